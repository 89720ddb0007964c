use chrono::Utc;
use sqlx::Row;
use uuid::Uuid;

use super::{decode_err, RepositoryError};
use crate::DbPool;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    fn parse(raw: &str) -> Result<Self, RepositoryError> {
        match raw {
            "user" => Ok(Self::User),
            "assistant" => Ok(Self::Assistant),
            other => Err(RepositoryError::Decode(format!("unknown chat role `{other}`"))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatMessageRecord {
    pub id: String,
    pub location_id: String,
    pub session_id: String,
    pub role: ChatRole,
    pub content: String,
    pub created_at: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChatHistoryPage {
    pub messages: Vec<ChatMessageRecord>,
    pub total: i64,
    pub has_more: bool,
}

/// Append-only chat exchange log. Rows are never mutated or deleted.
pub struct ChatHistoryRepository {
    pool: DbPool,
}

fn row_to_message(row: &sqlx::sqlite::SqliteRow) -> Result<ChatMessageRecord, RepositoryError> {
    let role: String = row.try_get("role").map_err(decode_err)?;
    Ok(ChatMessageRecord {
        id: row.try_get("id").map_err(decode_err)?,
        location_id: row.try_get("location_id").map_err(decode_err)?,
        session_id: row.try_get("session_id").map_err(decode_err)?,
        role: ChatRole::parse(&role)?,
        content: row.try_get("content").map_err(decode_err)?,
        created_at: row.try_get("created_at").map_err(decode_err)?,
    })
}

impl ChatHistoryRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn append(
        &self,
        location_id: &str,
        session_id: &str,
        role: ChatRole,
        content: &str,
    ) -> Result<ChatMessageRecord, RepositoryError> {
        let record = ChatMessageRecord {
            id: Uuid::new_v4().to_string(),
            location_id: location_id.to_string(),
            session_id: session_id.to_string(),
            role,
            content: content.to_string(),
            created_at: Utc::now().to_rfc3339(),
        };

        sqlx::query(
            "INSERT INTO chat_history (id, location_id, session_id, role, content, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.id)
        .bind(&record.location_id)
        .bind(&record.session_id)
        .bind(record.role.as_str())
        .bind(&record.content)
        .bind(&record.created_at)
        .execute(&self.pool)
        .await?;

        Ok(record)
    }

    /// Newest-first page of a tenant's history, with the total row count
    /// and whether more rows remain past this page.
    pub async fn history(
        &self,
        location_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<ChatHistoryPage, RepositoryError> {
        let limit = limit.clamp(1, 200);
        let offset = offset.max(0);

        let rows = sqlx::query(
            "SELECT id, location_id, session_id, role, content, created_at
             FROM chat_history
             WHERE location_id = ?
             ORDER BY created_at DESC, id DESC
             LIMIT ? OFFSET ?",
        )
        .bind(location_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let messages =
            rows.iter().map(row_to_message).collect::<Result<Vec<_>, RepositoryError>>()?;

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM chat_history WHERE location_id = ?")
                .bind(location_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(ChatHistoryPage { messages, total, has_more: offset + limit < total })
    }
}

#[cfg(test)]
mod tests {
    use super::{ChatHistoryRepository, ChatRole};
    use crate::{connect_with_settings, migrations};

    async fn repo() -> ChatHistoryRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        ChatHistoryRepository::new(pool)
    }

    #[tokio::test]
    async fn appended_pairs_share_a_session() {
        let repo = repo().await;

        let user = repo.append("loc1", "session-1", ChatRole::User, "hello").await.expect("user");
        let reply = repo
            .append("loc1", "session-1", ChatRole::Assistant, "hi there")
            .await
            .expect("assistant");

        assert_eq!(user.session_id, reply.session_id);
        assert_ne!(user.id, reply.id);

        let page = repo.history("loc1", 50, 0).await.expect("history");
        assert_eq!(page.total, 2);
        assert!(page.messages.iter().any(|m| m.role == ChatRole::User && m.content == "hello"));
        assert!(
            page.messages.iter().any(|m| m.role == ChatRole::Assistant && m.content == "hi there")
        );
    }

    #[tokio::test]
    async fn history_pages_newest_first() {
        let repo = repo().await;

        for index in 0..5 {
            repo.append("loc1", &format!("session-{index}"), ChatRole::User, &format!("m{index}"))
                .await
                .expect("append");
        }

        let first_page = repo.history("loc1", 2, 0).await.expect("page");
        assert_eq!(first_page.messages.len(), 2);
        assert_eq!(first_page.total, 5);
        assert!(first_page.has_more);

        let last_page = repo.history("loc1", 2, 4).await.expect("page");
        assert_eq!(last_page.messages.len(), 1);
        assert!(!last_page.has_more);
    }

    #[tokio::test]
    async fn history_is_partitioned_by_tenant() {
        let repo = repo().await;

        repo.append("loc1", "s1", ChatRole::User, "mine").await.expect("append");
        repo.append("loc2", "s2", ChatRole::User, "theirs").await.expect("append");

        let page = repo.history("loc1", 50, 0).await.expect("history");
        assert_eq!(page.total, 1);
        assert_eq!(page.messages[0].content, "mine");
    }
}
