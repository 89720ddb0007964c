use chrono::Utc;
use guidepost_core::persona::PersonaProfile;
use sqlx::Row;

use super::{clean_text, decode_err, decode_list, encode_list, RepositoryError};
use crate::DbPool;

#[derive(Clone, Debug, PartialEq)]
pub struct PersonaRecord {
    pub location_id: String,
    pub profile: PersonaProfile,
    pub profile_image_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

pub struct PersonaRepository {
    pool: DbPool,
}

const PERSONA_COLUMNS: &str = "location_id, name, age, position, company_size, industry, goals, \
     challenges, interests, preferred_channels, decision_factors, budget_range, \
     profile_description, profile_image_url, created_at, updated_at";

fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<PersonaRecord, RepositoryError> {
    let profile = PersonaProfile {
        name: row.try_get("name").map_err(decode_err)?,
        age: row.try_get("age").map_err(decode_err)?,
        position: row.try_get::<Option<String>, _>("position").map_err(decode_err)?.unwrap_or_default(),
        company_size: row
            .try_get::<Option<String>, _>("company_size")
            .map_err(decode_err)?
            .unwrap_or_default(),
        industry: row.try_get::<Option<String>, _>("industry").map_err(decode_err)?.unwrap_or_default(),
        goals: decode_list(row.try_get("goals").map_err(decode_err)?)?.unwrap_or_default(),
        challenges: decode_list(row.try_get("challenges").map_err(decode_err)?)?.unwrap_or_default(),
        interests: decode_list(row.try_get("interests").map_err(decode_err)?)?.unwrap_or_default(),
        preferred_channels: decode_list(row.try_get("preferred_channels").map_err(decode_err)?)?
            .unwrap_or_default(),
        decision_factors: decode_list(row.try_get("decision_factors").map_err(decode_err)?)?
            .unwrap_or_default(),
        budget_range: row
            .try_get::<Option<String>, _>("budget_range")
            .map_err(decode_err)?
            .unwrap_or_default(),
        profile_description: row
            .try_get::<Option<String>, _>("profile_description")
            .map_err(decode_err)?
            .unwrap_or_default(),
    };

    Ok(PersonaRecord {
        location_id: row.try_get("location_id").map_err(decode_err)?,
        profile,
        profile_image_url: row.try_get("profile_image_url").map_err(decode_err)?,
        created_at: row.try_get("created_at").map_err(decode_err)?,
        updated_at: row.try_get("updated_at").map_err(decode_err)?,
    })
}

impl PersonaRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// The tenant's current persona: the most recent row by creation time.
    pub async fn latest_by_location(
        &self,
        location_id: &str,
    ) -> Result<Option<PersonaRecord>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {PERSONA_COLUMNS} FROM target_customers
             WHERE location_id = ? ORDER BY created_at DESC LIMIT 1"
        ))
        .bind(location_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_record(r)?)),
            None => Ok(None),
        }
    }

    /// Regeneration overwrites the tenant's persona in place.
    pub async fn upsert(
        &self,
        location_id: &str,
        profile: &PersonaProfile,
        profile_image_url: &str,
    ) -> Result<PersonaRecord, RepositoryError> {
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO target_customers
                (location_id, name, age, position, company_size, industry, goals, challenges,
                 interests, preferred_channels, decision_factors, budget_range,
                 profile_description, profile_image_url, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(location_id) DO UPDATE SET
                 name = excluded.name,
                 age = excluded.age,
                 position = excluded.position,
                 company_size = excluded.company_size,
                 industry = excluded.industry,
                 goals = excluded.goals,
                 challenges = excluded.challenges,
                 interests = excluded.interests,
                 preferred_channels = excluded.preferred_channels,
                 decision_factors = excluded.decision_factors,
                 budget_range = excluded.budget_range,
                 profile_description = excluded.profile_description,
                 profile_image_url = excluded.profile_image_url,
                 updated_at = excluded.updated_at",
        )
        .bind(location_id)
        .bind(profile.name.trim())
        .bind(profile.age)
        .bind(clean_text(Some(&profile.position)))
        .bind(clean_text(Some(&profile.company_size)))
        .bind(clean_text(Some(&profile.industry)))
        .bind(encode_list(Some(&profile.goals)))
        .bind(encode_list(Some(&profile.challenges)))
        .bind(encode_list(Some(&profile.interests)))
        .bind(encode_list(Some(&profile.preferred_channels)))
        .bind(encode_list(Some(&profile.decision_factors)))
        .bind(clean_text(Some(&profile.budget_range)))
        .bind(clean_text(Some(&profile.profile_description)))
        .bind(clean_text(Some(profile_image_url)))
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.latest_by_location(location_id).await?.ok_or_else(|| {
            RepositoryError::Decode("persona row missing after upsert".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use guidepost_core::persona::PersonaProfile;

    use super::PersonaRepository;
    use crate::{connect_with_settings, migrations};

    async fn repo() -> PersonaRepository {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        PersonaRepository::new(pool)
    }

    fn profile(name: &str) -> PersonaProfile {
        PersonaProfile {
            name: name.to_string(),
            age: 34,
            position: "Operations Director".to_string(),
            company_size: "50-200 employees".to_string(),
            industry: "Logistics".to_string(),
            goals: vec!["automate reporting".to_string()],
            challenges: vec!["legacy tooling".to_string()],
            interests: vec!["trail running".to_string()],
            preferred_channels: vec!["LinkedIn".to_string()],
            decision_factors: vec!["ROI".to_string()],
            budget_range: "$10k-$50k".to_string(),
            profile_description: "Pragmatic and data-driven.".to_string(),
        }
    }

    #[tokio::test]
    async fn upsert_and_fetch_round_trip() {
        let repo = repo().await;

        let saved = repo
            .upsert("loc1", &profile("Maya Chen"), "https://img.example.com/maya.jpg")
            .await
            .expect("upsert");
        assert_eq!(saved.profile, profile("Maya Chen"));
        assert_eq!(saved.profile_image_url.as_deref(), Some("https://img.example.com/maya.jpg"));

        let fetched = repo.latest_by_location("loc1").await.expect("query").expect("exists");
        assert_eq!(fetched.profile.name, "Maya Chen");
    }

    #[tokio::test]
    async fn regeneration_overwrites_the_single_current_row() {
        let repo = repo().await;

        repo.upsert("loc1", &profile("Maya Chen"), "https://img.example.com/1.jpg")
            .await
            .expect("first");
        repo.upsert("loc1", &profile("Ray Osei"), "https://img.example.com/2.jpg")
            .await
            .expect("second");

        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM target_customers WHERE location_id = 'loc1'")
                .fetch_one(&repo.pool)
                .await
                .expect("count");
        assert_eq!(count, 1);

        let current = repo.latest_by_location("loc1").await.expect("query").expect("exists");
        assert_eq!(current.profile.name, "Ray Osei");
    }

    #[tokio::test]
    async fn missing_persona_reads_as_none() {
        let repo = repo().await;
        assert!(repo.latest_by_location("absent").await.expect("query").is_none());
    }
}
