use chrono::Utc;
use sqlx::Row;
use uuid::Uuid;

use super::{clean_text, decode_err, RepositoryError};
use crate::DbPool;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TenantRecord {
    pub id: String,
    pub location_id: String,
    pub full_name: Option<String>,
    pub company_name: Option<String>,
    pub email: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

pub struct TenantRepository {
    pool: DbPool,
}

fn row_to_tenant(row: &sqlx::sqlite::SqliteRow) -> Result<TenantRecord, RepositoryError> {
    Ok(TenantRecord {
        id: row.try_get("id").map_err(decode_err)?,
        location_id: row.try_get("location_id").map_err(decode_err)?,
        full_name: row.try_get("full_name").map_err(decode_err)?,
        company_name: row.try_get("company_name").map_err(decode_err)?,
        email: row.try_get("email").map_err(decode_err)?,
        created_at: row.try_get("created_at").map_err(decode_err)?,
        updated_at: row.try_get("updated_at").map_err(decode_err)?,
    })
}

const TENANT_COLUMNS: &str =
    "id, location_id, full_name, company_name, email, created_at, updated_at";

impl TenantRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_location(
        &self,
        location_id: &str,
    ) -> Result<Option<TenantRecord>, RepositoryError> {
        let row =
            sqlx::query(&format!("SELECT {TENANT_COLUMNS} FROM tenants WHERE location_id = ?"))
                .bind(location_id)
                .fetch_optional(&self.pool)
                .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_tenant(r)?)),
            None => Ok(None),
        }
    }

    /// First contact for a location implicitly creates the tenant row.
    /// A provided name updates an existing row only when it differs.
    pub async fn get_or_create(
        &self,
        location_id: &str,
        full_name: Option<&str>,
    ) -> Result<TenantRecord, RepositoryError> {
        let full_name = clean_text(full_name);

        if let Some(mut existing) = self.find_by_location(location_id).await? {
            if let Some(name) = full_name {
                if existing.full_name.as_deref() != Some(name.as_str()) {
                    let now = Utc::now().to_rfc3339();
                    sqlx::query(
                        "UPDATE tenants SET full_name = ?, updated_at = ? WHERE location_id = ?",
                    )
                    .bind(&name)
                    .bind(&now)
                    .bind(location_id)
                    .execute(&self.pool)
                    .await?;
                    existing.full_name = Some(name);
                    existing.updated_at = now;
                }
            }
            return Ok(existing);
        }

        let now = Utc::now().to_rfc3339();
        let record = TenantRecord {
            id: Uuid::new_v4().to_string(),
            location_id: location_id.to_string(),
            full_name,
            company_name: None,
            email: None,
            created_at: now.clone(),
            updated_at: now,
        };

        sqlx::query(
            "INSERT INTO tenants (id, location_id, full_name, company_name, email, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.id)
        .bind(&record.location_id)
        .bind(&record.full_name)
        .bind(&record.company_name)
        .bind(&record.email)
        .bind(&record.created_at)
        .bind(&record.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(record)
    }

    pub async fn company_name(
        &self,
        location_id: &str,
    ) -> Result<Option<String>, RepositoryError> {
        let name: Option<Option<String>> =
            sqlx::query_scalar("SELECT company_name FROM tenants WHERE location_id = ?")
                .bind(location_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(name.flatten())
    }

    pub async fn set_company_name(
        &self,
        location_id: &str,
        company_name: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE tenants SET company_name = ?, updated_at = ? WHERE location_id = ?")
            .bind(clean_text(Some(company_name)))
            .bind(Utc::now().to_rfc3339())
            .bind(location_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
