use chrono::Utc;
use guidepost_core::survey::CompanyAnswers;
use sqlx::Row;

use super::{clean_text, decode_err, decode_list, encode_list, RepositoryError};
use crate::DbPool;

#[derive(Clone, Debug, PartialEq)]
pub struct CompanyProfileRecord {
    pub location_id: String,
    pub answers: CompanyAnswers,
    pub summary: Option<String>,
    pub updated_at: String,
}

pub struct CompanyProfileRepository {
    pool: DbPool,
}

const COMPANY_COLUMNS: &str = "location_id, business_type, industry, target_audience, \
     company_description, brand_voice, key_products, competitors, summary, updated_at";

fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<CompanyProfileRecord, RepositoryError> {
    let answers = CompanyAnswers {
        business_type: row.try_get("business_type").map_err(decode_err)?,
        industry: row.try_get("industry").map_err(decode_err)?,
        target_audience: row.try_get("target_audience").map_err(decode_err)?,
        company_description: row.try_get("company_description").map_err(decode_err)?,
        brand_voice: row.try_get("brand_voice").map_err(decode_err)?,
        key_products: decode_list(row.try_get("key_products").map_err(decode_err)?)?,
        competitors: decode_list(row.try_get("competitors").map_err(decode_err)?)?,
    };

    Ok(CompanyProfileRecord {
        location_id: row.try_get("location_id").map_err(decode_err)?,
        answers,
        summary: row.try_get("summary").map_err(decode_err)?,
        updated_at: row.try_get("updated_at").map_err(decode_err)?,
    })
}

impl CompanyProfileRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_location(
        &self,
        location_id: &str,
    ) -> Result<Option<CompanyProfileRecord>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {COMPANY_COLUMNS} FROM company_profiles WHERE location_id = ?"
        ))
        .bind(location_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_record(r)?)),
            None => Ok(None),
        }
    }

    /// Sanitize and write the answer set. The stored summary is left alone;
    /// it changes only through [`set_summary`](Self::set_summary).
    pub async fn upsert_answers(
        &self,
        location_id: &str,
        answers: &CompanyAnswers,
    ) -> Result<CompanyProfileRecord, RepositoryError> {
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO company_profiles
                (location_id, business_type, industry, target_audience, company_description,
                 brand_voice, key_products, competitors, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(location_id) DO UPDATE SET
                 business_type = excluded.business_type,
                 industry = excluded.industry,
                 target_audience = excluded.target_audience,
                 company_description = excluded.company_description,
                 brand_voice = excluded.brand_voice,
                 key_products = excluded.key_products,
                 competitors = excluded.competitors,
                 updated_at = excluded.updated_at",
        )
        .bind(location_id)
        .bind(clean_text(answers.business_type.as_deref()))
        .bind(clean_text(answers.industry.as_deref()))
        .bind(clean_text(answers.target_audience.as_deref()))
        .bind(clean_text(answers.company_description.as_deref()))
        .bind(clean_text(answers.brand_voice.as_deref()))
        .bind(encode_list(answers.key_products.as_deref()))
        .bind(encode_list(answers.competitors.as_deref()))
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.find_by_location(location_id).await?.ok_or_else(|| {
            RepositoryError::Decode("company profile row missing after upsert".to_string())
        })
    }

    /// Store or clear the synthesized summary. `None` clears it, as when a
    /// survey is redone.
    pub async fn set_summary(
        &self,
        location_id: &str,
        summary: Option<&str>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE company_profiles SET summary = ?, updated_at = ? WHERE location_id = ?",
        )
        .bind(clean_text(summary))
        .bind(Utc::now().to_rfc3339())
        .bind(location_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
