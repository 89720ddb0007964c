use chrono::Utc;
use guidepost_core::survey::MarketAnswers;
use sqlx::Row;

use super::{clean_text, decode_err, RepositoryError};
use crate::DbPool;

#[derive(Clone, Debug, PartialEq)]
pub struct TargetMarketRecord {
    pub location_id: String,
    pub answers: MarketAnswers,
    /// Canonical JSON of the sectioned summary document; decoded and
    /// validated by callers at the read boundary.
    pub summary: Option<String>,
    pub updated_at: String,
}

pub struct TargetMarketRepository {
    pool: DbPool,
}

const MARKET_COLUMNS: &str = "location_id, demographics, psychographics, pain_points, \
     buying_behavior, market_size, growth_potential, geographic_focus, summary, updated_at";

fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<TargetMarketRecord, RepositoryError> {
    let answers = MarketAnswers {
        demographics: row.try_get("demographics").map_err(decode_err)?,
        psychographics: row.try_get("psychographics").map_err(decode_err)?,
        pain_points: row.try_get("pain_points").map_err(decode_err)?,
        buying_behavior: row.try_get("buying_behavior").map_err(decode_err)?,
        market_size: row.try_get("market_size").map_err(decode_err)?,
        growth_potential: row.try_get("growth_potential").map_err(decode_err)?,
        geographic_focus: row.try_get("geographic_focus").map_err(decode_err)?,
    };

    Ok(TargetMarketRecord {
        location_id: row.try_get("location_id").map_err(decode_err)?,
        answers,
        summary: row.try_get("summary").map_err(decode_err)?,
        updated_at: row.try_get("updated_at").map_err(decode_err)?,
    })
}

impl TargetMarketRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_location(
        &self,
        location_id: &str,
    ) -> Result<Option<TargetMarketRecord>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {MARKET_COLUMNS} FROM target_markets WHERE location_id = ?"
        ))
        .bind(location_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(ref r) => Ok(Some(row_to_record(r)?)),
            None => Ok(None),
        }
    }

    pub async fn upsert_answers(
        &self,
        location_id: &str,
        answers: &MarketAnswers,
    ) -> Result<TargetMarketRecord, RepositoryError> {
        let now = Utc::now().to_rfc3339();

        sqlx::query(
            "INSERT INTO target_markets
                (location_id, demographics, psychographics, pain_points, buying_behavior,
                 market_size, growth_potential, geographic_focus, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(location_id) DO UPDATE SET
                 demographics = excluded.demographics,
                 psychographics = excluded.psychographics,
                 pain_points = excluded.pain_points,
                 buying_behavior = excluded.buying_behavior,
                 market_size = excluded.market_size,
                 growth_potential = excluded.growth_potential,
                 geographic_focus = excluded.geographic_focus,
                 updated_at = excluded.updated_at",
        )
        .bind(location_id)
        .bind(clean_text(answers.demographics.as_deref()))
        .bind(clean_text(answers.psychographics.as_deref()))
        .bind(clean_text(answers.pain_points.as_deref()))
        .bind(clean_text(answers.buying_behavior.as_deref()))
        .bind(clean_text(answers.market_size.as_deref()))
        .bind(clean_text(answers.growth_potential.as_deref()))
        .bind(clean_text(answers.geographic_focus.as_deref()))
        .bind(&now)
        .execute(&self.pool)
        .await?;

        self.find_by_location(location_id).await?.ok_or_else(|| {
            RepositoryError::Decode("target market row missing after upsert".to_string())
        })
    }

    pub async fn set_summary(
        &self,
        location_id: &str,
        summary_json: Option<&str>,
    ) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE target_markets SET summary = ?, updated_at = ? WHERE location_id = ?")
            .bind(clean_text(summary_json))
            .bind(Utc::now().to_rfc3339())
            .bind(location_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
