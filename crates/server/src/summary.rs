//! Summary synthesis endpoints.

use axum::extract::State;
use axum::Json;
use guidepost_core::summary::SectionedSummary;
use serde::{Deserialize, Serialize};

use crate::api::{ai_error, bad_request, db_error, not_found, ErrorResponse};
use crate::bootstrap::AppState;
use crate::synthesis::{self, SynthesisError};

#[derive(Debug, Deserialize)]
pub struct SummaryRequest {
    #[serde(rename = "locationId")]
    pub location_id: String,
}

#[derive(Debug, Serialize)]
pub struct CompanySummaryResponse {
    pub summary: String,
}

#[derive(Debug, Serialize)]
pub struct MarketSummaryResponse {
    pub summary: SectionedSummary,
}

fn synthesis_error(err: SynthesisError) -> ErrorResponse {
    match err {
        SynthesisError::NotFound(message) => not_found(message),
        SynthesisError::Repository(err) => db_error(err),
        SynthesisError::Ai(err) => ai_error(err),
    }
}

fn location_from(body: &SummaryRequest) -> Result<&str, ErrorResponse> {
    let location_id = body.location_id.trim();
    if location_id.is_empty() {
        return Err(bad_request("Location ID is required"));
    }
    Ok(location_id)
}

pub async fn generate_company_summary(
    State(state): State<AppState>,
    Json(body): Json<SummaryRequest>,
) -> Result<Json<CompanySummaryResponse>, ErrorResponse> {
    let location_id = location_from(&body)?;

    let summary = synthesis::synthesize_company_summary(&state, location_id)
        .await
        .map_err(synthesis_error)?;

    Ok(Json(CompanySummaryResponse { summary }))
}

pub async fn generate_market_summary(
    State(state): State<AppState>,
    Json(body): Json<SummaryRequest>,
) -> Result<Json<MarketSummaryResponse>, ErrorResponse> {
    let location_id = location_from(&body)?;

    let summary = synthesis::synthesize_market_summary(&state, location_id)
        .await
        .map_err(synthesis_error)?;

    Ok(Json(MarketSummaryResponse { summary }))
}

#[cfg(test)]
mod tests {
    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::Json;
    use guidepost_db::CompanyProfileRepository;
    use serde_json::json;

    use super::{generate_company_summary, generate_market_summary, SummaryRequest};
    use crate::api::testing::{memory_pool, state_with, ScriptedGenerative};

    #[tokio::test]
    async fn company_summary_requires_existing_answers() {
        let state = state_with(memory_pool().await, ScriptedGenerative::replying("unused"));

        let (status, body) = generate_company_summary(
            State(state),
            Json(SummaryRequest { location_id: "loc1".to_string() }),
        )
        .await
        .expect_err("no answers yet");

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body.error, "No company data found");
    }

    #[tokio::test]
    async fn company_summary_returns_the_joined_text() {
        let pool = memory_pool().await;
        let narrative = json!({
            "overview": "A",
            "targetMarket": "B",
            "marketPosition": "C",
            "brandCommunication": "D"
        })
        .to_string();
        let state = state_with(pool.clone(), ScriptedGenerative::replying(&narrative));

        CompanyProfileRepository::new(pool)
            .upsert_answers("loc1", &Default::default())
            .await
            .expect("answers");

        let Json(response) = generate_company_summary(
            State(state),
            Json(SummaryRequest { location_id: "loc1".to_string() }),
        )
        .await
        .expect("summary");

        assert_eq!(response.summary, "A\n\nB\n\nC\n\nD");
    }

    #[tokio::test]
    async fn market_summary_requires_a_location() {
        let state = state_with(memory_pool().await, ScriptedGenerative::replying("unused"));

        let (status, _) = generate_market_summary(
            State(state),
            Json(SummaryRequest { location_id: "".to_string() }),
        )
        .await
        .expect_err("blank location");

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
