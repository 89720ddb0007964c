//! Target customer persona endpoints.

use axum::extract::{Query, State};
use axum::Json;
use guidepost_core::persona::PersonaProfile;
use guidepost_db::{PersonaRecord, PersonaRepository};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::{ai_error, bad_request, db_error, not_found, ErrorResponse};
use crate::bootstrap::AppState;
use crate::synthesis::{self, SynthesisError};
use crate::tenants::LocationQuery;

#[derive(Debug, Deserialize)]
pub struct GeneratePersonaRequest {
    #[serde(rename = "locationId")]
    pub location_id: String,
    #[serde(rename = "marketSummary")]
    pub market_summary: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct PersonaView {
    #[serde(flatten)]
    pub profile: PersonaProfile,
    pub profile_image_url: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<PersonaRecord> for PersonaView {
    fn from(record: PersonaRecord) -> Self {
        Self {
            profile: record.profile,
            profile_image_url: record.profile_image_url,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PersonaResponse {
    pub profile: Option<PersonaView>,
}

pub async fn generate_target_customer(
    State(state): State<AppState>,
    Json(body): Json<GeneratePersonaRequest>,
) -> Result<Json<PersonaResponse>, ErrorResponse> {
    let location_id = body.location_id.trim();
    if location_id.is_empty() {
        return Err(bad_request("Location ID is required"));
    }
    let market_summary =
        body.market_summary.ok_or_else(|| bad_request("Market summary is required"))?;

    let record = synthesis::synthesize_persona(&state, location_id, &market_summary)
        .await
        .map_err(|err| match err {
            SynthesisError::NotFound(message) => not_found(message),
            SynthesisError::Repository(err) => db_error(err),
            SynthesisError::Ai(err) => ai_error(err),
        })?;

    Ok(Json(PersonaResponse { profile: Some(record.into()) }))
}

/// The tenant's current persona, or `profile: null` before the first
/// generation. Absence is a first-run state, not an error.
pub async fn get_target_customer(
    State(state): State<AppState>,
    Query(query): Query<LocationQuery>,
) -> Result<Json<PersonaResponse>, ErrorResponse> {
    let location_id = query.location_id.trim();
    if location_id.is_empty() {
        return Err(bad_request("Location ID is required"));
    }

    let record = PersonaRepository::new(state.db_pool.clone())
        .latest_by_location(location_id)
        .await
        .map_err(db_error)?;

    Ok(Json(PersonaResponse { profile: record.map(PersonaView::from) }))
}
