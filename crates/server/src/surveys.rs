//! Survey answer-set routes and the survey session endpoints.
//!
//! The data routes mirror the persistence gateway: read the answer set
//! (absent reads as `{}`) and sanitize-upsert it. The session routes drive
//! the survey state machine; the client holds its current step and sends
//! it with each transition, the server validates the transition, persists
//! the sheet, and re-materializes the session view.

use axum::extract::{Path, Query, State};
use axum::Json;
use guidepost_core::survey::{
    AnswerSheet, CompanyAnswers, MarketAnswers, NextOutcome, SurveyKind, SurveySession,
};
use guidepost_db::{CompanyProfileRepository, TargetMarketRepository};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::warn;

use crate::api::{ai_error, bad_request, db_error, domain_error, not_found, ErrorResponse};
use crate::bootstrap::AppState;
use crate::synthesis::{self, SynthesisError};
use crate::tenants::LocationQuery;

// ---------------------------------------------------------------------------
// Answer-set data routes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct SaveCompanyRequest {
    pub location_id: String,
    #[serde(flatten)]
    pub answers: CompanyAnswers,
}

#[derive(Debug, Serialize)]
pub struct CompanyDataView {
    pub location_id: String,
    #[serde(flatten)]
    pub answers: CompanyAnswers,
    pub summary: Option<String>,
    pub updated_at: String,
}

pub async fn get_company_data(
    State(state): State<AppState>,
    Query(query): Query<LocationQuery>,
) -> Result<Json<Value>, ErrorResponse> {
    let location_id = query.location_id.trim();
    if location_id.is_empty() {
        return Err(bad_request("Location ID is required"));
    }

    let record = CompanyProfileRepository::new(state.db_pool.clone())
        .find_by_location(location_id)
        .await
        .map_err(db_error)?;

    // First run: no row yet reads as an empty object, not an error.
    let Some(record) = record else { return Ok(Json(json!({}))) };

    let view = CompanyDataView {
        location_id: record.location_id,
        answers: record.answers,
        summary: record.summary,
        updated_at: record.updated_at,
    };
    Ok(Json(serde_json::to_value(view).unwrap_or(Value::Null)))
}

pub async fn save_company_data(
    State(state): State<AppState>,
    Json(body): Json<SaveCompanyRequest>,
) -> Result<Json<Value>, ErrorResponse> {
    let location_id = body.location_id.trim();
    if location_id.is_empty() {
        return Err(bad_request("Location ID is required"));
    }

    CompanyProfileRepository::new(state.db_pool.clone())
        .upsert_answers(location_id, &body.answers)
        .await
        .map_err(db_error)?;

    Ok(Json(json!({ "success": true })))
}

#[derive(Debug, Deserialize)]
pub struct SaveMarketRequest {
    pub location_id: String,
    #[serde(flatten)]
    pub answers: MarketAnswers,
}

#[derive(Debug, Serialize)]
pub struct MarketDataView {
    pub location_id: String,
    #[serde(flatten)]
    pub answers: MarketAnswers,
    pub summary: Option<String>,
    pub updated_at: String,
}

pub async fn get_target_market(
    State(state): State<AppState>,
    Query(query): Query<LocationQuery>,
) -> Result<Json<Value>, ErrorResponse> {
    let location_id = query.location_id.trim();
    if location_id.is_empty() {
        return Err(bad_request("Location ID is required"));
    }

    let record = TargetMarketRepository::new(state.db_pool.clone())
        .find_by_location(location_id)
        .await
        .map_err(db_error)?;

    let Some(record) = record else { return Ok(Json(json!({}))) };

    let view = MarketDataView {
        location_id: record.location_id,
        answers: record.answers,
        summary: record.summary,
        updated_at: record.updated_at,
    };
    Ok(Json(serde_json::to_value(view).unwrap_or(Value::Null)))
}

pub async fn save_target_market(
    State(state): State<AppState>,
    Json(body): Json<SaveMarketRequest>,
) -> Result<Json<Value>, ErrorResponse> {
    let location_id = body.location_id.trim();
    if location_id.is_empty() {
        return Err(bad_request("Location ID is required"));
    }

    TargetMarketRepository::new(state.db_pool.clone())
        .upsert_answers(location_id, &body.answers)
        .await
        .map_err(db_error)?;

    Ok(Json(json!({ "success": true })))
}

// ---------------------------------------------------------------------------
// Session endpoints
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct StepRequest {
    #[serde(rename = "locationId")]
    pub location_id: String,
    pub step: usize,
    pub answer: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RestartRequest {
    #[serde(rename = "locationId")]
    pub location_id: String,
}

fn parse_kind(raw: &str) -> Result<SurveyKind, ErrorResponse> {
    SurveyKind::parse(raw).ok_or_else(|| not_found(format!("unknown survey kind `{raw}`")))
}

fn trimmed_location(raw: &str) -> Result<&str, ErrorResponse> {
    let location_id = raw.trim();
    if location_id.is_empty() {
        return Err(bad_request("Location ID is required"));
    }
    Ok(location_id)
}

fn session_view<S: AnswerSheet + Serialize>(
    session: &SurveySession<S>,
    summary: Option<Value>,
) -> Value {
    let definition = S::definition();
    let mut view = json!({
        "survey": definition.kind.as_str(),
        "totalSteps": definition.len(),
        "completed": session.is_complete(),
        "answers": serde_json::to_value(session.answers()).unwrap_or(Value::Null),
    });

    if let Some(step) = session.current_step() {
        if let Some(step_def) = definition.step(step) {
            view["step"] = json!(step);
            view["field"] = json!(step_def.field);
            view["question"] = json!(step_def.question);
            view["placeholder"] = json!(step_def.placeholder);
        }
    }
    if let Some(summary) = summary {
        view["summary"] = summary;
    }

    view
}

fn synthesis_error(err: SynthesisError) -> ErrorResponse {
    match err {
        SynthesisError::NotFound(message) => not_found(message),
        SynthesisError::Repository(err) => db_error(err),
        SynthesisError::Ai(err) => ai_error(err),
    }
}

async fn company_state(
    state: &AppState,
    location_id: &str,
) -> Result<(CompanyAnswers, Option<String>), ErrorResponse> {
    let record = CompanyProfileRepository::new(state.db_pool.clone())
        .find_by_location(location_id)
        .await
        .map_err(db_error)?;
    Ok(record.map(|r| (r.answers, r.summary)).unwrap_or_default())
}

async fn market_state(
    state: &AppState,
    location_id: &str,
) -> Result<(MarketAnswers, Option<String>), ErrorResponse> {
    let record = TargetMarketRepository::new(state.db_pool.clone())
        .find_by_location(location_id)
        .await
        .map_err(db_error)?;
    Ok(record.map(|r| (r.answers, r.summary)).unwrap_or_default())
}

/// A stored market summary re-enters through validation; junk reads as
/// absent so the survey is re-shown instead of rendering untrusted data.
fn decode_market_summary(location_id: &str, stored: Option<String>) -> Option<Value> {
    let raw = stored?;
    match guidepost_core::summary::SectionedSummary::from_stored_json(&raw) {
        Ok(document) => serde_json::to_value(document).ok(),
        Err(violation) => {
            warn!(
                event_name = "surveys.stored_summary_invalid",
                location_id = %location_id,
                error = %violation,
                "stored market summary failed validation, treating as absent"
            );
            None
        }
    }
}

pub async fn get_session(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(query): Query<LocationQuery>,
) -> Result<Json<Value>, ErrorResponse> {
    let kind = parse_kind(&kind)?;
    let location_id = trimmed_location(&query.location_id)?;

    let view = match kind {
        SurveyKind::Company => {
            let (answers, summary) = company_state(&state, location_id).await?;
            let session = SurveySession::resume(answers, summary.is_some());
            session_view(&session, summary.map(Value::String))
        }
        SurveyKind::TargetMarket => {
            let (answers, summary) = market_state(&state, location_id).await?;
            let summary = decode_market_summary(location_id, summary);
            let session = SurveySession::resume(answers, summary.is_some());
            session_view(&session, summary)
        }
    };

    Ok(Json(view))
}

pub async fn next_step(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Json(body): Json<StepRequest>,
) -> Result<Json<Value>, ErrorResponse> {
    let kind = parse_kind(&kind)?;
    let location_id = trimmed_location(&body.location_id)?;

    match kind {
        SurveyKind::Company => {
            let (answers, _) = company_state(&state, location_id).await?;
            let mut session =
                SurveySession::at_step(answers, body.step).map_err(domain_error)?;
            let outcome = session.next(body.answer.as_deref()).map_err(domain_error)?;

            CompanyProfileRepository::new(state.db_pool.clone())
                .upsert_answers(location_id, session.answers())
                .await
                .map_err(db_error)?;

            let summary = match outcome {
                NextOutcome::Completed => Some(Value::String(
                    synthesis::synthesize_company_summary(&state, location_id)
                        .await
                        .map_err(synthesis_error)?,
                )),
                NextOutcome::Advanced { .. } => None,
            };
            Ok(Json(session_view(&session, summary)))
        }
        SurveyKind::TargetMarket => {
            let (answers, _) = market_state(&state, location_id).await?;
            let mut session =
                SurveySession::at_step(answers, body.step).map_err(domain_error)?;
            let outcome = session.next(body.answer.as_deref()).map_err(domain_error)?;

            TargetMarketRepository::new(state.db_pool.clone())
                .upsert_answers(location_id, session.answers())
                .await
                .map_err(db_error)?;

            let summary = match outcome {
                NextOutcome::Completed => {
                    let document = synthesis::synthesize_market_summary(&state, location_id)
                        .await
                        .map_err(synthesis_error)?;
                    serde_json::to_value(document).ok()
                }
                NextOutcome::Advanced { .. } => None,
            };
            Ok(Json(session_view(&session, summary)))
        }
    }
}

pub async fn previous_step(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Json(body): Json<StepRequest>,
) -> Result<Json<Value>, ErrorResponse> {
    let kind = parse_kind(&kind)?;
    let location_id = trimmed_location(&body.location_id)?;

    // Stepping back never persists.
    let view = match kind {
        SurveyKind::Company => {
            let (answers, _) = company_state(&state, location_id).await?;
            let mut session =
                SurveySession::at_step(answers, body.step).map_err(domain_error)?;
            session.previous().map_err(domain_error)?;
            session_view(&session, None)
        }
        SurveyKind::TargetMarket => {
            let (answers, _) = market_state(&state, location_id).await?;
            let mut session =
                SurveySession::at_step(answers, body.step).map_err(domain_error)?;
            session.previous().map_err(domain_error)?;
            session_view(&session, None)
        }
    };

    Ok(Json(view))
}

pub async fn enhance_step(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Json(body): Json<StepRequest>,
) -> Result<Json<Value>, ErrorResponse> {
    let kind = parse_kind(&kind)?;
    let location_id = trimmed_location(&body.location_id)?;
    let enhancer = guidepost_ai::FieldEnhancer::new(state.generative.clone());

    match kind {
        SurveyKind::Company => {
            let (answers, _) = company_state(&state, location_id).await?;
            let mut session =
                SurveySession::at_step(answers, body.step).map_err(domain_error)?;
            let question = session
                .current_step_definition()
                .map(|step| step.question)
                .unwrap_or_default();
            let original = session
                .current_value_text()
                .map_err(|_| bad_request("Please provide an answer first"))?;

            let enhanced = enhancer.enhance(&original, question).await.map_err(ai_error)?;
            let value = session.apply_enhanced(&enhanced).map_err(domain_error)?;

            CompanyProfileRepository::new(state.db_pool.clone())
                .upsert_answers(location_id, session.answers())
                .await
                .map_err(db_error)?;

            let mut view = session_view(&session, None);
            view["enhancedAnswer"] = serde_json::to_value(&value).unwrap_or(Value::Null);
            Ok(Json(view))
        }
        SurveyKind::TargetMarket => {
            let (answers, _) = market_state(&state, location_id).await?;
            let mut session =
                SurveySession::at_step(answers, body.step).map_err(domain_error)?;
            let question = session
                .current_step_definition()
                .map(|step| step.question)
                .unwrap_or_default();
            let original = session
                .current_value_text()
                .map_err(|_| bad_request("Please provide an answer first"))?;

            let enhanced = enhancer.enhance(&original, question).await.map_err(ai_error)?;
            let value = session.apply_enhanced(&enhanced).map_err(domain_error)?;

            TargetMarketRepository::new(state.db_pool.clone())
                .upsert_answers(location_id, session.answers())
                .await
                .map_err(db_error)?;

            let mut view = session_view(&session, None);
            view["enhancedAnswer"] = serde_json::to_value(&value).unwrap_or(Value::Null);
            Ok(Json(view))
        }
    }
}

pub async fn restart_survey(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Json(body): Json<RestartRequest>,
) -> Result<Json<Value>, ErrorResponse> {
    let kind = parse_kind(&kind)?;
    let location_id = trimmed_location(&body.location_id)?;

    // Restart keeps every answered value, returns to step 0, and discards
    // the stored summary so completion re-synthesizes it.
    let view = match kind {
        SurveyKind::Company => {
            let (answers, _) = company_state(&state, location_id).await?;
            let repo = CompanyProfileRepository::new(state.db_pool.clone());
            repo.upsert_answers(location_id, &answers).await.map_err(db_error)?;
            repo.set_summary(location_id, None).await.map_err(db_error)?;

            let mut session = SurveySession::resume(answers, true);
            session.restart();
            session_view(&session, None)
        }
        SurveyKind::TargetMarket => {
            let (answers, _) = market_state(&state, location_id).await?;
            let repo = TargetMarketRepository::new(state.db_pool.clone());
            repo.upsert_answers(location_id, &answers).await.map_err(db_error)?;
            repo.set_summary(location_id, None).await.map_err(db_error)?;

            let mut session = SurveySession::resume(answers, true);
            session.restart();
            session_view(&session, None)
        }
    };

    Ok(Json(view))
}
