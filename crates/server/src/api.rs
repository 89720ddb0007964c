//! Shared JSON API plumbing: the error envelope, status mapping for each
//! failure kind, and the route table.
//!
//! Every failure leaves the server as `{ "error": "<message>" }` with a
//! 4xx/5xx status; there are no partial-success responses.

use axum::{
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use guidepost_ai::AiError;
use guidepost_core::errors::DomainError;
use guidepost_db::RepositoryError;
use serde::Serialize;
use tracing::error;

use crate::bootstrap::AppState;
use crate::{chat, content, persona, summary, surveys, tenants};

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
}

pub type ErrorResponse = (StatusCode, Json<ApiError>);

pub fn error_response(status: StatusCode, message: impl Into<String>) -> ErrorResponse {
    (status, Json(ApiError { error: message.into() }))
}

pub fn bad_request(message: impl Into<String>) -> ErrorResponse {
    error_response(StatusCode::BAD_REQUEST, message)
}

pub fn not_found(message: impl Into<String>) -> ErrorResponse {
    error_response(StatusCode::NOT_FOUND, message)
}

pub fn db_error(err: RepositoryError) -> ErrorResponse {
    error!(event_name = "api.persistence_error", error = %err, "persistence failure");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, format!("persistence failure: {err}"))
}

pub fn domain_error(err: DomainError) -> ErrorResponse {
    bad_request(err.to_string())
}

pub fn ai_error(err: AiError) -> ErrorResponse {
    error!(event_name = "api.provider_error", error = %err, "generative provider failure");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/tenants", post(tenants::init_tenant))
        .route("/api/company-name", get(tenants::get_company_name).post(tenants::set_company_name))
        .route("/api/company-data", get(surveys::get_company_data).post(surveys::save_company_data))
        .route(
            "/api/target-market",
            get(surveys::get_target_market).post(surveys::save_target_market),
        )
        .route("/api/surveys/{kind}", get(surveys::get_session))
        .route("/api/surveys/{kind}/next", post(surveys::next_step))
        .route("/api/surveys/{kind}/previous", post(surveys::previous_step))
        .route("/api/surveys/{kind}/enhance", post(surveys::enhance_step))
        .route("/api/surveys/{kind}/restart", post(surveys::restart_survey))
        .route("/api/enhance", post(content::enhance_answer))
        .route("/api/structured-content", post(content::generate_structured_content))
        .route("/api/company-summary", post(summary::generate_company_summary))
        .route("/api/market-summary", post(summary::generate_market_summary))
        .route(
            "/api/target-customer",
            get(persona::get_target_customer).post(persona::generate_target_customer),
        )
        .route("/api/chat", post(chat::send_message))
        .route("/api/chat-history", get(chat::chat_history))
        .with_state(state)
}
