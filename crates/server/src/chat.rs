//! Chat relay: forward a user message to the external workflow webhook and
//! log both sides of the exchange.
//!
//! Each round generates a fresh session identifier shared by the user and
//! assistant rows. No retries; a webhook failure aborts the round after the
//! user row is written.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use guidepost_db::{ChatHistoryRepository, ChatMessageRecord, ChatRole};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::api::{bad_request, db_error, error_response, ErrorResponse};
use crate::bootstrap::AppState;

#[derive(Debug, Deserialize)]
pub struct SendMessageRequest {
    pub message: String,
    #[serde(rename = "locationId")]
    pub location_id: String,
}

#[derive(Debug, Serialize)]
pub struct SendMessageResponse {
    pub response: String,
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

pub async fn send_message(
    State(state): State<AppState>,
    Json(body): Json<SendMessageRequest>,
) -> Result<Json<SendMessageResponse>, ErrorResponse> {
    let message = body.message.trim();
    let location_id = body.location_id.trim();
    if message.is_empty() || location_id.is_empty() {
        return Err(bad_request("Message and location ID are required"));
    }

    let repo = ChatHistoryRepository::new(state.db_pool.clone());
    let session_id = Uuid::new_v4().to_string();

    repo.append(location_id, &session_id, ChatRole::User, message).await.map_err(db_error)?;

    let reply = relay_to_webhook(&state, location_id, message).await?;

    repo.append(location_id, &session_id, ChatRole::Assistant, &reply)
        .await
        .map_err(db_error)?;

    info!(
        event_name = "chat.round_completed",
        location_id = %location_id,
        session_id = %session_id,
        "chat exchange relayed and logged"
    );

    Ok(Json(SendMessageResponse { response: reply, session_id }))
}

async fn relay_to_webhook(
    state: &AppState,
    location_id: &str,
    message: &str,
) -> Result<String, ErrorResponse> {
    let url = Url::parse_with_params(
        &state.chat.webhook_url,
        &[
            ("locationId", location_id),
            ("message", message),
            ("type", "message"),
            ("timestamp", &Utc::now().to_rfc3339()),
        ],
    )
    .map_err(|e| {
        error_response(StatusCode::INTERNAL_SERVER_ERROR, format!("invalid webhook URL: {e}"))
    })?;

    let response = state.http.get(url).send().await.map_err(|e| {
        error_response(StatusCode::INTERNAL_SERVER_ERROR, format!("webhook request failed: {e}"))
    })?;

    let status = response.status();
    if !status.is_success() {
        return Err(error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("webhook failed: HTTP {status}"),
        ));
    }

    let payload: Value = response.json().await.map_err(|e| {
        error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("webhook returned an unreadable body: {e}"),
        )
    })?;

    // The workflow names its reply field inconsistently.
    let reply = payload
        .get("output")
        .and_then(Value::as_str)
        .or_else(|| payload.get("message").and_then(Value::as_str))
        .unwrap_or(&state.chat.no_reply_text);

    Ok(reply.to_string())
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(rename = "locationId")]
    pub location_id: String,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ChatMessageView {
    pub id: String,
    pub location_id: String,
    pub session_id: String,
    pub role: &'static str,
    pub content: String,
    pub created_at: String,
}

impl From<ChatMessageRecord> for ChatMessageView {
    fn from(record: ChatMessageRecord) -> Self {
        Self {
            id: record.id,
            location_id: record.location_id,
            session_id: record.session_id,
            role: record.role.as_str(),
            content: record.content,
            created_at: record.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub messages: Vec<ChatMessageView>,
    pub total: i64,
    #[serde(rename = "hasMore")]
    pub has_more: bool,
}

pub async fn chat_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, ErrorResponse> {
    let location_id = query.location_id.trim();
    if location_id.is_empty() {
        return Err(bad_request("Location ID is required"));
    }

    let page = ChatHistoryRepository::new(state.db_pool.clone())
        .history(location_id, query.limit.unwrap_or(50), query.offset.unwrap_or(0))
        .await
        .map_err(db_error)?;

    Ok(Json(HistoryResponse {
        messages: page.messages.into_iter().map(ChatMessageView::from).collect(),
        total: page.total,
        has_more: page.has_more,
    }))
}
