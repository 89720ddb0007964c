//! Direct generation endpoints: one-answer enhancement and caller-supplied
//! schema generation.

use axum::extract::State;
use axum::Json;
use guidepost_ai::{FieldEnhancer, StructuredContentGenerator};
use guidepost_core::shape::Shape;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::{ai_error, bad_request, ErrorResponse};
use crate::bootstrap::AppState;

#[derive(Debug, Deserialize)]
pub struct EnhanceRequest {
    pub answer: String,
    pub question: String,
}

#[derive(Debug, Serialize)]
pub struct EnhanceResponse {
    #[serde(rename = "enhancedAnswer")]
    pub enhanced_answer: String,
}

pub async fn enhance_answer(
    State(state): State<AppState>,
    Json(body): Json<EnhanceRequest>,
) -> Result<Json<EnhanceResponse>, ErrorResponse> {
    let answer = body.answer.trim();
    if answer.is_empty() {
        return Err(bad_request("Answer is required"));
    }

    let enhanced = FieldEnhancer::new(state.generative.clone())
        .enhance(answer, body.question.trim())
        .await
        .map_err(ai_error)?;

    Ok(Json(EnhanceResponse { enhanced_answer: enhanced }))
}

#[derive(Debug, Deserialize)]
pub struct StructuredContentRequest {
    pub answer: String,
    pub question: String,
    pub schema: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct StructuredContentResponse {
    #[serde(rename = "enhancedAnswer")]
    pub enhanced_answer: Value,
}

pub async fn generate_structured_content(
    State(state): State<AppState>,
    Json(body): Json<StructuredContentRequest>,
) -> Result<Json<StructuredContentResponse>, ErrorResponse> {
    let schema = body
        .schema
        .ok_or_else(|| bad_request("Schema is required for structured content generation"))?;
    let shape = Shape::from_json_schema(&schema)
        .ok_or_else(|| bad_request("Schema is not a supported shape"))?;

    let value = StructuredContentGenerator::new(state.generative.clone())
        .generate(&body.question, &body.answer, schema, &shape)
        .await
        .map_err(ai_error)?;

    Ok(Json(StructuredContentResponse { enhanced_answer: value }))
}
