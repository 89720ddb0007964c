//! Summary synthesis: composed answer sets in, persisted summaries out.
//!
//! Loads the tenant's answer set plus optional company name, runs one
//! schema-constrained generation, and persists the result. Failures
//! propagate untouched so callers can fall back to re-showing the survey.
//! The persona variant additionally drives the portrait pipeline, falling
//! back to a placeholder avatar at any failed step.

use guidepost_ai::{await_portrait_url, prompts, AiError, StructuredContentGenerator};
use guidepost_core::persona::PersonaProfile;
use guidepost_core::summary::{NarrativeSummary, SectionedSummary, SummaryDocument};
use guidepost_db::{
    CompanyProfileRepository, PersonaRecord, PersonaRepository, RepositoryError,
    TargetMarketRepository, TenantRepository,
};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::bootstrap::AppState;
use crate::storage::placeholder_avatar_url;

#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("{0}")]
    NotFound(&'static str),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Ai(#[from] AiError),
}

fn generator(state: &AppState) -> StructuredContentGenerator {
    StructuredContentGenerator::new(state.generative.clone())
}

/// The company name is optional context; a failed lookup never blocks
/// synthesis.
async fn company_name(state: &AppState, location_id: &str) -> Option<String> {
    match TenantRepository::new(state.db_pool.clone()).company_name(location_id).await {
        Ok(name) => name,
        Err(error) => {
            warn!(
                event_name = "synthesis.company_name_lookup_failed",
                location_id = %location_id,
                error = %error,
                "continuing without company name"
            );
            None
        }
    }
}

/// Synthesize and persist the four-paragraph company summary, returning
/// the blank-line-joined text.
pub async fn synthesize_company_summary(
    state: &AppState,
    location_id: &str,
) -> Result<String, SynthesisError> {
    let repo = CompanyProfileRepository::new(state.db_pool.clone());
    let record = repo
        .find_by_location(location_id)
        .await?
        .ok_or(SynthesisError::NotFound("No company data found"))?;

    let name = company_name(state, location_id).await;
    let instruction = prompts::company_summary_instruction(name.as_deref());
    let input = prompts::company_answer_block(name.as_deref(), &record.answers);

    let value = generator(state)
        .generate(&instruction, &input, NarrativeSummary::response_schema(), &NarrativeSummary::shape())
        .await?;
    let narrative = NarrativeSummary::from_response(&value).map_err(AiError::Shape)?;

    let summary = SummaryDocument::Paragraphs(narrative).stored_form();
    repo.set_summary(location_id, Some(&summary)).await?;

    info!(
        event_name = "synthesis.company_summary_saved",
        location_id = %location_id,
        "company summary synthesized and persisted"
    );
    Ok(summary)
}

/// Synthesize and persist the sectioned target-market summary.
pub async fn synthesize_market_summary(
    state: &AppState,
    location_id: &str,
) -> Result<SectionedSummary, SynthesisError> {
    let repo = TargetMarketRepository::new(state.db_pool.clone());
    let record = repo
        .find_by_location(location_id)
        .await?
        .ok_or(SynthesisError::NotFound("No target market data found"))?;

    let name = company_name(state, location_id).await;
    let instruction = prompts::market_summary_instruction(name.as_deref());
    let input = prompts::market_answer_block(name.as_deref(), &record.answers);

    let value = generator(state)
        .generate(&instruction, &input, SectionedSummary::response_schema(), &SectionedSummary::shape())
        .await?;
    let document = SectionedSummary::from_response(&value).map_err(AiError::Shape)?;

    repo.set_summary(location_id, Some(&SummaryDocument::Sections(document.clone()).stored_form()))
        .await?;

    info!(
        event_name = "synthesis.market_summary_saved",
        location_id = %location_id,
        "target market summary synthesized and persisted"
    );
    Ok(document)
}

/// Synthesize a persona from the market summary, generate its portrait,
/// and upsert the row. The portrait degrades to a placeholder avatar; the
/// upsert itself never depends on the image pipeline succeeding.
pub async fn synthesize_persona(
    state: &AppState,
    location_id: &str,
    market_summary: &Value,
) -> Result<PersonaRecord, SynthesisError> {
    let prompt = prompts::persona_instruction(&market_summary.to_string());
    let value = generator(state)
        .generate_with_prompt(prompt, PersonaProfile::response_schema(), &PersonaProfile::response_shape())
        .await?;
    let profile = PersonaProfile::from_response(&value).map_err(AiError::Shape)?;

    let image_url = portrait_or_placeholder(state, location_id, &profile).await;

    let record =
        PersonaRepository::new(state.db_pool.clone()).upsert(location_id, &profile, &image_url).await?;

    info!(
        event_name = "synthesis.persona_saved",
        location_id = %location_id,
        persona_name = %record.profile.name,
        "target customer persona persisted"
    );
    Ok(record)
}

async fn portrait_or_placeholder(
    state: &AppState,
    location_id: &str,
    profile: &PersonaProfile,
) -> String {
    let placeholder = placeholder_avatar_url(&profile.name);

    let (Some(image), Some(blobs)) = (state.image.as_ref(), state.blobs.as_ref()) else {
        return placeholder;
    };

    let prompt = prompts::portrait_prompt(&profile.name, profile.age, &profile.position);
    let source_url = match await_portrait_url(image.as_ref(), &prompt, &state.poll).await {
        Ok(url) => url,
        Err(error) => {
            warn!(
                event_name = "synthesis.portrait_generation_failed",
                location_id = %location_id,
                error = %error,
                "falling back to placeholder avatar"
            );
            return placeholder;
        }
    };

    let bytes = match download_image(state, &source_url).await {
        Ok(bytes) => bytes,
        Err(error) => {
            warn!(
                event_name = "synthesis.portrait_download_failed",
                location_id = %location_id,
                error = %error,
                "falling back to placeholder avatar"
            );
            return placeholder;
        }
    };

    let path = format!("{location_id}/target-customer-{}.jpg", Uuid::new_v4());
    match blobs.upload(&path, bytes, "image/jpeg").await {
        Ok(public_url) => public_url,
        Err(error) => {
            warn!(
                event_name = "synthesis.portrait_upload_failed",
                location_id = %location_id,
                error = %error,
                "falling back to placeholder avatar"
            );
            placeholder
        }
    }
}

async fn download_image(state: &AppState, url: &str) -> Result<Vec<u8>, reqwest::Error> {
    let response = state.http.get(url).send().await?.error_for_status()?;
    Ok(response.bytes().await?.to_vec())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use guidepost_ai::{AiError, ImageJob, ImageJobClient, JobStatus};
    use guidepost_core::survey::{CompanyAnswers, MarketAnswers};
    use guidepost_db::{
        CompanyProfileRepository, PersonaRepository, TargetMarketRepository, TenantRepository,
    };
    use serde_json::json;

    use super::{synthesize_company_summary, synthesize_market_summary, synthesize_persona, SynthesisError};
    use crate::api::testing::{memory_pool, state_with, ScriptedGenerative};

    fn narrative_response() -> String {
        json!({
            "overview": "A",
            "targetMarket": "B",
            "marketPosition": "C",
            "brandCommunication": "D"
        })
        .to_string()
    }

    fn sections_response() -> String {
        json!({
            "sections": [{
                "title": "Ideal Customer Profile",
                "content": [{ "type": "paragraph", "text": "Urban professionals." }]
            }]
        })
        .to_string()
    }

    fn persona_response() -> String {
        json!({
            "profile": {
                "name": "Maya Chen",
                "age": 34,
                "position": "Operations Director",
                "company_size": "50-200 employees",
                "industry": "Logistics",
                "goals": ["automate reporting"],
                "challenges": ["legacy tooling"],
                "interests": ["trail running"],
                "preferred_channels": ["LinkedIn"],
                "decision_factors": ["ROI"],
                "budget_range": "$10k-$50k",
                "profile_description": "Pragmatic and data-driven."
            }
        })
        .to_string()
    }

    #[tokio::test]
    async fn company_summary_composes_and_persists_the_paragraphs() {
        let pool = memory_pool().await;
        let state = state_with(pool.clone(), ScriptedGenerative::replying(&narrative_response()));

        TenantRepository::new(pool.clone()).get_or_create("loc1", None).await.expect("tenant");
        let repo = CompanyProfileRepository::new(pool.clone());
        repo.upsert_answers(
            "loc1",
            &CompanyAnswers {
                business_type: Some("Anvil maker".to_string()),
                ..CompanyAnswers::default()
            },
        )
        .await
        .expect("answers");

        let summary = synthesize_company_summary(&state, "loc1").await.expect("synthesis");
        assert_eq!(summary, "A\n\nB\n\nC\n\nD");

        let stored = repo.find_by_location("loc1").await.expect("query").expect("row");
        assert_eq!(stored.summary.as_deref(), Some("A\n\nB\n\nC\n\nD"));
    }

    #[tokio::test]
    async fn company_summary_without_answers_is_not_found() {
        let pool = memory_pool().await;
        let state = state_with(pool, ScriptedGenerative::replying(&narrative_response()));

        let error = synthesize_company_summary(&state, "loc1").await.expect_err("no answer set");
        assert!(matches!(error, SynthesisError::NotFound(_)));
    }

    #[tokio::test]
    async fn malformed_generator_output_propagates_and_persists_nothing() {
        let pool = memory_pool().await;
        let state = state_with(pool.clone(), ScriptedGenerative::replying("not json at all"));

        let repo = CompanyProfileRepository::new(pool.clone());
        repo.upsert_answers("loc1", &CompanyAnswers::default()).await.expect("answers");

        let error = synthesize_company_summary(&state, "loc1").await.expect_err("schema failure");
        assert!(matches!(error, SynthesisError::Ai(AiError::MalformedJson(_))));

        let stored = repo.find_by_location("loc1").await.expect("query").expect("row");
        assert_eq!(stored.summary, None, "failed synthesis must not persist a summary");
    }

    #[tokio::test]
    async fn market_summary_persists_canonical_json() {
        let pool = memory_pool().await;
        let state = state_with(pool.clone(), ScriptedGenerative::replying(&sections_response()));

        let repo = TargetMarketRepository::new(pool.clone());
        repo.upsert_answers(
            "loc1",
            &MarketAnswers { demographics: Some("x".to_string()), ..MarketAnswers::default() },
        )
        .await
        .expect("answers");

        let document = synthesize_market_summary(&state, "loc1").await.expect("synthesis");
        assert_eq!(document.sections.len(), 1);

        let stored = repo.find_by_location("loc1").await.expect("query").expect("row");
        let decoded = guidepost_core::summary::SectionedSummary::from_stored_json(
            stored.summary.as_deref().expect("summary stored"),
        )
        .expect("stored summary re-validates");
        assert_eq!(decoded, document);
    }

    #[tokio::test]
    async fn persona_without_image_pipeline_gets_the_placeholder() {
        let pool = memory_pool().await;
        let state = state_with(pool.clone(), ScriptedGenerative::replying(&persona_response()));

        let record = synthesize_persona(&state, "loc1", &json!({"sections": []}))
            .await
            .expect("persona synthesis");

        assert_eq!(record.profile.name, "Maya Chen");
        let image_url = record.profile_image_url.expect("image url set");
        assert!(image_url.starts_with("https://ui-avatars.com/api/"));
    }

    /// An image job that never leaves `processing`.
    struct StuckImageClient;

    #[async_trait]
    impl ImageJobClient for StuckImageClient {
        async fn create_portrait_job(&self, _prompt: &str) -> Result<ImageJob, AiError> {
            Ok(ImageJob {
                id: "job-stuck".to_string(),
                status: JobStatus::Starting,
                output: None,
                error: None,
            })
        }

        async fn job_status(&self, job_id: &str) -> Result<ImageJob, AiError> {
            Ok(ImageJob {
                id: job_id.to_string(),
                status: JobStatus::Processing,
                output: None,
                error: None,
            })
        }
    }

    #[tokio::test]
    async fn stuck_image_job_falls_back_and_upsert_still_succeeds() {
        let pool = memory_pool().await;
        let mut state = state_with(pool.clone(), ScriptedGenerative::replying(&persona_response()));
        state.image = Some(Arc::new(StuckImageClient));
        state.blobs = Some(Arc::new(
            crate::storage::BlobStore::from_config(&guidepost_core::config::StorageConfig {
                base_url: "http://127.0.0.1:9".to_string(),
                bucket: "profile-images".to_string(),
                api_key: Some("key".to_string().into()),
            })
            .expect("store"),
        ));

        let record = synthesize_persona(&state, "loc1", &json!({"sections": []}))
            .await
            .expect("persona persists despite image timeout");

        let image_url = record.profile_image_url.expect("image url set");
        assert!(image_url.starts_with("https://ui-avatars.com/api/"));

        let stored = PersonaRepository::new(pool)
            .latest_by_location("loc1")
            .await
            .expect("query")
            .expect("row persisted");
        assert_eq!(stored.profile.name, "Maya Chen");
    }
}
