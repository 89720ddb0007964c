//! Domain core for the Guidepost onboarding backend.
//!
//! Everything in this crate is pure: survey definitions and the session
//! state machine, summary document types, the response shape validator,
//! and configuration loading. Persistence and provider calls live in the
//! `guidepost-db` and `guidepost-ai` crates.

pub mod config;
pub mod errors;
pub mod persona;
pub mod shape;
pub mod summary;
pub mod survey;

pub use config::{ConfigError, GuidepostConfig, LoadOptions};
pub use errors::DomainError;
pub use persona::PersonaProfile;
pub use shape::{Shape, ShapeViolation};
pub use summary::{BlockKind, ContentBlock, NarrativeSummary, Section, SectionedSummary, SummaryDocument};
pub use survey::{
    AnswerSheet, AnswerValue, CompanyAnswers, MarketAnswers, SessionState, SurveyDefinition,
    SurveyKind, SurveySession, SurveyStep, ValueKind,
};
