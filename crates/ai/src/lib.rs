//! Provider boundary for Guidepost's AI-backed features.
//!
//! Every generative call in the system funnels through this crate:
//!
//! - `client` - the Gemini-style text generation client behind the
//!   [`GenerativeClient`] trait
//! - `structured` - schema-constrained generation with shape validation,
//!   the single choke point for structured output
//! - `enhance` - free-text answer polishing
//! - `image` - portrait generation jobs with a bounded poll loop
//! - `prompts` - the prompt templates the features above compose
//!
//! The provider is never trusted: empty text is a failure before parsing,
//! and structured output is validated against an expected shape before any
//! caller sees it.

pub mod client;
pub mod enhance;
pub mod error;
pub mod image;
pub mod prompts;
pub mod structured;

pub use client::{GeminiClient, GenerationRequest, GenerativeClient};
pub use enhance::FieldEnhancer;
pub use error::AiError;
pub use image::{await_portrait_url, ImageJob, ImageJobClient, JobStatus, PollPolicy, ReplicateClient};
pub use structured::StructuredContentGenerator;
