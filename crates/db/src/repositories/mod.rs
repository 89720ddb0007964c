//! Tenant-keyed repositories.
//!
//! One row per tenant per entity kind, reached by `location_id`. Not-found
//! is a normal outcome (`Ok(None)`), distinct from a backend failure.
//! Every write passes through the sanitization helpers below: strings are
//! trimmed, and empty or absent values persist as NULL, never as "".

use thiserror::Error;

mod chat;
mod company;
mod market;
mod persona;
mod tenant;

pub use chat::{ChatHistoryPage, ChatHistoryRepository, ChatMessageRecord, ChatRole};
pub use company::{CompanyProfileRecord, CompanyProfileRepository};
pub use market::{TargetMarketRecord, TargetMarketRepository};
pub use persona::{PersonaRecord, PersonaRepository};
pub use tenant::{TenantRecord, TenantRepository};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

pub(crate) fn decode_err(error: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::Decode(error.to_string())
}

/// Trim a text field; empty or absent becomes NULL.
pub(crate) fn clean_text(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|text| !text.is_empty()).map(str::to_string)
}

/// Trim list items and drop empties; an empty or absent list becomes NULL.
pub(crate) fn clean_list(value: Option<&[String]>) -> Option<Vec<String>> {
    let items: Vec<String> = value?
        .iter()
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect();
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

/// Serialize a cleaned list as the stored JSON text, or NULL.
pub(crate) fn encode_list(value: Option<&[String]>) -> Option<String> {
    clean_list(value).map(|items| serde_json::to_string(&items).unwrap_or_else(|_| "[]".into()))
}

/// Decode a stored JSON list column.
pub(crate) fn decode_list(raw: Option<String>) -> Result<Option<Vec<String>>, RepositoryError> {
    raw.map(|text| serde_json::from_str::<Vec<String>>(&text).map_err(decode_err)).transpose()
}
