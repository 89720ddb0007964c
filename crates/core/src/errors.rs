use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("survey step {step} is out of range (survey has {len} steps)")]
    StepOutOfRange { step: usize, len: usize },
    #[error("answer for `{field}` must not be empty")]
    EmptyAnswer { field: &'static str },
    #[error("survey is already complete")]
    SurveyComplete,
    #[error("domain invariant violation: {0}")]
    InvariantViolation(String),
}
