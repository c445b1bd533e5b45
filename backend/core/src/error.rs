use thiserror::Error;

use crate::form::FieldError;

/// Top-level error type for the TripForge service.
#[derive(Debug, Error)]
pub enum TripError {
    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error("form is locked and can no longer be edited")]
    FormLocked,

    #[error("form is invalid: {}", describe_fields(.0))]
    InvalidForm(Vec<FieldError>),

    #[error("itinerary generation failed: {0}")]
    GenerationFailed(String),

    #[error("no itinerary has been generated yet")]
    NoItinerary,

    #[error("itinerary version {0} not found")]
    VersionNotFound(u32),

    #[error("itinerary version conflict: expected {expected}, got {got}")]
    VersionConflict { expected: u32, got: u32 },

    #[error("LLM provider error ({provider}): {message}")]
    LlmError { provider: String, message: String },

    #[error("configuration error: {0}")]
    ConfigError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn describe_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}
