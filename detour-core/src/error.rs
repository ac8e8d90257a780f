//! Error types for detour.

use thiserror::Error;

/// Errors that can occur in detour operations.
#[derive(Error, Debug)]
pub enum DetourError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid candidate: {0}")]
    InvalidCandidate(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Provider '{0}' not found in PATH")]
    ProviderNotInstalled(String),

    #[error("Provider request timed out after {0}s")]
    ProviderTimeout(u64),

    #[error("No calendar provider configured")]
    NoCalendarConfigured,

    #[error("Could not reschedule '{title}': {reason}")]
    RescheduleWrite { title: String, reason: String },

    #[error("Cannot {action} a candidate that is {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for DetourError {
    fn from(e: serde_json::Error) -> Self {
        DetourError::Serialization(e.to_string())
    }
}

/// Result type alias for detour operations.
pub type DetourResult<T> = Result<T, DetourError>;
