//! Error types for calpeek.

use thiserror::Error;

/// Errors surfaced by the window, settings and provider layers.
#[derive(Error, Debug)]
pub enum CalPeekError {
    /// Credential missing, rejected, or lacking calendar access.
    #[error("Authorization failed: {0}")]
    Authorization(String),

    /// Calendar id unknown or not shared with the credential.
    #[error("Calendar not found: {0}")]
    NotFound(String),

    #[error("Calendar provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// A provider record without a usable date or dateTime.
    #[error("Malformed event record '{id}': {reason}")]
    MalformedRecord { id: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl CalPeekError {
    pub fn malformed(id: &str, reason: impl Into<String>) -> Self {
        CalPeekError::MalformedRecord {
            id: id.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for calpeek operations.
pub type CalPeekResult<T> = Result<T, CalPeekError>;
