//! Error types for nowcal.

use thiserror::Error;

/// Errors that can occur in nowcal operations.
#[derive(Error, Debug)]
pub enum NowcalError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to fetch '{url}': {reason}")]
    Transport { url: String, reason: String },

    #[error("ICS parse error: {0}")]
    IcsParse(String),

    #[error("Malformed event '{uid}': {reason}")]
    MalformedEvent { uid: String, reason: String },

    #[error("Calendar source not found: {0}")]
    SourceNotFound(String),

    #[error("A calendar source named '{0}' already exists")]
    DuplicateSource(String),

    #[error("Invalid calendar URL: {0}")]
    InvalidUrl(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl NowcalError {
    pub(crate) fn malformed(uid: &str, reason: impl Into<String>) -> Self {
        NowcalError::MalformedEvent {
            uid: uid.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn transport(url: &str, reason: impl ToString) -> Self {
        NowcalError::Transport {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Result type alias for nowcal operations.
pub type NowcalResult<T> = Result<T, NowcalError>;
