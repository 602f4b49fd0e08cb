//! Error types for SteamWrap

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Steam API unavailable ({endpoint}): {reason}")]
    UpstreamUnavailable {
        endpoint: &'static str,
        reason: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("Encode error: {0}")]
    Encode(String),
}

impl ReportError {
    pub fn upstream(endpoint: &'static str, reason: impl ToString) -> Self {
        ReportError::UpstreamUnavailable {
            endpoint,
            reason: reason.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
