//! Error Types for Crypto Briefing

use agent_core::AgentError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, BriefingError>;

#[derive(Error, Debug)]
pub enum BriefingError {
    #[error("Coin '{0}' was not found. Check the CoinGecko id.")]
    CoinNotFound(String),

    #[error("Failed to fetch {what}: {reason}")]
    Fetch { what: String, reason: String },

    #[error("{0} timed out")]
    Timeout(String),

    #[error("The server has no {0} configured.")]
    MissingApiKey(&'static str),

    #[error("{0}")]
    InvalidArgument(String),

    #[error("The messaging channel session is not available: {0}")]
    SessionNotReady(String),

    #[error("Channel error: {0}")]
    Channel(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BriefingError {
    pub fn fetch(what: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        BriefingError::Fetch {
            what: what.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<BriefingError> for AgentError {
    fn from(err: BriefingError) -> Self {
        match err {
            BriefingError::InvalidArgument(_) | BriefingError::MissingApiKey(_) => {
                AgentError::ToolValidation(err.to_string())
            }
            BriefingError::Config(msg) => AgentError::Config(msg),
            other => AgentError::ToolExecution(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_keep_readable_messages() {
        let err: AgentError = BriefingError::CoinNotFound("__unknown__".into()).into();
        assert!(matches!(err, AgentError::ToolExecution(_)));
        assert_eq!(err.user_message(), "Coin '__unknown__' was not found. Check the CoinGecko id.");

        let err: AgentError = BriefingError::InvalidArgument("'hours' must be between 1 and 72".into()).into();
        assert!(matches!(err, AgentError::ToolValidation(_)));
    }
}
