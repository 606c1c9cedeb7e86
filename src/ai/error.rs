//! Model provider error types

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while talking to the model provider
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("No API key configured (run `notewright config set api-key <KEY>` or set OPENAI_API_KEY)")]
    MissingApiKey,

    #[error("Rate limited by the model provider")]
    RateLimited { retry_after: Option<Duration> },

    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ModelError {
    /// Whether the provider rejected our credentials
    pub fn is_auth(&self) -> bool {
        match self {
            ModelError::MissingApiKey => true,
            ModelError::ApiError { status, .. } => matches!(status, 401 | 403),
            _ => false,
        }
    }

    pub fn is_rate_limit(&self) -> bool {
        matches!(self, ModelError::RateLimited { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_auth() {
        assert!(ModelError::MissingApiKey.is_auth());
        assert!(
            ModelError::ApiError {
                status: 401,
                message: "Incorrect API key".to_string()
            }
            .is_auth()
        );
        assert!(
            !ModelError::ApiError {
                status: 500,
                message: "Server error".to_string()
            }
            .is_auth()
        );
        assert!(!ModelError::InvalidResponse("bad".to_string()).is_auth());
    }

    #[test]
    fn test_is_rate_limit() {
        let err = ModelError::RateLimited {
            retry_after: Some(Duration::from_secs(20)),
        };
        assert!(err.is_rate_limit());
        assert!(!ModelError::MissingApiKey.is_rate_limit());
    }

    #[test]
    fn test_display() {
        let err = ModelError::ApiError {
            status: 404,
            message: "model not found".to_string(),
        };
        assert_eq!(err.to_string(), "API error 404: model not found");
    }
}
