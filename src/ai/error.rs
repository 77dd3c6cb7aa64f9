//! Completion-service error handling.

use thiserror::Error;

/// Errors raised while talking to the completion service.
#[derive(Error, Debug)]
pub enum AiError {
    /// API key not found in the environment or settings file.
    #[error(
        "OpenAI API key not configured. Use 'acr config set OPENAI_API_KEY=<key>' or set the OPENAI_API_KEY environment variable"
    )]
    ApiKeyNotFound,

    /// The service rejected the credentials (HTTP 401).
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// API request failed with a non-success status.
    #[error("API request failed: {0}")]
    ApiRequestFailed(String),

    /// Invalid response format from the API.
    #[error("Invalid response format from API: {0}")]
    InvalidResponseFormat(String),

    /// Rate limit exceeded (HTTP 429).
    #[error("Rate limit exceeded. Please try again later")]
    RateLimitExceeded,

    /// Network connectivity error, including timeouts.
    #[error("Network error: {0}")]
    NetworkError(String),
}

impl AiError {
    /// Returns `true` when the error chain carries an authentication failure.
    pub fn is_authentication_failure(err: &anyhow::Error) -> bool {
        err.chain().any(|cause| {
            matches!(
                cause.downcast_ref::<Self>(),
                Some(Self::AuthenticationFailed(_))
            )
        })
    }
}
