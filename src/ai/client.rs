//! AI client trait and metadata definitions.

use std::future::Future;
use std::pin::Pin;
use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{Context, Result};
use regex::Regex;
use reqwest::{Client, StatusCode};

use crate::ai::error::AiError;
use crate::ai::model_config::get_model_registry;
use crate::ai::openai::OpenAiClient;
use crate::config::AppConfig;

/// HTTP request timeout for completion calls.
///
/// A timeout surfaces as [`AiError::NetworkError`] and is handled like any
/// other gateway failure.
pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(300);

/// Metadata about an AI client implementation.
#[derive(Clone, Debug)]
pub struct AiClientMetadata {
    /// Service provider name.
    pub provider: String,
    /// Model identifier.
    pub model: String,
    /// Maximum context length supported, in tokens.
    pub max_context_length: usize,
    /// Maximum response length supported, in tokens.
    pub max_response_length: usize,
}

/// Trait for completion service clients.
pub trait AiClient: Send + Sync {
    /// Sends a request to the AI service and returns the response text.
    fn send_request<'a>(
        &'a self,
        system_prompt: &'a str,
        user_prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;

    /// Returns metadata about the AI client implementation.
    fn get_metadata(&self) -> AiClientMetadata;
}

/// Creates the configured completion client.
pub fn create_default_ai_client(config: &AppConfig) -> Result<Box<dyn AiClient>> {
    let api_key = config.api_key.clone().ok_or(AiError::ApiKeyNotFound)?;

    let registry = get_model_registry();
    if registry.get_model_spec(&config.model).is_none() {
        tracing::warn!(
            model = %config.model,
            "Model not found in registry, using default context limits"
        );
    } else if registry.is_legacy_model(&config.model) {
        tracing::warn!(model = %config.model, "Model is marked legacy and may be retired");
    }

    let client = OpenAiClient::new(config.model.clone(), api_key, config.base_url.clone())?
        .with_input_share(config.input_share);
    Ok(Box::new(client))
}

// ── Shared helpers for AI client implementations ────────────────────

/// Builds an HTTP client with the standard request timeout.
pub(crate) fn build_http_client() -> Result<Client> {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .context("Failed to build HTTP client")
}

/// Checks an HTTP response for error status and returns a structured error
/// if non-success.
///
/// 401 maps to [`AiError::AuthenticationFailed`] so the command layer can
/// refresh credentials; 429 maps to [`AiError::RateLimitExceeded`].
pub(crate) async fn check_error_response(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let error_text = response.text().await.unwrap_or_else(|e| {
        tracing::debug!("Failed to read error response body: {e}");
        String::new()
    });
    let err = match status {
        StatusCode::UNAUTHORIZED => {
            AiError::AuthenticationFailed(format!("HTTP {status}: {error_text}"))
        }
        StatusCode::TOO_MANY_REQUESTS => AiError::RateLimitExceeded,
        _ => AiError::ApiRequestFailed(format!("HTTP {status}: {error_text}")),
    };
    Err(err.into())
}

/// Logs successful text extraction from an AI API response.
pub(crate) fn log_response_success(provider: &str, result: &Result<String>) {
    if let Ok(text) = result {
        tracing::debug!(
            response_len = text.len(),
            "Successfully extracted text content from {} API response",
            provider
        );
        tracing::debug!(
            response_content = %text,
            "{} API response content",
            provider
        );
    }
}

/// Removes `<think>…</think>` blocks emitted by reasoning models and trims
/// the remainder.
pub(crate) fn strip_reasoning(text: &str) -> String {
    static THINK_BLOCK: OnceLock<Option<Regex>> = OnceLock::new();
    let pattern = THINK_BLOCK.get_or_init(|| Regex::new(r"(?s)<think>.*?</think>").ok());
    match pattern {
        Some(re) => re.replace_all(text, "").trim().to_string(),
        None => text.trim().to_string(),
    }
}
