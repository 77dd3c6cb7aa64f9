//! OpenAI-compatible chat completion client (OpenAI, LM Studio, vLLM, etc.)

use std::future::Future;
use std::pin::Pin;

use anyhow::Result;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::client::{
    build_http_client, check_error_response, log_response_success, strip_reasoning, AiClient,
    AiClientMetadata,
};
use crate::ai::{error::AiError, model_config::get_model_registry};
use crate::context::DEFAULT_INPUT_SHARE;

/// Default API base when none is configured.
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";

/// Chat request message
#[derive(Serialize, Debug)]
struct Message {
    role: String,
    content: String,
}

/// Chat completion request body
#[derive(Serialize, Debug)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning_effort: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    verbosity: Option<&'static str>,
    stream: bool,
}

/// Chat completion response choice
#[derive(Deserialize, Debug)]
struct Choice {
    message: ResponseMessage,
}

/// Chat completion response message
#[derive(Deserialize, Debug)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Chat completion response
#[derive(Deserialize, Debug)]
struct ChatResponse {
    choices: Vec<Choice>,
    model: Option<String>,
    usage: Option<Usage>,
}

/// Token usage statistics
#[derive(Deserialize, Debug)]
#[allow(dead_code)]
struct Usage {
    prompt_tokens: Option<i32>,
    completion_tokens: Option<i32>,
    total_tokens: Option<i32>,
}

/// OpenAI-compatible API client
pub struct OpenAiClient {
    /// HTTP client for API requests
    client: Client,
    /// Bearer token for authentication
    api_key: String,
    /// Model identifier
    model: String,
    /// Base URL for the API (e.g., "https://api.openai.com")
    base_url: String,
    /// Share of the context window the prompt may occupy
    input_share: f64,
}

impl OpenAiClient {
    /// Create a new client; `base_url` defaults to the public OpenAI endpoint.
    pub fn new(model: String, api_key: String, base_url: Option<String>) -> Result<Self> {
        Ok(Self {
            client: build_http_client()?,
            api_key,
            model,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            input_share: DEFAULT_INPUT_SHARE,
        })
    }

    /// Sets the share of the window reserved for the prompt, which bounds the
    /// completion length requested.
    #[must_use]
    pub fn with_input_share(mut self, input_share: f64) -> Self {
        self.input_share = input_share;
        self
    }

    /// Output limit that keeps prompt plus completion inside the window
    fn get_max_tokens(&self) -> Option<i32> {
        get_model_registry()
            .get_output_token_limit(&self.model, self.input_share)
            .map(|limit| i32::try_from(limit).unwrap_or(i32::MAX))
    }

    /// Build the full API URL
    ///
    /// Accepts bases with or without a trailing `/v1`, as OpenAI SDK style
    /// configuration usually includes it.
    fn get_api_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        let base = base.strip_suffix("/v1").unwrap_or(base);
        let url = format!("{base}/v1/chat/completions");

        debug!(base_url = %self.base_url, full_url = %url, "Constructed chat completions URL");

        url
    }

    /// Determine if this model uses max_completion_tokens instead of max_tokens
    fn uses_completion_tokens(&self) -> bool {
        self.model.starts_with("gpt-5") || self.model.starts_with("o1")
    }

    /// GPT-5 nano accepts low-effort reasoning hints
    fn is_gpt5_nano(&self) -> bool {
        self.model.starts_with("gpt-5-nano")
    }

    fn build_request(&self, system_prompt: &str, user_prompt: &str) -> ChatRequest {
        let mut messages = Vec::new();

        if !system_prompt.is_empty() {
            messages.push(Message {
                role: "system".to_string(),
                content: system_prompt.to_string(),
            });
        }

        messages.push(Message {
            role: "user".to_string(),
            content: user_prompt.to_string(),
        });

        let max_tokens = self.get_max_tokens();
        let (max_tokens, max_completion_tokens) = if self.uses_completion_tokens() {
            (None, max_tokens)
        } else {
            (max_tokens, None)
        };
        let (reasoning_effort, verbosity) = if self.is_gpt5_nano() {
            (Some("low"), Some("low"))
        } else {
            (None, None)
        };

        ChatRequest {
            model: self.model.clone(),
            messages,
            max_tokens,
            max_completion_tokens,
            reasoning_effort,
            verbosity,
            stream: false,
        }
    }
}

impl AiClient for OpenAiClient {
    fn send_request<'a>(
        &'a self,
        system_prompt: &'a str,
        user_prompt: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(async move {
            debug!(
                system_prompt_len = system_prompt.len(),
                user_prompt_len = user_prompt.len(),
                model = %self.model,
                base_url = %self.base_url,
                "Preparing chat completion request"
            );

            let request = self.build_request(system_prompt, user_prompt);

            debug!(
                max_tokens = ?request.max_tokens,
                max_completion_tokens = ?request.max_completion_tokens,
                message_count = request.messages.len(),
                "Built chat completion payload"
            );

            let api_url = self.get_api_url();
            info!(url = %api_url, model = %self.model, "Sending request to completion API");

            let response = self
                .client
                .post(&api_url)
                .header("Content-Type", "application/json")
                .header("Authorization", format!("Bearer {}", self.api_key))
                .json(&request)
                .send()
                .await
                .map_err(|e| AiError::NetworkError(e.to_string()))?;

            let response = check_error_response(response).await?;

            let chat_response: ChatResponse = response
                .json()
                .await
                .map_err(|e| AiError::InvalidResponseFormat(e.to_string()))?;

            debug!(
                choice_count = chat_response.choices.len(),
                model = ?chat_response.model,
                usage = ?chat_response.usage,
                "Received chat completion response"
            );

            let result = chat_response
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.message.content)
                .map(|content| strip_reasoning(&content))
                .ok_or_else(|| {
                    AiError::InvalidResponseFormat("No message content in response".to_string())
                        .into()
                });

            log_response_success("OpenAI-compatible", &result);

            result
        })
    }

    fn get_metadata(&self) -> AiClientMetadata {
        let registry = get_model_registry();

        let provider = if self.base_url.starts_with(DEFAULT_BASE_URL) {
            "OpenAI".to_string()
        } else {
            "OpenAI-compatible".to_string()
        };

        AiClientMetadata {
            provider,
            model: self.model.clone(),
            max_context_length: registry.get_input_context(&self.model),
            max_response_length: registry.get_max_output_tokens(&self.model),
        }
    }
}
