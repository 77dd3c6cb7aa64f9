//! Single-call summarization through the completion service.

use anyhow::Result;
use tracing::{info, warn};

use crate::ai::prompts::generate_summary_prompt;
use crate::ai::{AiClient, Language};

/// Reduces a blob of text to a concise technical summary.
pub struct Summarizer {
    client: Box<dyn AiClient>,
    language: Language,
}

impl Summarizer {
    /// Summarizer answering in `language`.
    pub fn new(client: Box<dyn AiClient>, language: Language) -> Self {
        Self { client, language }
    }

    /// Response language requested from the model.
    pub fn language(&self) -> Language {
        self.language
    }

    /// Model identifier of the underlying client.
    pub fn model(&self) -> String {
        self.client.get_metadata().model
    }

    /// The underlying client, for the final completion request.
    pub fn client(&self) -> &dyn AiClient {
        self.client.as_ref()
    }

    /// Sends one summarization request. Errors are returned unchanged.
    pub async fn summarize(&self, text: &str) -> Result<String> {
        let prompt = generate_summary_prompt(self.language, text);
        info!(
            language = self.language.code(),
            prompt_len = prompt.len(),
            "Sending summarization request"
        );

        match self.client.send_request("", &prompt).await {
            Ok(summary) => {
                info!(summary_len = summary.len(), "Summarization completed");
                Ok(summary)
            }
            Err(e) => {
                warn!(error = %e, "Summarization request failed");
                Err(e)
            }
        }
    }
}
