//! Completion-service integration: client trait, OpenAI-compatible client,
//! model registry and prompt templates.

pub mod client;
pub mod error;
pub mod model_config;
pub mod openai;
pub mod prompts;

#[cfg(test)]
pub(crate) mod test_utils;

pub use client::{create_default_ai_client, AiClient, AiClientMetadata};
pub use error::AiError;
pub use openai::OpenAiClient;
pub use prompts::{Language, PromptType};
