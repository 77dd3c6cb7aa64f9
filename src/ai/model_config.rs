//! AI model configuration and specifications
//!
//! Model context windows and output limits are loaded from an embedded YAML
//! table so the context budget and request parameters match each model.

use anyhow::Result;
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Raw contents of the embedded model table.
pub const MODELS_YAML: &str = include_str!("models.yaml");

/// Context window used when neither the model nor its provider is known.
pub const DEFAULT_INPUT_CONTEXT: usize = 8_192;

/// Output limit used when neither the model nor its provider is known.
pub const DEFAULT_MAX_OUTPUT_TOKENS: usize = 4_096;

/// Model specification from YAML configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ModelSpec {
    /// Provider key (e.g., "openai", "local")
    pub provider: String,
    /// Human-readable model name
    pub model: String,
    /// API identifier used for requests (e.g., "gpt-4o-mini")
    pub api_identifier: String,
    /// Maximum number of tokens that can be generated in a single response
    pub max_output_tokens: usize,
    /// Full context window in tokens
    pub input_context: usize,
    /// Performance tier (e.g., "fast", "balanced", "flagship")
    pub tier: String,
    /// Whether this is a legacy model that may be deprecated
    #[serde(default)]
    pub legacy: bool,
}

/// Default fallback configuration for a provider
#[derive(Debug, Deserialize)]
pub struct DefaultConfig {
    /// Default maximum output tokens for unknown models from this provider
    pub max_output_tokens: usize,
    /// Default context window for unknown models from this provider
    pub input_context: usize,
}

/// Provider-specific configuration
#[derive(Debug, Deserialize)]
pub struct ProviderConfig {
    /// Human-readable provider name
    pub name: String,
    /// Base URL for API requests
    pub api_base: String,
    /// Default model identifier to use if none specified
    pub default_model: String,
    /// Default configuration for unknown models
    pub defaults: DefaultConfig,
}

/// Complete model configuration
#[derive(Debug, Deserialize)]
pub struct ModelConfiguration {
    /// List of all available models
    pub models: Vec<ModelSpec>,
    /// Provider-specific configurations
    pub providers: HashMap<String, ProviderConfig>,
}

/// Model registry for looking up specifications
pub struct ModelRegistry {
    config: ModelConfiguration,
    by_identifier: HashMap<String, ModelSpec>,
}

impl ModelRegistry {
    /// Load model registry from embedded YAML
    pub fn load() -> Result<Self> {
        Self::from_yaml(MODELS_YAML)
    }

    /// Load model registry from a YAML document
    pub fn from_yaml(yaml_content: &str) -> Result<Self> {
        let config: ModelConfiguration = serde_yaml::from_str(yaml_content)?;

        let by_identifier = config
            .models
            .iter()
            .map(|model| (model.api_identifier.clone(), model.clone()))
            .collect();

        Ok(Self {
            config,
            by_identifier,
        })
    }

    /// An empty registry; every lookup falls through to the built-in defaults.
    fn empty() -> Self {
        Self {
            config: ModelConfiguration {
                models: Vec::new(),
                providers: HashMap::new(),
            },
            by_identifier: HashMap::new(),
        }
    }

    /// Get model specification by API identifier
    pub fn get_model_spec(&self, api_identifier: &str) -> Option<&ModelSpec> {
        if let Some(spec) = self.by_identifier.get(api_identifier) {
            return Some(spec);
        }

        // Dated snapshots and routed identifiers resolve to their base model
        let core_identifier = extract_core_model_identifier(api_identifier);
        self.by_identifier.get(&core_identifier)
    }

    /// Get max output tokens for a model, with fallback to provider defaults
    pub fn get_max_output_tokens(&self, api_identifier: &str) -> usize {
        if let Some(spec) = self.get_model_spec(api_identifier) {
            return spec.max_output_tokens;
        }

        self.provider_defaults(api_identifier)
            .map_or(DEFAULT_MAX_OUTPUT_TOKENS, |d| d.max_output_tokens)
    }

    /// Get the context window for a model, with fallback to provider defaults
    pub fn get_input_context(&self, api_identifier: &str) -> usize {
        if let Some(spec) = self.get_model_spec(api_identifier) {
            return spec.input_context;
        }

        self.provider_defaults(api_identifier)
            .map_or(DEFAULT_INPUT_CONTEXT, |d| d.input_context)
    }

    /// Largest completion that still fits once `input_share` of the window is
    /// taken by the prompt.
    ///
    /// Returns `None` when the prompt may fill the whole window, in which case
    /// no output limit should be sent.
    pub fn get_output_token_limit(&self, api_identifier: &str, input_share: f64) -> Option<usize> {
        let window = self.get_input_context(api_identifier);
        let prompt_tokens = (window as f64 * input_share).floor() as usize;
        let remaining = window.saturating_sub(prompt_tokens);

        (remaining > 0).then(|| self.get_max_output_tokens(api_identifier).min(remaining))
    }

    fn provider_defaults(&self, api_identifier: &str) -> Option<&DefaultConfig> {
        let provider = infer_provider(api_identifier)?;
        self.config.providers.get(provider).map(|p| &p.defaults)
    }

    /// Check if a model is legacy
    pub fn is_legacy_model(&self, api_identifier: &str) -> bool {
        self.get_model_spec(api_identifier)
            .is_some_and(|spec| spec.legacy)
    }

    /// Get all available models
    pub fn get_all_models(&self) -> &[ModelSpec] {
        &self.config.models
    }

    /// Whether the identifier names a model in the table
    pub fn is_known_model(&self, api_identifier: &str) -> bool {
        self.get_model_spec(api_identifier).is_some()
    }

    /// Get provider configuration
    pub fn get_provider_config(&self, provider: &str) -> Option<&ProviderConfig> {
        self.config.providers.get(provider)
    }
}

/// Infer provider key from model identifier
fn infer_provider(api_identifier: &str) -> Option<&'static str> {
    let id = api_identifier.trim_start_matches("openai/");
    if id.starts_with("gpt-") || id.starts_with("o1") || id.starts_with("o3") {
        Some("openai")
    } else if id.contains("deepseek") || id.contains("llama") {
        Some("local")
    } else {
        None
    }
}

/// Extract core model identifier from routed or dated identifiers
///
/// - "openai/gpt-4o-mini" -> "gpt-4o-mini"
/// - "gpt-4o-mini-2024-07-18" -> "gpt-4o-mini"
fn extract_core_model_identifier(api_identifier: &str) -> String {
    let identifier = api_identifier
        .rsplit_once('/')
        .map_or(api_identifier, |(_, rest)| rest);

    // Drop a trailing -YYYY-MM-DD snapshot date
    let bytes = identifier.as_bytes();
    if bytes.len() > 11 {
        let split = bytes.len() - 11;
        let tail = &bytes[split..];
        let is_date = tail.iter().enumerate().all(|(i, b)| match i {
            0 | 5 | 8 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
        if is_date {
            return identifier[..split].to_string();
        }
    }

    identifier.to_string()
}

/// Global model registry instance
static MODEL_REGISTRY: OnceLock<ModelRegistry> = OnceLock::new();

/// Get the global model registry instance
///
/// A table that fails to parse degrades to an empty registry so lookups fall
/// back to the conservative defaults.
pub fn get_model_registry() -> &'static ModelRegistry {
    MODEL_REGISTRY.get_or_init(|| {
        ModelRegistry::load().unwrap_or_else(|e| {
            tracing::warn!("Failed to load model registry: {e}");
            ModelRegistry::empty()
        })
    })
}
