//! Runtime configuration resolved from the environment and the settings file.

use anyhow::{bail, Context, Result};

use crate::ai::model_config::get_model_registry;
use crate::ai::Language;
use crate::context::{
    BudgetCalculator, ContextOptions, DEFAULT_CHARS_PER_TOKEN, DEFAULT_CONCURRENCY,
    DEFAULT_INPUT_SHARE,
};
use crate::utils::settings::Settings;

/// API key for the completion service.
pub const API_KEY: &str = "OPENAI_API_KEY";
/// Base URL of an OpenAI-compatible service.
pub const BASE_URL: &str = "OPENAI_API_BASEURL";
/// Model identifier.
pub const MODEL: &str = "OPENAI_API_MODEL";
/// Response language code.
pub const RESPONSE_LANGUAGE: &str = "OPENAI_RESPONSE_LANGUAGE";
/// Fixed chunk size in characters.
pub const CHUNK_SIZE_CHARS: &str = "OPENAI_CHUNK_SIZE_CHARS";
/// Joined-summary length that triggers a second summarization pass.
pub const COMBINED_SIZE_CHARS: &str = "OPENAI_COMBINED_SIZE_CHARS";
/// Share of the context window used for diffs.
pub const INPUT_SHARE: &str = "ACR_INPUT_SHARE";
/// Files summarized in parallel.
pub const CONCURRENCY: &str = "ACR_CONCURRENCY";

/// Every key `config set` accepts.
pub const KNOWN_KEYS: [&str; 8] = [
    API_KEY,
    BASE_URL,
    MODEL,
    RESPONSE_LANGUAGE,
    CHUNK_SIZE_CHARS,
    COMBINED_SIZE_CHARS,
    INPUT_SHARE,
    CONCURRENCY,
];

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Resolved configuration for one command.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Completion service API key.
    pub api_key: Option<String>,
    /// Service base URL; the public OpenAI endpoint when `None`.
    pub base_url: Option<String>,
    /// Model identifier.
    pub model: String,
    /// Language responses are requested in.
    pub language: Language,
    /// Fixed chunk size overriding the computed budget.
    pub max_chunk_chars: Option<usize>,
    /// Threshold for compressing joined chunk summaries.
    pub max_combined_chars: Option<usize>,
    /// Share of the context window used for diffs.
    pub input_share: f64,
    /// Files summarized in parallel.
    pub concurrency: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            model: DEFAULT_MODEL.to_string(),
            language: Language::default(),
            max_chunk_chars: None,
            max_combined_chars: None,
            input_share: DEFAULT_INPUT_SHARE,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }
}

impl AppConfig {
    /// Loads from the environment, falling back to the settings file.
    pub fn load() -> Result<Self> {
        let settings = Settings::load()?;
        Self::from_lookup(|key| settings.get_env_var(key))
    }

    /// Builds a configuration from an arbitrary key lookup. Blank values
    /// count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let defaults = Self::default();
        let language = match get(RESPONSE_LANGUAGE) {
            Some(code) => code.parse::<Language>()?,
            None => defaults.language,
        };

        Ok(Self {
            api_key: get(API_KEY),
            base_url: get(BASE_URL),
            model: get(MODEL).unwrap_or(defaults.model),
            language,
            max_chunk_chars: parse_positive(CHUNK_SIZE_CHARS, get(CHUNK_SIZE_CHARS))?,
            max_combined_chars: parse_positive(COMBINED_SIZE_CHARS, get(COMBINED_SIZE_CHARS))?,
            input_share: match get(INPUT_SHARE) {
                Some(raw) => parse_share(&raw)?,
                None => defaults.input_share,
            },
            concurrency: parse_positive(CONCURRENCY, get(CONCURRENCY))?
                .unwrap_or(defaults.concurrency),
        })
    }

    /// Context builder options for this configuration.
    pub fn context_options(&self) -> ContextOptions {
        ContextOptions {
            max_chars_per_chunk: self.max_chunk_chars,
            max_combined_chars: self.max_combined_chars,
            concurrency: self.concurrency,
        }
    }

    /// Budget calculator for this configuration.
    pub fn budget_calculator(&self) -> Result<BudgetCalculator> {
        Ok(BudgetCalculator::new(self.input_share, DEFAULT_CHARS_PER_TOKEN)?
            .with_override(self.max_chunk_chars))
    }
}

fn parse_positive(key: &str, raw: Option<String>) -> Result<Option<usize>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    let value: usize = raw
        .parse()
        .with_context(|| format!("Invalid value for {key}: \"{raw}\" is not a whole number"))?;
    if value == 0 {
        bail!("Invalid value for {key}: must be greater than zero");
    }
    Ok(Some(value))
}

fn parse_share(raw: &str) -> Result<f64> {
    let share: f64 = raw
        .parse()
        .with_context(|| format!("Invalid value for {INPUT_SHARE}: \"{raw}\" is not a number"))?;
    if !(share > 0.0 && share <= 1.0) {
        bail!("Invalid value for {INPUT_SHARE}: must be greater than 0 and at most 1");
    }
    Ok(share)
}

/// Checks a `KEY=VALUE` pair before it is written to the settings file.
pub fn validate_setting(key: &str, value: &str) -> Result<()> {
    if !KNOWN_KEYS.contains(&key) {
        bail!(
            "Unknown configuration key \"{key}\". Valid keys: {}",
            KNOWN_KEYS.join(", ")
        );
    }

    let value = value.trim();
    match key {
        MODEL => {
            if !get_model_registry().is_known_model(value) {
                let models: Vec<&str> = get_model_registry()
                    .get_all_models()
                    .iter()
                    .map(|m| m.api_identifier.as_str())
                    .collect();
                bail!(
                    "Unknown model \"{value}\". Available models: {}",
                    models.join(", ")
                );
            }
        }
        RESPONSE_LANGUAGE => {
            value.parse::<Language>()?;
        }
        CHUNK_SIZE_CHARS | COMBINED_SIZE_CHARS | CONCURRENCY => {
            parse_positive(key, Some(value.to_string()))?;
        }
        INPUT_SHARE => {
            parse_share(value)?;
        }
        API_KEY | BASE_URL if value.is_empty() => bail!("{key} cannot be empty"),
        _ => {}
    }

    Ok(())
}

/// Masks a secret for display, keeping the last four characters.
pub fn mask_secret(secret: &str) -> String {
    let count = secret.chars().count();
    if count <= 4 {
        return "*".repeat(count);
    }
    let tail: String = secret.chars().skip(count - 4).collect();
    format!("{}{tail}", "*".repeat(count - 4))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_configured() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.language, Language::EnUs);
        assert_eq!(config.concurrency, 4);
    }

    #[test]
    fn reads_every_key() {
        let config = AppConfig::from_lookup(lookup(&[
            (API_KEY, "sk-abc"),
            (BASE_URL, "http://localhost:1234"),
            (MODEL, "gpt-4o"),
            (RESPONSE_LANGUAGE, "pt-BR"),
            (CHUNK_SIZE_CHARS, "5000"),
            (COMBINED_SIZE_CHARS, "7000"),
            (INPUT_SHARE, "0.25"),
            (CONCURRENCY, "2"),
        ]))
        .unwrap();

        assert_eq!(config.api_key.as_deref(), Some("sk-abc"));
        assert_eq!(config.base_url.as_deref(), Some("http://localhost:1234"));
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.language, Language::PtBr);
        assert_eq!(config.max_chunk_chars, Some(5000));
        assert_eq!(config.max_combined_chars, Some(7000));
        assert!((config.input_share - 0.25).abs() < f64::EPSILON);
        assert_eq!(config.concurrency, 2);

        let options = config.context_options();
        assert_eq!(options.max_chars_per_chunk, Some(5000));
        assert_eq!(options.concurrency, 2);
        assert_eq!(config.budget_calculator().unwrap().compute_max_chunk_chars("gpt-4o"), 5000);
    }

    #[test]
    fn blank_values_count_as_unset() {
        let config =
            AppConfig::from_lookup(lookup(&[(API_KEY, "  "), (CHUNK_SIZE_CHARS, "")])).unwrap();
        assert_eq!(config.api_key, None);
        assert_eq!(config.max_chunk_chars, None);
    }

    #[test]
    fn invalid_values_are_errors() {
        assert!(AppConfig::from_lookup(lookup(&[(CHUNK_SIZE_CHARS, "abc")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[(CONCURRENCY, "0")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[(INPUT_SHARE, "1.5")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[(RESPONSE_LANGUAGE, "klingon")])).is_err());
    }

    #[test]
    fn validate_setting_checks_keys_and_values() {
        assert!(validate_setting(MODEL, "gpt-4o-mini").is_ok());
        assert!(validate_setting(MODEL, "made-up-model").is_err());
        assert!(validate_setting(RESPONSE_LANGUAGE, "fr").is_ok());
        assert!(validate_setting(RESPONSE_LANGUAGE, "xx").is_err());
        assert!(validate_setting(CHUNK_SIZE_CHARS, "-1").is_err());
        assert!(validate_setting(INPUT_SHARE, "0.75").is_ok());
        assert!(validate_setting(API_KEY, "").is_err());
        let err = validate_setting("NOT_A_KEY", "x").unwrap_err().to_string();
        assert!(err.contains("Unknown configuration key"));
    }

    #[test]
    fn secrets_are_masked() {
        assert_eq!(mask_secret("sk-1234567890"), "*********7890");
        assert_eq!(mask_secret("abc"), "***");
    }
}
