//! Preflight validation checks for early failure detection
//!
//! Commands call these before opening network connections so missing
//! repositories or credentials fail fast with a clear message.

use anyhow::{bail, Context, Result};

use crate::config::{AppConfig, API_KEY};

/// Result of AI credential validation
#[derive(Debug)]
pub struct AiCredentialInfo {
    /// Service that will receive requests
    pub provider: String,
    /// The model that will be used
    pub model: String,
}

/// Validate AI credentials are available before processing
///
/// Only checks configuration; no request is sent.
pub fn check_ai_credentials(config: &AppConfig) -> Result<AiCredentialInfo> {
    if config.api_key.is_none() {
        bail!(
            "API key not configured.\n\
             Set the {API_KEY} environment variable or run: acr config set {API_KEY}=<key>"
        );
    }

    let provider = match &config.base_url {
        Some(url) => format!("OpenAI-compatible ({url})"),
        None => "OpenAI".to_string(),
    };

    Ok(AiCredentialInfo {
        provider,
        model: config.model.clone(),
    })
}

/// Validate we're in a valid git repository
///
/// This is a lightweight check that opens the repository without
/// loading any commit data.
pub fn check_git_repository() -> Result<()> {
    crate::git::GitRepository::open().context(
        "Not in a git repository. Please run this command from within a git repository.",
    )?;
    Ok(())
}

/// Combined preflight check for AI commands
///
/// Validates:
/// - Git repository access
/// - AI credentials
pub fn check_ai_command_prerequisites(config: &AppConfig) -> Result<AiCredentialInfo> {
    check_git_repository()?;
    check_ai_credentials(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn missing_key_is_reported_with_hint() {
        let err = check_ai_credentials(&AppConfig::default()).unwrap_err().to_string();
        assert!(err.contains("API key not configured"));
        assert!(err.contains("acr config set OPENAI_API_KEY"));
    }

    #[test]
    fn provider_reflects_base_url() {
        let config = AppConfig {
            api_key: Some("sk-test".to_string()),
            ..AppConfig::default()
        };
        let info = check_ai_credentials(&config).unwrap();
        assert_eq!(info.provider, "OpenAI");
        assert_eq!(info.model, "gpt-4o-mini");

        let local = AppConfig {
            api_key: Some("local".to_string()),
            base_url: Some("http://localhost:1234".to_string()),
            ..AppConfig::default()
        };
        assert_eq!(
            check_ai_credentials(&local).unwrap().provider,
            "OpenAI-compatible (http://localhost:1234)"
        );
    }
}
