//! Configuration-related CLI commands.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use crate::ai::model_config::{get_model_registry, ModelRegistry};
use crate::config::{mask_secret, validate_setting, AppConfig, API_KEY, KNOWN_KEYS};
use crate::utils::Settings;

/// Configuration operations.
#[derive(Parser)]
pub struct ConfigCommand {
    /// Configuration subcommand to execute.
    #[command(subcommand)]
    pub command: ConfigSubcommands,
}

/// Configuration subcommands.
#[derive(Subcommand)]
pub enum ConfigSubcommands {
    /// Saves a setting (KEY=VALUE) to the settings file.
    Set(SetCommand),
    /// Shows the effective configuration and where each value comes from.
    Show,
    /// Lists the models in the embedded registry.
    Models,
}

/// Set command options.
#[derive(Parser)]
pub struct SetCommand {
    /// Assignment in the form KEY=VALUE.
    #[arg(value_name = "KEY=VALUE")]
    pub assignment: String,
}

impl ConfigCommand {
    /// Executes the config command.
    pub fn execute(self) -> Result<()> {
        match self.command {
            ConfigSubcommands::Set(set_cmd) => set_cmd.execute(),
            ConfigSubcommands::Show => {
                let settings = Settings::load()?;
                print!("{}", render_settings(&settings, |key| std::env::var(key).ok()));
                // Surface invalid values early
                AppConfig::load()?;
                Ok(())
            }
            ConfigSubcommands::Models => {
                print!("{}", render_models(get_model_registry()));
                Ok(())
            }
        }
    }
}

impl SetCommand {
    /// Executes the set command.
    pub fn execute(self) -> Result<()> {
        let (key, value) = parse_assignment(&self.assignment)?;
        validate_setting(key, value)?;

        let mut settings = Settings::load()?;
        settings.set(key, value);
        settings.save()?;

        let path = Settings::get_settings_path()?;
        println!("✅ Saved {key} to {}", path.display());
        Ok(())
    }
}

fn parse_assignment(assignment: &str) -> Result<(&str, &str)> {
    let (key, value) = assignment
        .split_once('=')
        .context("Expected KEY=VALUE")?;
    Ok((key.trim(), value.trim()))
}

fn render_settings(settings: &Settings, env_lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut text = String::from("⚙️  Configuration\n");
    for key in KNOWN_KEYS {
        let (value, source) = match env_lookup(key) {
            Some(value) => (value, "env"),
            None => match settings.env.get(key) {
                Some(value) => (value.clone(), "settings"),
                None => ("(default)".to_string(), "-"),
            },
        };
        let shown = if key == API_KEY && source != "-" {
            mask_secret(&value)
        } else {
            value
        };
        text.push_str(&format!("  {key:<28} {shown}  [{source}]\n"));
    }
    text
}

fn render_models(registry: &ModelRegistry) -> String {
    let mut text = format!(
        "{:<32} {:<10} {:<9} {:>10} {:>10}  {}\n",
        "MODEL", "PROVIDER", "TIER", "CONTEXT", "OUTPUT", "NOTES"
    );
    for spec in registry.get_all_models() {
        let provider = registry
            .get_provider_config(&spec.provider)
            .map_or(spec.provider.as_str(), |p| p.name.as_str());
        let notes = if registry.is_legacy_model(&spec.api_identifier) {
            "legacy"
        } else {
            ""
        };
        text.push_str(&format!(
            "{:<32} {provider:<10} {:<9} {:>10} {:>10}  {notes}\n",
            spec.api_identifier, spec.tier, spec.input_context, spec.max_output_tokens
        ));
    }
    text
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::config::{MODEL, RESPONSE_LANGUAGE};

    #[test]
    fn assignment_parsing() {
        assert_eq!(
            parse_assignment("OPENAI_API_MODEL = gpt-4o").unwrap(),
            ("OPENAI_API_MODEL", "gpt-4o")
        );
        assert_eq!(
            parse_assignment("OPENAI_API_BASEURL=http://h/?a=b").unwrap(),
            ("OPENAI_API_BASEURL", "http://h/?a=b")
        );
        assert!(parse_assignment("NO_EQUALS").is_err());
    }

    #[test]
    fn settings_render_sources_and_masks_key() {
        let mut settings = Settings::default();
        settings.set(API_KEY, "sk-secret-1234");
        settings.set(MODEL, "gpt-4o");

        let text = render_settings(&settings, |key| {
            (key == RESPONSE_LANGUAGE).then(|| "fr".to_string())
        });

        assert!(text.contains("**********1234  [settings]"));
        assert!(!text.contains("sk-secret"));
        assert!(text.contains("gpt-4o  [settings]"));
        assert!(text.contains("fr  [env]"));
        assert!(text.contains("(default)  [-]"));
    }

    #[test]
    fn models_table_lists_registry() {
        let text = render_models(get_model_registry());
        assert!(text.starts_with("MODEL"));
        assert!(text.contains("gpt-4o-mini"));
        assert!(text.lines().any(|l| l.starts_with("gpt-4 ") && l.ends_with("legacy")));
        assert!(text.contains("TIER"));
        assert!(text
            .lines()
            .any(|l| l.starts_with("gpt-4o-mini ") && l.contains(" fast ")));
    }
}
