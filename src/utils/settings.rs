//! Settings and configuration utilities.
//!
//! Settings live in `<config dir>/ai-commit-review/settings.json` and act as a
//! fallback for environment variables.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Directory name under the platform configuration directory.
pub const SETTINGS_DIR: &str = "ai-commit-review";

/// Settings loaded from the user's configuration directory.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Settings {
    /// Environment variable overrides.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl Settings {
    /// Loads settings from the default location.
    pub fn load() -> Result<Self> {
        let settings_path = Self::get_settings_path()?;
        Self::load_from_path(&settings_path)
    }

    /// Loads settings from a specific path.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        // A missing file means nothing has been configured yet
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

        serde_json::from_str::<Self>(&content)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))
    }

    /// Writes settings to the default location.
    pub fn save(&self) -> Result<()> {
        let settings_path = Self::get_settings_path()?;
        self.save_to_path(&settings_path)
    }

    /// Writes settings to a specific path, creating parent directories.
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create settings directory: {}", parent.display())
            })?;
        }

        let content =
            serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        fs::write(path, content)
            .with_context(|| format!("Failed to write settings file: {}", path.display()))
    }

    /// Returns the default settings path.
    pub fn get_settings_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Failed to determine config directory")?;

        Ok(config_dir.join(SETTINGS_DIR).join("settings.json"))
    }

    /// Stores a value, replacing any previous one.
    pub fn set(&mut self, key: &str, value: &str) {
        self.env.insert(key.to_string(), value.to_string());
    }

    /// Returns an environment variable with fallback to settings.
    pub fn get_env_var(&self, key: &str) -> Option<String> {
        match env::var(key) {
            Ok(value) => Some(value),
            Err(_) => self.env.get(key).cloned(),
        }
    }
}

/// Asks for a new API key on stdin and stores it in the settings file.
pub fn prompt_and_save_api_key(key_name: &str) -> Result<String> {
    eprint!("🔑 Enter a new value for {key_name}: ");
    io::stderr().flush().context("Failed to flush prompt")?;

    let api_key = read_trimmed_line(&mut io::stdin().lock())?;
    if api_key.is_empty() {
        bail!("No API key entered");
    }

    let mut settings = Settings::load()?;
    settings.set(key_name, &api_key);
    settings.save()?;

    Ok(api_key)
}

fn read_trimmed_line(reader: &mut impl BufRead) -> Result<String> {
    let mut line = String::new();
    reader
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(line.trim().to_string())
}
