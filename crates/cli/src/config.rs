//! Configuration loading for the CLI.
//!
//! Loads `~/.gradepilot/config.toml` with environment variable overrides.
//! Missing file means defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure. Maps directly to
/// `~/.gradepilot/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Anthropic API key. `GRADEPILOT_API_KEY` / `ANTHROPIC_API_KEY` override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model for the grading loop.
    #[serde(default = "default_model")]
    pub model: String,

    /// Max tokens per backend response.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Default iteration bound.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,
}

fn default_model() -> String {
    "claude-sonnet-4-5".into()
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_max_iterations() -> u32 {
    10
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_model(),
            max_tokens: default_max_tokens(),
            max_iterations: default_max_iterations(),
        }
    }
}

impl AppConfig {
    /// Default config file location.
    pub fn default_path() -> PathBuf {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        Path::new(&home).join(".gradepilot").join("config.toml")
    }

    /// Load from a path, falling back to defaults when the file is absent,
    /// then apply environment overrides.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(path)?;
            toml::from_str(&raw)?
        } else {
            Self::default()
        };

        if let Ok(key) = std::env::var("GRADEPILOT_API_KEY") {
            config.api_key = Some(key);
        } else if config.api_key.is_none()
            && let Ok(key) = std::env::var("ANTHROPIC_API_KEY")
        {
            config.api_key = Some(key);
        }

        Ok(config)
    }
}
