//! Runtime application configuration.
//!
//! Distinct from the persisted broadcast configuration singleton: this
//! is the process-level config (bot token, paths) loaded from
//! `~/.promocast/config.toml`, with `BOT_TOKEN` taking precedence from
//! the environment.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{PromoError, Result};

/// Root runtime configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Telegram bot token. Usually supplied via the BOT_TOKEN env var.
    #[serde(default)]
    pub bot_token: String,
    #[serde(default = "default_db_path")]
    pub db_path: String,
    /// Directory holding uploaded broadcast images.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
}

fn default_db_path() -> String {
    "~/.promocast/promocast.db".into()
}
fn default_upload_dir() -> String {
    "~/.promocast/uploads".into()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            db_path: default_db_path(),
            upload_dir: default_upload_dir(),
        }
    }
}

impl AppConfig {
    /// Load config from the default path, falling back to defaults if
    /// no file exists. BOT_TOKEN from the environment always wins.
    pub fn load() -> Result<Self> {
        let path = Self::default_path();
        let mut config = if path.exists() {
            Self::load_from(&path)?
        } else {
            Self::default()
        };
        if let Ok(token) = std::env::var("BOT_TOKEN") {
            if !token.is_empty() {
                config.bot_token = token;
            }
        }
        Ok(config)
    }

    /// Load config from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| PromoError::Config(format!("failed to read config: {e}")))?;
        let config: Self = toml::from_str(&content)
            .map_err(|e| PromoError::Config(format!("failed to parse config: {e}")))?;
        Ok(config)
    }

    /// Save config to the default path.
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| PromoError::Config(format!("failed to serialize config: {e}")))?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Get the default config path (~/.promocast/config.toml).
    pub fn default_path() -> PathBuf {
        Self::home_dir().join("config.toml")
    }

    /// Get the Promocast home directory.
    pub fn home_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".promocast")
    }
}
