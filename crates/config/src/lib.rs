//! Configuration loading, validation, and management for CtxBot.
//!
//! Loads configuration from `~/.ctxbot/config.toml` with environment
//! variable overrides for secrets. Validates all settings at startup so
//! the gateway and runner can assume a sane config.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.ctxbot/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Completion service API key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Telegram bot token (only required by the `bot` command)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_token: Option<String>,

    /// Default model
    #[serde(default = "default_model")]
    pub model: String,

    /// Default sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Max tokens per model reply (0 = let the service decide)
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Optional system prompt sent ahead of every conversation (empty = none)
    #[serde(default)]
    pub system_message: String,

    /// How many history messages are kept when building a request
    #[serde(default = "default_max_context_messages")]
    pub max_context_messages: usize,

    /// Path to the prompt template catalog (default: ./prompts.json)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompts_path: Option<PathBuf>,

    /// Directory for the usage and template-result logs (default: ./logs)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs_dir: Option<PathBuf>,
}

fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.2
}
fn default_max_tokens() -> u32 {
    1024
}
fn default_max_context_messages() -> usize {
    20
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("bot_token", &redact(&self.bot_token))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("system_message", &self.system_message)
            .field("max_context_messages", &self.max_context_messages)
            .field("prompts_path", &self.prompts_path)
            .field("logs_dir", &self.logs_dir)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.ctxbot/config.toml).
    ///
    /// Environment variables override file values:
    /// - `CTXBOT_API_KEY` or `OPENAI_API_KEY` for the completion service key
    /// - `CTXBOT_BOT_TOKEN` or `BOT_TOKEN` for the Telegram token
    /// - `CTXBOT_MODEL` for the default model
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;

        if config.api_key.is_none() {
            config.api_key = std::env::var("CTXBOT_API_KEY")
                .ok()
                .or_else(|| std::env::var("OPENAI_API_KEY").ok());
        }

        if config.bot_token.is_none() {
            config.bot_token = std::env::var("CTXBOT_BOT_TOKEN")
                .ok()
                .or_else(|| std::env::var("BOT_TOKEN").ok());
        }

        if let Ok(model) = std::env::var("CTXBOT_MODEL") {
            config.model = model;
        }

        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".ctxbot")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::ValidationError(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.max_context_messages < 2 {
            return Err(ConfigError::ValidationError(
                "max_context_messages must be at least 2 (one user/assistant pair)".into(),
            ));
        }

        Ok(())
    }

    /// The API key, or a fatal configuration error if missing.
    pub fn require_api_key(&self) -> Result<&str, ConfigError> {
        self.api_key.as_deref().ok_or_else(|| {
            ConfigError::ValidationError(
                "no API key configured (set CTXBOT_API_KEY or OPENAI_API_KEY, \
                 or api_key in config.toml)"
                    .into(),
            )
        })
    }

    /// The Telegram bot token, or a fatal configuration error if missing.
    pub fn require_bot_token(&self) -> Result<&str, ConfigError> {
        self.bot_token.as_deref().ok_or_else(|| {
            ConfigError::ValidationError(
                "no bot token configured (set CTXBOT_BOT_TOKEN or BOT_TOKEN, \
                 or bot_token in config.toml)"
                    .into(),
            )
        })
    }

    /// Resolved path to the prompt template catalog.
    pub fn prompts_path(&self) -> PathBuf {
        self.prompts_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("prompts.json"))
    }

    /// Resolved log directory.
    pub fn logs_dir(&self) -> PathBuf {
        self.logs_dir.clone().unwrap_or_else(|| PathBuf::from("logs"))
    }

    /// Path of the token-usage CSV log.
    pub fn usage_log_path(&self) -> PathBuf {
        self.logs_dir().join("usage.csv")
    }

    /// Path of the template results document.
    pub fn template_results_path(&self) -> PathBuf {
        self.logs_dir().join("template_results.json")
    }

    /// Generate a default config TOML string (for `onboard`).
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            bot_token: None,
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            system_message: String::new(),
            max_context_messages: default_max_context_messages(),
            prompts_path: None,
            logs_dir: None,
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
