//! Application configuration
//!
//! One `Config` is loaded at startup (TOML file, env overrides for
//! secrets) and passed by reference into component constructors.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Environment variable holding the Moltbook API key
pub const MOLTBOOK_API_KEY_ENV: &str = "MOLTBOOK_API_KEY";

/// Environment variable holding the model backend API key
pub const MODEL_API_KEY_ENV: &str = "MOLTBUDDY_MODEL_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub moltbook: MoltbookConfig,

    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub learning: LearningConfig,
}

/// Moltbook platform settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MoltbookConfig {
    /// API base URL (overridable for testing)
    pub base_url: String,
}

impl Default for MoltbookConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.moltbook.com/api/v1".to_string(),
        }
    }
}

/// Generative model backend settings (OpenAI-compatible endpoint)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Chat completions base URL
    pub base_url: String,

    /// Model name
    pub model: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
        }
    }
}

/// Experience-driven persona learning settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    /// When false, action log writes are suppressed entirely
    pub enabled: bool,

    /// Metric to maximize: upvotes_received, replies_received,
    /// follower_count, karma, or engagement
    pub metric: String,

    /// Advisory cadence: after this many logged actions the CLI suggests
    /// running `moltbuddy update`. Nothing auto-triggers a step.
    pub update_after_actions: usize,

    /// Seed persona used until the history has a revision
    pub seed_persona: Option<String>,

    /// Override for the action log location
    pub action_log_path: Option<PathBuf>,

    /// Override for the persona history location
    pub persona_history_path: Option<PathBuf>,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            metric: "engagement".to_string(),
            update_after_actions: 5,
            seed_persona: None,
            action_log_path: None,
            persona_history_path: None,
        }
    }
}

impl Config {
    /// Load configuration from the default path, creating a default file
    /// if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            let config = Config::default();
            config.save()?;
            return Ok(config);
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path
    pub fn load_from(path: &PathBuf) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(config)
    }

    /// Save configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let toml_string = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&config_path, toml_string).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::app_dir()?.join("config.toml"))
    }

    /// Application home directory (`~/.moltbuddy`)
    pub fn app_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".moltbuddy"))
    }

    /// Data directory for the append-only logs
    pub fn data_dir() -> Result<PathBuf> {
        Ok(Self::app_dir()?.join("data"))
    }

    /// Effective action log path (override or default data dir)
    pub fn action_log_path(&self) -> Result<PathBuf> {
        match &self.learning.action_log_path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::data_dir()?.join("action_log.jsonl")),
        }
    }

    /// Effective persona history path (override or default data dir)
    pub fn persona_history_path(&self) -> Result<PathBuf> {
        match &self.learning.persona_history_path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::data_dir()?.join("persona_history.jsonl")),
        }
    }

    /// Moltbook API key from the environment, falling back to the
    /// `~/.moltbuddy/api_key` file
    pub fn moltbook_api_key(&self) -> Option<String> {
        if let Ok(key) = std::env::var(MOLTBOOK_API_KEY_ENV) {
            let key = key.trim().to_string();
            if !key.is_empty() {
                return Some(key);
            }
        }
        let path = Self::app_dir().ok()?.join("api_key");
        let key = fs::read_to_string(path).ok()?.trim().to_string();
        if key.is_empty() {
            None
        } else {
            Some(key)
        }
    }

    /// Model backend API key from the environment
    pub fn model_api_key(&self) -> Option<String> {
        for var in [MODEL_API_KEY_ENV, "OPENAI_API_KEY"] {
            if let Ok(key) = std::env::var(var) {
                let key = key.trim().to_string();
                if !key.is_empty() {
                    return Some(key);
                }
            }
        }
        None
    }
}
