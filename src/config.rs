use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{TranslateError, TranslateResult};
use crate::language::LanguagePair;

pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_PRIMARY_LANGUAGE: &str = "Vietnamese";
pub const DEFAULT_SECONDARY_LANGUAGE: &str = "English";

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub languages: LanguageConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct ApiConfig {
    pub api_key: String,
    pub api_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct LanguageConfig {
    pub primary: String,
    pub secondary: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct DisplayConfig {
    // UI language: "auto", "en" or "vi"
    pub language: String,
    // Preview width (terminal columns) for history listings
    pub preview_width: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_url: DEFAULT_API_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            primary: DEFAULT_PRIMARY_LANGUAGE.to_string(),
            secondary: DEFAULT_SECONDARY_LANGUAGE.to_string(),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            language: "auto".to_string(),
            preview_width: 50,
        }
    }
}

/// Everything the chat client needs, validated.
#[derive(Debug, Clone, PartialEq)]
pub struct TranslatorConfig {
    pub api_key: String,
    pub api_url: String,
    pub model: String,
    pub timeout_secs: u64,
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        fallback.to_string()
    } else {
        value.to_string()
    }
}

impl Config {
    /// Loads `~/.tl/config.toml` (writing defaults on first run), then
    /// applies `TL_*` environment overrides. An unreadable or unwritable
    /// config falls back to defaults so history commands keep working.
    pub fn new() -> Self {
        let mut config = Self::load_or_default(&Self::get_config_path());
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config
    }

    pub fn load_or_default(config_path: &Path) -> Self {
        Self::load_or_create(config_path).unwrap_or_else(|e| {
            warn!("Using default configuration: {:#}", e);
            Config::default()
        })
    }

    pub fn load_or_create(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            let content = fs::read_to_string(config_path)
                .with_context(|| format!("Failed to read {}", config_path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("Invalid config file {}", config_path.display()))?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(config_path)?;
            Ok(config)
        }
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(config_dir) = config_path.parent() {
            fs::create_dir_all(config_dir)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(config_path, content)?;
        Ok(())
    }

    /// Base directory for config and history: `$TL_HOME` or `~/.tl`.
    pub fn data_dir() -> PathBuf {
        match std::env::var("TL_HOME") {
            Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".tl"),
        }
    }

    pub fn get_config_path() -> PathBuf {
        Self::data_dir().join("config.toml")
    }

    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("TL_API_KEY") {
            self.api.api_key = key;
        }
        if let Some(url) = lookup("TL_API_URL") {
            self.api.api_url = url;
        }
        if let Some(model) = lookup("TL_MODEL") {
            self.api.model = model;
        }
    }

    /// Fails with a configuration error when the key or URL is missing, so
    /// callers can stop before any network call.
    pub fn translator_config(&self) -> TranslateResult<TranslatorConfig> {
        let api_key = self.api.api_key.trim();
        let api_url = self.api.api_url.trim();

        if api_key.is_empty() || api_url.is_empty() {
            return Err(TranslateError::Config(
                "API key and URL must be set in config.toml or via TL_API_KEY / TL_API_URL".to_string(),
            ));
        }

        Ok(TranslatorConfig {
            api_key: api_key.to_string(),
            api_url: api_url.to_string(),
            model: non_empty_or(&self.api.model, DEFAULT_MODEL),
            timeout_secs: self.api.timeout_secs.max(1),
        })
    }

    pub fn language_pair(&self) -> LanguagePair {
        LanguagePair::new(
            non_empty_or(&self.languages.primary, DEFAULT_PRIMARY_LANGUAGE),
            non_empty_or(&self.languages.secondary, DEFAULT_SECONDARY_LANGUAGE),
        )
    }

    pub fn get_effective_language(&self) -> String {
        if self.display.language == "auto" {
            // Try to get system language
            std::env::var("LANG")
                .unwrap_or_else(|_| "en_US".to_string())
                .split('.')
                .next()
                .unwrap_or("en")
                .to_string()
        } else {
            self.display.language.clone()
        }
    }
}
