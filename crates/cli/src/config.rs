//! Configuration management using config.toml

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use steamwrap_core::{AchievementCount, ReportError, Result};
use steamwrap_render::RenderOptions;

pub const CONFIG_PATH: &str = "config.toml";
const API_KEY_ENV: &str = "STEAM_API_KEY";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Steam Web API key; `STEAM_API_KEY` takes precedence
    pub steam_web_api_key: String,

    pub api_base_url: String,

    /// Image relay used when a direct image load fails
    pub relay_base_url: String,

    /// Which unlocks the "Total Achievements Earned" line counts
    pub achievement_count: AchievementCount,

    pub render: RenderOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            steam_web_api_key: String::new(),
            api_base_url: steamwrap_aggregator::DEFAULT_API_BASE.to_string(),
            relay_base_url: steamwrap_render::image_loader::DEFAULT_RELAY_BASE.to_string(),
            achievement_count: AchievementCount::default(),
            render: RenderOptions::default(),
        }
    }
}

impl Config {
    /// Load config from `path`. A missing file yields defaults; an unreadable or
    /// malformed one is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)
            .map_err(|e| ReportError::Config(format!("reading {}: {}", path.display(), e)))?;
        Self::parse(&content).map_err(|e| match e {
            ReportError::Config(msg) => ReportError::Config(format!("{}: {}", path.display(), msg)),
            other => other,
        })
    }

    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| ReportError::Config(e.to_string()))
    }

    /// Apply environment overrides (after `.env` has been loaded)
    pub fn with_env(mut self) -> Self {
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                self.steam_web_api_key = key;
            }
        }
        self
    }

    /// The API key, or a config error naming both places it can be set
    pub fn api_key(&self) -> Result<&str> {
        let key = self.steam_web_api_key.trim();
        if key.is_empty() {
            return Err(ReportError::Config(format!(
                "no Steam Web API key: set {} or steam_web_api_key in {}",
                API_KEY_ENV, CONFIG_PATH
            )));
        }
        Ok(key)
    }
}
