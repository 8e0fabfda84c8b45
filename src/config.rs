// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Configuration management for the running coach

use anyhow::{Context as _, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{defaults, files, strava};

/// Top-level configuration, loaded from a TOML file or the environment
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    /// Strava OAuth application credentials
    #[serde(default)]
    pub strava: StravaConfig,
    /// Coaching behavior and model selection
    #[serde(default)]
    pub coach: CoachConfig,
}

/// Strava OAuth application settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StravaConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    /// Local redirect URI registered with the Strava application
    pub redirect_uri: Option<String>,
}

impl StravaConfig {
    /// Redirect URI, falling back to the default localhost callback
    pub fn redirect_uri(&self) -> &str {
        self.redirect_uri.as_deref().unwrap_or(strava::DEFAULT_REDIRECT_URI)
    }

    /// True when both application credentials are present
    pub fn is_configured(&self) -> bool {
        self.client_id.is_some() && self.client_secret.is_some()
    }
}

/// Coaching configuration surface
///
/// Defaults mirror [`crate::constants::defaults`]; `api_key` absent means
/// the AI path is skipped entirely and only rule-based analysis runs.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CoachConfig {
    /// OpenRouter API key; absent disables the AI path
    pub api_key: Option<String>,
    /// Model identifier passed to OpenRouter
    pub model: String,
    /// Fall back to the rule-based engine when the model call fails
    pub fallback_to_rules: bool,
    /// Maximum recent activities pulled into the analysis window
    pub max_activities: usize,
    /// Cache validity in hours
    pub cache_duration_hours: u64,
}

impl Default for CoachConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: defaults::MODEL.to_string(),
            fallback_to_rules: defaults::FALLBACK_TO_RULES,
            max_activities: defaults::MAX_ACTIVITIES_TO_ANALYZE,
            cache_duration_hours: defaults::CACHE_DURATION_HOURS,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file, falling back to the environment
    ///
    /// With no explicit path, looks under the platform config dir
    /// (`running-coach/config.toml`). When the file is absent, reads
    /// `STRAVA_CLIENT_ID`, `STRAVA_CLIENT_SECRET`, `STRAVA_REDIRECT_URI`,
    /// and `OPENROUTER_API_KEY` after loading any `.env` file.
    pub fn load(path: Option<String>) -> Result<Self> {
        let config_path = path.map(PathBuf::from).unwrap_or_else(Self::default_path);

        if config_path.exists() {
            let content = fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config file {}", config_path.display()))?;
            toml::from_str(&content).context("Failed to parse config file")
        } else {
            dotenv::dotenv().ok();
            Ok(Self::from_env())
        }
    }

    /// Build a configuration purely from environment variables
    pub fn from_env() -> Self {
        let mut coach = CoachConfig {
            api_key: std::env::var("OPENROUTER_API_KEY").ok(),
            ..CoachConfig::default()
        };
        if let Ok(model) = std::env::var("OPENROUTER_MODEL") {
            coach.model = model;
        }

        Self {
            strava: StravaConfig {
                client_id: std::env::var("STRAVA_CLIENT_ID").ok(),
                client_secret: std::env::var("STRAVA_CLIENT_SECRET").ok(),
                redirect_uri: std::env::var("STRAVA_REDIRECT_URI").ok(),
            },
            coach,
        }
    }

    /// Persist the configuration as TOML
    pub fn save(&self, path: Option<String>) -> Result<()> {
        let config_path = path.map(PathBuf::from).unwrap_or_else(Self::default_path);

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file {}", config_path.display()))
    }

    /// Default config file location under the platform config dir
    fn default_path() -> PathBuf {
        dirs::config_dir()
            .map(|p| p.join(files::APP_DIR).join("config.toml"))
            .unwrap_or_else(|| Path::new("config.toml").to_path_buf())
    }

    /// Default data directory for tokens and cache files
    pub fn data_dir() -> PathBuf {
        dirs::data_dir()
            .map(|p| p.join(files::APP_DIR))
            .unwrap_or_else(|| Path::new("data").to_path_buf())
    }
}
