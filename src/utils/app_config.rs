/// Application configuration management
/// Stores user preferences in ~/.config/localplace-cli/config.toml

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::utils::constants::*;

/// On-disk configuration. Every field is optional; unset fields fall back to
/// environment variables and then to built-in defaults.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub api_url: Option<String>,
    pub health_interval: Option<String>,
    pub metrics_interval: Option<String>,
    pub containers_interval: Option<String>,
    pub stats_interval: Option<String>,
    pub request_timeout: Option<String>,
    pub action_timeout: Option<String>,
    pub log_tail: Option<usize>,
}

/// Fully resolved runtime settings
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub api_url: String,
    /// `None` means fetch once at startup
    pub health_interval: Option<Duration>,
    pub metrics_interval: Option<Duration>,
    pub containers_interval: Option<Duration>,
    pub stats_interval: Option<Duration>,
    pub request_timeout: Duration,
    /// Timeout for the mutating POSTs, which can outlast `request_timeout`
    pub action_timeout: Duration,
    pub log_tail: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            health_interval: Some(DEFAULT_HEALTH_INTERVAL),
            metrics_interval: Some(DEFAULT_METRICS_INTERVAL),
            containers_interval: Some(DEFAULT_CONTAINERS_INTERVAL),
            stats_interval: Some(DEFAULT_STATS_INTERVAL),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            action_timeout: DEFAULT_ACTION_TIMEOUT,
            log_tail: DEFAULT_LOG_TAIL,
        }
    }
}

impl Settings {
    /// Resolve settings from the config file, `.env`, the process environment
    /// and an optional `--api-url` override, in increasing precedence
    pub fn load(api_url_override: Option<String>) -> Result<Self> {
        // A missing .env is normal
        let _ = dotenv::dotenv();

        let config = AppConfig::load()?;
        let mut settings = config.resolve(|key| std::env::var(key).ok())?;

        if let Some(url) = api_url_override {
            settings.api_url = url;
        }

        Ok(settings)
    }
}

/// Parse an interval such as `5s`, `10m` or `1h 30m`
///
/// `once`, `0` and zero durations mean "fetch once, no schedule".
pub fn parse_interval(value: &str) -> Result<Option<Duration>> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("once") || value == "0" {
        return Ok(None);
    }

    let duration = humantime::parse_duration(value)
        .with_context(|| format!("Invalid interval '{}'", value))?;

    Ok(Some(duration).filter(|d| !d.is_zero()))
}

impl AppConfig {
    /// Directory holding config.toml and the TUI log file
    pub fn config_dir() -> Result<PathBuf> {
        let base = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine the user config directory"))?;
        let config_dir = base.join(APP_NAME);

        // Create directory if it doesn't exist
        fs::create_dir_all(&config_dir)
            .context("Failed to create config directory")?;

        Ok(config_dir)
    }

    /// Get config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE_NAME))
    }

    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .context("Failed to read config file")?;

        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;

        Ok(config)
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        fs::write(path, contents)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Set and save the API base URL
    pub fn set_api_url(&mut self, url: &str) -> Result<()> {
        self.api_url = Some(url.trim().trim_end_matches('/').to_string());
        self.save()
    }

    /// Merge this file with environment lookups into runtime settings
    pub fn resolve(&self, env: impl Fn(&str) -> Option<String>) -> Result<Settings> {
        let defaults = Settings::default();

        let pick = |env_key: &str, file_value: &Option<String>| -> Option<String> {
            env(env_key)
                .filter(|v| !v.trim().is_empty())
                .or_else(|| file_value.clone())
        };

        let interval = |env_key: &str,
                        file_value: &Option<String>,
                        default: Option<Duration>|
         -> Result<Option<Duration>> {
            match pick(env_key, file_value) {
                Some(raw) => parse_interval(&raw).with_context(|| format!("Invalid value for {}", env_key)),
                None => Ok(default),
            }
        };

        let timeout = |key: &str, file_value: &Option<String>, default: Duration| -> Result<Duration> {
            match file_value {
                Some(raw) => parse_interval(raw)
                    .with_context(|| format!("Invalid value for {}", key))?
                    .ok_or_else(|| anyhow!("{} must be greater than zero", key)),
                None => Ok(default),
            }
        };

        Ok(Settings {
            api_url: pick(ENV_API_URL, &self.api_url).unwrap_or(defaults.api_url),
            health_interval: interval(ENV_HEALTH_INTERVAL, &self.health_interval, defaults.health_interval)?,
            metrics_interval: interval(ENV_METRICS_INTERVAL, &self.metrics_interval, defaults.metrics_interval)?,
            containers_interval: interval(
                ENV_CONTAINERS_INTERVAL,
                &self.containers_interval,
                defaults.containers_interval,
            )?,
            stats_interval: interval(ENV_STATS_INTERVAL, &self.stats_interval, defaults.stats_interval)?,
            request_timeout: timeout("request_timeout", &self.request_timeout, defaults.request_timeout)?,
            action_timeout: timeout("action_timeout", &self.action_timeout, defaults.action_timeout)?,
            log_tail: self.log_tail.unwrap_or(defaults.log_tail),
        })
    }
}
