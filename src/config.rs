use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::PurgeError;
use crate::purge::PurgeOptions;

/// Environment variable holding the GitHub personal access token
pub const TOKEN_ENV: &str = "GH_TOKEN";

/// Environment variable holding the account whose forks are purged
pub const ACCOUNT_ENV: &str = "GH_USERNAME";

/// GitHub's upper bound for `per_page` on list endpoints
const MAX_PER_PAGE: u8 = 100;

/// Levels accepted for `logging.level`
const LOG_LEVELS: [&str; 6] = ["trace", "debug", "info", "warn", "error", "off"];

/// Token and account for one run, read from the environment
#[derive(Clone)]
pub struct Credentials {
    token: String,
    account: String,
}

impl Credentials {
    /// Build credentials, rejecting blank values
    pub fn new(token: impl Into<String>, account: impl Into<String>) -> Result<Self, PurgeError> {
        let token = token.into();
        let account = account.into();

        if token.trim().is_empty() {
            return Err(PurgeError::EmptyEnv { name: TOKEN_ENV });
        }
        if account.trim().is_empty() {
            return Err(PurgeError::EmptyEnv { name: ACCOUNT_ENV });
        }

        Ok(Self {
            token,
            account: account.trim().to_string(),
        })
    }

    /// Read `GH_TOKEN` and `GH_USERNAME` from the process environment
    pub fn from_env() -> Result<Self, PurgeError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Read credentials through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, PurgeError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let token = lookup(TOKEN_ENV).ok_or(PurgeError::MissingEnv { name: TOKEN_ENV })?;
        let account = lookup(ACCOUNT_ENV).ok_or(PurgeError::MissingEnv { name: ACCOUNT_ENV })?;

        Self::new(token, account)
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn account(&self) -> &str {
        &self.account
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"<redacted>")
            .field("account", &self.account)
            .finish()
    }
}

/// Settings file for fork-purger
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    /// Purge behavior settings
    #[serde(default)]
    pub purge: PurgeConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Purge behavior configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PurgeConfig {
    /// Forks created more than this many days ago are deleted
    #[serde(default = "default_older_than_days")]
    pub older_than_days: u32,

    /// Repositories requested per listing page
    #[serde(default = "default_per_page")]
    pub per_page: u8,

    /// Deadline for the whole run
    #[serde(default = "default_timeout")]
    pub timeout: String, // "30s", "5m", "1h"
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Log level used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub level: String, // "info"
}

// Default value functions
fn default_older_than_days() -> u32 {
    60
}
fn default_per_page() -> u8 {
    MAX_PER_PAGE
}
fn default_timeout() -> String {
    "5m".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for PurgeConfig {
    fn default() -> Self {
        Self {
            older_than_days: default_older_than_days(),
            per_page: default_per_page(),
            timeout: default_timeout(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, falling back to defaults
    pub fn load_or_default() -> Result<Self> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load(&config_path)
        } else {
            tracing::debug!("No configuration at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        config
            .validate()
            .with_context(|| format!("Invalid config file: {:?}", path))?;

        Ok(config)
    }

    /// Get the default configuration file path (XDG compliant)
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = config_dir().context("Failed to get user config directory")?;

        Ok(config_dir.join("fork-purger").join("config.yml"))
    }

    /// Expand `~` and environment variables in a user-supplied config path
    pub fn expand_path(raw: &str) -> Result<PathBuf> {
        let expanded = shellexpand::full(raw)
            .with_context(|| format!("Failed to expand config path: {}", raw))?;

        Ok(PathBuf::from(expanded.as_ref()))
    }

    /// Check value ranges before anything touches the network
    pub fn validate(&self) -> Result<(), PurgeError> {
        if self.purge.older_than_days == 0 {
            return Err(PurgeError::InvalidSetting {
                field: "purge.older_than_days",
                reason: "must be at least 1".to_string(),
            });
        }

        if self.purge.per_page == 0 || self.purge.per_page > MAX_PER_PAGE {
            return Err(PurgeError::InvalidSetting {
                field: "purge.per_page",
                reason: format!("must be between 1 and {}", MAX_PER_PAGE),
            });
        }

        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(PurgeError::InvalidSetting {
                field: "logging.level",
                reason: format!("must be one of {}", LOG_LEVELS.join(", ")),
            });
        }

        self.run_timeout()?;
        Ok(())
    }

    /// Age threshold as a chrono Duration for comparison with creation times
    pub fn age_threshold(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.purge.older_than_days))
    }

    /// Parsed run deadline
    pub fn run_timeout(&self) -> Result<Duration, PurgeError> {
        let timeout = parse_duration(&self.purge.timeout).map_err(|e| {
            PurgeError::InvalidSetting {
                field: "purge.timeout",
                reason: e.to_string(),
            }
        })?;

        if timeout.is_zero() {
            return Err(PurgeError::InvalidSetting {
                field: "purge.timeout",
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(timeout)
    }

    /// Options for a `ForkPurger` built from these settings
    pub fn purge_options(&self) -> Result<PurgeOptions, PurgeError> {
        self.validate()?;

        Ok(PurgeOptions {
            threshold: self.age_threshold(),
            per_page: self.purge.per_page,
            timeout: self.run_timeout()?,
        })
    }
}

/// Parse duration strings like "30s", "5m", "1h", "2d" or raw seconds
pub fn parse_duration(duration_str: &str) -> Result<Duration> {
    let duration_str = duration_str.trim().to_lowercase();

    let seconds = if let Some(value) = duration_str.strip_suffix('s') {
        value.parse::<u64>().context("Invalid seconds value")?
    } else if let Some(value) = duration_str.strip_suffix('m') {
        value.parse::<u64>().map(|v| v * 60).context("Invalid minutes value")?
    } else if let Some(value) = duration_str.strip_suffix('h') {
        value.parse::<u64>().map(|v| v * 3600).context("Invalid hours value")?
    } else if let Some(value) = duration_str.strip_suffix('d') {
        value.parse::<u64>().map(|v| v * 86400).context("Invalid days value")?
    } else {
        duration_str
            .parse::<u64>()
            .context("Invalid duration format. Use format like '30s', '5m', '1h'")?
    };

    Ok(Duration::from_secs(seconds))
}
