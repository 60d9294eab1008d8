//! Runner configuration loaded from a RON file.
//!
//! A missing file means defaults; a malformed file is an error.

use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use fetchkit_core::{SupersedePolicy, TriggerPolicy, WatchMode, WatchSet, WatchValue};
use fetchkit_engine::FetchSettings;
use fetchkit_logging::LogDestination;
use log::LevelFilter;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILENAME: &str = "fetchkit.ron";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {path:?}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("invalid log level {0:?}")]
    LogLevel(String),
    #[error("no url configured")]
    MissingUrl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
pub enum PolicyConfig {
    /// Fetch only on the `fetch` command
    Manual,
    /// Fetch once when the runner activates
    #[default]
    Once,
    /// Fetch on activation and whenever the watched values change
    Reactive,
    /// Fetch on activation and after every state change
    ReactiveEvery,
}

impl From<PolicyConfig> for TriggerPolicy {
    fn from(policy: PolicyConfig) -> Self {
        match policy {
            PolicyConfig::Manual => TriggerPolicy::Manual,
            PolicyConfig::Once => TriggerPolicy::Once,
            PolicyConfig::Reactive => TriggerPolicy::Reactive(WatchMode::Changes),
            PolicyConfig::ReactiveEvery => TriggerPolicy::Reactive(WatchMode::Every),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub redirect_limit: usize,
    pub max_bytes: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        let settings = FetchSettings::default();
        Self {
            connect_timeout_ms: settings.connect_timeout.as_millis() as u64,
            request_timeout_ms: settings.request_timeout.as_millis() as u64,
            redirect_limit: settings.redirect_limit,
            max_bytes: settings.max_bytes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub destination: LogDestination,
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            destination: LogDestination::default(),
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub url: String,
    pub policy: PolicyConfig,
    pub supersede: SupersedePolicy,
    /// Initial watched values, compared positionally.
    pub watch: Vec<WatchValue>,
    pub fetch: FetchConfig,
    pub log: LogConfig,
}

impl AppConfig {
    /// Loads `path`, falling back to defaults when the file does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        ron::from_str(&content).map_err(|err| ConfigError::Parse {
            path: path.to_path_buf(),
            message: err.to_string(),
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.trim().is_empty() {
            return Err(ConfigError::MissingUrl);
        }
        self.log_level().map(|_| ())
    }

    pub fn trigger_policy(&self) -> TriggerPolicy {
        self.policy.into()
    }

    pub fn watch_set(&self) -> WatchSet {
        WatchSet::new(self.watch.clone())
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            connect_timeout: Duration::from_millis(self.fetch.connect_timeout_ms),
            request_timeout: Duration::from_millis(self.fetch.request_timeout_ms),
            redirect_limit: self.fetch.redirect_limit,
            max_bytes: self.fetch.max_bytes,
            ..FetchSettings::default()
        }
    }

    pub fn log_level(&self) -> Result<LevelFilter, ConfigError> {
        LevelFilter::from_str(self.log.level.trim())
            .map_err(|_| ConfigError::LogLevel(self.log.level.clone()))
    }
}
