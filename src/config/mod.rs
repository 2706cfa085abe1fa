//! Settings and application directories.
//!
//! Settings live in `config.toml` under a single `social-agent` directory in
//! the OS config root. `SOCIAL_AGENT_HOME` relocates that directory (tests,
//! portable setups) and `SOCIAL_AGENT_API_BASE` overrides the backend URL.

use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::Timeframe;

pub const APP_DIR_NAME: &str = "social-agent";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const STORE_FILE_NAME: &str = "local.db";
pub const HOME_ENV: &str = "SOCIAL_AGENT_HOME";
pub const API_BASE_ENV: &str = "SOCIAL_AGENT_API_BASE";

pub const DEFAULT_API_BASE: &str = "http://localhost:8000/api/v1";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no suitable config directory available")]
    NoBaseDir,
    #[error("failed to create directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardSettings {
    /// How often the sidebar re-polls the pending review count.
    pub pending_poll_secs: u64,
    /// Quiet period before a comment-library search is sent.
    pub search_debounce_ms: u64,
    pub default_timeframe: String,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            pending_poll_secs: 30,
            search_debounce_ms: 300,
            default_timeframe: Timeframe::Day.as_str().to_string(),
        }
    }
}

impl DashboardSettings {
    pub fn pending_poll_interval(&self) -> Duration {
        Duration::from_secs(self.pending_poll_secs.max(1))
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }

    pub fn timeframe(&self) -> Result<Timeframe> {
        self.default_timeframe
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                key: "dashboard.default_timeframe",
                value: self.default_timeframe.clone(),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Default filter directive when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api: ApiSettings,
    pub dashboard: DashboardSettings,
    pub logging: LoggingSettings,
}

impl Settings {
    /// Parse settings from TOML text; missing keys keep their defaults.
    pub fn from_toml_str(text: &str, origin: &Path) -> Result<Self> {
        let settings: Settings = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        settings.dashboard.timeframe()?;
        Ok(settings)
    }

    /// Apply an API base override (environment or command line).
    pub fn override_api_base(&mut self, base_url: Option<String>) {
        if let Some(base) = base_url.map(|b| b.trim().to_string())
            && !base.is_empty()
        {
            self.api.base_url = base;
        }
    }
}

/// Resolved locations of everything the dashboard writes to disk.
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
}

impl AppPaths {
    /// Resolve the app directory, creating it if needed.
    pub fn resolve() -> Result<Self> {
        let base = match std::env::var_os(HOME_ENV) {
            Some(path) => PathBuf::from(path),
            None => BaseDirs::new()
                .map(|dirs| dirs.config_dir().join(APP_DIR_NAME))
                .ok_or(ConfigError::NoBaseDir)?,
        };
        Self::at(base)
    }

    pub fn at(root: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&root).map_err(|source| ConfigError::CreateDir {
            path: root.clone(),
            source,
        })?;
        Ok(Self { root })
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join(CONFIG_FILE_NAME)
    }

    pub fn store_file(&self) -> PathBuf {
        self.root.join(STORE_FILE_NAME)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join("logs")
    }
}

/// Load settings from `path`, returning defaults when the file is missing.
pub fn load_from(path: &Path) -> Result<Settings> {
    if !path.exists() {
        return Ok(Settings::default());
    }
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    Settings::from_toml_str(&text, path)
}

/// Load settings for `paths` and apply the environment override.
pub fn load_or_default(paths: &AppPaths) -> Result<Settings> {
    let mut settings = load_from(&paths.config_file())?;
    settings.override_api_base(std::env::var(API_BASE_ENV).ok());
    Ok(settings)
}
