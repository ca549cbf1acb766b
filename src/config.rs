//! Configuration for the skynow CLI
//!
//! Loaded from a TOML file in the XDG config directory
//! (`~/.config/skynow/config.toml` on Linux). Every field has a default, so
//! a missing file or a partial file both work; the provider API key ships
//! embedded the way the original deployment did.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default weather provider host
const DEFAULT_PROVIDER_HOST: &str = "api.wunderground.com";

/// Embedded provider API key
const DEFAULT_API_KEY: &str = "2c763d8615191628";

/// Default IP geolocation endpoint (ip-api style JSON `lat`/`lon` fields)
const DEFAULT_GEOLOCATE_URL: &str = "http://ip-api.com/json";

/// Default per-request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Errors reading or parsing the config file
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file was read but is not valid TOML for this schema
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// No platform config directory could be determined
    #[error("could not determine platform config directory")]
    NoConfigDir,
}

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Weather provider host, e.g. "api.wunderground.com"
    pub provider_host: String,
    /// Provider API key
    pub api_key: String,
    /// IP geolocation endpoint used when no position override is given;
    /// set to an empty string to disable positioning entirely
    pub geolocate_url: Option<String>,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider_host: DEFAULT_PROVIDER_HOST.to_string(),
            api_key: DEFAULT_API_KEY.to_string(),
            geolocate_url: Some(DEFAULT_GEOLOCATE_URL.to_string()),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Loads config from the default XDG path, or returns defaults if the
    /// file does not exist yet
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&Self::config_file_path()?)
    }

    /// Loads config from a specific path, or returns defaults if the file
    /// does not exist
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Path to the config file in the platform config directory
    pub fn config_file_path() -> Result<PathBuf, ConfigError> {
        let dirs = ProjectDirs::from("", "", "skynow").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Per-request timeout as a `Duration`
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
