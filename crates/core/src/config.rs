//! Configuration management
//!
//! Settings come from an optional TOML file and are then overridden by
//! environment variables. A configuration without a destination bucket is
//! rejected before any work starts.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::key::normalize_prefix;

const CONFIG_DIR_ENV: &str = "PHOTOSYNC_CONFIG_DIR";
const CONFIG_FILE: &str = "config.toml";

/// Default destination prefix
pub const DEFAULT_PREFIX: &str = "photos/";

/// Destination object storage settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Destination bucket (required)
    pub bucket: Option<String>,

    /// Region name; S3-compatible services commonly accept "auto"
    pub region: String,

    /// Custom endpoint URL
    pub endpoint: Option<String>,

    pub access_key_id: Option<String>,

    pub secret_access_key: Option<String>,

    /// Use path-style addressing instead of virtual-hosted buckets
    pub force_path_style: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            bucket: None,
            region: "auto".to_string(),
            endpoint: None,
            access_key_id: None,
            secret_access_key: None,
            force_path_style: false,
        }
    }
}

/// Sync behaviour settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Key prefix for uploaded photos
    pub prefix: String,

    /// Lifetime of a login waiting for its verification code
    pub session_ttl_secs: Option<u64>,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            session_ttl_secs: None,
        }
    }
}

/// Complete configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub sync: SyncSettings,
}

impl Config {
    /// Override settings from environment-style variables
    ///
    /// `lookup` is usually `std::env::var(..).ok()`; empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.is_empty());

        if let Some(v) = get("PHOTO_BUCKET") {
            self.storage.bucket = Some(v);
        }
        if let Some(v) = get("PHOTO_PREFIX") {
            self.sync.prefix = v;
        }
        if let Some(v) = get("S3_REGION") {
            self.storage.region = v;
        }
        if let Some(v) = get("S3_ENDPOINT") {
            self.storage.endpoint = Some(v);
        }
        if let Some(v) = get("S3_ACCESS_KEY_ID") {
            self.storage.access_key_id = Some(v);
        }
        if let Some(v) = get("S3_SECRET_ACCESS_KEY") {
            self.storage.secret_access_key = Some(v);
        }
        if let Some(v) = get("S3_FORCE_PATH_STYLE") {
            self.storage.force_path_style = v == "true";
        }
        if let Some(v) = get("PHOTOSYNC_SESSION_TTL_SECS") {
            let secs = v.parse().map_err(|_| {
                Error::Config(format!("PHOTOSYNC_SESSION_TTL_SECS is not a number: {v}"))
            })?;
            self.sync.session_ttl_secs = Some(secs);
        }

        Ok(())
    }

    /// Check required settings
    pub fn validate(&self) -> Result<()> {
        if self.bucket().is_none() {
            return Err(Error::Config("PHOTO_BUCKET not configured".to_string()));
        }

        if let Some(endpoint) = &self.storage.endpoint {
            url::Url::parse(endpoint)
                .map_err(|e| Error::Config(format!("Invalid S3_ENDPOINT '{endpoint}': {e}")))?;
        }

        if self.storage.access_key_id.is_some() != self.storage.secret_access_key.is_some() {
            return Err(Error::Config(
                "S3_ACCESS_KEY_ID and S3_SECRET_ACCESS_KEY must be set together".to_string(),
            ));
        }

        Ok(())
    }

    pub fn bucket(&self) -> Option<&str> {
        self.storage.bucket.as_deref().filter(|b| !b.is_empty())
    }

    /// Destination prefix, always ending with `/`
    pub fn prefix(&self) -> String {
        normalize_prefix(&self.sync.prefix)
    }

    pub fn session_ttl(&self) -> Option<Duration> {
        self.sync.session_ttl_secs.map(Duration::from_secs)
    }
}

/// Locates, loads and saves the configuration file
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Manager for the default location
    ///
    /// `$PHOTOSYNC_CONFIG_DIR/config.toml` when set, otherwise
    /// `<config dir>/photosync/config.toml`.
    pub fn new() -> Result<Self> {
        let dir = match std::env::var_os(CONFIG_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::config_dir()
                .ok_or_else(|| Error::Config("Cannot determine config directory".to_string()))?
                .join("photosync"),
        };
        Ok(Self::with_path(dir.join(CONFIG_FILE)))
    }

    pub fn with_path(config_path: impl Into<PathBuf>) -> Self {
        Self {
            config_path: config_path.into(),
        }
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Read the file, falling back to defaults when it does not exist
    pub fn load(&self) -> Result<Config> {
        if !self.config_path.exists() {
            tracing::debug!(path = %self.config_path.display(), "No config file, using defaults");
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&self.config_path)?;
        toml::from_str(&content).map_err(|e| {
            Error::Config(format!(
                "Failed to parse {}: {e}",
                self.config_path.display()
            ))
        })
    }

    pub fn save(&self, config: &Config) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(config)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {e}")))?;
        std::fs::write(&self.config_path, content)?;
        Ok(())
    }

    /// Load the file, apply the process environment and validate
    pub fn resolve(&self) -> Result<Config> {
        let mut config = self.load()?;
        config.apply_env(|name| std::env::var(name).ok())?;
        config.validate()?;
        Ok(config)
    }
}
