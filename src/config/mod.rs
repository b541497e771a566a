//! Configuration management for Folio.
//!
//! Configuration is read from `~/.config/folio/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.

use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::catalog::PAGE_SIZE;
use crate::domain::Category;

pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/books/v1/";

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub browse: BrowseConfig,
}

/// Remote catalog settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Root of the volumes API, with a trailing slash
    pub base_url: String,

    /// API key appended as `key=`; requests go out unauthenticated when unset
    pub api_key: Option<String>,

    /// Whole-request deadline in seconds (default: 30)
    pub timeout_secs: u64,

    /// Connect deadline in seconds (default: 15)
    pub connect_timeout_secs: u64,

    /// Books requested per page (default: 20)
    pub page_size: usize,

    /// Language restriction for trending shelves (default: "en")
    pub language: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            timeout_secs: 30,
            connect_timeout_secs: 15,
            page_size: PAGE_SIZE,
            language: "en".to_string(),
        }
    }
}

impl CatalogConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// The key, ignoring blank values left in the file.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct BrowseConfig {
    pub default_category: Category,
}

impl Config {
    /// Load configuration from the default path.
    ///
    /// If the config file doesn't exist, creates a default one with comments.
    /// Missing fields in the config file will use default values.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::default_config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
            return Ok(Self::default());
        }

        Self::from_path(&config_path)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;

        config.validate(path)?;
        Ok(config)
    }

    /// Get the default config file path: `~/.config/folio/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("folio").join("config.toml"))
    }

    fn validate(&self, path: &Path) -> Result<(), ConfigError> {
        if self.catalog.page_size == 0 {
            return Err(ConfigError::Invalid {
                path: path.to_path_buf(),
                reason: "catalog.page_size must be at least 1".into(),
            });
        }
        if let Err(e) = url::Url::parse(&self.catalog.base_url) {
            return Err(ConfigError::Invalid {
                path: path.to_path_buf(),
                reason: format!("catalog.base_url is not a URL: {}", e),
            });
        }
        Ok(())
    }

    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        Ok(())
    }

    fn default_config_content() -> String {
        r##"# Folio Configuration

[catalog]
# Root of the Google Books volumes API
base_url = "https://www.googleapis.com/books/v1/"

# Optional API key; leave empty for unauthenticated requests
api_key = ""

# Request deadline and connect deadline, in seconds
timeout_secs = 30
connect_timeout_secs = 15

# Books per page; a shorter page is treated as the end of the results
page_size = 20

# Language restriction for trending shelves
language = "en"

[browse]
# Shelf shown on startup. One of: fiction, non-fiction, business,
# technology, science, romance, mystery, biography
default_category = "fiction"
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid config file at {path}: {reason}")]
    Invalid { path: PathBuf, reason: String },
}
