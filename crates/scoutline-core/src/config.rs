//! Configuration management for Scoutline.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main application configuration.
///
/// This is loaded from `~/.config/scoutline/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Target site settings
    pub site: SiteConfig,
    /// Browser automation settings
    pub browser: BrowserConfig,
    /// Scraping behaviour settings
    pub scraping: ScrapingConfig,
    /// Catalog database settings
    pub database: DatabaseConfig,
    /// CSS selectors for interactive page controls
    pub selectors: SelectorConfig,
}

impl AppConfig {
    /// Load configuration from the default location, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if:
    /// - Config directory cannot be determined
    /// - File exists but cannot be read
    /// - File contents are not valid TOML
    pub fn load() -> ConfigResult<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from an explicit path, falling back to defaults if missing.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        if path.exists() {
            tracing::debug!("Loading config from {}", path.display());
            let contents = fs::read_to_string(path)?;
            let config: Self = toml::from_str(&contents)?;
            config.validate()?;
            Ok(config)
        } else {
            tracing::debug!("Config file not found at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    /// Apply environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `SCOUTLINE_BASE_URL`: Override the target site base URL
    /// - `SCOUTLINE_HEADLESS`: Override browser headless mode (true/false)
    /// - `SCOUTLINE_DB_PATH`: Override the catalog database path
    /// - `SCOUTLINE_MAX_RETRIES`: Override the per-call retry bound
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("SCOUTLINE_BASE_URL") {
            tracing::debug!("Override site.base_url from env: {}", val);
            self.site.base_url = val;
        }

        if let Ok(val) = std::env::var("SCOUTLINE_HEADLESS") {
            if let Ok(headless) = val.parse() {
                self.browser.headless = headless;
                tracing::debug!("Override browser.headless from env: {}", headless);
            }
        }

        if let Ok(val) = std::env::var("SCOUTLINE_DB_PATH") {
            tracing::debug!("Override database.path from env: {}", val);
            self.database.path = Some(PathBuf::from(val));
        }

        if let Ok(val) = std::env::var("SCOUTLINE_MAX_RETRIES") {
            if let Ok(retries) = val.parse() {
                self.scraping.max_retries = retries;
                tracing::debug!("Override scraping.max_retries from env: {}", retries);
            }
        }

        self
    }

    /// Check values that would make the scraper misbehave.
    pub fn validate(&self) -> ConfigResult<()> {
        if url::Url::parse(&self.site.base_url).is_err() {
            return Err(ConfigError::InvalidValue {
                field: "site.base_url".to_string(),
                reason: format!("not an absolute URL: '{}'", self.site.base_url),
            });
        }
        if self.scraping.max_retries == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scraping.max_retries".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if self.selectors.country_items.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "selectors.country_items".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        if self.scraping.discovery_batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "scraping.discovery_batch_size".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    /// Save configuration to the default location.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> ConfigResult<()> {
        let config_path = Self::config_path()?;
        let config_dir = config_path
            .parent()
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "config_path".to_string(),
                reason: "no parent directory".to_string(),
            })?;

        fs::create_dir_all(config_dir)?;
        tracing::debug!("Saving config to {}", config_path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(config_path, contents)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/scoutline/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs =
            ProjectDirs::from("com", "scoutline", "scoutline").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Get the data directory path.
    ///
    /// Uses XDG base directories: `~/.local/share/scoutline`
    pub fn data_dir() -> ConfigResult<PathBuf> {
        let dirs =
            ProjectDirs::from("com", "scoutline", "scoutline").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.data_dir().to_path_buf())
    }

    /// Resolve the catalog database path, defaulting to `<data dir>/catalog.db`.
    pub fn database_path(&self) -> ConfigResult<PathBuf> {
        match &self.database.path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::data_dir()?.join("catalog.db")),
        }
    }
}

/// Target site settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Base URL every relative link is resolved against
    pub base_url: String,
    /// Page that hosts the country quick select
    pub entry_path: String,
    /// Path of the competition search results page
    pub search_path: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.transfermarkt.com".to_string(),
            entry_path: "/".to_string(),
            search_path: "/schnellsuche/ergebnis/schnellsuche".to_string(),
        }
    }
}

/// Browser automation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Run browser in headless mode
    pub headless: bool,
    /// Browser window width
    pub window_width: u32,
    /// Browser window height
    pub window_height: u32,
    /// Navigation timeout in seconds
    pub navigation_timeout_secs: u64,
    /// Minimum delay between two navigations in milliseconds
    pub min_navigation_delay_ms: u64,
    /// Fixed user agent. A common desktop one is picked per session when unset
    pub user_agent: Option<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1920,
            window_height: 1080,
            navigation_timeout_secs: 30,
            min_navigation_delay_ms: 1000,
            user_agent: None,
        }
    }
}

/// Scraping behaviour settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrapingConfig {
    /// Attempts per navigation or HTTP fetch before giving up
    pub max_retries: u32,
    /// Backoff before the first retry in milliseconds; doubles per attempt
    pub base_backoff_ms: u64,
    /// Upper bound for a single backoff in milliseconds
    pub max_backoff_ms: u64,
    /// Countries scraped per discovery batch
    pub discovery_batch_size: usize,
    /// How long to wait for an intercepted quick-select response in milliseconds
    pub capture_timeout_ms: u64,
    /// Market-value lookups allowed in flight at once
    pub max_concurrent_lookups: usize,
    /// HTTP request timeout in seconds
    pub http_timeout_secs: u64,
    /// User agent for plain HTTP requests
    pub user_agent: String,
}

impl ScrapingConfig {
    #[must_use]
    pub fn base_backoff(&self) -> Duration {
        Duration::from_millis(self.base_backoff_ms)
    }

    #[must_use]
    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }

    #[must_use]
    pub fn capture_timeout(&self) -> Duration {
        Duration::from_millis(self.capture_timeout_ms)
    }
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_backoff_ms: 1000,
            max_backoff_ms: 30_000,
            discovery_batch_size: 10,
            capture_timeout_ms: 10_000,
            max_concurrent_lookups: 4,
            http_timeout_secs: 30,
            user_agent: "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
        }
    }
}

/// CSS selectors for the controls the scraper drives.
///
/// The site ships more than one layout of its quick select; pointing these at
/// the active layout keeps the engine unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Element that opens the country quick select
    pub country_opener: String,
    /// One element per country listed in the opened quick select
    pub country_items: String,
    /// URL pattern of the background request a country selection fires
    pub country_capture_pattern: String,
    /// Options of the season selector on a player's stats page
    pub season_options: String,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            country_opener: "div.quick-select-box[data-select='land'] .selector-title"
                .to_string(),
            country_items: "div.quick-select-box[data-select='land'] ul.selector-dropdown > li"
                .to_string(),
            country_capture_pattern: "*/quickselect/competitions/*".to_string(),
            season_options: "select[name='saison'] option".to_string(),
        }
    }
}

/// Catalog database settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Path of the SQLite catalog; defaults to the data directory
    pub path: Option<PathBuf>,
}
