//! Queue configuration module
//!
//! Provides `QueueConfig`, its builder, and environment loading.

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Default storage key for the persisted queue slot
pub const DEFAULT_STORAGE_KEY: &str = "offline-queue";

/// Default interval of the periodic sync timer
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(30);

/// Default pause between consecutive cycles while draining a backlog
pub const DEFAULT_DRAIN_DELAY: Duration = Duration::from_secs(1);

/// Default retry ceiling used when a request does not set its own
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Queue configuration
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Directory holding the persisted slot
    pub storage_dir: PathBuf,
    /// Key of the persisted slot
    pub storage_key: String,
    /// Base URL that relative request URLs are resolved against
    pub api_base_url: Option<String>,
    /// Periodic timer interval
    pub sync_interval: Duration,
    /// Pause between cycles while the queue is non-empty
    pub drain_delay: Duration,
    /// Retry ceiling for requests built without an explicit one
    pub default_max_retries: u32,
    /// HTTP request timeout; `None` leaves the client default
    pub request_timeout: Option<Duration>,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            storage_dir: default_storage_dir(),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            api_base_url: None,
            sync_interval: DEFAULT_SYNC_INTERVAL,
            drain_delay: DEFAULT_DRAIN_DELAY,
            default_max_retries: DEFAULT_MAX_RETRIES,
            request_timeout: None,
        }
    }
}

fn default_storage_dir() -> PathBuf {
    let mut path = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("offline-queue");
    path
}

fn env_parse<T: std::str::FromStr>(name: &'static str) -> Result<Option<T>, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue(name, raw)),
        Err(_) => Ok(None),
    }
}

impl QueueConfig {
    /// Create a new QueueConfigBuilder
    pub fn builder() -> QueueConfigBuilder {
        QueueConfigBuilder::default()
    }

    /// Load configuration from `OFFLINE_QUEUE_*` environment variables,
    /// falling back to defaults for anything unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut builder = Self::builder();

        if let Ok(dir) = std::env::var("OFFLINE_QUEUE_DIR") {
            builder = builder.storage_dir(dir);
        }
        if let Ok(key) = std::env::var("OFFLINE_QUEUE_KEY") {
            builder = builder.storage_key(key);
        }
        if let Ok(url) = std::env::var("OFFLINE_QUEUE_API_URL") {
            builder = builder.api_base_url(url);
        }
        if let Some(secs) = env_parse::<u64>("OFFLINE_QUEUE_SYNC_INTERVAL_SECS")? {
            builder = builder.sync_interval(Duration::from_secs(secs));
        }
        if let Some(ms) = env_parse::<u64>("OFFLINE_QUEUE_DRAIN_DELAY_MS")? {
            builder = builder.drain_delay(Duration::from_millis(ms));
        }
        if let Some(retries) = env_parse::<u32>("OFFLINE_QUEUE_MAX_RETRIES")? {
            builder = builder.default_max_retries(retries);
        }
        if let Some(secs) = env_parse::<u64>("OFFLINE_QUEUE_TIMEOUT_SECS")? {
            builder = builder.request_timeout(Duration::from_secs(secs));
        }

        builder.build()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage_key.trim().is_empty() {
            return Err(ConfigError::MissingValue("storage_key"));
        }
        if self.sync_interval.is_zero() {
            return Err(ConfigError::InvalidValue(
                "sync_interval",
                "must be greater than zero".to_string(),
            ));
        }
        if let Some(url) = &self.api_base_url {
            let parsed =
                reqwest::Url::parse(url).map_err(|_| ConfigError::InvalidUrl(url.clone()))?;
            if parsed.cannot_be_a_base() {
                return Err(ConfigError::InvalidUrl(url.clone()));
            }
        }
        Ok(())
    }

    /// Full path of the persisted slot file
    pub fn storage_path(&self) -> PathBuf {
        self.storage_dir.join(format!("{}.json", self.storage_key))
    }
}

/// Builder for QueueConfig
#[derive(Debug, Default)]
pub struct QueueConfigBuilder {
    storage_dir: Option<PathBuf>,
    storage_key: Option<String>,
    api_base_url: Option<String>,
    sync_interval: Option<Duration>,
    drain_delay: Option<Duration>,
    default_max_retries: Option<u32>,
    request_timeout: Option<Duration>,
}

impl QueueConfigBuilder {
    /// Set the storage directory
    pub fn storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = Some(dir.into());
        self
    }

    /// Set the storage key
    pub fn storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = Some(key.into());
        self
    }

    /// Set the API base URL
    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = Some(url.into());
        self
    }

    /// Set the periodic sync interval
    pub fn sync_interval(mut self, interval: Duration) -> Self {
        self.sync_interval = Some(interval);
        self
    }

    /// Set the delay between drain cycles
    pub fn drain_delay(mut self, delay: Duration) -> Self {
        self.drain_delay = Some(delay);
        self
    }

    /// Set the default retry ceiling
    pub fn default_max_retries(mut self, retries: u32) -> Self {
        self.default_max_retries = Some(retries);
        self
    }

    /// Set the HTTP request timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<QueueConfig, ConfigError> {
        let defaults = QueueConfig::default();
        let config = QueueConfig {
            storage_dir: self.storage_dir.unwrap_or(defaults.storage_dir),
            storage_key: self.storage_key.unwrap_or(defaults.storage_key),
            api_base_url: self.api_base_url,
            sync_interval: self.sync_interval.unwrap_or(defaults.sync_interval),
            drain_delay: self.drain_delay.unwrap_or(defaults.drain_delay),
            default_max_retries: self
                .default_max_retries
                .unwrap_or(defaults.default_max_retries),
            request_timeout: self.request_timeout,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Configuration errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
    #[error("missing value: {0}")]
    MissingValue(&'static str),
    #[error("invalid value for {0}: {1}")]
    InvalidValue(&'static str, String),
}
