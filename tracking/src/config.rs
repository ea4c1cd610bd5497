use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use url::Url;

const DEFAULT_DETAIL_URL: &str =
    "https://jmsgw.jtexpress.vn/operatingplatform/order/getOrderDetail";
const DEFAULT_TRACKING_URL: &str =
    "https://jmsgw.jtexpress.vn/operatingplatform/podTracking/inner/query/keywordList";

const MAX_CONCURRENCY_LIMIT: usize = tokio::sync::Semaphore::MAX_PERMITS;
const MAX_RETRY_BACKOFF_MS: u64 = 60_000;
const MAX_CACHE_TTL_SECS: u64 = 365 * 24 * 3600;

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("Concurrency limit must be between 1 and {}", MAX_CONCURRENCY_LIMIT)]
    InvalidConcurrencyLimit,

    #[error("Retry attempts must be at least 1")]
    InvalidRetryAttempts,

    #[error("Upstream timeout cannot be 0")]
    InvalidTimeout,

    #[error("Cache TTL must be between 1 and {} seconds", MAX_CACHE_TTL_SECS)]
    InvalidCacheTtl,

    #[error("Retry backoff cannot exceed {}ms", MAX_RETRY_BACKOFF_MS)]
    InvalidRetryBackoff,

    #[error("Cache sweep interval cannot be 0")]
    InvalidSweepInterval,
}

/// Tracking service configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Listener for incoming batch requests
    pub listener: Listener,
    /// Upstream tracking provider endpoints and call policy
    pub upstream: UpstreamConfig,
    /// Result cache settings
    pub cache: CacheConfig,
    /// Maximum number of shipment lookups in flight at once
    pub concurrency_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            listener: Listener::default(),
            upstream: UpstreamConfig::default(),
            cache: CacheConfig::default(),
            concurrency_limit: 10,
        }
    }
}

impl Config {
    /// Validates the tracking configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.listener.validate()?;
        self.upstream.validate()?;
        self.cache.validate()?;

        if self.concurrency_limit == 0 || self.concurrency_limit > MAX_CONCURRENCY_LIMIT {
            return Err(ValidationError::InvalidConcurrencyLimit);
        }

        Ok(())
    }
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    /// Host address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

impl Default for Listener {
    fn default() -> Self {
        Listener {
            host: "127.0.0.1".into(),
            port: 3000,
        }
    }
}

impl Listener {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

/// Upstream tracking provider configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Shipment detail endpoint
    ///
    /// Note: Uses the `url::Url` type so invalid URLs are rejected during
    /// config deserialization.
    pub detail_url: Url,
    /// Tracking event query endpoint
    pub tracking_url: Url,
    /// Per-call timeout, covering connect, send and reading the body
    pub timeout_ms: u64,
    /// Total attempts per call, including the first one
    pub retry_attempts: u32,
    /// Delay unit for linear backoff; attempt `n` waits `n * retry_backoff_ms`
    pub retry_backoff_ms: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        UpstreamConfig {
            detail_url: Url::parse(DEFAULT_DETAIL_URL).expect("default detail url is valid"),
            tracking_url: Url::parse(DEFAULT_TRACKING_URL)
                .expect("default tracking url is valid"),
            timeout_ms: 5000,
            retry_attempts: 3,
            retry_backoff_ms: 1000,
        }
    }
}

impl UpstreamConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.timeout_ms == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        if self.retry_attempts == 0 {
            return Err(ValidationError::InvalidRetryAttempts);
        }
        if self.retry_backoff_ms > MAX_RETRY_BACKOFF_MS {
            return Err(ValidationError::InvalidRetryBackoff);
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_millis(self.retry_backoff_ms)
    }
}

/// Cache configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    /// How long a successful lookup is served from the cache
    pub ttl_secs: u64,
    /// How often expired entries are swept out
    pub sweep_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            ttl_secs: 3600,
            sweep_interval_secs: 60,
        }
    }
}

impl CacheConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.ttl_secs == 0 || self.ttl_secs > MAX_CACHE_TTL_SECS {
            return Err(ValidationError::InvalidCacheTtl);
        }
        if self.sweep_interval_secs == 0 {
            return Err(ValidationError::InvalidSweepInterval);
        }
        Ok(())
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}
