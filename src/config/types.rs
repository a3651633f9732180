//! Configuration type definitions
//!
//! This module contains the pool configuration structure, its serde model
//! for the TOML `[pool]` table, and a fluent builder.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;

use crate::constants::{backoff, pool};
use crate::error::PoolError;
use crate::types::{ConnectionUri, DriverName};

/// Serde helper for `Duration` fields expressed as whole seconds
pub mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_secs())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(d)?;
        Ok(Duration::from_secs(secs))
    }
}

/// Serde helper for `Duration` fields expressed as milliseconds
pub mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        let millis = u64::deserialize(d)?;
        Ok(Duration::from_millis(millis))
    }
}

/// Immutable pool configuration, created once at startup
///
/// Validated with [`PoolConfig::validate`] before the pool is built;
/// construction fails fast on inconsistent bounds or half-configured
/// credentials.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PoolConfig {
    /// Backend driver identifier (informational, passed to the connector)
    pub driver: DriverName,
    /// Backend connection URI
    pub url: ConnectionUri,
    /// Backend username
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// Backend password
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Floor of connections the replenisher maintains (0 disables the floor)
    #[serde(default = "super::defaults::min_pool_size")]
    pub min_pool_size: usize,
    /// Hard cap on concurrent connections (idle + active)
    #[serde(default = "super::defaults::max_pool_size")]
    pub max_pool_size: usize,
    /// Idle time after which a connection is reclaimed; zero = never evict
    #[serde(with = "duration_secs", default = "super::defaults::idle_timeout")]
    pub idle_timeout: Duration,
    /// Optional validation query run by the connector's probe
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_query: Option<String>,
    /// Backend-specific connection properties (charset, TLS flags, ...)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
    /// Pre-create `min_pool_size` connections at startup
    #[serde(default = "super::defaults::prewarm")]
    pub prewarm: bool,
    /// Connections used within this window skip the acquire-time probe
    #[serde(
        with = "duration_secs",
        default = "super::defaults::validation_window"
    )]
    pub validation_window: Duration,
    /// Interval between idle-reclamation passes
    #[serde(with = "duration_secs", default = "super::defaults::reap_interval")]
    pub reap_interval: Duration,
    /// Bounded attempt count for connection creation
    #[serde(default = "super::defaults::connect_attempts")]
    pub connect_attempts: u32,
    /// Initial delay between creation attempts (doubles per retry)
    #[serde(
        with = "duration_millis",
        default = "super::defaults::connect_backoff"
    )]
    pub connect_backoff: Duration,
}

impl PoolConfig {
    /// Create a builder with the required driver and URI
    ///
    /// # Examples
    ///
    /// ```
    /// use dbpool::config::PoolConfig;
    ///
    /// let config = PoolConfig::builder("mysql", "mysql://db.example.com:3306/shop")
    ///     .user("shop")
    ///     .password("secret")
    ///     .min_pool_size(2)
    ///     .max_pool_size(10)
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(config.max_pool_size, 10);
    /// ```
    #[must_use]
    pub fn builder(driver: impl Into<String>, url: impl Into<String>) -> PoolConfigBuilder {
        PoolConfigBuilder::new(driver, url)
    }

    /// Whether idle-timeout eviction is enabled
    #[must_use]
    pub const fn evicts_idle(&self) -> bool {
        !self.idle_timeout.is_zero()
    }

    /// Connection properties carried over from classic JDBC-style pools
    ///
    /// UTF-8 text, TLS off, driver-level reconnect on.
    #[must_use]
    pub fn default_properties() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("useUnicode".to_string(), "true".to_string()),
            ("characterEncoding".to_string(), "UTF-8".to_string()),
            ("useSSL".to_string(), "false".to_string()),
            ("autoReconnect".to_string(), "true".to_string()),
        ])
    }
}

/// Builder for constructing `PoolConfig` instances
///
/// Provides a fluent API, especially useful in tests where filling in all
/// configuration fields is verbose.
pub struct PoolConfigBuilder {
    driver: String,
    url: String,
    user: Option<String>,
    password: Option<String>,
    min_pool_size: Option<usize>,
    max_pool_size: Option<usize>,
    idle_timeout: Option<Duration>,
    validation_query: Option<String>,
    properties: BTreeMap<String, String>,
    prewarm: bool,
    validation_window: Option<Duration>,
    reap_interval: Option<Duration>,
    connect_attempts: Option<u32>,
    connect_backoff: Option<Duration>,
}

impl PoolConfigBuilder {
    /// Create a new builder with required connection parameters
    #[must_use]
    pub fn new(driver: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            driver: driver.into(),
            url: url.into(),
            user: None,
            password: None,
            min_pool_size: None,
            max_pool_size: None,
            idle_timeout: None,
            validation_query: None,
            properties: BTreeMap::new(),
            prewarm: true,
            validation_window: None,
            reap_interval: None,
            connect_attempts: None,
            connect_backoff: None,
        }
    }

    /// Set the backend username
    #[must_use]
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    /// Set the backend password
    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Set the minimum pool size (replenishment floor)
    #[must_use]
    pub fn min_pool_size(mut self, min: usize) -> Self {
        self.min_pool_size = Some(min);
        self
    }

    /// Set the maximum pool size (hard cap)
    #[must_use]
    pub fn max_pool_size(mut self, max: usize) -> Self {
        self.max_pool_size = Some(max);
        self
    }

    /// Set the idle timeout; `Duration::ZERO` disables eviction
    #[must_use]
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = Some(timeout);
        self
    }

    /// Set the validation query run by liveness probes
    #[must_use]
    pub fn validation_query(mut self, query: impl Into<String>) -> Self {
        self.validation_query = Some(query.into());
        self
    }

    /// Add one backend connection property
    #[must_use]
    pub fn property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Enable or disable eager startup fill (default: enabled)
    #[must_use]
    pub fn prewarm(mut self, prewarm: bool) -> Self {
        self.prewarm = prewarm;
        self
    }

    /// Set the probe staleness window
    #[must_use]
    pub fn validation_window(mut self, window: Duration) -> Self {
        self.validation_window = Some(window);
        self
    }

    /// Set the reclamation interval
    #[must_use]
    pub fn reap_interval(mut self, interval: Duration) -> Self {
        self.reap_interval = Some(interval);
        self
    }

    /// Set the bounded connection-creation attempt count
    #[must_use]
    pub fn connect_attempts(mut self, attempts: u32) -> Self {
        self.connect_attempts = Some(attempts);
        self
    }

    /// Set the initial creation backoff delay
    #[must_use]
    pub fn connect_backoff(mut self, delay: Duration) -> Self {
        self.connect_backoff = Some(delay);
        self
    }

    /// Build and validate the configuration
    ///
    /// # Errors
    ///
    /// Returns `PoolError::ConfigInvalid` if the driver or URI is empty,
    /// `max_pool_size` is zero or below `min_pool_size`, or a username is
    /// configured without a password.
    pub fn build(self) -> Result<PoolConfig, PoolError> {
        let driver = DriverName::new(self.driver)
            .map_err(|e| PoolError::ConfigInvalid(e.to_string()))?;
        let url =
            ConnectionUri::new(self.url).map_err(|e| PoolError::ConfigInvalid(e.to_string()))?;

        let config = PoolConfig {
            driver,
            url,
            user: self.user,
            password: self.password,
            min_pool_size: self.min_pool_size.unwrap_or_else(super::defaults::min_pool_size),
            max_pool_size: self.max_pool_size.unwrap_or_else(super::defaults::max_pool_size),
            idle_timeout: self.idle_timeout.unwrap_or_else(super::defaults::idle_timeout),
            validation_query: self.validation_query,
            properties: self.properties,
            prewarm: self.prewarm,
            validation_window: self
                .validation_window
                .unwrap_or_else(super::defaults::validation_window),
            reap_interval: self.reap_interval.unwrap_or_else(super::defaults::reap_interval),
            connect_attempts: self
                .connect_attempts
                .unwrap_or(backoff::DEFAULT_CONNECT_ATTEMPTS),
            connect_backoff: self
                .connect_backoff
                .unwrap_or(backoff::DEFAULT_CONNECT_BACKOFF),
        };
        config.validate()?;
        Ok(config)
    }
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            driver: DriverName::new("tcp".to_string()).expect("static driver name is non-empty"),
            url: ConnectionUri::new("localhost:3306".to_string())
                .expect("static URI is non-empty"),
            user: None,
            password: None,
            min_pool_size: pool::DEFAULT_MIN_POOL_SIZE,
            max_pool_size: pool::DEFAULT_MAX_POOL_SIZE,
            idle_timeout: pool::DEFAULT_IDLE_TIMEOUT,
            validation_query: None,
            properties: BTreeMap::new(),
            prewarm: true,
            validation_window: pool::DEFAULT_VALIDATION_WINDOW,
            reap_interval: pool::DEFAULT_REAP_INTERVAL,
            connect_attempts: backoff::DEFAULT_CONNECT_ATTEMPTS,
            connect_backoff: backoff::DEFAULT_CONNECT_BACKOFF,
        }
    }
}
