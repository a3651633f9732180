//! Configuration loading from files and environment variables
//!
//! Loads the `[pool]` table from a TOML file, with environment variables
//! taking precedence for Docker/container deployments.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::types::PoolConfig;

/// Top-level configuration file model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfigFile {
    pub pool: PoolConfig,
}

/// Apply `DBPOOL_*` environment overrides to a loaded configuration
///
/// Recognized variables:
/// - `DBPOOL_URL` - backend connection URI
/// - `DBPOOL_USER` / `DBPOOL_PASSWORD` - backend credentials
/// - `DBPOOL_MIN_POOL_SIZE` / `DBPOOL_MAX_POOL_SIZE` - pool bounds
fn apply_env_overrides(config: &mut PoolConfig) -> Result<()> {
    if let Ok(url) = std::env::var("DBPOOL_URL") {
        tracing::info!("overriding pool url from DBPOOL_URL");
        config.url = url
            .try_into()
            .map_err(|e| anyhow::anyhow!("DBPOOL_URL: {}", e))?;
    }
    if let Ok(user) = std::env::var("DBPOOL_USER") {
        config.user = Some(user);
    }
    if let Ok(password) = std::env::var("DBPOOL_PASSWORD") {
        config.password = Some(password);
    }
    if let Ok(min) = std::env::var("DBPOOL_MIN_POOL_SIZE") {
        config.min_pool_size = min
            .parse()
            .with_context(|| format!("invalid DBPOOL_MIN_POOL_SIZE '{}'", min))?;
    }
    if let Ok(max) = std::env::var("DBPOOL_MAX_POOL_SIZE") {
        config.max_pool_size = max
            .parse()
            .with_context(|| format!("invalid DBPOOL_MAX_POOL_SIZE '{}'", max))?;
    }
    Ok(())
}

/// Load pool configuration from a TOML file, with environment overrides
///
/// The result is validated before being returned; an invalid configuration
/// fails here rather than at first use.
pub fn load_config(config_path: &str) -> Result<PoolConfig> {
    let config_content = std::fs::read_to_string(config_path)
        .with_context(|| format!("failed to read config file '{}'", config_path))?;

    let file: ConfigFile = toml::from_str(&config_content)
        .with_context(|| format!("failed to parse config file '{}'", config_path))?;

    let mut config = file.pool;
    apply_env_overrides(&mut config)?;
    config.validate()?;

    Ok(config)
}

/// Create a default configuration for examples/testing
#[must_use]
pub fn create_default_config() -> PoolConfig {
    let mut config = PoolConfig::default();
    config.properties = PoolConfig::default_properties();
    config
}
