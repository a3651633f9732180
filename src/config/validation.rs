//! Configuration validation
//!
//! Fail-fast checks run before the pool is built. A rejected configuration
//! is fatal: the error is never retried.

use crate::constants::pool::MIN_RECOMMENDED_REAP_INTERVAL;
use crate::error::PoolError;

use super::types::PoolConfig;

impl PoolConfig {
    /// Validate configuration for correctness
    ///
    /// Emptiness of `driver` and `url` is enforced by their types at
    /// construction; this checks the remaining semantic constraints:
    /// - `max_pool_size` must be at least 1
    /// - `max_pool_size` must not be below `min_pool_size`
    /// - a username without a password can never authenticate
    /// - at least one creation attempt must be allowed
    pub fn validate(&self) -> Result<(), PoolError> {
        if self.max_pool_size == 0 {
            return Err(PoolError::ConfigInvalid(
                "max_pool_size must be at least 1".to_string(),
            ));
        }

        if self.max_pool_size < self.min_pool_size {
            return Err(PoolError::ConfigInvalid(format!(
                "max_pool_size ({}) < min_pool_size ({})",
                self.max_pool_size, self.min_pool_size
            )));
        }

        if self.user.is_some() && self.password.is_none() {
            return Err(PoolError::ConfigInvalid(format!(
                "user '{}' configured without a password",
                self.user.as_deref().unwrap_or_default()
            )));
        }

        if self.connect_attempts == 0 {
            return Err(PoolError::ConfigInvalid(
                "connect_attempts must be at least 1".to_string(),
            ));
        }

        if self.reap_interval < MIN_RECOMMENDED_REAP_INTERVAL && self.evicts_idle() {
            tracing::warn!(
                reap_interval_ms = self.reap_interval.as_millis() as u64,
                "reap_interval below recommended minimum; expect probe traffic and churn"
            );
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_config_passes() {
        let config = PoolConfig::builder("mysql", "db:3306")
            .min_pool_size(2)
            .max_pool_size(5)
            .build()
            .unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_max_rejected() {
        let result = PoolConfig::builder("mysql", "db:3306")
            .min_pool_size(0)
            .max_pool_size(0)
            .build();
        match result {
            Err(PoolError::ConfigInvalid(msg)) => assert!(msg.contains("at least 1")),
            other => panic!("expected ConfigInvalid, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_max_below_min_rejected() {
        let result = PoolConfig::builder("mysql", "db:3306")
            .min_pool_size(5)
            .max_pool_size(2)
            .build();
        match result {
            Err(PoolError::ConfigInvalid(msg)) => {
                assert!(msg.contains("max_pool_size (2)"));
                assert!(msg.contains("min_pool_size (5)"));
            }
            other => panic!("expected ConfigInvalid, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_user_without_password_rejected() {
        let result = PoolConfig::builder("mysql", "db:3306").user("app").build();
        match result {
            Err(PoolError::ConfigInvalid(msg)) => assert!(msg.contains("without a password")),
            other => panic!("expected ConfigInvalid, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_password_only_allowed() {
        // Token-style auth: password without username is accepted.
        let result = PoolConfig::builder("mysql", "db:3306").password("tok").build();
        assert!(result.is_ok());
    }

    #[test]
    fn test_zero_connect_attempts_rejected() {
        let result = PoolConfig::builder("mysql", "db:3306")
            .connect_attempts(0)
            .build();
        assert!(matches!(result, Err(PoolError::ConfigInvalid(_))));
    }

    #[test]
    fn test_min_equal_max_allowed() {
        let result = PoolConfig::builder("mysql", "db:3306")
            .min_pool_size(5)
            .max_pool_size(5)
            .build();
        assert!(result.is_ok());
    }
}
