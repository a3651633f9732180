//! Pool error types
//!
//! One enum covers every way an acquisition or pool operation can fail,
//! making it easy for callers to distinguish transient conditions from
//! configuration mistakes.

use std::time::Duration;

use thiserror::Error;

/// Result alias used throughout the pool
pub type PoolResult<T> = Result<T, PoolError>;

/// Errors surfaced by pool operations
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PoolError {
    /// The backend could not be reached after bounded retries
    #[error("failed to connect to backend after {attempts} attempt(s): {source}")]
    ConnectFailed {
        attempts: u32,
        #[source]
        source: std::io::Error,
    },

    /// A connection failed its health probe
    #[error("connection validation failed: {reason}")]
    ValidationFailed { reason: String },

    /// No connection became available within the caller's timeout
    #[error("pool exhausted; no connection available after {waited:?}")]
    PoolExhausted { waited: Duration },

    /// The pool has been shut down
    #[error("pool is closed")]
    PoolClosed,

    /// The configuration was rejected before any connection was attempted
    #[error("invalid pool configuration: {0}")]
    ConfigInvalid(String),
}

impl PoolError {
    /// Build a `ConnectFailed` from the last I/O error of a retry run
    #[must_use]
    pub fn connect_failed(attempts: u32, source: std::io::Error) -> Self {
        Self::ConnectFailed { attempts, source }
    }

    /// Check if this error means the backend itself is unreachable
    #[must_use]
    pub const fn is_backend_unreachable(&self) -> bool {
        matches!(self, Self::ConnectFailed { .. })
    }

    /// Check if retrying the same call later could succeed
    ///
    /// Configuration errors and closed pools are permanent; everything else
    /// can clear up on its own.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::ConnectFailed { .. } | Self::ValidationFailed { .. } | Self::PoolExhausted { .. }
        )
    }

    /// Get the appropriate log level for this error
    #[must_use]
    pub fn log_level(&self) -> tracing::Level {
        match self {
            // Exhaustion under load is expected; callers retry with backoff
            Self::PoolExhausted { .. } => tracing::Level::DEBUG,
            // Races against shutdown are normal
            Self::PoolClosed => tracing::Level::DEBUG,
            // Configuration mistakes need attention
            Self::ConfigInvalid(_) => tracing::Level::ERROR,
            // Backend trouble might be transient
            Self::ConnectFailed { .. } | Self::ValidationFailed { .. } => tracing::Level::WARN,
        }
    }
}
