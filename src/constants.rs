//! Constants used throughout the pool
//!
//! This module centralizes magic numbers and default tuning values
//! to improve maintainability and reduce duplication.

use std::time::Duration;

/// Connection pool constants
pub mod pool {
    use super::Duration;

    /// Default maximum connections in the pool
    pub const DEFAULT_MAX_POOL_SIZE: usize = 10;

    /// Default minimum (floor) connections the replenisher maintains
    pub const DEFAULT_MIN_POOL_SIZE: usize = 2;

    /// Default idle timeout before a connection is reclaimed (10 minutes)
    pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(600);

    /// Default interval between reclamation passes
    pub const DEFAULT_REAP_INTERVAL: Duration = Duration::from_secs(30);

    /// Staleness window: connections used within this window skip the
    /// acquire-time liveness probe
    pub const DEFAULT_VALIDATION_WINDOW: Duration = Duration::from_secs(30);

    /// Minimum recommended reclamation interval; shorter intervals cause
    /// excessive probe traffic and connection churn
    pub const MIN_RECOMMENDED_REAP_INTERVAL: Duration = Duration::from_secs(1);
}

/// Connection creation retry constants
pub mod backoff {
    use super::Duration;

    /// Default bounded attempt count for connection creation
    pub const DEFAULT_CONNECT_ATTEMPTS: u32 = 3;

    /// Default initial delay between creation attempts (doubles each retry)
    pub const DEFAULT_CONNECT_BACKOFF: Duration = Duration::from_millis(100);

    /// Cap on the per-attempt backoff delay
    pub const MAX_CONNECT_BACKOFF: Duration = Duration::from_secs(5);
}

/// Socket tuning constants for the TCP backend connector
pub mod socket {
    use super::Duration;

    /// TCP keepalive idle time before probes start
    pub const KEEPALIVE_TIME: Duration = Duration::from_secs(60);

    /// Interval between TCP keepalive probes
    pub const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(10);

    /// Buffer size for the non-blocking peek liveness probe.
    /// Only 1 byte is needed to detect a closed or readable socket.
    pub const PEEK_BUFFER_SIZE: usize = 1;
}

/// Default timeout for establishing one backend connection
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
