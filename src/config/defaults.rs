//! Default values for configuration fields
//!
//! This module centralizes all default value functions used in serde
//! deserialization.

use crate::constants::{backoff, pool};
use std::time::Duration;

/// Default minimum pool size (replenishment floor)
#[inline]
pub fn min_pool_size() -> usize {
    pool::DEFAULT_MIN_POOL_SIZE
}

/// Default maximum pool size
#[inline]
pub fn max_pool_size() -> usize {
    pool::DEFAULT_MAX_POOL_SIZE
}

/// Default idle timeout before reclamation
#[inline]
pub fn idle_timeout() -> Duration {
    pool::DEFAULT_IDLE_TIMEOUT
}

/// Default for eager startup fill (true = pre-create the min floor)
#[inline]
pub fn prewarm() -> bool {
    true
}

/// Default staleness window for acquire-time probes
#[inline]
pub fn validation_window() -> Duration {
    pool::DEFAULT_VALIDATION_WINDOW
}

/// Default interval between reclamation passes
#[inline]
pub fn reap_interval() -> Duration {
    pool::DEFAULT_REAP_INTERVAL
}

/// Default bounded connection-creation attempt count
#[inline]
pub fn connect_attempts() -> u32 {
    backoff::DEFAULT_CONNECT_ATTEMPTS
}

/// Default initial creation backoff delay
#[inline]
pub fn connect_backoff() -> Duration {
    backoff::DEFAULT_CONNECT_BACKOFF
}
