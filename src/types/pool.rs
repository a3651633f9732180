//! Connection pool metric newtypes
//!
//! This module provides type-safe wrappers for pool statistics to prevent
//! accidentally mixing different counters (e.g. active vs. idle counts).

use std::fmt;

macro_rules! pool_counter {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident(usize)
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
        $vis struct $name(usize);

        impl $name {
            #[doc = concat!("Create a new ", stringify!($name), " count")]
            #[inline]
            pub const fn new(count: usize) -> Self {
                Self(count)
            }

            /// Get the raw value
            #[inline]
            #[must_use]
            pub const fn get(self) -> usize {
                self.0
            }

            /// Zero count (initial state)
            #[inline]
            pub const fn zero() -> Self {
                Self(0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<usize> for $name {
            fn from(value: usize) -> Self {
                Self(value)
            }
        }
    };
}

pool_counter! {
    /// Number of connections currently checked out by callers
    pub struct ActiveConnections(usize)
}

pool_counter! {
    /// Number of idle connections ready for handout
    ///
    /// This value is always ≤ the configured maximum pool size.
    pub struct IdleConnections(usize)
}

pool_counter! {
    /// Number of callers currently waiting for a connection
    pub struct WaitingAcquirers(usize)
}

pool_counter! {
    /// Total connections created over the pool's lifetime
    ///
    /// Monotonically increasing; useful for monitoring connection churn.
    pub struct CreatedConnections(usize)
}

pool_counter! {
    /// Total connections discarded over the pool's lifetime
    ///
    /// Counts validation failures, idle-timeout evictions, and shutdown
    /// closes. Monotonically increasing.
    pub struct DiscardedConnections(usize)
}

/// Point-in-time pool statistics for monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub active: ActiveConnections,
    pub idle: IdleConnections,
    pub waiters: WaitingAcquirers,
    pub created: CreatedConnections,
    pub discarded: DiscardedConnections,
}

impl PoolStats {
    /// Connections currently alive (idle + active)
    #[must_use]
    pub const fn total(&self) -> usize {
        self.active.get() + self.idle.get()
    }
}

impl fmt::Display for PoolStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "active={} idle={} waiters={} created={} discarded={}",
            self.active, self.idle, self.waiters, self.created, self.discarded
        )
    }
}
