//! Core types shared across the pool
//!
//! Validated configuration strings and type-safe pool counters.

pub mod pool;
pub mod validated;

pub use pool::{
    ActiveConnections, CreatedConnections, DiscardedConnections, IdleConnections, PoolStats,
    WaitingAcquirers,
};
pub use validated::{ConnectionUri, DriverName, ValidationError};
