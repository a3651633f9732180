//! Connection pool: manager, checked-out guard, connection lifecycle, and
//! the background reclamation task

pub mod connection;
pub mod guard;
pub mod manager;
mod reaper;

pub use connection::{ConnectionState, PooledConnection};
pub use guard::PoolGuard;
pub use manager::Pool;
