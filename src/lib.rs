//! Bounded, FIFO-fair connection pool for database-style backends
//!
//! A pool owns up to `max_pool_size` connections to a single backend and
//! keeps at least `min_pool_size` warm. Callers acquire with a timeout and
//! are served in arrival order; a background task reclaims connections that
//! sit idle past the configured timeout and restores the floor.
//!
//! The backend itself is abstracted behind [`BackendConnector`]; the
//! built-in [`TcpConnector`] opens tuned TCP streams and probes liveness
//! with a non-blocking peek.
//!
//! # Example
//!
//! ```no_run
//! use dbpool::{Pool, PoolConfig, TcpConnector};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), dbpool::PoolError> {
//! let config = PoolConfig::builder("mysql", "mysql://db.example.com:3306/shop")
//!     .user("shop")
//!     .password("secret")
//!     .min_pool_size(2)
//!     .max_pool_size(10)
//!     .idle_timeout(Duration::from_secs(300))
//!     .build()?;
//!
//! let connector = TcpConnector::from_config(&config)?;
//! let pool = Pool::connect(config, connector).await?;
//!
//! let conn = pool.acquire(Duration::from_secs(5)).await?;
//! // ... use the connection ...
//! pool.release(conn).await;
//! # Ok(())
//! # }
//! ```

pub mod args;
pub mod backend;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod pool;
pub mod types;

pub use backend::{BackendConnector, TcpConnector};
pub use config::{create_default_config, load_config, PoolConfig, PoolConfigBuilder};
pub use error::{PoolError, PoolResult};
pub use pool::{ConnectionState, Pool, PoolGuard, PooledConnection};
pub use types::PoolStats;
