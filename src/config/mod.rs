//! Pool configuration: types, defaults, loading, and validation

pub mod defaults;
pub mod loading;
pub mod types;
mod validation;

pub use loading::{create_default_config, load_config, ConfigFile};
pub use types::{PoolConfig, PoolConfigBuilder};
