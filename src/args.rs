//! Command-line argument parsing for the pool daemon binary

use clap::Parser;

/// Command-line arguments for the pool daemon
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "dbpool.toml", env = "DBPOOL_CONFIG")]
    pub config: String,

    /// Interval between pool statistics log lines, in seconds
    #[arg(long, default_value = "30", env = "DBPOOL_STATS_INTERVAL")]
    pub stats_interval: u64,

    /// Number of worker threads (defaults to number of CPU cores)
    #[arg(short, long)]
    pub threads: Option<usize>,
}

impl Args {
    /// Get the stats interval as a Duration
    #[must_use]
    pub const fn stats_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.stats_interval)
    }
}
