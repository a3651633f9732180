//! Centralized logging setup

/// Initialize logging to stdout
///
/// The log level comes from the `RUST_LOG` environment variable and
/// defaults to "info" when unset.
pub fn init_logging() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stdout)
        .init();
}
