use anyhow::Result;
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};

use dbpool::args::Args;
use dbpool::{create_default_config, load_config, Pool, TcpConnector};

fn main() -> Result<()> {
    dbpool::logging::init_logging();

    let args = Args::parse();

    let num_cpus = std::thread::available_parallelism()
        .map(|p| p.get())
        .unwrap_or(1);
    let worker_threads = args.threads.unwrap_or(num_cpus);

    if worker_threads == 1 {
        info!("Starting pool daemon with single-threaded runtime");
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        rt.block_on(run_daemon(args))
    } else {
        info!(
            "Starting pool daemon with {} worker threads (detected {} CPUs)",
            worker_threads, num_cpus
        );
        let rt = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(worker_threads)
            .enable_all()
            .build()?;
        rt.block_on(run_daemon(args))
    }
}

async fn run_daemon(args: Args) -> Result<()> {
    let config = if std::path::Path::new(&args.config).exists() {
        match load_config(&args.config) {
            Ok(config) => config,
            Err(e) => {
                error!("Failed to load config file '{}': {}", args.config, e);
                error!("Please check your config file syntax and try again");
                return Err(e);
            }
        }
    } else {
        warn!(
            "Config file '{}' not found, creating default config",
            args.config
        );
        let default_config = create_default_config();
        let config_toml = toml::to_string_pretty(&default_config)?;
        std::fs::write(&args.config, &config_toml)?;
        info!("Created default config file: {}", args.config);
        default_config
    };

    info!(
        "Pooling {} connections to {} ({}..{} connections)",
        config.driver,
        config.url,
        config.min_pool_size,
        config.max_pool_size
    );

    let connector = TcpConnector::from_config(&config)?;
    let pool = Pool::connect(config, connector).await?;

    let stats_pool = pool.clone();
    let stats_interval = args.stats_interval();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(stats_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            if stats_pool.is_closed() {
                break;
            }
            info!("pool stats: {}", stats_pool.stats());
        }
    });

    shutdown_signal().await;
    info!("Shutdown signal received, closing pool...");
    pool.close().await;
    info!("Graceful shutdown complete");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
