//! Handler for the `run` command.

use tokio::signal;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::app::{App, Config};
use crate::cli::RunArgs;
use crate::error::Result;

/// Execute the run command.
pub async fn execute(args: &RunArgs) -> Result<()> {
    let mut config = Config::load(&args.config)?;

    // Apply CLI overrides
    if let Some(ref level) = args.log_level {
        config.logging.level = level.clone();
    }
    if args.json_logs {
        config.logging.format = "json".to_string();
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    config.init_logging();
    info!(
        version = env!("CARGO_PKG_VERSION"),
        leverage = config.trading.leverage,
        whitelist = ?config.trading.token_whitelist,
        "tradebridge starting"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received"),
            Err(e) => warn!(error = %e, "Failed to listen for shutdown signal"),
        }
        shutdown_tx.send_replace(true);
    });

    App::run(config, shutdown_rx).await?;

    info!("tradebridge stopped");
    Ok(())
}
