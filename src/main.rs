//! Roulette Table Server
//!
//! Hosts one shared table over WebSocket until Ctrl-C.

use std::sync::Arc;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use roulette_table::{
    network::{GameServer, ServerConfig},
    VERSION,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install subscriber: {}", e))?;

    let config = ServerConfig::from_env();

    info!("Roulette Table Server v{}", VERSION);
    info!(
        "Round: {}s betting, {}s spinning, {}s result ({} ms ticks)",
        config.table.betting_ticks,
        config.table.spinning_ticks,
        config.table.result_ticks,
        config.tick_interval.as_millis()
    );
    info!(
        "Bets: {}..={} chips, starting balance {}",
        config.table.limits.min, config.table.limits.max, config.table.starting_balance
    );

    let server = Arc::new(GameServer::new(config));

    let signal_server = server.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Ctrl-C received, shutting down");
                signal_server.shutdown();
            }
            Err(e) => error!("Failed to listen for Ctrl-C: {}", e),
        }
    });

    server.run().await?;
    info!("Server stopped");
    Ok(())
}
