use std::sync::Arc;

use tokio::sync::watch;
use tracing::{error, info, warn};

use avenger_core::Config;
use avenger_core::config::LoggingSettings;
use avenger_gateway::discord::{DiscordError, start_discord_bot};
use avenger_gateway::flush::{shutdown_flush, start_flush_runner};
use avenger_gateway::logging::init_tracing;
use avenger_gateway::render::init_fonts;
use avenger_gateway::server;
use avenger_gateway::shutdown::wait_for_shutdown_signal;
use avenger_gateway::state::AppState;
use avenger_ledger::LedgerStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    avenger_core::load_dotenv();

    // Logging comes up before config errors are reported so they reach the log
    let config = Config::load();
    let logging = config
        .as_ref()
        .map(|c| c.settings.logging.clone())
        .unwrap_or_else(|_| LoggingSettings::default());
    let _log_guard = init_tracing(&logging);

    let config = config.inspect_err(|e| error!("Failed to load configuration: {}", e))?;
    let settings = config.settings.clone();
    info!(
        "Configuration loaded (prefix: {}, ledger: {})",
        settings.bot.command_prefix,
        settings.ledger.path.display()
    );

    let ledger = Arc::new(LedgerStore::open(&settings.ledger.path));

    // The font scan blocks for a while on large font collections
    tokio::task::spawn_blocking(init_fonts).await?;
    info!("System font database initialized");

    let state = Arc::new(AppState::new(Arc::clone(&ledger), settings.clone()));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut client = start_discord_bot(config.discord_token(), Arc::clone(&state)).await?;
    let shard_manager = Arc::clone(&client.shard_manager);

    let server_task = if settings.keep_alive.enabled {
        let state = Arc::clone(&state);
        let bind_addr = settings.keep_alive_addr();
        let shutdown = shutdown_rx.clone();
        Some(tokio::spawn(async move {
            if let Err(e) = server::run(state, &bind_addr, shutdown).await {
                error!("Keep-alive server on {} failed: {}", bind_addr, e);
            }
        }))
    } else {
        info!("Keep-alive server disabled");
        None
    };

    let (flush_stop_tx, flush_stop_rx) = watch::channel(false);
    let flush_task = start_flush_runner(
        Arc::clone(&ledger),
        settings.flush_interval(),
        flush_stop_rx,
    );

    let mut client_task = tokio::spawn(async move { client.start().await });

    let outcome = tokio::select! {
        _ = wait_for_shutdown_signal() => {
            info!("Shutdown signal received");
            Ok(())
        }
        joined = &mut client_task => {
            let reason = match joined {
                Ok(Ok(())) => "connection closed".to_string(),
                Ok(Err(e)) => e.to_string(),
                Err(e) => e.to_string(),
            };
            error!("Discord client stopped: {}", reason);
            Err(DiscordError::ClientStopped(reason))
        }
    };

    info!("Shutting down bot...");
    // Persist first, then release the server, shards and client
    shutdown_flush(
        &ledger,
        &flush_stop_tx,
        flush_task,
        settings.shutdown_flush_timeout(),
    )
    .await;

    let _ = shutdown_tx.send(true);
    shard_manager.shutdown_all().await;
    client_task.abort();

    if let Some(task) = server_task
        && let Err(e) = task.await
    {
        warn!("Keep-alive server task ended abnormally: {}", e);
    }

    info!("Shutdown complete");
    outcome.map_err(Into::into)
}
