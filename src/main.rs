//! Crash Game Server
//!
//! Entry point: initializes logging, derives the round seed, spawns
//! the engine task, and runs the WebSocket server until ctrl-c.

use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use crash_game::core::rng::derive_round_seed;
use crash_game::game::engine::spawn_engine;
use crash_game::network::server::{GameServer, ServerConfig};
use crash_game::{CRASHED_PAUSE_SECS, FLYING_TICK_RATE, VERSION, WAITING_COUNTDOWN_SECS};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("Crash Server v{}", VERSION);
    info!(
        "Round cycle: {}s countdown, {} Hz flight, {}s crash pause",
        WAITING_COUNTDOWN_SECS, FLYING_TICK_RATE, CRASHED_PAUSE_SECS
    );

    // Seed the round series from process entropy and log it so a run's
    // crash points can be replayed offline.
    let entropy = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("System clock before Unix epoch")?
        .as_nanos()
        .to_le_bytes();
    let seed = derive_round_seed(&entropy);
    info!("Round seed: {}", hex::encode(seed.to_le_bytes()));

    let mut config = ServerConfig::default();
    if let Ok(port) = std::env::var("PORT") {
        let port: u16 = port.parse().context("Invalid PORT value")?;
        config.bind_addr.set_port(port);
    }

    let (engine, engine_task) = spawn_engine(seed);
    let server = GameServer::new(config, engine.clone());

    tokio::select! {
        result = server.run() => {
            result.context("Server error")?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupt received, shutting down");
            server.shutdown();
        }
    }

    engine.shutdown().await;
    engine_task.await.context("Engine task panicked")?;

    Ok(())
}
