mod auth;
mod bridge;
mod config;
mod executor;
mod handlers;
mod response;
mod server;
mod telemetry;
mod types;

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use clap::Parser;
use rand::{rngs::StdRng, SeedableRng};
use telemetry_bridge_core::overlay::DisplayCell;
use telemetry_bridge_core::sim::SimulatedWorld;
use telemetry_bridge_core::{InputDriver, Position};
use tokio::signal::unix::{signal, SignalKind};

use crate::bridge::TelemetryBridge;
use crate::config::{BridgeConfig, SharedConfig};
use crate::executor::ExecutorHandle;

const OVERLAY_POLL_MS: u64 = 100;
const NPC_SPREAD_TILES: i32 = 6;
const HOME_TILE: Position = Position::new(3200, 3200, 0);

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) executor: ExecutorHandle,
    pub(crate) display: Arc<DisplayCell>,
    pub(crate) expected_token: Option<String>,
}

/// Runs the bridge against a simulated world.
#[derive(Debug, Parser)]
#[command(name = "telemetry-bridge", version)]
struct Cli {
    /// Stop after this many ticks; 0 runs until Ctrl-C.
    #[arg(long, default_value_t = 0)]
    ticks: u64,

    /// Seed for the simulated world and the command executor.
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Hostile NPCs to keep in the world.
    #[arg(long, default_value_t = 6)]
    npcs: usize,
}

fn spawn_overlay_consumer(bridge: Arc<TelemetryBridge>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(OVERLAY_POLL_MS));
        let mut shown: Option<String> = None;
        loop {
            interval.tick().await;
            let text = bridge.overlay_text();
            if text != shown {
                match &text {
                    Some(text) => tracing::info!(overlay = %text, "center overlay"),
                    None => tracing::info!("center overlay cleared"),
                }
                shown = text;
            }
        }
    })
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::filter::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let config = BridgeConfig::from_env();
    let tick_interval = Duration::from_millis(config.tick_interval_ms);

    tracing::info!(
        "starting telemetry bridge: seed={} npcs={} tick_interval_ms={} action_bridge={}",
        cli.seed,
        cli.npcs,
        config.tick_interval_ms,
        if config.action_bridge_enabled {
            config.bind_addr()
        } else {
            "disabled".to_string()
        }
    );

    let world = Arc::new(SimulatedWorld::new(HOME_TILE, cli.seed));
    world.spawn_scorpions(cli.npcs, NPC_SPREAD_TILES);

    let bridge = Arc::new(TelemetryBridge::start_up(
        world.clone(),
        Some(world.clone() as Arc<dyn InputDriver>),
        SharedConfig::new(config),
        StdRng::seed_from_u64(cli.seed.wrapping_add(1)),
    ));
    let overlay = spawn_overlay_consumer(Arc::clone(&bridge));

    let mut hangup = signal(SignalKind::hangup()).context("failed to install SIGHUP handler")?;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut interval = tokio::time::interval(tick_interval);
    let mut ticks = 0u64;
    loop {
        tokio::select! {
            _ = interval.tick() => {
                world.advance_tick();
                if world.npc_count() == 0 {
                    world.spawn_scorpions(cli.npcs, NPC_SPREAD_TILES);
                }
                bridge.on_game_tick();

                ticks += 1;
                if cli.ticks > 0 && ticks >= cli.ticks {
                    tracing::info!(ticks, "tick limit reached");
                    break;
                }
            }
            _ = hangup.recv() => {
                tracing::info!("SIGHUP received; reloading configuration from environment");
                bridge.apply_config(BridgeConfig::from_env()).await;
            }
            result = &mut ctrl_c => {
                result.context("failed to listen for ctrl-c")?;
                tracing::info!("ctrl-c received");
                break;
            }
        }
    }

    overlay.abort();
    bridge.shut_down().await;
    Ok(())
}
