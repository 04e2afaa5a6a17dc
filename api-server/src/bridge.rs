//! Lifecycle of the bridge: startup, the per-tick scan, config reloads and
//! shutdown.

use std::{sync::Arc, time::Duration};

use parking_lot::Mutex;
use rand::rngs::StdRng;
use telemetry_bridge_core::overlay::{DisplayCell, DisplayState};
use telemetry_bridge_core::{GameHost, InputDriver, TickSnapshot, WorldScanner};

use crate::config::{BridgeConfig, ConfigKey, SharedConfig};
use crate::executor::CommandExecutor;
use crate::server::ActionServer;
use crate::telemetry::TelemetryExporter;

// The stopped listener's socket can close just after its stop resolves.
const REBIND_ATTEMPTS: u32 = 5;
const REBIND_BACKOFF_MS: u64 = 20;

pub(crate) struct TelemetryBridge {
    host: Arc<dyn GameHost>,
    config: SharedConfig,
    display: Arc<DisplayCell>,
    exporter: TelemetryExporter,
    executor: CommandExecutor,
    action_server: Mutex<Option<ActionServer>>,
}

impl TelemetryBridge {
    pub(crate) fn start_up(
        host: Arc<dyn GameHost>,
        input: Option<Arc<dyn InputDriver>>,
        config: SharedConfig,
        rng: StdRng,
    ) -> Self {
        let current = config.snapshot();
        let executor = CommandExecutor::spawn(Arc::clone(&host), input, config.clone(), rng);
        let bridge = Self {
            host,
            exporter: TelemetryExporter::new(&current.endpoint),
            display: Arc::new(DisplayCell::new()),
            config,
            executor,
            action_server: Mutex::new(None),
        };
        if current.action_bridge_enabled {
            match bridge.start_action_server(&current) {
                Ok(server) => *bridge.action_server.lock() = Some(server),
                Err(err) => tracing::warn!("action bridge disabled: {err:#}"),
            }
        }
        tracing::info!(
            telemetry_enabled = current.enabled,
            endpoint = %current.endpoint,
            action_bridge_enabled = current.action_bridge_enabled,
            "telemetry bridge started"
        );
        bridge
    }

    pub(crate) async fn shut_down(&self) {
        let server = self.action_server.lock().take();
        if let Some(server) = server {
            server.stop().await;
        }
        self.executor.shutdown();
        self.display.clear();
        tracing::info!("telemetry bridge stopped");
    }

    /// Runs once per game tick. Never blocks: the export is spawned.
    pub(crate) fn on_game_tick(&self) {
        let config = self.config.snapshot();
        if !config.enabled || !self.host.is_logged_in() {
            self.display.clear();
            return;
        }
        let Some(player) = self.host.local_player() else {
            self.display.clear();
            return;
        };
        let Some(position) = player.position else {
            self.display.clear();
            return;
        };

        let scan = WorldScanner::new(config.scan_policy()).scan(&position, &self.host.npcs());
        self.display.publish(DisplayState::from_scan(&scan));

        if self.exporter.has_endpoint() {
            let snapshot = TickSnapshot::new(self.host.tick_count(), position, &player, &scan);
            self.exporter.export(&snapshot, config.request_timeout());
        }
    }

    /// Swaps in `next` and reacts to every setting that changed.
    pub(crate) async fn apply_config(&self, next: BridgeConfig) {
        let previous = self.config.replace(next.clone());
        let mut bridge_restarted = false;
        for key in previous.changed_keys(&next) {
            if key.restarts_action_bridge() {
                if bridge_restarted {
                    continue;
                }
                bridge_restarted = true;
            }
            self.on_config_changed(key, &next).await;
        }
    }

    pub(crate) async fn on_config_changed(&self, key: ConfigKey, config: &BridgeConfig) {
        tracing::debug!(?key, "config changed");
        match key {
            ConfigKey::Endpoint => self.exporter.refresh_endpoint(&config.endpoint),
            ConfigKey::TickInterval => {
                tracing::info!("tick interval changes apply after restart");
            }
            key if key.restarts_action_bridge() => self.restart_action_server(config).await,
            // Read fresh on every tick and every command.
            _ => {}
        }
    }

    /// Stops any running listener and starts a new one if the bridge is enabled.
    ///
    /// The old listener is fully stopped before the new one binds, so a
    /// reload that keeps the address can reuse the port.
    pub(crate) async fn restart_action_server(&self, config: &BridgeConfig) {
        let previous = self.action_server.lock().take();
        let mut attempts = 1;
        if let Some(server) = previous {
            if server.bind_addr() == config.bind_addr() {
                attempts = REBIND_ATTEMPTS;
            }
            server.stop().await;
        }
        if !config.action_bridge_enabled {
            return;
        }

        for attempt in 1..=attempts {
            match self.start_action_server(config) {
                Ok(server) => {
                    *self.action_server.lock() = Some(server);
                    return;
                }
                Err(err) if attempt < attempts => {
                    tracing::debug!(attempt, "action bridge rebind failed: {err:#}");
                    tokio::time::sleep(Duration::from_millis(REBIND_BACKOFF_MS)).await;
                }
                Err(err) => tracing::warn!("action bridge disabled: {err:#}"),
            }
        }
    }

    fn start_action_server(&self, config: &BridgeConfig) -> anyhow::Result<ActionServer> {
        ActionServer::start(config, self.executor.handle(), Arc::clone(&self.display))
    }

    #[cfg(test)]
    fn action_server_running(&self) -> bool {
        self.action_server.lock().is_some()
    }

    pub(crate) fn overlay_text(&self) -> Option<String> {
        let config = self.config.snapshot();
        if !config.center_overlay_enabled {
            return None;
        }
        self.display.load().center_overlay_text(
            config.scan_policy().marker(),
            config.overlay_only_attack_now,
        )
    }

    #[cfg(test)]
    fn display(&self) -> Arc<DisplayState> {
        self.display.load()
    }
}

#[cfg(test)]
mod tests {
    use std::net::TcpListener;

    use rand::SeedableRng;
    use telemetry_bridge_core::sim::SimulatedWorld;
    use telemetry_bridge_core::Position;

    use super::*;

    fn quiet_config() -> BridgeConfig {
        BridgeConfig {
            endpoint: String::new(),
            ..BridgeConfig::default()
        }
    }

    fn bridge_over(world: &Arc<SimulatedWorld>, config: BridgeConfig) -> TelemetryBridge {
        TelemetryBridge::start_up(
            world.clone(),
            Some(world.clone() as Arc<dyn InputDriver>),
            SharedConfig::new(config),
            StdRng::seed_from_u64(3),
        )
    }

    #[actix_web::test]
    async fn tick_publishes_scan_and_overlay() {
        let world = Arc::new(SimulatedWorld::new(Position::new(100, 100, 0), 1));
        world.spawn_npc(3024, Some("Scorpion"), Position::new(101, 101, 0), 3);
        world.spawn_npc(3024, Some("Scorpion"), Position::new(104, 100, 0), 3);
        let bridge = bridge_over(&world, quiet_config());

        bridge.on_game_tick();

        let display = bridge.display();
        assert_eq!(display.count, 2);
        assert_eq!(display.nearest_distance(), Some(1));
        assert_eq!(bridge.overlay_text().as_deref(), Some("ATTACK SCORPION"));
        bridge.shut_down().await;
    }

    #[actix_web::test]
    async fn overlay_settings_shape_text() {
        let world = Arc::new(SimulatedWorld::new(Position::new(100, 100, 0), 1));
        world.spawn_npc(3024, Some("Scorpion"), Position::new(104, 100, 0), 3);
        let bridge = bridge_over(&world, quiet_config());
        bridge.on_game_tick();
        assert_eq!(bridge.overlay_text(), None);

        bridge
            .apply_config(BridgeConfig {
                overlay_only_attack_now: false,
                ..quiet_config()
            })
            .await;
        assert_eq!(bridge.overlay_text().as_deref(), Some("SCORPION NEARBY (4)"));

        bridge
            .apply_config(BridgeConfig {
                overlay_only_attack_now: false,
                center_overlay_enabled: false,
                ..quiet_config()
            })
            .await;
        assert_eq!(bridge.overlay_text(), None);
        bridge.shut_down().await;
    }

    #[actix_web::test]
    async fn disabled_or_logged_out_clears_display() {
        let world = Arc::new(SimulatedWorld::new(Position::new(100, 100, 0), 1));
        world.spawn_npc(3024, Some("Scorpion"), Position::new(101, 100, 0), 3);
        let bridge = bridge_over(&world, quiet_config());

        bridge.on_game_tick();
        assert_eq!(bridge.display().count, 1);

        world.set_logged_in(false);
        bridge.on_game_tick();
        assert_eq!(*bridge.display(), DisplayState::default());

        world.set_logged_in(true);
        bridge.on_game_tick();
        assert_eq!(bridge.display().count, 1);

        bridge
            .apply_config(BridgeConfig {
                enabled: false,
                ..quiet_config()
            })
            .await;
        bridge.on_game_tick();
        assert_eq!(*bridge.display(), DisplayState::default());

        bridge.apply_config(quiet_config()).await;
        world.set_player_position(None);
        bridge.on_game_tick();
        assert_eq!(*bridge.display(), DisplayState::default());
        bridge.shut_down().await;
    }

    #[actix_web::test]
    async fn scan_policy_reload_applies_next_tick() {
        let world = Arc::new(SimulatedWorld::new(Position::new(100, 100, 0), 1));
        world.spawn_npc(3024, Some("Scorpion"), Position::new(110, 100, 0), 3);
        let bridge = bridge_over(&world, quiet_config());

        bridge.on_game_tick();
        assert_eq!(bridge.display().count, 1);

        bridge
            .apply_config(BridgeConfig {
                scan_radius_tiles: 5,
                ..quiet_config()
            })
            .await;
        bridge.on_game_tick();
        assert_eq!(bridge.display().count, 0);
        bridge.shut_down().await;
    }

    #[actix_web::test]
    async fn bridge_keys_restart_listener() {
        let world = Arc::new(SimulatedWorld::new(Position::new(100, 100, 0), 1));
        let bridge = bridge_over(&world, quiet_config());
        assert!(!bridge.action_server_running());

        let enabled = BridgeConfig {
            action_bridge_enabled: true,
            action_bridge_port: 0,
            ..quiet_config()
        };
        bridge.apply_config(enabled.clone()).await;
        assert!(bridge.action_server_running());

        bridge
            .apply_config(BridgeConfig {
                action_auth_token: "secret".to_string(),
                ..enabled.clone()
            })
            .await;
        assert!(bridge.action_server_running());

        bridge.apply_config(quiet_config()).await;
        assert!(!bridge.action_server_running());
        bridge.shut_down().await;
    }

    #[actix_web::test]
    async fn token_rotation_on_same_port_keeps_listener() {
        let port = {
            let free = TcpListener::bind("127.0.0.1:0").unwrap();
            free.local_addr().unwrap().port()
        };
        let enabled = BridgeConfig {
            action_bridge_enabled: true,
            action_bridge_port: port,
            ..quiet_config()
        };
        let world = Arc::new(SimulatedWorld::new(Position::new(100, 100, 0), 1));
        let bridge = bridge_over(&world, enabled.clone());
        assert!(bridge.action_server_running());

        bridge
            .apply_config(BridgeConfig {
                action_auth_token: "secret".to_string(),
                ..enabled
            })
            .await;
        assert!(bridge.action_server_running());

        let resp = reqwest::Client::new()
            .post(format!("http://127.0.0.1:{port}/action"))
            .body(r#"{"kind":"attack"}"#)
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), reqwest::StatusCode::UNAUTHORIZED);
        assert_eq!(resp.text().await.unwrap(), "invalid_action_token");
        bridge.shut_down().await;
    }

    #[actix_web::test]
    async fn unbindable_port_disables_listener_only() {
        let occupied = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = occupied.local_addr().unwrap().port();
        let world = Arc::new(SimulatedWorld::new(Position::new(100, 100, 0), 1));
        world.spawn_npc(3024, Some("Scorpion"), Position::new(101, 100, 0), 3);

        let bridge = bridge_over(
            &world,
            BridgeConfig {
                action_bridge_enabled: true,
                action_bridge_port: port,
                ..quiet_config()
            },
        );
        assert!(!bridge.action_server_running());

        bridge.on_game_tick();
        assert_eq!(bridge.display().count, 1);
        bridge.shut_down().await;
    }

    #[actix_web::test]
    async fn endpoint_reload_rederives_url() {
        let world = Arc::new(SimulatedWorld::new(Position::new(100, 100, 0), 1));
        let bridge = bridge_over(&world, quiet_config());
        assert!(!bridge.exporter.has_endpoint());

        bridge
            .apply_config(BridgeConfig {
                endpoint: "http://127.0.0.1:9/tick".to_string(),
                ..quiet_config()
            })
            .await;
        assert!(bridge.exporter.has_endpoint());
        bridge.shut_down().await;
    }
}
