use std::{env, sync::Arc, time::Duration};

use parking_lot::RwLock;
use telemetry_bridge_core::constants::{
    DEFAULT_MAX_ENTITIES_PER_TICK, DEFAULT_SCAN_RADIUS_TILES, DEFAULT_TARGET_MARKER,
};
use telemetry_bridge_core::ScanPolicy;

pub(crate) const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:8765/tick";
pub(crate) const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 350;
pub(crate) const DEFAULT_ACTION_BRIDGE_HOST: &str = "127.0.0.1";
pub(crate) const DEFAULT_ACTION_BRIDGE_PORT: u16 = 8766;
pub(crate) const DEFAULT_TICK_INTERVAL_MS: u64 = 600;
pub(crate) const CONNECT_TIMEOUT_SECS: u64 = 2;
pub(crate) const MAX_ACTION_BODY_BYTES: usize = 16 * 1024;

/// Every setting the bridge consumes. The whole value is swapped on reload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BridgeConfig {
    pub(crate) enabled: bool,
    pub(crate) endpoint: String,
    pub(crate) request_timeout_ms: u64,
    pub(crate) center_overlay_enabled: bool,
    pub(crate) overlay_only_attack_now: bool,
    pub(crate) action_bridge_enabled: bool,
    pub(crate) action_bridge_host: String,
    pub(crate) action_bridge_port: u16,
    pub(crate) action_auth_token: String,
    pub(crate) target_marker: String,
    pub(crate) scan_radius_tiles: i32,
    pub(crate) max_entities_per_tick: usize,
    pub(crate) tick_interval_ms: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            center_overlay_enabled: true,
            overlay_only_attack_now: true,
            action_bridge_enabled: false,
            action_bridge_host: DEFAULT_ACTION_BRIDGE_HOST.to_string(),
            action_bridge_port: DEFAULT_ACTION_BRIDGE_PORT,
            action_auth_token: String::new(),
            target_marker: DEFAULT_TARGET_MARKER.to_string(),
            scan_radius_tiles: DEFAULT_SCAN_RADIUS_TILES,
            max_entities_per_tick: DEFAULT_MAX_ENTITIES_PER_TICK,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
        }
    }
}

impl BridgeConfig {
    pub(crate) fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            enabled: read_env_bool("TELEMETRY_ENABLED", defaults.enabled),
            endpoint: read_env_string("TELEMETRY_ENDPOINT", &defaults.endpoint),
            request_timeout_ms: read_env_u64("TELEMETRY_TIMEOUT_MS", defaults.request_timeout_ms),
            center_overlay_enabled: read_env_bool(
                "CENTER_OVERLAY_ENABLED",
                defaults.center_overlay_enabled,
            ),
            overlay_only_attack_now: read_env_bool(
                "OVERLAY_ONLY_ATTACK_NOW",
                defaults.overlay_only_attack_now,
            ),
            action_bridge_enabled: read_env_bool(
                "ACTION_BRIDGE_ENABLED",
                defaults.action_bridge_enabled,
            ),
            action_bridge_host: read_env_string("ACTION_BRIDGE_HOST", &defaults.action_bridge_host),
            action_bridge_port: read_env_u16("ACTION_BRIDGE_PORT", defaults.action_bridge_port),
            action_auth_token: read_env_string("ACTION_AUTH_TOKEN", &defaults.action_auth_token),
            target_marker: read_env_string("TARGET_NAME_MARKER", &defaults.target_marker),
            scan_radius_tiles: read_env_u32("SCAN_RADIUS_TILES", defaults.scan_radius_tiles as u32)
                as i32,
            max_entities_per_tick: read_env_usize(
                "MAX_ENTITIES_PER_TICK",
                defaults.max_entities_per_tick,
            ),
            tick_interval_ms: read_env_u64("TICK_INTERVAL_MS", defaults.tick_interval_ms),
        }
    }

    pub(crate) fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Trimmed auth token, or `None` when auth is disabled.
    pub(crate) fn expected_token(&self) -> Option<String> {
        let trimmed = self.action_auth_token.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }

    pub(crate) fn bind_addr(&self) -> String {
        format!("{}:{}", self.action_bridge_host, self.action_bridge_port)
    }

    /// Falls back to the default policy when the configured values are unusable.
    pub(crate) fn scan_policy(&self) -> ScanPolicy {
        match ScanPolicy::new(
            &self.target_marker,
            self.scan_radius_tiles,
            self.max_entities_per_tick,
        ) {
            Ok(policy) => policy,
            Err(err) => {
                tracing::warn!("invalid scan policy ({err}); using defaults");
                ScanPolicy::default()
            }
        }
    }

    /// Keys whose values differ between `self` and `next`.
    pub(crate) fn changed_keys(&self, next: &BridgeConfig) -> Vec<ConfigKey> {
        let mut keys = Vec::new();
        if self.enabled != next.enabled {
            keys.push(ConfigKey::Enabled);
        }
        if self.endpoint != next.endpoint {
            keys.push(ConfigKey::Endpoint);
        }
        if self.request_timeout_ms != next.request_timeout_ms {
            keys.push(ConfigKey::RequestTimeout);
        }
        if self.center_overlay_enabled != next.center_overlay_enabled
            || self.overlay_only_attack_now != next.overlay_only_attack_now
        {
            keys.push(ConfigKey::Overlay);
        }
        if self.action_bridge_enabled != next.action_bridge_enabled {
            keys.push(ConfigKey::ActionBridgeEnabled);
        }
        if self.action_bridge_host != next.action_bridge_host {
            keys.push(ConfigKey::ActionBridgeHost);
        }
        if self.action_bridge_port != next.action_bridge_port {
            keys.push(ConfigKey::ActionBridgePort);
        }
        if self.action_auth_token != next.action_auth_token {
            keys.push(ConfigKey::ActionAuthToken);
        }
        if self.target_marker != next.target_marker
            || self.scan_radius_tiles != next.scan_radius_tiles
            || self.max_entities_per_tick != next.max_entities_per_tick
        {
            keys.push(ConfigKey::ScanPolicy);
        }
        if self.tick_interval_ms != next.tick_interval_ms {
            keys.push(ConfigKey::TickInterval);
        }
        keys
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ConfigKey {
    Enabled,
    Endpoint,
    RequestTimeout,
    Overlay,
    ActionBridgeEnabled,
    ActionBridgeHost,
    ActionBridgePort,
    ActionAuthToken,
    ScanPolicy,
    TickInterval,
}

impl ConfigKey {
    pub(crate) fn restarts_action_bridge(self) -> bool {
        matches!(
            self,
            Self::ActionBridgeEnabled
                | Self::ActionBridgeHost
                | Self::ActionBridgePort
                | Self::ActionAuthToken
        )
    }
}

/// Config readable from the tick loop, the worker and the handlers at once.
#[derive(Debug, Clone, Default)]
pub(crate) struct SharedConfig {
    inner: Arc<RwLock<BridgeConfig>>,
}

impl SharedConfig {
    pub(crate) fn new(config: BridgeConfig) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    pub(crate) fn snapshot(&self) -> BridgeConfig {
        self.inner.read().clone()
    }

    /// Swaps in `next` and returns the previous value.
    pub(crate) fn replace(&self, next: BridgeConfig) -> BridgeConfig {
        std::mem::replace(&mut *self.inner.write(), next)
    }
}

pub(crate) fn read_env_string(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

pub(crate) fn read_env_bool(name: &str, default: bool) -> bool {
    env::var(name)
        .ok()
        .and_then(|value| parse_bool(&value))
        .unwrap_or(default)
}

pub(crate) fn read_env_usize(name: &str, default: usize) -> usize {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<usize>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

pub(crate) fn read_env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

pub(crate) fn read_env_u32(name: &str, default: u32) -> u32 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<u32>().ok())
        .filter(|value| *value > 0 && *value <= i32::MAX as u32)
        .unwrap_or(default)
}

pub(crate) fn read_env_u16(name: &str, default: u16) -> u16 {
    env::var(name)
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(default)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
