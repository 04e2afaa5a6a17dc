use std::time::Duration;

use parking_lot::RwLock;
use reqwest::{header::CONTENT_TYPE, Client, Url};
use telemetry_bridge_core::TickSnapshot;

use crate::config::CONNECT_TIMEOUT_SECS;

/// Fire-and-forget POST of per-tick snapshots.
///
/// The parsed endpoint is cached and re-derived whenever the configured
/// string changes; an unparseable endpoint disables export until fixed.
pub(crate) struct TelemetryExporter {
    client: Client,
    endpoint: RwLock<Option<Url>>,
}

impl TelemetryExporter {
    pub(crate) fn new(endpoint: &str) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .unwrap_or_else(|err| {
                tracing::warn!("telemetry client builder failed ({err}); using defaults");
                Client::new()
            });
        let exporter = Self {
            client,
            endpoint: RwLock::new(None),
        };
        exporter.refresh_endpoint(endpoint);
        exporter
    }

    pub(crate) fn refresh_endpoint(&self, endpoint: &str) {
        let parsed = match Url::parse(endpoint.trim()) {
            Ok(url) => Some(url),
            Err(err) => {
                tracing::warn!(endpoint, "invalid telemetry endpoint: {err}");
                None
            }
        };
        *self.endpoint.write() = parsed;
    }

    pub(crate) fn has_endpoint(&self) -> bool {
        self.endpoint.read().is_some()
    }

    /// Spawns the POST and returns immediately. Failures are only logged.
    pub(crate) fn export(&self, snapshot: &TickSnapshot, timeout: Duration) {
        let Some(url) = self.endpoint.read().clone() else {
            return;
        };
        let tick = snapshot.tick;
        let request = self
            .client
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(snapshot.to_json())
            .timeout(timeout);

        tokio::spawn(async move {
            match request.send().await {
                Ok(response) if !response.status().is_success() => {
                    tracing::debug!(tick, status = %response.status(), "telemetry rejected");
                }
                Ok(_) => {}
                Err(err) => tracing::debug!(tick, "telemetry send failed: {err}"),
            }
        });
    }
}
