use std::sync::Arc;

use actix_web::{dev::ServerHandle, middleware, rt, web, App, HttpServer};
use anyhow::Context;
use telemetry_bridge_core::overlay::DisplayCell;

use crate::config::{BridgeConfig, MAX_ACTION_BODY_BYTES};
use crate::executor::ExecutorHandle;
use crate::handlers::{action, health, method_not_allowed};
use crate::AppState;

const ACTION_HTTP_WORKERS: usize = 2;

pub(crate) fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/action")
            .route(web::post().to(action))
            .default_service(web::to(method_not_allowed)),
    )
    .route("/health", web::get().to(health));
}

/// A running `/action` listener.
pub(crate) struct ActionServer {
    handle: ServerHandle,
    bind_addr: String,
}

impl ActionServer {
    pub(crate) fn start(
        config: &BridgeConfig,
        executor: ExecutorHandle,
        display: Arc<DisplayCell>,
    ) -> anyhow::Result<Self> {
        let bind_addr = config.bind_addr();
        let state = AppState {
            executor,
            display,
            expected_token: config.expected_token(),
        };

        let server = HttpServer::new(move || {
            App::new()
                .app_data(web::Data::new(state.clone()))
                .app_data(web::PayloadConfig::new(MAX_ACTION_BODY_BYTES))
                .wrap(middleware::Logger::default())
                .configure(configure_routes)
        })
        .workers(ACTION_HTTP_WORKERS)
        .disable_signals()
        .bind(&bind_addr)
        .with_context(|| format!("failed to bind action bridge on {bind_addr}"))?
        .run();

        let handle = server.handle();
        rt::spawn(async move {
            if let Err(err) = server.await {
                tracing::warn!("action bridge stopped with error: {err}");
            }
        });
        tracing::info!(bind_addr = %bind_addr, "action bridge listening");

        Ok(Self { handle, bind_addr })
    }

    pub(crate) fn bind_addr(&self) -> &str {
        &self.bind_addr
    }

    /// Stops accepting immediately; in-flight requests are not drained.
    /// Resolves once the server has shut down.
    pub(crate) async fn stop(self) {
        tracing::info!(bind_addr = %self.bind_addr, "action bridge stopping");
        self.handle.stop(false).await;
    }
}
