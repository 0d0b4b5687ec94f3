//! Server execution logic.

use std::{future::Future, sync::Arc};

use axum::{
    Router,
    routing::{get, post},
};
use thiserror::Error;
use tokio::{net::TcpListener, sync::watch};
use tower_http::trace::TraceLayer;

use crate::config::ServerConfig;

use super::{
    handler::{get_zone_status, health_check, record_crowd_data, websocket_handler},
    scheduler::BroadcastScheduler,
    signal::shutdown_signal,
    state::AppState,
};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Serve(#[from] std::io::Error),
}

/// Live crowd-density server
///
/// Serves the WebSocket gateway on every configured path, the HTTP API, and
/// runs the broadcast scheduler until shutdown.
///
/// # Example
///
/// ```ignore
/// let server = Server::new(app_state, ServerConfig::default());
/// server.run().await?;
/// ```
pub struct Server {
    state: Arc<AppState>,
    config: ServerConfig,
}

impl Server {
    pub fn new(state: Arc<AppState>, config: ServerConfig) -> Self {
        Self { state, config }
    }

    pub fn router(&self) -> Router {
        let mut router = Router::new();
        for path in &self.config.ws_paths {
            router = router.route(path, get(websocket_handler));
        }

        router
            .route("/api/health", get(health_check))
            .route("/api/monitor/zones", get(get_zone_status))
            .route("/api/crowd-data", post(record_crowd_data))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Bind to the configured address and serve until Ctrl+C / SIGTERM
    pub async fn run(self) -> Result<(), ServerError> {
        let addr = self.config.bind_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;

        tracing::info!("Press Ctrl+C to shutdown gracefully");
        self.serve(listener, shutdown_signal()).await
    }

    /// Serve on an already bound listener until `shutdown` resolves
    ///
    /// The broadcast scheduler is stopped together with the HTTP server.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = self.router();
        let local_addr = listener.local_addr()?;
        tracing::info!("SitePulse server listening on {}", local_addr);
        for path in &self.config.ws_paths {
            tracing::info!("Live feed: ws://{}{}?token=<jwt>", local_addr, path);
        }

        let (stop_tx, stop_rx) = watch::channel(false);
        let scheduler = BroadcastScheduler::new(
            self.state.broadcast_zone_updates_usecase.clone(),
            self.config.broadcast_interval,
        );
        let scheduler_task = tokio::spawn(scheduler.run(stop_rx));

        let stop_on_shutdown = stop_tx.clone();
        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                shutdown.await;
                let _ = stop_on_shutdown.send(true);
            })
            .await;

        let _ = stop_tx.send(true);
        if let Err(e) = scheduler_task.await {
            tracing::error!("Broadcast scheduler panicked: {}", e);
        }
        tracing::info!("Server shutdown complete");

        result.map_err(ServerError::from)
    }
}
