use std::net::SocketAddr;

use axum::routing::{get, patch};
use axum::Router;
use thiserror::Error;
use tokio::signal;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::api::handlers::{
    handle_create, handle_delete, handle_fallback, handle_health, handle_list,
    handle_route_not_found, handle_update,
};
use crate::api::state::AppState;
use crate::config::ServerConfig;
use crate::task::{StoreError, TaskStore};

pub const DEFAULT_LOG_FILTER: &str = "taskboard=info,tower_http=info";

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to open task store: {0}")]
    Store(#[from] StoreError),

    #[error("failed to bind {addr}: {reason}")]
    Bind { addr: SocketAddr, reason: String },

    #[error("server error: {0}")]
    Serve(String),
}

pub struct TaskServer {
    pub port: u16,
    pub state: AppState,
}

impl TaskServer {
    /// Opens the configured store. Fails before binding if it cannot be read.
    pub fn new(config: ServerConfig) -> Result<Self, ServerError> {
        let store = TaskStore::open(&config.store)?;
        Ok(Self {
            port: config.port,
            state: AppState::new(store, config.static_dir),
        })
    }

    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    pub async fn start(&self) -> Result<(), ServerError> {
        let app = self.router();
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        info!("Binding to {addr}");

        let server = axum::Server::try_bind(&addr).map_err(|err| ServerError::Bind {
            addr,
            reason: err.to_string(),
        })?;
        info!("Server is listening on port {}", self.port);

        server
            .serve(app.into_make_service())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|err| ServerError::Serve(err.to_string()))
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handle_health))
        .route(
            "/api/tasks",
            get(handle_list)
                .post(handle_create)
                .fallback(handle_route_not_found),
        )
        .route(
            "/api/tasks/:id",
            patch(handle_update)
                .delete(handle_delete)
                .fallback(handle_route_not_found),
        )
        .fallback(handle_fallback)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match signal::ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(err) => {
                warn!("Failed to install Ctrl+C handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(err) => {
                warn!("Failed to install terminate handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
