//! Read-only HTTP query API over stored updates.
//!
//! Routes:
//! - `GET /`: health check
//! - `GET /updates?tool=&limit=`: updates sorted by date, newest first

mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::http::{Method, header};
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use releasewatch_shared::{ApiConfig, ReleaseWatchError, Result};
use releasewatch_storage::Storage;

pub use handlers::{UpdateView, UpdatesQuery};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<Storage>,
    /// Page size when `limit` is missing or invalid.
    pub default_limit: u32,
}

impl AppState {
    pub fn new(storage: Storage, config: &ApiConfig) -> Self {
        Self {
            storage: Arc::new(storage),
            default_limit: config.default_limit,
        }
    }
}

/// Build the API router with CORS and request tracing.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(handlers::health))
        .route(
            "/updates",
            get(handlers::list_updates)
                .options(handlers::options)
                .fallback(handlers::method_not_allowed),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the API on `bind` until Ctrl-C.
pub async fn serve(state: AppState, bind: &str) -> Result<()> {
    let addr: SocketAddr = bind
        .parse()
        .map_err(|e| ReleaseWatchError::config(format!("invalid bind address '{bind}': {e}")))?;

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ReleaseWatchError::Network(format!("failed to bind {addr}: {e}")))?;

    info!(%addr, "query API listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ReleaseWatchError::Network(format!("server error: {e}")))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}
