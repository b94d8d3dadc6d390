//! Taskboard Server - HTTP API for the taskboard task tracker.
//!
//! This crate provides:
//! - REST endpoints for tasks and task dependencies under `/api`
//! - Bearer token authentication against configured users
//! - YAML configuration and storage selection
//!
//! The domain rules live in the `taskboard` crate; handlers translate
//! requests into service calls and errors into the response envelope.

#![forbid(unsafe_code)]

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod state;

use std::future::Future;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, TraceLayer};
use tracing::{Level, info, warn};

pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};
pub use state::AppState;

/// Run the server until `shutdown` resolves.
///
/// # Errors
///
/// Fails if the configuration is invalid, the storage cannot be opened or
/// the listener cannot be bound.
pub async fn run_with_shutdown<F>(config: ServerConfig, shutdown: F) -> anyhow::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = config.socket_addr()?;
    if config.users.is_empty() {
        warn!("No users configured; every authenticated route will answer 401");
    }

    let state = Arc::new(AppState::new(&config).await?);
    let app = create_router(state);

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "Taskboard server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Create the application router.
///
/// Every request runs in an `info` span carrying its method and URI, so
/// events logged while handling it, store failures included, name the
/// request they belong to.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api", api::routes())
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::new().level(Level::INFO)))
        .with_state(state)
}
