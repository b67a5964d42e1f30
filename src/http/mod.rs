//! Supervisor HTTP API (§4.4, §6).
//!
//! A small read-mostly JSON surface over `Coordinator`, plus
//! container-runtime status and static asset serving. Built on
//! `axum`/`tokio`, grounded in the teacher pack's async HTTP stack
//! (`OpenAgentsInc-openagents`'s backend `Cargo.toml`).

mod agents;
mod docker;
mod error;
mod handlers;
mod static_files;
pub mod state;

use std::path::PathBuf;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub use state::AppState;

/// Build the Supervisor's router. Exposed separately from `serve` so
/// tests can drive it in-process via `tower::ServiceExt::oneshot`.
pub fn router(db_path: PathBuf, asset_root: PathBuf, docker_socket: PathBuf) -> Router {
    let state = AppState::new(db_path, asset_root, docker_socket);

    Router::new()
        .route("/api/tickets", get(handlers::list_tickets).post(handlers::create_ticket))
        .route("/api/tickets/:id", get(handlers::get_ticket))
        .route("/api/tickets/:id/comment", post(handlers::add_comment))
        .route("/api/tickets/:id/complete", post(handlers::complete_ticket))
        .route("/api/tickets/:id/update", post(handlers::update_ticket))
        .route("/api/activity", get(handlers::activity))
        .route("/api/agents", get(agents::list_agents))
        .route("/api/agents/:name/logs", get(agents::agent_logs))
        .route("/api/stats", get(handlers::stats))
        .fallback(static_files::serve)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve the Supervisor until ctrl-c, per §4.4's concurrent
/// request-handler model.
///
/// # Errors
///
/// Returns an error if the listener cannot bind or the server fails.
pub async fn serve(port: u16, db_path: PathBuf, asset_root: PathBuf, docker_socket: PathBuf) -> anyhow::Result<()> {
    let app = router(db_path, asset_root, docker_socket);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    tracing::info!(port, "supervisor listening");
    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
