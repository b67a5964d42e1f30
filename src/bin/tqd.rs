//! `tqd` — the Supervisor HTTP daemon (§4.4).

use std::path::PathBuf;

use ticketq::discovery::resolve_store_path;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().json().with_env_filter(tracing_subscriber::EnvFilter::from_default_env()).with_target(false).init();

    let port: u16 = std::env::var("PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(3000);
    let env_override = std::env::var("TICKET_DB").ok();
    let cwd = std::env::current_dir()?;
    let db_path = resolve_store_path(None, env_override.as_deref(), &cwd);
    let asset_root = std::env::var("TICKET_ASSET_ROOT").map_or_else(
        |_| std::env::current_exe().ok().and_then(|p| p.parent().map(|p| p.join("static"))).unwrap_or_else(|| PathBuf::from("static")),
        PathBuf::from,
    );
    let docker_socket =
        std::env::var("TICKET_DOCKER_SOCKET").map_or_else(|_| PathBuf::from("/var/run/docker.sock"), PathBuf::from);

    tracing::info!(?db_path, ?asset_root, ?docker_socket, "supervisor starting");
    ticketq::http::serve(port, db_path, asset_root, docker_socket).await
}
