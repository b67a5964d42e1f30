//! Shared, read-only Supervisor state (§4.4).
//!
//! No connection pool is held here — §4.4 requires a fresh connection per
//! request, matching the store's "opened and closed per request"
//! discipline. `AppState` only carries the paths/config every handler
//! needs to open one.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone)]
pub struct AppState(pub Arc<Inner>);

pub struct Inner {
    pub db_path: PathBuf,
    pub asset_root: PathBuf,
    pub docker_socket: PathBuf,
}

/// Soft timeout for a container-runtime call before we give up and
/// return an "unavailable" placeholder (§5).
pub const DOCKER_SOFT_TIMEOUT: Duration = Duration::from_secs(5);
/// Hard timeout before the process is killed outright.
pub const DOCKER_HARD_TIMEOUT: Duration = Duration::from_secs(10);

impl AppState {
    #[must_use]
    pub fn new(db_path: PathBuf, asset_root: PathBuf, docker_socket: PathBuf) -> Self {
        Self(Arc::new(Inner { db_path, asset_root, docker_socket }))
    }
}
