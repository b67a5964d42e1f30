//! Store path resolution (§4.3, §9).
//!
//! Resolution order: explicit flag > `TICKET_DB` env var > first ancestor
//! directory containing the well-known store subpath > cwd default. The
//! ancestor walk is implemented as a pure function over a starting
//! directory so it can be tested without touching the real filesystem
//! layout of the process.

use std::path::{Path, PathBuf};

/// Relative path of the store file within a project, once one has been
/// initialized. Mirrors the layout used by the out-of-scope project
/// scaffolding step.
pub const STORE_SUBPATH: &str = ".swarm/tickets/tickets.db";

/// Walk from `start` up through its ancestors looking for `STORE_SUBPATH`.
/// Returns the first match, or `None` if no ancestor has it.
#[must_use]
pub fn find_ancestor_store(start: &Path) -> Option<PathBuf> {
    let mut dir = start.to_path_buf();
    loop {
        let candidate = dir.join(STORE_SUBPATH);
        if candidate.is_file() {
            return Some(candidate);
        }
        if !dir.pop() {
            return None;
        }
    }
}

/// Resolve the store path given an explicit CLI flag, an environment
/// override, and the current working directory.
///
/// Pure with respect to `cwd`; callers pass `std::env::current_dir()`.
#[must_use]
pub fn resolve_store_path(explicit: Option<&str>, env_override: Option<&str>, cwd: &Path) -> PathBuf {
    if let Some(p) = explicit {
        return PathBuf::from(p);
    }
    if let Some(p) = env_override {
        return PathBuf::from(p);
    }
    find_ancestor_store(cwd).unwrap_or_else(|| PathBuf::from("./tickets.db"))
}
