//! Crate-wide error taxonomy.
//!
//! Every fallible operation in `Store`, `Coordinator`, and the recovery hook
//! returns [`Error`] so callers match on kind instead of parsing messages.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("{0} not found")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0} unavailable")]
    Unavailable(String),

    #[error(
        "schema version mismatch: store has {stored}, binary expects {expected}; run `tq migrate`"
    )]
    SchemaMismatch { stored: i64, expected: i64 },

    #[error("store busy: could not acquire write lock within timeout")]
    StoreBusy,

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Exit code the CLI should use for this error, per §4.3 of the design.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Validation(_) => 2,
            Self::NotFound(_)
            | Self::Conflict(_)
            | Self::Unavailable(_)
            | Self::StoreBusy
            | Self::SchemaMismatch { .. }
            | Self::Sqlite(_)
            | Self::Io(_) => 1,
        }
    }

    /// HTTP status code the Supervisor should use for this error, per §7.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Conflict(_) | Self::Validation(_) => 400,
            Self::Unavailable(_) => 503,
            Self::SchemaMismatch { .. } | Self::StoreBusy | Self::Sqlite(_) | Self::Io(_) => 500,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
