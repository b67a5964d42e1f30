//! Ticket coordination core: SQLite-backed store, business-rule
//! coordinator, orphan-recovery hook, CLI, and supervisor HTTP API.

pub mod cli;
pub mod coordinator;
pub mod discovery;
pub mod error;
pub mod http;
pub mod model;
pub mod recovery;
pub mod store;

pub use coordinator::Coordinator;
pub use error::{Error, Result};
pub use store::Store;
