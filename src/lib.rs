//! Tracklog Server Library
//!
//! This library exposes the internal modules for testing and potential reuse.

pub mod config;
pub mod ledger;
pub mod provider;
pub mod server;
pub mod sqlite_persistence;
pub mod user;

// Re-export commonly used types for convenience
pub use ledger::{ReactionService, SqliteLedgerStore};
pub use provider::{IdentityProvider, MetadataProvider, SpotifyClient};
pub use server::{make_app, run_server, RequestsLoggingLevel, ServerConfig};
pub use user::{SqliteUserStore, UserStore};
