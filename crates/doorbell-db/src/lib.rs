//! Data layer for the Doorbell door status tracker (`SQLite`).
//!
//! One `SQLite` database in WAL mode holds the append-only event log and the
//! reaction side log. This crate owns the schema (embedded migrations) and
//! every query against it.
//!
//! # Architecture
//!
//! ```text
//! Space state machine --append--> EventStore <--CAS-- Claim resolver
//!                                     |
//! Statistics engine <----scan---------+
//!         ^
//!         +-------scan------- ReactionStore
//! ```
//!
//! # Modules
//!
//! - [`sqlite`] -- Connection pool, configuration, migrations
//! - [`event_store`] -- Append, range scans, and the conditional actor update
//! - [`reaction_store`] -- Message reactor sets as a join table
//! - [`error`] -- Shared error types

pub mod error;
pub mod event_store;
pub mod reaction_store;
pub mod sqlite;

// Re-export primary types for convenience.
pub use error::DbError;
pub use event_store::{EventRow, EventStore};
pub use reaction_store::ReactionStore;
pub use sqlite::{Database, Durability, SqliteConfig};
