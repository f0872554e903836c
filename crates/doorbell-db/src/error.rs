//! Error types for the data layer.
//!
//! All storage failures surface as [`DbError`]. Absent rows are not errors:
//! lookups return `Option` and conditional updates return `bool`.

use doorbell_types::UnknownEventType;

/// Errors that can occur in the data layer.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    /// A `SQLite` operation failed.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] sqlx::Error),

    /// A schema migration failed.
    #[error("SQLite migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A persisted row held an event type this build does not know.
    #[error("Corrupt event row: {0}")]
    Decode(#[from] UnknownEventType),

    /// Creating the database directory failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}
