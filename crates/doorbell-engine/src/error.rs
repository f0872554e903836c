//! Error types for the Doorbell binary.
//!
//! [`EngineError`] is the top-level error type that wraps all possible
//! failure modes during startup, monitoring, and shutdown.

/// Top-level error for the Doorbell binary.
///
/// Each variant wraps a specific subsystem error, providing a single
/// error type that `main` can propagate with `?`.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: doorbell_core::config::ConfigError,
    },

    /// The event database could not be opened or migrated.
    #[error("database error: {source}")]
    Database {
        /// The underlying database error.
        #[from]
        source: doorbell_db::DbError,
    },

    /// A command or restore could not be applied to the space status.
    #[error("space error: {source}")]
    Space {
        /// The underlying state machine error.
        #[from]
        source: doorbell_core::space::SpaceError,
    },

    /// The sensor monitor stopped with an error.
    #[error("monitor error: {source}")]
    Monitor {
        /// The underlying monitor error.
        #[from]
        source: doorbell_core::monitor::MonitorError,
    },

    /// The statistics configuration is unusable.
    #[error("statistics error: {source}")]
    Stats {
        /// The underlying statistics error.
        #[from]
        source: doorbell_stats::StatsError,
    },

    /// Waiting for a signal or reading the console failed.
    #[error("I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Observer API server failed.
    #[error("observer error: {message}")]
    Observer {
        /// Description of the observer failure.
        message: String,
    },

    /// A background task panicked or was cancelled.
    #[error("task error: {message}")]
    Task {
        /// Description of the task failure.
        message: String,
    },
}
