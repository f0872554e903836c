//! Observer API server for the Doorbell door status tracker.
//!
//! A read-only Axum HTTP server exposing:
//!
//! - **Status** (`/api/status`): the current space state and latest event
//! - **Event log** (`/api/events`, `/api/events/{id}`): ordered range queries
//! - **Statistics** (`/api/stats`): the cached report as JSON
//! - **Liveness** (`/health`)
//!
//! The observer never issues transitions. Statistics are served from the
//! [`ReportCache`](doorbell_stats::ReportCache), so a burst of requests
//! costs at most one regeneration per TTL.

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;

// Re-export primary types for convenience.
pub use error::ObserverError;
pub use router::build_router;
pub use server::{ServerConfig, ServerError, start_server};
pub use state::AppState;
