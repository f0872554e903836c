//! Shared application state for the Observer API server.

use std::sync::Arc;

use doorbell_core::space::SpaceStatus;
use doorbell_db::EventStore;
use doorbell_stats::ReportCache;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor. Every
/// handle is read-only from the observer's point of view: it never issues
/// transitions and never regenerates reports outside the cache.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The live space status.
    pub space: Arc<SpaceStatus>,
    /// The event log.
    pub events: EventStore,
    /// The cached statistics report.
    pub reports: Arc<ReportCache>,
}

impl AppState {
    /// Bundle the handles the handlers read from.
    pub const fn new(space: Arc<SpaceStatus>, events: EventStore, reports: Arc<ReportCache>) -> Self {
        Self {
            space,
            events,
            reports,
        }
    }
}
