//! REST API endpoint handlers for the Observer server.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/health` | Liveness check |
//! | `GET` | `/api/status` | Current space state and latest event |
//! | `GET` | `/api/events` | Ordered event range (`type`, `from`, `to`, `limit`) |
//! | `GET` | `/api/events/{id}` | Single event |
//! | `GET` | `/api/stats` | Cached statistics report |
//! | `GET` | `/api/export.csv` | Whole event log as CSV |

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use doorbell_types::{Event, EventId, EventType};

use crate::error::ObserverError;
use crate::state::AppState;

/// Events returned when no `limit` is given.
const DEFAULT_EVENT_LIMIT: u32 = 100;

/// Upper bound on `limit`.
const MAX_EVENT_LIMIT: u32 = 1000;

// ---------------------------------------------------------------------------
// Query parameter structs
// ---------------------------------------------------------------------------

/// Query parameters for the `GET /api/events` endpoint.
#[derive(Debug, serde::Deserialize)]
pub struct EventsQuery {
    /// Restrict to one event type, e.g. `OPEN`.
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    /// Inclusive lower bound, epoch milliseconds.
    pub from: Option<i64>,
    /// Exclusive upper bound, epoch milliseconds.
    pub to: Option<i64>,
    /// Maximum number of events to return (default 100, at most 1000).
    pub limit: Option<u32>,
}

// ---------------------------------------------------------------------------
// GET /health
// ---------------------------------------------------------------------------

/// Liveness check.
pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ---------------------------------------------------------------------------
// GET /api/status
// ---------------------------------------------------------------------------

/// Current state, derived flags, and the most recent event.
pub async fn get_status(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let current = state.space.current_state().await;
    let last_event = state.events.latest(0).await?;

    Ok(Json(serde_json::json!({
        "state": current,
        "locked": current.is_locked(),
        "overridden": current.is_overridden(),
        "last_event": last_event,
    })))
}

// ---------------------------------------------------------------------------
// GET /api/events
// ---------------------------------------------------------------------------

/// Query the event log in `(timestamp, id)` order.
///
/// # Query Parameters
///
/// - `type`: one of `OPEN`, `LOCK`, `OVERRIDE_OPEN`, `OVERRIDE_LOCK`, `CLEAR_OVERRIDE`
/// - `from`, `to`: half-open millisecond range
/// - `limit`: number of events, earliest first
pub async fn list_events(
    State(state): State<Arc<AppState>>,
    Query(params): Query<EventsQuery>,
) -> Result<impl IntoResponse, ObserverError> {
    let event_type = params
        .event_type
        .as_deref()
        .map(str::parse::<EventType>)
        .transpose()
        .map_err(|e| ObserverError::InvalidQuery(e.to_string()))?;

    if let (Some(from), Some(to)) = (params.from, params.to)
        && from > to
    {
        return Err(ObserverError::InvalidQuery(format!(
            "from ({from}) is after to ({to})"
        )));
    }

    let limit = params.limit.unwrap_or(DEFAULT_EVENT_LIMIT).min(MAX_EVENT_LIMIT);
    let events = state
        .events
        .query_range_limited(event_type, params.from, params.to, limit)
        .await?;

    Ok(Json(serde_json::json!({
        "count": events.len(),
        "events": events,
    })))
}

// ---------------------------------------------------------------------------
// GET /api/events/{id}
// ---------------------------------------------------------------------------

/// Return one event by id.
pub async fn get_event(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ObserverError> {
    let id = id_str
        .parse::<i64>()
        .map(EventId::from)
        .map_err(|e| ObserverError::InvalidQuery(format!("{id_str}: {e}")))?;

    let event = state
        .events
        .get_by_id(id)
        .await?
        .ok_or_else(|| ObserverError::NotFound(format!("event {id}")))?;

    Ok(Json(event))
}

// ---------------------------------------------------------------------------
// GET /api/stats
// ---------------------------------------------------------------------------

/// Return the cached statistics report, regenerating it if stale.
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let report = state.reports.get().await;
    Ok(Json(serde_json::to_value(report.as_ref())?))
}

// ---------------------------------------------------------------------------
// GET /api/export.csv
// ---------------------------------------------------------------------------

/// Header row of the CSV export.
const CSV_HEADER: &str = "id,timestamp_ms,event_type,actor_id";

/// Export the whole event log as CSV, one row per event in log order.
pub async fn export_csv(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ObserverError> {
    let events = state.events.all().await?;
    tracing::debug!(events = events.len(), "Exporting event log as CSV");

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"doorbell_events.csv\"",
            ),
        ],
        events_to_csv(&events),
    ))
}

/// Render events as CSV. Every field is numeric or an event type name, so
/// nothing needs quoting.
pub fn events_to_csv(events: &[Event]) -> String {
    let mut csv = String::from(CSV_HEADER);
    csv.push('\n');
    for event in events {
        csv.push_str(&format!(
            "{},{},{},{}\n",
            event.id,
            event.timestamp_ms,
            event.event_type.as_str(),
            event.actor
        ));
    }
    csv
}
