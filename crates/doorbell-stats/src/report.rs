//! One-pass report generation with per-section failure isolation.
//!
//! The engine reads the event log and the reaction log once each, then runs
//! every metric over the loaded data. A metric that fails is logged, left at
//! its zeroed default, and recorded in [`Report::failed_sections`]; the rest
//! of the report is still produced.

use std::sync::Arc;

use doorbell_core::clock::Clock;
use doorbell_db::{EventStore, ReactionStore};
use doorbell_types::{ActorId, Event, ReactionRecord, Report, ReportSection};

use crate::day_of_week::day_of_week_stats;
use crate::error::StatsError;
use crate::reactions::reaction_stats;
use crate::sessions::{closed_session_stats, open_session_stats, total_open_ms};
use crate::streaks::streak_stats;
use crate::time_of_day::time_of_day_stats;
use crate::users::user_stats;
use crate::zone::DisplayZone;

/// Default leaderboard length.
pub const DEFAULT_TOP_N: usize = 5;

/// Builds [`Report`] snapshots from the stores.
#[derive(Clone)]
pub struct StatsEngine {
    events: EventStore,
    reactions: ReactionStore,
    clock: Arc<dyn Clock>,
    zone: DisplayZone,
    top_n: usize,
    system_actor: ActorId,
}

impl StatsEngine {
    /// Create an engine reading from `events` and `reactions`.
    pub fn new(events: EventStore, reactions: ReactionStore, clock: Arc<dyn Clock>) -> Self {
        Self {
            events,
            reactions,
            clock,
            zone: DisplayZone::default(),
            top_n: DEFAULT_TOP_N,
            system_actor: ActorId::SYSTEM,
        }
    }

    /// Bucket calendar statistics in `zone`.
    #[must_use]
    pub const fn with_zone(mut self, zone: DisplayZone) -> Self {
        self.zone = zone;
        self
    }

    /// Truncate every leaderboard to `top_n` entries.
    #[must_use]
    pub const fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    /// Exclude `actor` from the user leaderboards.
    #[must_use]
    pub const fn with_system_actor(mut self, actor: ActorId) -> Self {
        self.system_actor = actor;
        self
    }

    /// The clock used to timestamp reports.
    pub const fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Generate a full report.
    ///
    /// Never fails: storage errors and per-metric errors become zeroed
    /// sections listed in [`Report::failed_sections`].
    pub async fn generate(&self) -> Report {
        let now_ms = self.clock.now_ms();
        let events = self.load_events().await;
        let records = self.load_reactions().await;

        let mut failed = Vec::new();
        let zone = &self.zone;
        let log = events.as_deref().map_err(Clone::clone);
        let reaction_log = records.as_deref().map_err(Clone::clone);

        let open_sessions = isolate(
            ReportSection::OpenSessions,
            &mut failed,
            log.clone().map(|e| open_session_stats(e, now_ms)),
        );
        let closed_sessions = isolate(
            ReportSection::ClosedSessions,
            &mut failed,
            log.clone().map(closed_session_stats),
        );
        let time_of_day = isolate(
            ReportSection::TimeOfDay,
            &mut failed,
            log.clone().and_then(|e| time_of_day_stats(e, zone)),
        );
        let day_of_week = isolate(
            ReportSection::DayOfWeek,
            &mut failed,
            log.clone().and_then(|e| day_of_week_stats(e, zone)),
        );
        let users = isolate(
            ReportSection::Users,
            &mut failed,
            log.clone().map(|e| user_stats(e, self.system_actor, self.top_n)),
        );
        let streaks = isolate(
            ReportSection::Streaks,
            &mut failed,
            log.clone().and_then(|e| streak_stats(e, zone, now_ms)),
        );
        let reactions = isolate(
            ReportSection::Reactions,
            &mut failed,
            reaction_log.map(|r| reaction_stats(r, self.top_n)),
        );
        let total = isolate(
            ReportSection::GrandTotal,
            &mut failed,
            log.map(|e| total_open_ms(e, now_ms)),
        );

        tracing::info!(
            generated_at_ms = now_ms,
            events = events.as_ref().map_or(0, Vec::len),
            failed_sections = failed.len(),
            "Statistics report generated"
        );

        Report {
            generated_at_ms: now_ms,
            open_sessions,
            closed_sessions,
            time_of_day,
            day_of_week,
            users,
            streaks,
            reactions,
            total_open_ms: total,
            failed_sections: failed,
        }
    }

    async fn load_events(&self) -> Result<Vec<Event>, StatsError> {
        self.events.all().await.map_err(|e| {
            tracing::warn!(error = %e, "Failed to load events for statistics");
            StatsError::EventsUnavailable
        })
    }

    async fn load_reactions(&self) -> Result<Vec<ReactionRecord>, StatsError> {
        self.reactions.records().await.map_err(|e| {
            tracing::warn!(error = %e, "Failed to load reactions for statistics");
            StatsError::ReactionsUnavailable
        })
    }
}

impl std::fmt::Debug for StatsEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatsEngine")
            .field("zone", &self.zone)
            .field("top_n", &self.top_n)
            .field("system_actor", &self.system_actor)
            .finish_non_exhaustive()
    }
}

/// Unwrap a section result, substituting the zeroed value on failure.
fn isolate<T: Default>(
    section: ReportSection,
    failed: &mut Vec<ReportSection>,
    result: Result<T, StatsError>,
) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(section = ?section, error = %e, "Statistics section failed");
            failed.push(section);
            T::default()
        }
    }
}
