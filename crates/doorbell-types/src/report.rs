//! Statistics report snapshots.
//!
//! A [`Report`] is produced in one pass by the statistics engine and never
//! mutated afterwards. Every sub-report implements [`Default`] as its zeroed
//! form, which is what a section holds when its computation failed.

use chrono::{NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::ids::{ActorId, MessageId};

/// Number of hour buckets in the hourly heatmap.
pub const HOURS_PER_DAY: usize = 24;

/// Summary of a set of session durations, all in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionStats {
    /// Arithmetic mean.
    pub average_ms: f64,
    /// Middle value; mean of the two middle values for even counts.
    pub median_ms: f64,
    /// Population standard deviation.
    pub std_dev_ms: f64,
    /// Longest session.
    pub max_ms: i64,
    /// Shortest session.
    pub min_ms: i64,
    /// Number of sessions.
    pub count: u64,
    /// Sum of all sessions.
    pub total_ms: i64,
    /// When the longest session started, epoch milliseconds. The earliest
    /// one wins when several share the maximum.
    pub longest_started_at_ms: Option<i64>,
}

/// One open period: when the space opened and when it locked again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatingHours {
    /// Local time of day the space opened.
    pub opened_at: NaiveTime,
    /// Local time of day the space locked.
    pub closed_at: NaiveTime,
}

/// When during the day the space tends to open and lock.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TimeOfDayStats {
    /// Mean time of day of `OPEN` events.
    pub average_open: Option<NaiveTime>,
    /// Mean time of day of `LOCK` events.
    pub average_lock: Option<NaiveTime>,
    /// Every terminated open period, in chronological order.
    pub operating_hours: Vec<OperatingHours>,
    /// `OPEN` event counts by hour of day, index 0 is midnight.
    pub hourly_opens: [u64; HOURS_PER_DAY],
}

/// Open count and cumulative open duration for one weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekdayActivity {
    /// The weekday.
    pub weekday: Weekday,
    /// Number of `OPEN` events on this weekday.
    pub opens: u64,
    /// Cumulative duration of terminated sessions that started this weekday.
    pub open_duration_ms: i64,
}

/// Activity bucketed by the weekday of the opening event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayOfWeekStats {
    /// Seven entries, Monday first.
    pub days: Vec<WeekdayActivity>,
    /// Weekday with the greatest cumulative open duration.
    pub busiest: Option<Weekday>,
}

impl Default for DayOfWeekStats {
    fn default() -> Self {
        let days = [
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
            Weekday::Sun,
        ]
        .into_iter()
        .map(|weekday| WeekdayActivity {
            weekday,
            opens: 0,
            open_duration_ms: 0,
        })
        .collect();
        Self {
            days,
            busiest: None,
        }
    }
}

/// A ranked leaderboard entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActorCount {
    /// The actor.
    pub actor: ActorId,
    /// How many times they did the counted thing.
    pub count: u64,
}

/// Per-actor leaderboards, excluding the system sentinel.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserStats {
    /// Actors ranked by `OPEN` events triggered.
    pub opens: Vec<ActorCount>,
    /// Actors ranked by `LOCK` events triggered.
    pub locks: Vec<ActorCount>,
}

/// Consecutive-day open streaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StreakStats {
    /// Consecutive open days ending today; zero if not open today.
    pub current_days: u64,
    /// Longest run of consecutive open days ever.
    pub longest_days: u64,
    /// Distinct calendar days with at least one `OPEN`.
    pub total_days_open: u64,
}

/// A message ranked by the number of distinct reactors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageReactions {
    /// The message.
    pub message_id: MessageId,
    /// Number of distinct reactors.
    pub reactor_count: u64,
}

/// Reaction leaderboards.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReactionStats {
    /// Most reacted-to messages.
    pub top_messages: Vec<MessageReactions>,
    /// Actors with the most reactions across all messages.
    pub top_reactors: Vec<ActorCount>,
}

/// Names of the independently computed report sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportSection {
    /// Open session lengths.
    OpenSessions,
    /// Closed session lengths.
    ClosedSessions,
    /// Time-of-day averages, operating hours, heatmap.
    TimeOfDay,
    /// Weekday activity.
    DayOfWeek,
    /// Per-actor leaderboards.
    Users,
    /// Consecutive-day streaks.
    Streaks,
    /// Reaction leaderboards.
    Reactions,
    /// Total open time.
    GrandTotal,
}

/// An immutable snapshot of every statistic.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Report {
    /// When the snapshot was generated, epoch milliseconds.
    pub generated_at_ms: i64,
    /// Durations between each `OPEN` and the following `LOCK`.
    pub open_sessions: SessionStats,
    /// Durations between each `LOCK` and the following `OPEN`.
    pub closed_sessions: SessionStats,
    /// Time-of-day patterns.
    pub time_of_day: TimeOfDayStats,
    /// Weekday patterns.
    pub day_of_week: DayOfWeekStats,
    /// Per-actor leaderboards.
    pub users: UserStats,
    /// Streaks.
    pub streaks: StreakStats,
    /// Reaction leaderboards.
    pub reactions: ReactionStats,
    /// Total open time including any session still in progress.
    pub total_open_ms: i64,
    /// Sections that failed and hold zeroed values.
    pub failed_sections: Vec<ReportSection>,
}

impl Report {
    /// Whether every section was computed successfully.
    pub fn is_complete(&self) -> bool {
        self.failed_sections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_weekday_table_has_seven_zeroed_days() {
        let stats = DayOfWeekStats::default();
        assert_eq!(stats.days.len(), 7);
        assert!(stats.days.iter().all(|d| d.opens == 0 && d.open_duration_ms == 0));
        assert_eq!(stats.days.first().map(|d| d.weekday), Some(Weekday::Mon));
        assert!(stats.busiest.is_none());
    }

    #[test]
    fn default_report_is_complete() {
        let report = Report::default();
        assert!(report.is_complete());
        assert_eq!(report.time_of_day.hourly_opens, [0; HOURS_PER_DAY]);
    }

    #[test]
    fn section_names_are_snake_case() {
        let json = serde_json::to_string(&ReportSection::OpenSessions).unwrap_or_default();
        assert_eq!(json, "\"open_sessions\"");
    }
}
