//! Open and closed session lengths.
//!
//! An open session runs from an `OPEN` to the next `LOCK`; a closed session
//! from a `LOCK` to the next `OPEN`. Override events are ignored. When the
//! same boundary repeats, the later one starts the session. An open session
//! still in progress is measured up to `now`.

use doorbell_types::{Event, EventType, SessionStats};

/// One session: when it started and how long it lasted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    /// Start of the session, epoch milliseconds.
    pub started_at_ms: i64,
    /// Length of the session.
    pub duration_ms: i64,
}

impl Period {
    const fn between(start_ms: i64, end_ms: i64) -> Self {
        Self {
            started_at_ms: start_ms,
            duration_ms: end_ms.saturating_sub(start_ms),
        }
    }
}

/// Every open session, including one still in progress.
pub fn open_periods(events: &[Event], now_ms: i64) -> Vec<Period> {
    let mut periods = Vec::new();
    let mut opened_at: Option<i64> = None;

    for event in events {
        match event.event_type {
            EventType::Open => opened_at = Some(event.timestamp_ms),
            EventType::Lock => {
                if let Some(start) = opened_at.take() {
                    periods.push(Period::between(start, event.timestamp_ms));
                }
            }
            _ => {}
        }
    }

    if let Some(start) = opened_at {
        periods.push(Period::between(start, now_ms));
    }
    periods
}

/// Every terminated closed session.
pub fn closed_periods(events: &[Event]) -> Vec<Period> {
    let mut periods = Vec::new();
    let mut locked_at: Option<i64> = None;

    for event in events {
        match event.event_type {
            EventType::Lock => locked_at = Some(event.timestamp_ms),
            EventType::Open => {
                if let Some(start) = locked_at.take() {
                    periods.push(Period::between(start, event.timestamp_ms));
                }
            }
            _ => {}
        }
    }
    periods
}

/// Durations of every open session, including one still in progress.
pub fn open_durations(events: &[Event], now_ms: i64) -> Vec<i64> {
    open_periods(events, now_ms)
        .iter()
        .map(|p| p.duration_ms)
        .collect()
}

/// Durations of every terminated closed session.
pub fn closed_durations(events: &[Event]) -> Vec<i64> {
    closed_periods(events).iter().map(|p| p.duration_ms).collect()
}

/// Summarise sessions, remembering when the longest one started.
pub fn summarize_periods(periods: &[Period]) -> SessionStats {
    // Strictly greater keeps the earliest of equally long sessions.
    let longest = periods.iter().fold(None::<&Period>, |best, p| match best {
        Some(b) if b.duration_ms >= p.duration_ms => Some(b),
        _ => Some(p),
    });
    SessionStats {
        longest_started_at_ms: longest.map(|p| p.started_at_ms),
        ..summarize(periods.iter().map(|p| p.duration_ms).collect())
    }
}

/// Summarise a set of durations.
///
/// Returns the zeroed summary for an empty set. Start times are unknown
/// here; see [`summarize_periods`].
pub fn summarize(mut durations: Vec<i64>) -> SessionStats {
    if durations.is_empty() {
        return SessionStats::default();
    }
    durations.sort_unstable();

    let count = durations.len();
    let total_ms = durations.iter().fold(0_i64, |acc, d| acc.saturating_add(*d));
    let n = count as f64;
    let average_ms = total_ms as f64 / n;

    let mid = count / 2;
    let median_ms = if count % 2 == 0 {
        let lower = durations.get(mid.saturating_sub(1)).copied().unwrap_or(0);
        let upper = durations.get(mid).copied().unwrap_or(0);
        (lower as f64 + upper as f64) / 2.0
    } else {
        durations.get(mid).copied().unwrap_or(0) as f64
    };

    let variance = durations
        .iter()
        .map(|d| {
            let delta = *d as f64 - average_ms;
            delta * delta
        })
        .sum::<f64>()
        / n;

    SessionStats {
        average_ms,
        median_ms,
        std_dev_ms: variance.sqrt(),
        max_ms: durations.last().copied().unwrap_or(0),
        min_ms: durations.first().copied().unwrap_or(0),
        count: u64::try_from(count).unwrap_or(u64::MAX),
        total_ms,
        longest_started_at_ms: None,
    }
}

/// Summary of open sessions.
pub fn open_session_stats(events: &[Event], now_ms: i64) -> SessionStats {
    summarize_periods(&open_periods(events, now_ms))
}

/// Summary of closed sessions.
pub fn closed_session_stats(events: &[Event]) -> SessionStats {
    summarize_periods(&closed_periods(events))
}

/// Total time the space has been open, including a session in progress.
pub fn total_open_ms(events: &[Event], now_ms: i64) -> i64 {
    open_durations(events, now_ms)
        .into_iter()
        .fold(0, i64::saturating_add)
}
