//! Activity by weekday.
//!
//! Every `OPEN` counts toward its weekday. A session's duration is credited
//! to the weekday of the `OPEN` that started it, once the matching `LOCK`
//! arrives; a session still in progress contributes nothing yet.

use chrono::{Datelike, Weekday};
use doorbell_types::{DayOfWeekStats, Event, EventType, WeekdayActivity};

use crate::error::StatsError;
use crate::zone::DisplayZone;

/// Compute weekday statistics in `zone`.
///
/// # Errors
///
/// Returns [`StatsError::TimestampOutOfRange`] if any event cannot be placed
/// in the zone.
pub fn day_of_week_stats(events: &[Event], zone: &DisplayZone) -> Result<DayOfWeekStats, StatsError> {
    let mut stats = DayOfWeekStats::default();
    let mut pending: Option<(i64, Weekday)> = None;

    for event in events {
        match event.event_type {
            EventType::Open => {
                let weekday = zone.local_datetime(event.timestamp_ms)?.weekday();
                if let Some(day) = day_mut(&mut stats, weekday) {
                    day.opens = day.opens.saturating_add(1);
                }
                pending = Some((event.timestamp_ms, weekday));
            }
            EventType::Lock => {
                if let Some((opened_at, weekday)) = pending.take() {
                    let duration = event.timestamp_ms.saturating_sub(opened_at);
                    if let Some(day) = day_mut(&mut stats, weekday) {
                        day.open_duration_ms = day.open_duration_ms.saturating_add(duration);
                    }
                }
            }
            _ => {}
        }
    }

    stats.busiest = busiest(&stats);
    Ok(stats)
}

fn day_mut(
    stats: &mut DayOfWeekStats,
    weekday: Weekday,
) -> Option<&mut WeekdayActivity> {
    stats.days.iter_mut().find(|d| d.weekday == weekday)
}

/// The weekday with the greatest positive cumulative duration; the earliest
/// weekday (Monday first) wins ties.
fn busiest(stats: &DayOfWeekStats) -> Option<Weekday> {
    let mut best: Option<(Weekday, i64)> = None;
    for day in &stats.days {
        if day.open_duration_ms <= 0 {
            continue;
        }
        match best {
            Some((_, top)) if top >= day.open_duration_ms => {}
            _ => best = Some((day.weekday, day.open_duration_ms)),
        }
    }
    best.map(|(weekday, _)| weekday)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use doorbell_types::{ActorId, EventId};

    use super::*;

    const HOUR_MS: i64 = 3_600_000;
    const DAY_MS: i64 = 24 * HOUR_MS;
    // 1970-01-05 was a Monday.
    const MONDAY: i64 = 4 * DAY_MS;

    const fn ev(id: i64, timestamp_ms: i64, event_type: EventType) -> Event {
        Event {
            id: EventId(id),
            timestamp_ms,
            event_type,
            actor: ActorId::SYSTEM,
        }
    }

    fn day(stats: &DayOfWeekStats, weekday: Weekday) -> (u64, i64) {
        let d = stats.days.iter().find(|d| d.weekday == weekday).unwrap();
        (d.opens, d.open_duration_ms)
    }

    #[test]
    fn durations_credit_the_opening_weekday() {
        let events = [
            // Monday 22:00 to Tuesday 02:00.
            ev(1, MONDAY + 22 * HOUR_MS, EventType::Open),
            ev(2, MONDAY + DAY_MS + 2 * HOUR_MS, EventType::Lock),
            // Wednesday, one hour.
            ev(3, MONDAY + 2 * DAY_MS + 9 * HOUR_MS, EventType::Open),
            ev(4, MONDAY + 2 * DAY_MS + 10 * HOUR_MS, EventType::Lock),
        ];
        let stats = day_of_week_stats(&events, &DisplayZone::Utc).unwrap();

        assert_eq!(day(&stats, Weekday::Mon), (1, 4 * HOUR_MS));
        assert_eq!(day(&stats, Weekday::Tue), (0, 0));
        assert_eq!(day(&stats, Weekday::Wed), (1, HOUR_MS));
        assert_eq!(stats.busiest, Some(Weekday::Mon));
    }

    #[test]
    fn unterminated_session_counts_open_but_no_duration() {
        let events = [ev(1, MONDAY, EventType::Open)];
        let stats = day_of_week_stats(&events, &DisplayZone::Utc).unwrap();
        assert_eq!(day(&stats, Weekday::Mon), (1, 0));
        assert_eq!(stats.busiest, None);
    }

    #[test]
    fn earliest_weekday_wins_ties() {
        let events = [
            // Friday, two hours.
            ev(1, MONDAY + 4 * DAY_MS, EventType::Open),
            ev(2, MONDAY + 4 * DAY_MS + 2 * HOUR_MS, EventType::Lock),
            // Tuesday, two hours.
            ev(3, MONDAY + 8 * DAY_MS, EventType::Open),
            ev(4, MONDAY + 8 * DAY_MS + 2 * HOUR_MS, EventType::Lock),
        ];
        let stats = day_of_week_stats(&events, &DisplayZone::Utc).unwrap();
        assert_eq!(stats.busiest, Some(Weekday::Tue));
    }

    #[test]
    fn empty_log_has_seven_zeroed_days() {
        let stats = day_of_week_stats(&[], &DisplayZone::Utc).unwrap();
        assert_eq!(stats, DayOfWeekStats::default());
    }
}
