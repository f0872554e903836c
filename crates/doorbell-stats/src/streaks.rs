//! Consecutive-day open streaks.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use doorbell_types::{Event, EventType, StreakStats};

use crate::error::StatsError;
use crate::zone::DisplayZone;

/// Compute streaks of calendar days with at least one `OPEN`.
///
/// The current streak counts back from the day containing `now_ms` and is
/// zero unless the space opened today.
///
/// # Errors
///
/// Returns [`StatsError::TimestampOutOfRange`] if an event or `now_ms`
/// cannot be placed in the zone.
pub fn streak_stats(events: &[Event], zone: &DisplayZone, now_ms: i64) -> Result<StreakStats, StatsError> {
    let mut dates = BTreeSet::new();
    for event in events {
        if event.event_type == EventType::Open {
            dates.insert(zone.local_date(event.timestamp_ms)?);
        }
    }

    let today = zone.local_date(now_ms)?;
    let mut current_days = 0_u64;
    let mut check = Some(today);
    while let Some(date) = check.filter(|d| dates.contains(d)) {
        current_days = current_days.saturating_add(1);
        check = date.pred_opt();
    }

    Ok(StreakStats {
        current_days,
        longest_days: longest_run(&dates),
        total_days_open: u64::try_from(dates.len()).unwrap_or(u64::MAX),
    })
}

fn longest_run(dates: &BTreeSet<NaiveDate>) -> u64 {
    let mut longest = 0_u64;
    let mut run = 0_u64;
    let mut previous: Option<NaiveDate> = None;

    for date in dates {
        let consecutive = previous.and_then(|d| d.succ_opt()) == Some(*date);
        run = if consecutive { run.saturating_add(1) } else { 1 };
        longest = longest.max(run);
        previous = Some(*date);
    }
    longest
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use doorbell_types::{ActorId, EventId};

    use super::*;

    const DAY_MS: i64 = 86_400_000;

    const fn open(day: i64) -> Event {
        Event {
            id: EventId(day),
            timestamp_ms: day * DAY_MS + 3_600_000,
            event_type: EventType::Open,
            actor: ActorId::SYSTEM,
        }
    }

    #[test]
    fn current_and_longest_streaks() {
        // Days 1-3, then 6-7 with today = day 7.
        let events: Vec<Event> = [1, 2, 3, 6, 7].into_iter().map(open).collect();
        let stats = streak_stats(&events, &DisplayZone::Utc, 7 * DAY_MS + 5_000).unwrap();
        assert_eq!(stats.current_days, 2);
        assert_eq!(stats.longest_days, 3);
        assert_eq!(stats.total_days_open, 5);
    }

    #[test]
    fn no_open_today_means_no_current_streak() {
        let events: Vec<Event> = [1, 2].into_iter().map(open).collect();
        let stats = streak_stats(&events, &DisplayZone::Utc, 3 * DAY_MS).unwrap();
        assert_eq!(stats.current_days, 0);
        assert_eq!(stats.longest_days, 2);
    }

    #[test]
    fn several_opens_on_one_day_count_once() {
        let mut events = vec![open(4)];
        events.push(Event {
            timestamp_ms: 4 * DAY_MS + 7_200_000,
            ..open(4)
        });
        let stats = streak_stats(&events, &DisplayZone::Utc, 4 * DAY_MS).unwrap();
        assert_eq!(stats.total_days_open, 1);
        assert_eq!(stats.current_days, 1);
    }

    #[test]
    fn empty_log_is_zeroed() {
        let stats = streak_stats(&[], &DisplayZone::Utc, 0).unwrap();
        assert_eq!(stats, StreakStats::default());
    }
}
