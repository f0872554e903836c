//! When during the day the space opens and locks.
//!
//! Averages are plain arithmetic means of seconds since midnight, so a space
//! that closes around midnight averages to midday. That linear behaviour is
//! kept deliberately for continuity with existing reports.

use chrono::{NaiveTime, Timelike};
use doorbell_types::{Event, EventType, HOURS_PER_DAY, OperatingHours, TimeOfDayStats};

use crate::error::StatsError;
use crate::zone::DisplayZone;

/// Compute time-of-day statistics in `zone`.
///
/// # Errors
///
/// Returns [`StatsError::TimestampOutOfRange`] if any event cannot be placed
/// in the zone.
pub fn time_of_day_stats(events: &[Event], zone: &DisplayZone) -> Result<TimeOfDayStats, StatsError> {
    let mut open_secs = SecondsAccumulator::default();
    let mut lock_secs = SecondsAccumulator::default();
    let mut operating_hours = Vec::new();
    let mut hourly_opens = [0_u64; HOURS_PER_DAY];
    let mut opened_at: Option<NaiveTime> = None;

    for event in events {
        if !event.is_boundary() {
            continue;
        }
        let time = zone.local_datetime(event.timestamp_ms)?.time();

        if event.event_type == EventType::Open {
            open_secs.push(time);
            let hour = usize::try_from(time.hour()).unwrap_or(0);
            if let Some(bucket) = hourly_opens.get_mut(hour) {
                *bucket = bucket.saturating_add(1);
            }
            opened_at = Some(time);
        } else {
            lock_secs.push(time);
            if let Some(open) = opened_at.take() {
                operating_hours.push(OperatingHours {
                    opened_at: open,
                    closed_at: time,
                });
            }
        }
    }

    Ok(TimeOfDayStats {
        average_open: open_secs.mean(),
        average_lock: lock_secs.mean(),
        operating_hours,
        hourly_opens,
    })
}

#[derive(Debug, Default)]
struct SecondsAccumulator {
    total: u64,
    count: u64,
}

impl SecondsAccumulator {
    fn push(&mut self, time: NaiveTime) {
        self.total = self
            .total
            .saturating_add(u64::from(time.num_seconds_from_midnight()));
        self.count = self.count.saturating_add(1);
    }

    fn mean(&self) -> Option<NaiveTime> {
        let avg = self.total.checked_div(self.count)?;
        NaiveTime::from_num_seconds_from_midnight_opt(u32::try_from(avg).ok()?, 0)
    }
}
