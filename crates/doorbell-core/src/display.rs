//! Human-readable rendering of durations and times of day.

use std::fmt::Write as _;

use chrono::{NaiveTime, Timelike};

const DAY_MS: i64 = 86_400_000;
const HOUR_MS: i64 = 3_600_000;
const MINUTE_MS: i64 = 60_000;
const SECOND_MS: i64 = 1_000;

/// Render a millisecond duration as `"1 day, 2 hours, 5 seconds"`.
///
/// Zero-valued units are omitted. Leftover milliseconds are shown only when
/// `include_millis` is set. A duration that renders as nothing, including
/// any negative duration, becomes `"0 milliseconds"`.
pub fn format_duration(duration_ms: i64, include_millis: bool) -> String {
    let mut out = String::new();
    let mut remaining = duration_ms.max(0);

    for (unit_ms, name) in [
        (DAY_MS, "day"),
        (HOUR_MS, "hour"),
        (MINUTE_MS, "minute"),
        (SECOND_MS, "second"),
    ] {
        let value = remaining.checked_div(unit_ms).unwrap_or(0);
        if value > 0 {
            push_unit(&mut out, value, name);
            remaining = remaining.checked_rem(unit_ms).unwrap_or(0);
        }
    }

    if include_millis && remaining > 0 {
        push_unit(&mut out, remaining, "millisecond");
    }

    if out.is_empty() {
        out.push_str("0 milliseconds");
    }
    out
}

fn push_unit(out: &mut String, value: i64, name: &str) {
    if !out.is_empty() {
        out.push_str(", ");
    }
    let plural = if value == 1 { "" } else { "s" };
    let _ = write!(out, "{value} {name}{plural}");
}

/// Render a time of day on a 12-hour clock, e.g. `"9:05 AM"`.
pub fn format_time_of_day(time: NaiveTime) -> String {
    let (is_pm, hour) = time.hour12();
    let period = if is_pm { "PM" } else { "AM" };
    format!("{hour}:{:02} {period}", time.minute())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn units_are_joined_and_pluralised() {
        // 1 day + 2 hours + 5 seconds
        assert_eq!(format_duration(93_605_000, false), "1 day, 2 hours, 5 seconds");
    }

    #[test]
    fn millis_are_optional() {
        assert_eq!(format_duration(1_250, false), "1 second");
        assert_eq!(format_duration(1_250, true), "1 second, 250 milliseconds");
        assert_eq!(format_duration(1, true), "1 millisecond");
    }

    #[test]
    fn empty_duration_renders_zero() {
        assert_eq!(format_duration(0, false), "0 milliseconds");
        assert_eq!(format_duration(999, false), "0 milliseconds");
        assert_eq!(format_duration(-5_000, true), "0 milliseconds");
    }

    #[test]
    fn twelve_hour_clock() {
        let t = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap_or_default();
        assert_eq!(format_time_of_day(t(0, 0)), "12:00 AM");
        assert_eq!(format_time_of_day(t(9, 5)), "9:05 AM");
        assert_eq!(format_time_of_day(t(12, 30)), "12:30 PM");
        assert_eq!(format_time_of_day(t(23, 59)), "11:59 PM");
    }
}
