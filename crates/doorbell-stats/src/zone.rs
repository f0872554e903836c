//! Display time zone for calendar bucketing.
//!
//! Times of day, weekdays, and streak dates are all computed in one
//! configured zone: the host's local zone, UTC, or a fixed offset.

use core::fmt;
use core::str::FromStr;

use chrono::{DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, Utc};

use crate::error::StatsError;

/// Seconds in one hour, for offset parsing.
const SECS_PER_HOUR: i32 = 3_600;

/// Seconds in one minute, for offset parsing.
const SECS_PER_MINUTE: i32 = 60;

/// The zone used to turn epoch timestamps into wall-clock values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayZone {
    /// The host's local zone, including daylight saving.
    #[default]
    Local,
    /// Coordinated Universal Time.
    Utc,
    /// A constant offset from UTC.
    Fixed(FixedOffset),
}

impl DisplayZone {
    /// Convert an epoch-millisecond timestamp to wall-clock date and time.
    ///
    /// # Errors
    ///
    /// Returns [`StatsError::TimestampOutOfRange`] if the timestamp cannot be
    /// represented.
    pub fn local_datetime(&self, timestamp_ms: i64) -> Result<NaiveDateTime, StatsError> {
        let utc = DateTime::<Utc>::from_timestamp_millis(timestamp_ms)
            .ok_or(StatsError::TimestampOutOfRange(timestamp_ms))?;
        Ok(match self {
            Self::Local => utc.with_timezone(&Local).naive_local(),
            Self::Utc => utc.naive_utc(),
            Self::Fixed(offset) => utc.with_timezone(offset).naive_local(),
        })
    }

    /// The calendar date of a timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`StatsError::TimestampOutOfRange`] if the timestamp cannot be
    /// represented.
    pub fn local_date(&self, timestamp_ms: i64) -> Result<NaiveDate, StatsError> {
        self.local_datetime(timestamp_ms).map(|dt| dt.date())
    }
}

impl FromStr for DisplayZone {
    type Err = StatsError;

    /// Accepts `local`, `utc` (or `z`), and offsets like `+02:00`, `-0700`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "local" => return Ok(Self::Local),
            "utc" | "z" => return Ok(Self::Utc),
            _ => {}
        }
        parse_offset(trimmed)
            .map(Self::Fixed)
            .ok_or_else(|| StatsError::InvalidZone(s.to_owned()))
    }
}

fn parse_offset(s: &str) -> Option<FixedOffset> {
    let (sign, rest) = match s.split_at_checked(1)? {
        ("+", rest) => (1, rest),
        ("-", rest) => (-1, rest),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits.get(..2)?.parse().ok()?;
    let minutes: i32 = digits.get(2..)?.parse().ok()?;
    if minutes >= 60 {
        return None;
    }
    let seconds = hours
        .checked_mul(SECS_PER_HOUR)?
        .checked_add(minutes.checked_mul(SECS_PER_MINUTE)?)?
        .checked_mul(sign)?;
    FixedOffset::east_opt(seconds)
}

impl fmt::Display for DisplayZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => f.write_str("local"),
            Self::Utc => f.write_str("UTC"),
            Self::Fixed(offset) => write!(f, "{offset}"),
        }
    }
}
