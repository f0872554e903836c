//! Error types for statistics computation.
//!
//! A [`StatsError`] never aborts a report. The engine converts it into a
//! zeroed section and lists the section as failed.

/// Reasons a single statistic could not be computed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StatsError {
    /// The event log could not be read for this report.
    #[error("event log unavailable")]
    EventsUnavailable,

    /// The reaction log could not be read for this report.
    #[error("reaction log unavailable")]
    ReactionsUnavailable,

    /// A timestamp has no representation in the display time zone.
    #[error("timestamp {0} ms is out of range for the display time zone")]
    TimestampOutOfRange(i64),

    /// The configured display time zone is not recognised.
    #[error("invalid display time zone: {0:?}")]
    InvalidZone(String),
}
