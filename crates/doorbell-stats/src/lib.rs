//! Historical analytics for the Doorbell door status tracker.
//!
//! Every statistic is a pure function over the time-ordered event log. The
//! [`StatsEngine`] loads the logs once and assembles a [`Report`]; the
//! [`ReportCache`] keeps the latest report for a fixed TTL.
//!
//! [`Report`]: doorbell_types::Report
//!
//! # Modules
//!
//! - [`sessions`] -- Open and closed session lengths and the grand total
//! - [`time_of_day`] -- Average open and lock times, operating hours, heatmap
//! - [`day_of_week`] -- Activity per weekday and the busiest day
//! - [`users`] -- Per-actor leaderboards
//! - [`streaks`] -- Consecutive-day open streaks
//! - [`reactions`] -- Reaction leaderboards
//! - [`report`] -- Report assembly with per-section failure isolation
//! - [`cache`] -- TTL cache with single-flight regeneration
//! - [`zone`] -- Display time zone
//! - [`error`] -- Per-metric error type

pub mod cache;
pub mod day_of_week;
pub mod error;
pub mod reactions;
pub mod report;
pub mod sessions;
pub mod streaks;
pub mod time_of_day;
pub mod users;
pub mod zone;

pub use cache::{DEFAULT_TTL, ReportCache};
pub use error::StatsError;
pub use report::{DEFAULT_TOP_N, StatsEngine};
pub use zone::DisplayZone;
