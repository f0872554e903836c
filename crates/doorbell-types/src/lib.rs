//! Shared type definitions for the Doorbell door status tracker.
//!
//! This crate is the single source of truth for the domain types used across
//! the workspace. It performs no I/O.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe `i64` wrappers for events, actors, and messages
//! - [`enums`] -- Event kinds and the space status sum type
//! - [`structs`] -- The persisted event and reaction records
//! - [`report`] -- Immutable statistics report snapshots

pub mod enums;
pub mod ids;
pub mod report;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{EventType, SpaceState, UnknownEventType};
pub use ids::{ActorId, EventId, MessageId};
pub use report::{
    ActorCount, DayOfWeekStats, HOURS_PER_DAY, MessageReactions, OperatingHours, ReactionStats,
    Report, ReportSection, SessionStats, StreakStats, TimeOfDayStats, UserStats, WeekdayActivity,
};
pub use structs::{Event, NewEvent, ReactionRecord};
