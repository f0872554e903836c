//! Enumeration types: event kinds and the space status state.
//!
//! [`SpaceState`] replaces a pair of `locked`/`overridden` booleans with a
//! sum type. Every transition is a function returning the next variant, so a
//! state that is neither open nor locked cannot be represented.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Error returned when a persisted event type name is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown event type: {0}")]
pub struct UnknownEventType(pub String);

/// The kind of a recorded event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    /// The space became open.
    Open,
    /// The space became locked.
    Lock,
    /// A member pinned the space as open, suppressing the sensor.
    OverrideOpen,
    /// A member pinned the space as locked, suppressing the sensor.
    OverrideLock,
    /// A member released an active override.
    ClearOverride,
}

impl EventType {
    /// All event types, in declaration order.
    pub const ALL: [Self; 5] = [
        Self::Open,
        Self::Lock,
        Self::OverrideOpen,
        Self::OverrideLock,
        Self::ClearOverride,
    ];

    /// The name used in the persisted event log.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Lock => "LOCK",
            Self::OverrideOpen => "OVERRIDE_OPEN",
            Self::OverrideLock => "OVERRIDE_LOCK",
            Self::ClearOverride => "CLEAR_OVERRIDE",
        }
    }

    /// Whether this event starts or ends a session (`OPEN` or `LOCK`).
    pub const fn is_boundary(self) -> bool {
        matches!(self, Self::Open | Self::Lock)
    }

    /// The locked-ness this event implies on its own, if any.
    ///
    /// `CLEAR_OVERRIDE` resolves to whatever the sensor read at the time,
    /// which is not recorded, so it implies nothing.
    pub const fn implied_locked(self) -> Option<bool> {
        match self {
            Self::Open | Self::OverrideOpen => Some(false),
            Self::Lock | Self::OverrideLock => Some(true),
            Self::ClearOverride => None,
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = UnknownEventType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "OPEN" => Ok(Self::Open),
            "LOCK" => Ok(Self::Lock),
            "OVERRIDE_OPEN" => Ok(Self::OverrideOpen),
            "OVERRIDE_LOCK" => Ok(Self::OverrideLock),
            "CLEAR_OVERRIDE" => Ok(Self::ClearOverride),
            other => Err(UnknownEventType(other.to_owned())),
        }
    }
}

/// The authoritative status of the space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SpaceState {
    /// Open, following the sensor.
    Open,
    /// Locked, following the sensor.
    Locked,
    /// Declared open by a member; sensor transitions are suppressed.
    OpenOverridden,
    /// Declared locked by a member; sensor transitions are suppressed.
    LockedOverridden,
}

impl SpaceState {
    /// The non-overridden state matching a sensor reading.
    pub const fn from_sensor(locked: bool) -> Self {
        if locked { Self::Locked } else { Self::Open }
    }

    /// Whether the space is locked (overridden or not).
    pub const fn is_locked(self) -> bool {
        matches!(self, Self::Locked | Self::LockedOverridden)
    }

    /// Whether a manual override is active.
    pub const fn is_overridden(self) -> bool {
        matches!(self, Self::OpenOverridden | Self::LockedOverridden)
    }

    /// Drop the override, keeping the current locked-ness.
    pub const fn clear_override(self) -> Self {
        Self::from_sensor(self.is_locked())
    }

    /// Engage an override pinning the given locked-ness.
    ///
    /// Returns `None` unless the current state is exactly the matching
    /// non-overridden state (`Open` for an open override, `Locked` for a
    /// lock override).
    pub const fn engage_override(self, locked: bool) -> Option<Self> {
        match (self, locked) {
            (Self::Open, false) => Some(Self::OpenOverridden),
            (Self::Locked, true) => Some(Self::LockedOverridden),
            _ => None,
        }
    }

    /// The event type recorded when entering this state through a manual
    /// or sensor transition.
    pub const fn boundary_event(self) -> EventType {
        if self.is_locked() {
            EventType::Lock
        } else {
            EventType::Open
        }
    }
}

impl fmt::Display for SpaceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Open => "OPEN",
            Self::Locked => "LOCKED",
            Self::OpenOverridden => "OPEN_OVERRIDDEN",
            Self::LockedOverridden => "LOCKED_OVERRIDDEN",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_type_names_roundtrip() {
        for event_type in EventType::ALL {
            assert_eq!(event_type.as_str().parse::<EventType>(), Ok(event_type));
        }
        assert!("UNLOCK".parse::<EventType>().is_err());
    }

    #[test]
    fn override_only_from_matching_state() {
        assert_eq!(
            SpaceState::Open.engage_override(false),
            Some(SpaceState::OpenOverridden)
        );
        assert_eq!(
            SpaceState::Locked.engage_override(true),
            Some(SpaceState::LockedOverridden)
        );
        assert_eq!(SpaceState::Locked.engage_override(false), None);
        assert_eq!(SpaceState::Open.engage_override(true), None);
        assert_eq!(SpaceState::OpenOverridden.engage_override(false), None);
    }

    #[test]
    fn clearing_keeps_lockedness() {
        assert_eq!(SpaceState::OpenOverridden.clear_override(), SpaceState::Open);
        assert_eq!(
            SpaceState::LockedOverridden.clear_override(),
            SpaceState::Locked
        );
        assert_eq!(SpaceState::Open.clear_override(), SpaceState::Open);
    }

    #[test]
    fn overridden_states_keep_lockedness() {
        assert!(SpaceState::LockedOverridden.is_locked());
        assert!(!SpaceState::OpenOverridden.is_locked());
        assert!(SpaceState::OpenOverridden.is_overridden());
        assert!(!SpaceState::Locked.is_overridden());
    }

    #[test]
    fn serde_uses_screaming_case() {
        let json = serde_json::to_string(&EventType::OverrideOpen).unwrap_or_default();
        assert_eq!(json, "\"OVERRIDE_OPEN\"");
        let json = serde_json::to_string(&SpaceState::LockedOverridden).unwrap_or_default();
        assert_eq!(json, "\"LOCKED_OVERRIDDEN\"");
    }
}
