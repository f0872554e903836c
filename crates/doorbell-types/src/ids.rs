//! Type-safe identifier wrappers around `i64`.
//!
//! Event ids are assigned by the event store (SQLite `INTEGER PRIMARY KEY`),
//! actor and message ids come from the chat platform. Wrapping them keeps a
//! message id from ever being passed where an actor is expected.

use serde::{Deserialize, Serialize};

/// Generates a newtype wrapper around `i64` with standard derives.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Return the inner `i64` value.
            pub const fn into_inner(self) -> i64 {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id! {
    /// Store-assigned, monotonically increasing identifier of an event.
    EventId
}

define_id! {
    /// Identifier of the human (or the system) that triggered an event.
    ActorId
}

define_id! {
    /// Identifier of a status message that collects reactions.
    MessageId
}

impl ActorId {
    /// The reserved actor for sensor-driven events with no human initiator.
    pub const SYSTEM: Self = Self(-1);

    /// Whether this actor equals the default system sentinel.
    pub const fn is_system(self) -> bool {
        self.0 == Self::SYSTEM.0
    }
}
