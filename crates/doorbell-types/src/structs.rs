//! Core records: the persisted event and the reaction side log.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::enums::EventType;
use crate::ids::{ActorId, EventId, MessageId};

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// An entry in the append-only event log.
///
/// Immutable once written, except that `actor` may be claimed exactly once
/// while it still holds the system sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Store-assigned identifier; strictly increasing in append order.
    pub id: EventId,
    /// Wall-clock time of the transition in epoch milliseconds.
    pub timestamp_ms: i64,
    /// What happened.
    pub event_type: EventType,
    /// Who triggered it, or the system sentinel.
    pub actor: ActorId,
}

impl Event {
    /// Whether this event starts or ends a session.
    pub const fn is_boundary(&self) -> bool {
        self.event_type.is_boundary()
    }
}

/// An event that has not been assigned an id yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEvent {
    /// Wall-clock time of the transition in epoch milliseconds.
    pub timestamp_ms: i64,
    /// What happened.
    pub event_type: EventType,
    /// Who triggered it, or the system sentinel.
    pub actor: ActorId,
}

impl NewEvent {
    /// Build a new event.
    pub const fn new(timestamp_ms: i64, event_type: EventType, actor: ActorId) -> Self {
        Self {
            timestamp_ms,
            event_type,
            actor,
        }
    }

    /// Attach the id assigned by the store.
    pub const fn with_id(self, id: EventId) -> Event {
        Event {
            id,
            timestamp_ms: self.timestamp_ms,
            event_type: self.event_type,
            actor: self.actor,
        }
    }
}

// ---------------------------------------------------------------------------
// Reactions
// ---------------------------------------------------------------------------

/// A status message together with the set of actors who reacted to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionRecord {
    /// The message that collected the reactions.
    pub message_id: MessageId,
    /// Distinct reacting actors.
    pub reactors: BTreeSet<ActorId>,
}

impl ReactionRecord {
    /// Number of distinct reactors.
    pub fn reactor_count(&self) -> usize {
        self.reactors.len()
    }
}
