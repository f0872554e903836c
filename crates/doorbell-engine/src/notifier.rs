//! Transition notices written to the log.
//!
//! Stands in for a chat announcement: each accepted transition becomes one
//! structured log line with a human-readable summary.

use doorbell_core::display::format_duration;
use doorbell_core::space::{Notifier, TransitionNotice};
use doorbell_types::{ActorId, EventType};

/// Logs every accepted transition at `info`.
#[derive(Debug, Clone, Copy)]
pub struct LogNotifier {
    system_actor: ActorId,
}

impl LogNotifier {
    /// Treat events by `system_actor` as claimable.
    pub const fn new(system_actor: ActorId) -> Self {
        Self { system_actor }
    }
}

impl Notifier for LogNotifier {
    fn notify_transition(&self, notice: &TransitionNotice) {
        tracing::info!(
            event_id = %notice.event_id,
            event_type = %notice.event_type,
            actor = %notice.actor,
            timestamp_ms = notice.timestamp_ms,
            "{}",
            describe(notice, self.system_actor)
        );
    }
}

/// One-line summary of a transition.
pub fn describe(notice: &TransitionNotice, system_actor: ActorId) -> String {
    let headline = match notice.event_type {
        EventType::Open => "The space is now OPEN",
        EventType::Lock => "The space is now LOCKED",
        EventType::OverrideOpen => "The space has been declared OPEN",
        EventType::OverrideLock => "The space has been declared LOCKED",
        EventType::ClearOverride if notice.is_lock => "Override cleared, the space is LOCKED",
        EventType::ClearOverride => "Override cleared, the space is OPEN",
    };

    let mut line = String::from(headline);
    if notice.event_type.is_boundary()
        && let Some(prior) = notice.prior_duration_ms
    {
        let was = if notice.is_lock { "open" } else { "locked" };
        line.push_str(&format!(
            " after being {was} for {}",
            format_duration(prior, false)
        ));
    }
    if notice.actor == system_actor {
        line.push_str(&format!(" (claim with `claim {} <actor>`)", notice.event_id));
    }
    line
}
