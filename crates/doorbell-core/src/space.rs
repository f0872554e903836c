//! The authoritative space status state machine.
//!
//! [`SpaceStatus`] owns the single in-memory [`SpaceState`] of the process.
//! Sensor-driven transitions (from the monitor) and manual commands (from
//! the command layer) both funnel through one async mutex, which is held
//! across the event append. The new state is committed only after the append
//! succeeds, so a storage failure leaves the state exactly as it was.
//!
//! # Overrides
//!
//! A member can pin the space open or locked with an override. While an
//! override is active the next confirmed sensor transition does not change
//! the locked-ness; it only drops the override, silently, so the sensor is
//! followed again from then on.
//!
//! # Notifications
//!
//! Every accepted transition except that silent override drop produces a
//! [`TransitionNotice`] for the [`Notifier`], carrying the time since the
//! previous `OPEN`/`LOCK` boundary.

use std::sync::Arc;

use doorbell_db::{DbError, EventStore};
use doorbell_types::{ActorId, EventId, EventType, NewEvent, SpaceState};
use tokio::sync::Mutex;

use crate::clock::Clock;

/// Errors from state machine operations.
#[derive(Debug, thiserror::Error)]
pub enum SpaceError {
    /// The operation is not allowed from the current state.
    #[error("cannot {action} while the space is {state}")]
    IllegalState {
        /// What was attempted.
        action: &'static str,
        /// The state at the time.
        state: SpaceState,
    },

    /// The event could not be recorded; the state is unchanged.
    #[error("storage error: {0}")]
    Storage(#[from] DbError),
}

/// What the notifier hears about an accepted transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionNotice {
    /// Id of the recorded event, for claim affordances.
    pub event_id: EventId,
    /// The recorded event type.
    pub event_type: EventType,
    /// Who caused it, or the system sentinel.
    pub actor: ActorId,
    /// Event timestamp, epoch milliseconds.
    pub timestamp_ms: i64,
    /// Whether the space is locked after the transition.
    pub is_lock: bool,
    /// Milliseconds since the previous `OPEN`/`LOCK` event, `None` if this
    /// is the first one ever recorded.
    pub prior_duration_ms: Option<i64>,
}

/// Receives transition notices, e.g. to post a chat message.
///
/// Called while the state lock is held, so implementations must not call
/// back into [`SpaceStatus`].
pub trait Notifier: Send + Sync {
    /// Handle one accepted transition.
    fn notify_transition(&self, notice: &TransitionNotice);
}

/// A notifier that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify_transition(&self, _notice: &TransitionNotice) {}
}

/// The space status state machine.
pub struct SpaceStatus {
    state: Mutex<SpaceState>,
    events: EventStore,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
    system_actor: ActorId,
}

impl std::fmt::Debug for SpaceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpaceStatus")
            .field("system_actor", &self.system_actor)
            .finish_non_exhaustive()
    }
}

impl SpaceStatus {
    /// Create a state machine starting `LOCKED`.
    ///
    /// Call [`SpaceStatus::restore`] to start from the event log instead.
    pub fn new(events: EventStore, clock: Arc<dyn Clock>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            state: Mutex::new(SpaceState::Locked),
            events,
            clock,
            notifier,
            system_actor: ActorId::SYSTEM,
        }
    }

    /// Use a different actor id for sensor-driven events.
    #[must_use]
    pub const fn with_system_actor(mut self, system_actor: ActorId) -> Self {
        self.system_actor = system_actor;
        self
    }

    /// Reconstruct the state from the most recent event.
    ///
    /// An empty log, or a newest event implying locked, starts `LOCKED`;
    /// otherwise `OPEN`. A trailing `CLEAR_OVERRIDE` implies nothing by
    /// itself, so the newest `OPEN`/`LOCK` decides. Never starts overridden.
    ///
    /// # Errors
    ///
    /// Returns [`SpaceError::Storage`] if the log cannot be read.
    pub async fn restore(mut self) -> Result<Self, SpaceError> {
        let latest = self.events.latest(0).await?;
        let implied = match latest.and_then(|e| e.event_type.implied_locked()) {
            Some(locked) => Some(locked),
            None if latest.is_some() => self
                .events
                .latest_boundary()
                .await?
                .and_then(|e| e.event_type.implied_locked()),
            None => None,
        };

        let state = SpaceState::from_sensor(implied.unwrap_or(true));
        *self.state.get_mut() = state;

        tracing::info!(
            state = %state,
            last_event = ?latest.map(|e| e.id),
            "Initialized space state"
        );
        Ok(self)
    }

    /// The current state.
    pub async fn current_state(&self) -> SpaceState {
        *self.state.lock().await
    }

    /// Whether the space is currently locked (overridden or not).
    pub async fn is_locked(&self) -> bool {
        self.state.lock().await.is_locked()
    }

    /// The actor recorded for sensor-driven events.
    pub const fn system_actor(&self) -> ActorId {
        self.system_actor
    }

    /// Apply a debounced sensor transition.
    ///
    /// Returns the recorded event id, or `None` when nothing was recorded
    /// (an override was dropped, or the locked-ness already matched).
    ///
    /// # Errors
    ///
    /// Returns [`SpaceError::Storage`] if the event cannot be recorded.
    pub async fn on_sensor_transition(
        &self,
        sensor_locked: bool,
    ) -> Result<Option<EventId>, SpaceError> {
        let mut state = self.state.lock().await;
        tracing::debug!(stored = %*state, sensor_locked, "Sensor transition");

        if state.is_overridden() {
            let cleared = state.clear_override();
            tracing::info!(from = %*state, to = %cleared, "Sensor transition disengaged override");
            *state = cleared;
            return Ok(None);
        }

        if state.is_locked() == sensor_locked {
            tracing::debug!(state = %*state, "Sensor agrees with stored state");
            return Ok(None);
        }

        let next = SpaceState::from_sensor(sensor_locked);
        let id = self
            .commit(&mut state, next, next.boundary_event(), self.system_actor)
            .await?;
        Ok(Some(id))
    }

    /// Mark the space open on behalf of `actor`.
    ///
    /// Returns `false` if it is already open (overridden or not). From a
    /// locked state, including a lock override, moves to plain `OPEN`.
    ///
    /// # Errors
    ///
    /// Returns [`SpaceError::Storage`] if the event cannot be recorded.
    pub async fn manual_open(&self, actor: ActorId) -> Result<bool, SpaceError> {
        self.manual(actor, false).await
    }

    /// Mark the space locked on behalf of `actor`.
    ///
    /// Returns `false` if it is already locked (overridden or not). From an
    /// open state, including an open override, moves to plain `LOCKED`.
    ///
    /// # Errors
    ///
    /// Returns [`SpaceError::Storage`] if the event cannot be recorded.
    pub async fn manual_lock(&self, actor: ActorId) -> Result<bool, SpaceError> {
        self.manual(actor, true).await
    }

    async fn manual(&self, actor: ActorId, locked: bool) -> Result<bool, SpaceError> {
        let mut state = self.state.lock().await;

        if state.is_locked() == locked {
            tracing::info!(state = %*state, actor = %actor, "Ignoring redundant manual request");
            return Ok(false);
        }

        if state.is_overridden() {
            tracing::info!(state = %*state, actor = %actor, "Manual request clears override");
        }

        let next = SpaceState::from_sensor(locked);
        self.commit(&mut state, next, next.boundary_event(), actor)
            .await?;
        Ok(true)
    }

    /// Pin the space open. Legal only from exactly `OPEN`.
    ///
    /// # Errors
    ///
    /// Returns [`SpaceError::IllegalState`] from any other state, or
    /// [`SpaceError::Storage`] if the event cannot be recorded.
    pub async fn override_open(&self, actor: ActorId) -> Result<EventId, SpaceError> {
        self.engage_override(actor, false).await
    }

    /// Pin the space locked. Legal only from exactly `LOCKED`.
    ///
    /// # Errors
    ///
    /// Returns [`SpaceError::IllegalState`] from any other state, or
    /// [`SpaceError::Storage`] if the event cannot be recorded.
    pub async fn override_lock(&self, actor: ActorId) -> Result<EventId, SpaceError> {
        self.engage_override(actor, true).await
    }

    async fn engage_override(&self, actor: ActorId, locked: bool) -> Result<EventId, SpaceError> {
        let mut state = self.state.lock().await;

        let (next, event_type, action) = if locked {
            (state.engage_override(true), EventType::OverrideLock, "enable a lock override")
        } else {
            (state.engage_override(false), EventType::OverrideOpen, "enable an open override")
        };

        let Some(next) = next else {
            return Err(SpaceError::IllegalState {
                action,
                state: *state,
            });
        };

        tracing::info!(actor = %actor, override_state = %next, "Enabling override");
        self.commit(&mut state, next, event_type, actor).await
    }

    /// Drop an active override, following `sensor_locked` from now on.
    ///
    /// Returns `false` if no override is active.
    ///
    /// # Errors
    ///
    /// Returns [`SpaceError::Storage`] if the event cannot be recorded.
    pub async fn clear_override(
        &self,
        actor: ActorId,
        sensor_locked: bool,
    ) -> Result<bool, SpaceError> {
        let mut state = self.state.lock().await;

        if !state.is_overridden() {
            tracing::info!(actor = %actor, "No override to clear");
            return Ok(false);
        }

        tracing::info!(stored = %*state, sensor_locked, actor = %actor, "Clearing override");
        let next = SpaceState::from_sensor(sensor_locked);
        self.commit(&mut state, next, EventType::ClearOverride, actor)
            .await?;
        Ok(true)
    }

    /// Record `event_type`, then move to `next` and notify.
    async fn commit(
        &self,
        state: &mut SpaceState,
        next: SpaceState,
        event_type: EventType,
        actor: ActorId,
    ) -> Result<EventId, SpaceError> {
        let prior = self.events.latest_boundary().await?;
        let timestamp_ms = self.clock.now_ms();
        let event_id = self
            .events
            .append(&NewEvent::new(timestamp_ms, event_type, actor))
            .await?;

        tracing::info!(
            from = %*state,
            to = %next,
            event_id = %event_id,
            event_type = %event_type,
            actor = %actor,
            "Space state changed"
        );
        *state = next;

        let notice = TransitionNotice {
            event_id,
            event_type,
            actor,
            timestamp_ms,
            is_lock: next.is_locked(),
            prior_duration_ms: prior.map(|e| timestamp_ms.saturating_sub(e.timestamp_ms)),
        };
        self.notifier.notify_transition(&notice);

        Ok(event_id)
    }
}
