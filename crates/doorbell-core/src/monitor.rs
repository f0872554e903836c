//! The sensor monitor loop.
//!
//! Once per interval the monitor takes one raw sample, feeds it to the
//! [`Debouncer`], and forwards confirmed transitions to [`SpaceStatus`].
//! A failed read is logged and skipped. A storage failure while recording a
//! transition ends the loop with an error, since the log could no longer be
//! trusted to match the state.
//!
//! [`MonitorControl`] is shared between the loop and its owner (the engine
//! binary, the console) to request a stop and to inspect the latest reading.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::time::Duration;

use tokio::sync::Notify;

use crate::debounce::Debouncer;
use crate::sensor::SensorSource;
use crate::space::{SpaceError, SpaceStatus};

/// Errors that end the monitor loop.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// A confirmed transition could not be applied.
    #[error("failed to apply sensor transition: {0}")]
    Space(#[from] SpaceError),
}

const READING_UNKNOWN: u8 = 0;
const READING_OPEN: u8 = 1;
const READING_LOCKED: u8 = 2;

const fn encode(reading: Option<bool>) -> u8 {
    match reading {
        None => READING_UNKNOWN,
        Some(false) => READING_OPEN,
        Some(true) => READING_LOCKED,
    }
}

const fn decode(raw: u8) -> Option<bool> {
    match raw {
        READING_OPEN => Some(false),
        READING_LOCKED => Some(true),
        _ => None,
    }
}

/// Shared control and observation state for a running monitor.
#[derive(Debug, Default)]
pub struct MonitorControl {
    stop_requested: AtomicBool,
    stop_notify: Notify,
    last_reading: AtomicU8,
    last_stable: AtomicU8,
}

impl MonitorControl {
    /// Create a control block for a monitor that has not started.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the loop to exit after the current tick.
    pub fn request_stop(&self) {
        self.stop_requested.store(true, Ordering::Release);
        self.stop_notify.notify_one();
    }

    /// Whether a stop has been requested.
    pub fn is_stop_requested(&self) -> bool {
        self.stop_requested.load(Ordering::Acquire)
    }

    /// Resolve once a stop has been requested.
    async fn stopped(&self) {
        while !self.is_stop_requested() {
            self.stop_notify.notified().await;
        }
    }

    /// The most recent successful raw reading (`true` = locked).
    pub fn last_reading(&self) -> Option<bool> {
        decode(self.last_reading.load(Ordering::Acquire))
    }

    /// The most recent debounced transition forwarded to the state machine.
    pub fn last_stable(&self) -> Option<bool> {
        decode(self.last_stable.load(Ordering::Acquire))
    }

    fn record_reading(&self, reading: bool) {
        self.last_reading.store(encode(Some(reading)), Ordering::Release);
    }

    fn record_stable(&self, reading: bool) {
        self.last_stable.store(encode(Some(reading)), Ordering::Release);
    }
}

/// Counters describing a finished monitor run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorSummary {
    /// Ticks executed.
    pub ticks: u64,
    /// Ticks whose read failed.
    pub failed_reads: u64,
    /// Confirmed transitions forwarded to the state machine.
    pub transitions: u64,
}

/// Samples a sensor on a fixed interval and drives the state machine.
pub struct SensorMonitor<S> {
    sensor: S,
    debouncer: Debouncer,
    interval: Duration,
    space: Arc<SpaceStatus>,
    control: Arc<MonitorControl>,
    summary: MonitorSummary,
}

impl<S: SensorSource> SensorMonitor<S> {
    /// Create a monitor confirming readings after `threshold` ticks.
    pub fn new(
        sensor: S,
        threshold: u32,
        interval: Duration,
        space: Arc<SpaceStatus>,
        control: Arc<MonitorControl>,
    ) -> Self {
        Self {
            sensor,
            debouncer: Debouncer::new(threshold),
            interval,
            space,
            control,
            summary: MonitorSummary::default(),
        }
    }

    /// Start from a known locked-ness, normally the restored space state.
    ///
    /// Confirming the same reading then leaves the state machine alone, so
    /// an override set before the first confirmation survives until the
    /// door actually moves.
    #[must_use]
    pub fn with_initial_locked(mut self, locked: bool) -> Self {
        self.debouncer = Debouncer::new(self.debouncer.threshold()).seeded(locked);
        self
    }

    /// Run until a stop is requested.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Space`] if a transition cannot be recorded.
    pub async fn run(mut self) -> Result<MonitorSummary, MonitorError> {
        tracing::info!(
            threshold = self.debouncer.threshold(),
            interval_ms = u64::try_from(self.interval.as_millis()).unwrap_or(u64::MAX),
            "Door monitor started"
        );

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                () = self.control.stopped() => break,
            }
            if self.control.is_stop_requested() {
                break;
            }
            self.tick().await?;
        }

        tracing::info!(
            ticks = self.summary.ticks,
            failed_reads = self.summary.failed_reads,
            transitions = self.summary.transitions,
            "Door monitor stopped"
        );
        Ok(self.summary)
    }

    /// Take and process exactly one sample.
    ///
    /// # Errors
    ///
    /// Returns [`MonitorError::Space`] if a transition cannot be recorded.
    pub async fn tick(&mut self) -> Result<(), MonitorError> {
        self.summary.ticks = self.summary.ticks.saturating_add(1);

        let reading = match self.sensor.read_raw() {
            Ok(reading) => reading,
            Err(e) => {
                self.summary.failed_reads = self.summary.failed_reads.saturating_add(1);
                tracing::warn!(error = %e, "Sensor read failed, skipping tick");
                return Ok(());
            }
        };
        self.control.record_reading(reading);

        if let Some(locked) = self.debouncer.observe(reading) {
            tracing::info!(
                sensor = if locked { "LOCKED" } else { "OPEN" },
                "Door sensor confirmed state"
            );
            self.control.record_stable(locked);
            self.space.on_sensor_transition(locked).await?;
            self.summary.transitions = self.summary.transitions.saturating_add(1);
        }
        Ok(())
    }

    /// Counters so far.
    pub const fn summary(&self) -> MonitorSummary {
        self.summary
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use doorbell_db::Database;
    use doorbell_types::{ActorId, EventType, SpaceState};

    use super::*;
    use crate::clock::ManualClock;
    use crate::sensor::{ScriptedSensor, VirtualSensor};
    use crate::space::NoopNotifier;

    async fn space() -> (Database, Arc<SpaceStatus>) {
        let db = Database::connect_in_memory().await.unwrap();
        db.run_migrations().await.unwrap();
        let status = SpaceStatus::new(
            db.events(),
            Arc::new(ManualClock::new(0)),
            Arc::new(NoopNotifier),
        )
        .restore()
        .await
        .unwrap();
        (db, Arc::new(status))
    }

    #[tokio::test]
    async fn confirmed_open_reaches_the_state_machine() {
        let (db, space) = space().await;
        let sensor = ScriptedSensor::from_readings([false, false, false]);
        let mut monitor = SensorMonitor::new(
            sensor,
            3,
            Duration::from_millis(1),
            Arc::clone(&space),
            Arc::new(MonitorControl::new()),
        );

        monitor.tick().await.unwrap();
        monitor.tick().await.unwrap();
        assert_eq!(space.current_state().await, SpaceState::Locked);
        monitor.tick().await.unwrap();
        assert_eq!(space.current_state().await, SpaceState::Open);

        let events = db.events().all().await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events.first().map(|e| e.event_type), Some(EventType::Open));
        assert_eq!(monitor.summary().transitions, 1);
    }

    #[tokio::test]
    async fn failed_read_delays_confirmation_by_one_tick() {
        let (_db, space) = space().await;
        let sensor = ScriptedSensor::new([Some(false), None, Some(false), Some(false)]);
        let control = Arc::new(MonitorControl::new());
        let mut monitor =
            SensorMonitor::new(sensor, 3, Duration::from_millis(1), Arc::clone(&space), control);

        for _ in 0..3 {
            monitor.tick().await.unwrap();
        }
        assert_eq!(space.current_state().await, SpaceState::Locked);
        monitor.tick().await.unwrap();
        assert_eq!(space.current_state().await, SpaceState::Open);

        let summary = monitor.summary();
        assert_eq!(summary.ticks, 4);
        assert_eq!(summary.failed_reads, 1);
    }

    #[tokio::test]
    async fn first_confirmed_reading_matching_state_records_nothing() {
        let (db, space) = space().await;
        let control = Arc::new(MonitorControl::new());
        let mut monitor = SensorMonitor::new(
            ScriptedSensor::from_readings([true, true]),
            2,
            Duration::from_millis(1),
            Arc::clone(&space),
            Arc::clone(&control),
        );

        monitor.tick().await.unwrap();
        monitor.tick().await.unwrap();
        assert_eq!(db.events().count().await.unwrap(), 0);
        assert_eq!(control.last_stable(), Some(true));
        assert_eq!(control.last_reading(), Some(true));
    }

    #[tokio::test]
    async fn seeded_monitor_keeps_an_early_override() {
        let (db, space) = space().await;
        space.override_lock(ActorId(5)).await.unwrap();

        let mut monitor = SensorMonitor::new(
            ScriptedSensor::from_readings([true, true, false, false]),
            2,
            Duration::from_millis(1),
            Arc::clone(&space),
            Arc::new(MonitorControl::new()),
        )
        .with_initial_locked(space.is_locked().await);

        monitor.tick().await.unwrap();
        monitor.tick().await.unwrap();
        assert_eq!(space.current_state().await, SpaceState::LockedOverridden);
        assert_eq!(monitor.summary().transitions, 0);

        // The door really moves: the override is dropped without an event.
        monitor.tick().await.unwrap();
        monitor.tick().await.unwrap();
        assert_eq!(space.current_state().await, SpaceState::Locked);
        assert_eq!(monitor.summary().transitions, 1);

        let types: Vec<EventType> = db
            .events()
            .all()
            .await
            .unwrap()
            .iter()
            .map(|e| e.event_type)
            .collect();
        assert_eq!(types, vec![EventType::OverrideLock]);
    }

    #[tokio::test]
    async fn run_stops_on_request() {
        let (_db, space) = space().await;
        let sensor = VirtualSensor::new(false);
        let control = Arc::new(MonitorControl::new());
        let monitor = SensorMonitor::new(
            sensor.clone(),
            2,
            Duration::from_millis(1),
            Arc::clone(&space),
            Arc::clone(&control),
        );

        let handle = tokio::spawn(monitor.run());
        tokio::time::sleep(Duration::from_millis(50)).await;
        control.request_stop();

        let summary = handle.await.unwrap().unwrap();
        assert!(summary.ticks >= 2);
        assert_eq!(summary.transitions, 1);
        assert_eq!(space.current_state().await, SpaceState::Open);
    }

    #[tokio::test]
    async fn stop_before_start_runs_no_ticks() {
        let (_db, space) = space().await;
        let control = Arc::new(MonitorControl::new());
        control.request_stop();
        let monitor = SensorMonitor::new(
            ScriptedSensor::default(),
            1,
            Duration::from_millis(1),
            space,
            Arc::clone(&control),
        );
        let summary = monitor.run().await.unwrap();
        assert_eq!(summary.ticks, 0);
    }

    #[tokio::test]
    async fn storage_failure_ends_the_loop() {
        let (db, space) = space().await;
        db.close().await;
        let monitor = SensorMonitor::new(
            ScriptedSensor::from_readings([false]),
            1,
            Duration::from_millis(1),
            space,
            Arc::new(MonitorControl::new()),
        );
        assert!(matches!(monitor.run().await, Err(MonitorError::Space(_))));
    }
}
