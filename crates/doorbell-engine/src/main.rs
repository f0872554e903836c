//! Doorbell binary.
//!
//! Wires the door sensor monitor, the space status state machine, the
//! operator console, the statistics cache, and the observer API together,
//! then runs until Ctrl-C or `quit`.
//!
//! # Startup Sequence
//!
//! 1. Load configuration from `doorbell-config.yaml` (or `DOORBELL_CONFIG`)
//! 2. Initialize structured logging (tracing)
//! 3. Open the event database and run migrations
//! 4. Restore the space status from the latest event
//! 5. Build the statistics cache and log a report summary
//! 6. Start the observer API (if enabled)
//! 7. Start the sensor monitor and, in virtual mode, the console
//! 8. Wait for Ctrl-C or `quit`, then stop everything and close the pool

mod console;
mod error;
mod notifier;

use std::io::BufRead as _;
use std::path::PathBuf;
use std::sync::Arc;

use doorbell_core::claim::ClaimResolver;
use doorbell_core::clock::{Clock, SystemClock};
use doorbell_core::config::{DoorbellConfig, LoggingConfig, SensorConfig, SensorMode};
use doorbell_core::display::{format_duration, format_time_of_day};
use doorbell_core::monitor::{MonitorControl, MonitorError, MonitorSummary, SensorMonitor};
use doorbell_core::sensor::{GpioValueSensor, SensorSource, VirtualSensor};
use doorbell_core::space::SpaceStatus;
use doorbell_db::Database;
use doorbell_observer::{AppState, ServerConfig};
use doorbell_stats::{DisplayZone, ReportCache, StatsEngine};
use doorbell_types::Report;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::console::Console;
use crate::error::EngineError;
use crate::notifier::LogNotifier;

/// Config file read when `DOORBELL_CONFIG` is unset.
const DEFAULT_CONFIG_PATH: &str = "doorbell-config.yaml";

/// Console lines buffered ahead of execution.
const CONSOLE_BACKLOG: usize = 16;

/// Application entry point.
///
/// # Errors
///
/// Returns an error if any initialization step fails or the monitor stops
/// on a storage error.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config()?;
    init_tracing(&config.logging);

    info!(
        sensor_mode = ?config.sensor.mode,
        debounce_ticks = config.sensor.debounce_ticks,
        poll_interval_ms = config.sensor.poll_interval_ms,
        observer_enabled = config.observer.enabled,
        "doorbell-engine starting"
    );

    run(config).await?;

    info!("doorbell-engine shutdown complete");
    Ok(())
}

#[allow(clippy::too_many_lines)]
async fn run(config: DoorbellConfig) -> Result<(), EngineError> {
    // Storage.
    let db = Database::connect(&config.storage.to_sqlite_config()).await?;
    db.run_migrations().await?;
    let event_count = db.events().count().await?;
    info!(events = event_count, "Event log opened");

    // Space status.
    let system_actor = config.space.system_actor();
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let space = SpaceStatus::new(
        db.events(),
        Arc::clone(&clock),
        Arc::new(LogNotifier::new(system_actor)),
    )
    .with_system_actor(system_actor)
    .restore()
    .await?;
    let space = Arc::new(space);
    info!(state = %space.current_state().await, "Space status restored");

    // Statistics.
    let zone: DisplayZone = config.statistics.time_zone.parse()?;
    let engine = StatsEngine::new(db.events(), db.reactions(), Arc::clone(&clock))
        .with_zone(zone)
        .with_top_n(config.statistics.top_n)
        .with_system_actor(system_actor);
    let reports = Arc::new(ReportCache::new(engine, config.statistics.cache_ttl()));
    log_report_summary(&*reports.get().await);

    // Observer API.
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let observer = if config.observer.enabled {
        let state = Arc::new(AppState::new(
            Arc::clone(&space),
            db.events(),
            Arc::clone(&reports),
        ));
        let server_config = ServerConfig {
            host: config.observer.host.clone(),
            port: config.observer.port,
        };
        let mut rx = shutdown_rx;
        Some(tokio::spawn(async move {
            let shutdown = async move {
                let _ = rx.wait_for(|stopped| *stopped).await;
            };
            doorbell_observer::start_server(&server_config, state, shutdown).await
        }))
    } else {
        info!("Observer API disabled");
        None
    };

    // Sensor monitor and console.
    let control = Arc::new(MonitorControl::new());
    let claims = ClaimResolver::new(db.events()).with_system_actor(system_actor);
    let restored_locked = space.is_locked().await;
    let (mut monitor, virtual_sensor) = match config.sensor.mode {
        SensorMode::Virtual => {
            let sensor = VirtualSensor::new(restored_locked);
            info!("Using virtual door sensor");
            let handle = spawn_monitor(
                sensor.clone(),
                restored_locked,
                &config.sensor,
                &space,
                &control,
            );
            (handle, Some(sensor))
        }
        SensorMode::Gpio => {
            let sensor = GpioValueSensor::new(&config.sensor.gpio_value_path)
                .locked_when_high(config.sensor.locked_when_high);
            info!(path = %config.sensor.gpio_value_path, "Using GPIO door sensor");
            let handle = spawn_monitor(sensor, restored_locked, &config.sensor, &space, &control);
            (handle, None)
        }
    };

    let console = Console::new(
        Arc::clone(&space),
        db.clone(),
        claims,
        Arc::clone(&reports),
        Arc::clone(&control),
        virtual_sensor,
    );
    let console_task = tokio::spawn(async move {
        if let Err(e) = console.run(spawn_stdin_reader()).await {
            tracing::error!(error = %e, "Console stopped");
        }
    });

    // Wait for Ctrl-C or for the monitor to stop on its own (console quit
    // or a storage failure).
    let finished = tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("Ctrl-C received, stopping");
            control.request_stop();
            (&mut monitor).await
        }
        joined = &mut monitor => joined,
    };
    let outcome = finished.map_err(|e| EngineError::Task {
        message: format!("monitor task failed: {e}"),
    })?;

    console_task.abort();
    let _ = shutdown_tx.send(true);
    let observer_outcome = join_observer(observer).await;
    db.close().await;

    let summary = outcome?;
    info!(
        ticks = summary.ticks,
        failed_reads = summary.failed_reads,
        transitions = summary.transitions,
        "Monitor finished"
    );
    observer_outcome
}

/// Wait for the observer task, if one was started, and fold its failure
/// into [`EngineError`].
async fn join_observer(
    handle: Option<JoinHandle<Result<(), doorbell_observer::ServerError>>>,
) -> Result<(), EngineError> {
    let Some(handle) = handle else {
        return Ok(());
    };
    let result = match handle.await {
        Ok(Ok(())) => return Ok(()),
        Ok(Err(e)) => Err(EngineError::Observer {
            message: e.to_string(),
        }),
        Err(e) => Err(EngineError::Task {
            message: format!("observer task failed: {e}"),
        }),
    };
    if let Err(e) = &result {
        tracing::error!(error = %e, "Observer stopped with an error");
    }
    result
}

/// Start the sampling loop for `sensor` on its own task, taking the
/// restored locked-ness as already reported.
fn spawn_monitor<S: SensorSource + 'static>(
    sensor: S,
    initially_locked: bool,
    config: &SensorConfig,
    space: &Arc<SpaceStatus>,
    control: &Arc<MonitorControl>,
) -> JoinHandle<Result<MonitorSummary, MonitorError>> {
    let monitor = SensorMonitor::new(
        sensor,
        config.debounce_ticks,
        config.poll_interval(),
        Arc::clone(space),
        Arc::clone(control),
    )
    .with_initial_locked(initially_locked);
    tokio::spawn(monitor.run())
}

/// Forward stdin lines to a channel from a detached thread.
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(CONSOLE_BACKLOG);
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Initialize the tracing subscriber. `RUST_LOG` wins over the configured
/// level.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Load configuration from `DOORBELL_CONFIG` or `doorbell-config.yaml`.
///
/// A missing file means defaults; `DATABASE_URL` applies either way.
fn load_config() -> Result<DoorbellConfig, EngineError> {
    let path = std::env::var_os("DOORBELL_CONFIG")
        .map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from);
    if path.exists() {
        Ok(DoorbellConfig::from_file(&path)?)
    } else {
        let mut config = DoorbellConfig::default();
        config.storage.apply_env_overrides();
        Ok(config)
    }
}

/// Log the headline numbers of a report.
fn log_report_summary(report: &Report) {
    let average_open = report.time_of_day.average_open.map(format_time_of_day);
    let average_lock = report.time_of_day.average_lock.map(format_time_of_day);
    #[allow(clippy::cast_possible_truncation)]
    let average_session_ms = report.open_sessions.average_ms as i64;
    info!(
        sessions = report.open_sessions.count,
        total_open = %format_duration(report.total_open_ms, false),
        average_session = %format_duration(average_session_ms, false),
        average_open = average_open.as_deref().unwrap_or("n/a"),
        average_lock = average_lock.as_deref().unwrap_or("n/a"),
        current_streak_days = report.streaks.current_days,
        failed_sections = report.failed_sections.len(),
        "Statistics report ready"
    );
}
