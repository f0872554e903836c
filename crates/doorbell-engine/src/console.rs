//! Line-oriented operator console.
//!
//! Stands in for a chat command layer. Each line is one [`Command`]; replies
//! are written to the log. Lines arrive over a channel, so the blocking stdin
//! reader lives on its own thread and never holds up shutdown.
//!
//! In virtual sensor mode, `lock` and `unlock` move the simulated door so
//! the debouncer and state machine can be exercised on a bench.
//!
//! `track` and `react` feed the reaction side log that the statistics
//! report ranks, and `backup` writes a copy of the database.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use doorbell_core::claim::ClaimResolver;
use doorbell_core::display::{format_duration, format_time_of_day};
use doorbell_core::monitor::MonitorControl;
use doorbell_core::sensor::VirtualSensor;
use doorbell_core::space::{SpaceError, SpaceStatus};
use doorbell_db::Database;
use doorbell_stats::ReportCache;
use doorbell_types::{ActorId, EventId, MessageId};
use tokio::sync::mpsc;

use crate::error::EngineError;

/// Usage text for `help`.
const HELP: &str = "commands: lock | unlock | status | open <actor> | close <actor> | \
                    override-open <actor> | override-lock <actor> | clear <actor> | \
                    claim <event> <actor> | track <message> | react <message> <actor>... | \
                    backup <path> | stats | help | quit";

/// One console command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Move the virtual door to locked.
    SensorLock,
    /// Move the virtual door to open.
    SensorUnlock,
    /// Show the current state.
    Status,
    /// Manual open by an actor.
    Open(ActorId),
    /// Manual lock by an actor.
    Close(ActorId),
    /// Declare open regardless of the sensor.
    OverrideOpen(ActorId),
    /// Declare locked regardless of the sensor.
    OverrideLock(ActorId),
    /// Return to following the sensor.
    Clear(ActorId),
    /// Attribute a sensor event to an actor.
    Claim(EventId, ActorId),
    /// Start collecting reactions on a status message.
    Track(MessageId),
    /// Replace the set of actors who reacted to a message.
    React(MessageId, BTreeSet<ActorId>),
    /// Copy the database to a new file.
    Backup(PathBuf),
    /// Summarise the cached statistics report.
    Stats,
    /// Show usage.
    Help,
    /// Stop the monitor and exit.
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let verb = words.next().ok_or_else(|| String::from("empty command"))?;
        let mut id = |what: &str| -> Result<i64, String> {
            let word = words
                .next()
                .ok_or_else(|| format!("{verb}: missing {what}"))?;
            word.parse::<i64>()
                .map_err(|e| format!("{verb}: bad {what} {word:?}: {e}"))
        };

        let command = match verb.to_ascii_lowercase().as_str() {
            "lock" => Self::SensorLock,
            "unlock" => Self::SensorUnlock,
            "status" => Self::Status,
            "open" => Self::Open(ActorId(id("actor")?)),
            "close" => Self::Close(ActorId(id("actor")?)),
            "override-open" => Self::OverrideOpen(ActorId(id("actor")?)),
            "override-lock" => Self::OverrideLock(ActorId(id("actor")?)),
            "clear" => Self::Clear(ActorId(id("actor")?)),
            "claim" => {
                let event = EventId(id("event")?);
                Self::Claim(event, ActorId(id("actor")?))
            }
            "track" => Self::Track(MessageId(id("message")?)),
            "react" => {
                let message = MessageId(id("message")?);
                let mut reactors = BTreeSet::new();
                for word in &mut words {
                    let actor = word
                        .parse::<i64>()
                        .map_err(|e| format!("{verb}: bad actor {word:?}: {e}"))?;
                    reactors.insert(ActorId(actor));
                }
                Self::React(message, reactors)
            }
            "backup" => {
                let path = words
                    .next()
                    .ok_or_else(|| format!("{verb}: missing path"))?;
                Self::Backup(PathBuf::from(path))
            }
            "stats" => Self::Stats,
            "help" => Self::Help,
            "quit" | "exit" => Self::Quit,
            other => return Err(format!("unknown command {other:?}")),
        };
        Ok(command)
    }
}

/// Executes console commands against the running system.
pub struct Console {
    space: Arc<SpaceStatus>,
    db: Database,
    claims: ClaimResolver,
    reports: Arc<ReportCache>,
    control: Arc<MonitorControl>,
    sensor: Option<VirtualSensor>,
}

impl Console {
    /// Create a console. `sensor` is present only in virtual sensor mode.
    pub const fn new(
        space: Arc<SpaceStatus>,
        db: Database,
        claims: ClaimResolver,
        reports: Arc<ReportCache>,
        control: Arc<MonitorControl>,
        sensor: Option<VirtualSensor>,
    ) -> Self {
        Self {
            space,
            db,
            claims,
            reports,
            control,
            sensor,
        }
    }

    /// Execute lines until `quit`, the sender hangs up, or a stop request.
    ///
    /// # Errors
    ///
    /// Returns a storage error from a command.
    pub async fn run(self, mut lines: mpsc::Receiver<String>) -> Result<(), EngineError> {
        tracing::info!("{HELP}");

        while let Some(line) = lines.recv().await {
            if line.trim().is_empty() {
                continue;
            }
            let command = match line.parse::<Command>() {
                Ok(command) => command,
                Err(message) => {
                    tracing::warn!("{message}");
                    continue;
                }
            };
            let quit = command == Command::Quit;
            let reply = self.execute(command).await?;
            tracing::info!("{reply}");
            if quit || self.control.is_stop_requested() {
                break;
            }
        }
        Ok(())
    }

    /// Run one command and describe the outcome.
    ///
    /// Refused commands (wrong state, nothing to clear, claim lost) are
    /// normal replies; only storage failures are errors.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError`] if the event log cannot be written.
    pub async fn execute(&self, command: Command) -> Result<String, EngineError> {
        let reply = match command {
            Command::SensorLock => self.move_door(true),
            Command::SensorUnlock => self.move_door(false),
            Command::Status => {
                let state = self.space.current_state().await;
                format!("The space is {state}")
            }
            Command::Open(actor) => accepted(
                self.space.manual_open(actor).await?,
                "Opened",
                "The space is already open",
            ),
            Command::Close(actor) => accepted(
                self.space.manual_lock(actor).await?,
                "Locked",
                "The space is already locked",
            ),
            Command::OverrideOpen(actor) => {
                overridden(self.space.override_open(actor).await, "open")?
            }
            Command::OverrideLock(actor) => {
                overridden(self.space.override_lock(actor).await, "locked")?
            }
            Command::Clear(actor) => {
                let sensor_locked = self.sensor_locked().await;
                accepted(
                    self.space.clear_override(actor, sensor_locked).await?,
                    "Override cleared",
                    "No override is active",
                )
            }
            Command::Claim(event, actor) => accepted(
                self.claims.claim(event, actor).await?,
                "Event claimed",
                "That event cannot be claimed",
            ),
            Command::Track(message) => {
                self.db.reactions().track_message(message).await?;
                format!("Tracking reactions on message {message}")
            }
            Command::React(message, reactors) => {
                self.db
                    .reactions()
                    .replace_reactors(message, &reactors)
                    .await?;
                format!("Message {message} has {} reactions", reactors.len())
            }
            Command::Backup(path) => match self.db.backup_to(&path).await {
                Ok(()) => format!("Database copied to {}", path.display()),
                Err(e) => {
                    tracing::warn!(error = %e, path = %path.display(), "Backup failed");
                    format!("Backup failed: {e}")
                }
            },
            Command::Stats => self.stats_summary().await,
            Command::Help => String::from(HELP),
            Command::Quit => {
                self.control.request_stop();
                String::from("Stopping")
            }
        };
        Ok(reply)
    }

    fn move_door(&self, locked: bool) -> String {
        self.sensor.as_ref().map_or_else(
            || String::from("Sensor is hardware-backed; move the door instead"),
            |sensor| {
                sensor.set_locked(locked);
                format!("Virtual door set to {}", if locked { "locked" } else { "open" })
            },
        )
    }

    /// The best available sensor reading, falling back to the current state.
    async fn sensor_locked(&self) -> bool {
        if let Some(locked) = self.control.last_stable().or_else(|| self.control.last_reading()) {
            return locked;
        }
        self.space.is_locked().await
    }

    async fn stats_summary(&self) -> String {
        let report = self.reports.get().await;
        let average_open = report
            .time_of_day
            .average_open
            .map_or_else(|| String::from("n/a"), format_time_of_day);
        let average_lock = report
            .time_of_day
            .average_lock
            .map_or_else(|| String::from("n/a"), format_time_of_day);
        let busiest = report
            .day_of_week
            .busiest
            .map_or_else(|| String::from("n/a"), |d| d.to_string());

        format!(
            "{} sessions, open {} in total; usually opens {average_open}, locks {average_lock}; \
             busiest day {busiest}; streak {} days (best {})",
            report.open_sessions.count,
            format_duration(report.total_open_ms, false),
            report.streaks.current_days,
            report.streaks.longest_days,
        )
    }
}

fn accepted(done: bool, yes: &str, no: &str) -> String {
    String::from(if done { yes } else { no })
}

fn overridden(result: Result<EventId, SpaceError>, target: &str) -> Result<String, EngineError> {
    match result {
        Ok(id) => Ok(format!("Space declared {target} (event {id})")),
        Err(SpaceError::IllegalState { action, state }) => {
            Ok(format!("Cannot {action} while the space is {state}"))
        }
        Err(e) => Err(e.into()),
    }
}
