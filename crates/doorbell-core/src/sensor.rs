//! Door sensor sampling sources.
//!
//! A [`SensorSource`] answers one question per tick: does the sensor read
//! locked right now? Reads may fail; the monitor skips failed ticks.
//!
//! # Sources
//!
//! - [`GpioValueSensor`] -- a sysfs-style GPIO `value` file
//! - [`VirtualSensor`] -- shared state toggled at runtime, for bench testing
//! - [`ScriptedSensor`] -- a fixed queue of readings and failures, for tests

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Errors from a single sensor read.
#[derive(Debug, thiserror::Error)]
pub enum SensorError {
    /// The underlying device could not be read.
    #[error("sensor read failed: {0}")]
    Io(#[from] std::io::Error),

    /// The device returned something other than a binary level.
    #[error("unexpected sensor value: {0:?}")]
    InvalidValue(String),

    /// A scripted failure or an unavailable device.
    #[error("sensor unavailable: {0}")]
    Unavailable(String),
}

/// One boolean sample per call; `true` means the door reads locked.
pub trait SensorSource: Send {
    /// Take one raw (undebounced) sample.
    ///
    /// # Errors
    ///
    /// Returns a [`SensorError`] when the sample could not be taken.
    fn read_raw(&mut self) -> Result<bool, SensorError>;
}

// ---------------------------------------------------------------------------
// GPIO
// ---------------------------------------------------------------------------

/// Reads a GPIO pin through its sysfs `value` file (`0` or `1`).
#[derive(Debug, Clone)]
pub struct GpioValueSensor {
    path: PathBuf,
    locked_when_high: bool,
}

impl GpioValueSensor {
    /// Sample the value file at `path`. With the default wiring (pull-up,
    /// switch to ground) a low level means locked.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            locked_when_high: false,
        }
    }

    /// Invert the polarity so that a high level means locked.
    #[must_use]
    pub const fn locked_when_high(mut self, locked_when_high: bool) -> Self {
        self.locked_when_high = locked_when_high;
        self
    }
}

impl SensorSource for GpioValueSensor {
    fn read_raw(&mut self) -> Result<bool, SensorError> {
        let raw = std::fs::read_to_string(&self.path)?;
        let high = match raw.trim() {
            "1" => true,
            "0" => false,
            other => return Err(SensorError::InvalidValue(other.to_owned())),
        };
        Ok(high == self.locked_when_high)
    }
}

// ---------------------------------------------------------------------------
// Virtual
// ---------------------------------------------------------------------------

/// A sensor whose reading is set by hand, e.g. from a console.
///
/// Clones share the same reading, so one clone can be handed to the monitor
/// while another is toggled.
#[derive(Debug, Clone, Default)]
pub struct VirtualSensor {
    locked: Arc<AtomicBool>,
}

impl VirtualSensor {
    /// Create a virtual sensor reading `locked`.
    pub fn new(locked: bool) -> Self {
        Self {
            locked: Arc::new(AtomicBool::new(locked)),
        }
    }

    /// Change the reading.
    pub fn set_locked(&self, locked: bool) {
        self.locked.store(locked, Ordering::Release);
    }

    /// The current reading.
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Acquire)
    }
}

impl SensorSource for VirtualSensor {
    fn read_raw(&mut self) -> Result<bool, SensorError> {
        Ok(self.is_locked())
    }
}

// ---------------------------------------------------------------------------
// Scripted
// ---------------------------------------------------------------------------

/// Plays back a fixed sequence of readings.
///
/// `None` entries are failed reads. Once the script runs out the last
/// successful reading repeats; with no successful reading at all every
/// further read fails.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSensor {
    script: VecDeque<Option<bool>>,
    last: Option<bool>,
}

impl ScriptedSensor {
    /// Create a sensor that will return `script` in order.
    pub fn new(script: impl IntoIterator<Item = Option<bool>>) -> Self {
        Self {
            script: script.into_iter().collect(),
            last: None,
        }
    }

    /// Create a sensor from readings that never fail.
    pub fn from_readings(readings: impl IntoIterator<Item = bool>) -> Self {
        Self::new(readings.into_iter().map(Some))
    }

    /// Readings not yet consumed.
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl SensorSource for ScriptedSensor {
    fn read_raw(&mut self) -> Result<bool, SensorError> {
        match self.script.pop_front() {
            Some(Some(reading)) => {
                self.last = Some(reading);
                Ok(reading)
            }
            Some(None) => Err(SensorError::Unavailable("scripted failure".to_owned())),
            None => self
                .last
                .ok_or_else(|| SensorError::Unavailable("script exhausted".to_owned())),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn scripted_sensor_plays_back_then_repeats() {
        let mut sensor = ScriptedSensor::new([Some(true), None, Some(false)]);
        assert!(sensor.read_raw().unwrap());
        assert!(sensor.read_raw().is_err());
        assert!(!sensor.read_raw().unwrap());
        assert_eq!(sensor.remaining(), 0);
        assert!(!sensor.read_raw().unwrap());
    }

    #[test]
    fn empty_script_always_fails() {
        let mut sensor = ScriptedSensor::default();
        assert!(matches!(sensor.read_raw(), Err(SensorError::Unavailable(_))));
    }

    #[test]
    fn virtual_sensor_clones_share_state() {
        let sensor = VirtualSensor::new(false);
        let mut reader = sensor.clone();
        assert!(!reader.read_raw().unwrap());
        sensor.set_locked(true);
        assert!(reader.read_raw().unwrap());
    }

    fn gpio_file(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!(
            "doorbell-gpio-{name}-{}",
            std::process::id()
        ));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn gpio_low_reads_locked_by_default() {
        let path = gpio_file("low", "0\n");
        let mut sensor = GpioValueSensor::new(&path);
        assert!(sensor.read_raw().unwrap());
        let mut inverted = GpioValueSensor::new(&path).locked_when_high(true);
        assert!(!inverted.read_raw().unwrap());
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn gpio_high_reads_open_by_default() {
        let path = gpio_file("high", "1\n");
        let mut sensor = GpioValueSensor::new(&path);
        assert!(!sensor.read_raw().unwrap());
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn gpio_garbage_is_rejected() {
        let path = gpio_file("garbage", "maybe");
        let mut sensor = GpioValueSensor::new(&path);
        assert!(matches!(sensor.read_raw(), Err(SensorError::InvalidValue(_))));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn gpio_missing_file_is_io_error() {
        let mut sensor = GpioValueSensor::new("/nonexistent/gpio/value");
        assert!(matches!(sensor.read_raw(), Err(SensorError::Io(_))));
    }
}
