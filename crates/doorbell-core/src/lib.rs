//! Sensor debouncing, space status, and claims for the Doorbell tracker.
//!
//! This crate owns the live side of the system: it turns noisy door sensor
//! samples into confirmed transitions, keeps the single authoritative
//! [`SpaceState`](doorbell_types::SpaceState), records every transition in the
//! event log, and lets members claim sensor-recorded events.
//!
//! ```text
//! SensorSource --sample--> Debouncer --confirmed--> SpaceStatus --append--> EventStore
//!                                                        ^                      ^
//!                            manual / override commands -+     ClaimResolver ---+
//! ```
//!
//! # Modules
//!
//! - [`clock`] -- Wall-clock abstraction with a manual clock for tests
//! - [`config`] -- Configuration loading from `doorbell-config.yaml`
//! - [`debounce`] -- The pure debouncing policy
//! - [`sensor`] -- [`SensorSource`] and its GPIO, virtual, and scripted sources
//! - [`monitor`] -- The fixed-interval sampling loop
//! - [`space`] -- The [`SpaceStatus`] state machine and [`Notifier`] seam
//! - [`claim`] -- The [`ClaimResolver`]
//! - [`display`] -- Human-readable durations and times of day
//!
//! [`SensorSource`]: sensor::SensorSource
//! [`SpaceStatus`]: space::SpaceStatus
//! [`Notifier`]: space::Notifier
//! [`ClaimResolver`]: claim::ClaimResolver

pub mod claim;
pub mod clock;
pub mod config;
pub mod debounce;
pub mod display;
pub mod monitor;
pub mod sensor;
pub mod space;
