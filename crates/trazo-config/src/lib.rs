//! Trazo Config - calibration state and persistence
//!
//! The measurement core converts raw probe samples to volts through a
//! per-coupling-mode calibration factor captured against a known reference
//! signal. This crate owns that state and its TOML persistence:
//!
//! - [`CalibrationState`] / [`CalibrationEntry`] - one factor + captured
//!   range per AC/DC coupling mode
//! - [`ConfigError`] - error type for load/save operations
//!
//! The host usually embeds the calibration in its own serialized parameter
//! document; [`CalibrationState::to_toml`] / [`CalibrationState::from_toml`]
//! support that, and [`CalibrationState::load`] / [`CalibrationState::save`]
//! cover a standalone file.

pub mod calibration;
pub mod error;

pub use calibration::{CalibrationEntry, CalibrationState, entry_from_vpp};
pub use error::ConfigError;
