//! Trazo Core - acquisition and measurement primitives for an
//! oscilloscope-style audio analyzer.
//!
//! This crate provides the building blocks the acquisition pipeline is made
//! of, designed for real-time capture with zero allocation in the audio path.
//!
//! # Core Abstractions
//!
//! ## Capture
//!
//! - [`CaptureBuffer`] - Lock-free multi-channel circular capture buffer,
//!   written by the audio thread and snapshotted by display consumers
//! - [`SampleWindow`] - Owned channel-major window of samples, the snapshot
//!   type all measurements operate on
//!
//! ## Triggering
//!
//! - [`Trigger`] / [`TriggerConfig`] - Ascending edge trigger that locates a
//!   stable reference sample for repeated waveform draws
//!
//! ## Measurements
//!
//! - [`metrics::rms`] - Calibrated RMS over all channels
//! - [`metrics::vpp_from_pixels`] - Peak-to-peak voltage from the rendered
//!   vertical extent
//! - [`metrics::zero_crossing_frequency`] - Fundamental frequency estimate
//!
//! ## Configuration
//!
//! - [`ScopeParams`] - Plain value snapshot of the user-facing controls,
//!   passed into the core once per processing cycle
//! - [`ranges`] - Static scale tables (volts/div, seconds/div, input ranges)
//!
//! ## Utilities
//!
//! - Math functions: [`db_to_linear`], [`linear_to_db`],
//!   [`gain_to_db_floored`], [`map_range`]
//!
//! # no_std Support
//!
//! This crate is `no_std` compatible for embedded front-ends. Disable the
//! default `std` feature in your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! trazo-core = { version = "0.1", default-features = false }
//! ```
//!
//! # Design Principles
//!
//! - **Real-time safe**: pushing a block never allocates, locks, or blocks
//! - **Total functions**: measurement functions return sentinel values
//!   (0.0, -1.0) outside their valid domain instead of failing
//! - **Torn reads over stalls**: snapshot reads tolerate concurrent writes;
//!   a glitched frame is acceptable, an out-of-bounds access is not

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

pub mod capture;
pub mod math;
pub mod metrics;
pub mod params;
pub mod ranges;
pub mod sample_window;
pub mod trigger;

// Re-export main types at crate root
pub use capture::CaptureBuffer;
pub use math::{db_to_linear, gain_to_db_floored, linear_to_db, map_range};
pub use params::{CouplingMode, DisplayMode, ScopeParams};
pub use ranges::{ScaleStep, horizontal_scale, input_range, range_compensation, vertical_scale};
pub use sample_window::SampleWindow;
pub use trigger::{Trigger, TriggerConfig};
