//! Trazo Engine - the acquisition controller
//!
//! One [`AcquisitionController`] per plugin instance ties the layers
//! together: it owns the time-domain [capture buffer](trazo_core::CaptureBuffer)
//! and the frequency-domain [spectrum analyzer](trazo_analysis::SpectrumAnalyzer),
//! routes each audio block to whichever one the current display mode feeds,
//! and exposes the read-only surface the display collaborator draws from.
//!
//! The host collaborator's contract is small and ordered:
//!
//! 1. [`AcquisitionController::prepare`] at stream configuration (and again
//!    whenever sample rate or channel layout changes)
//! 2. [`AcquisitionController::process_block`] once per audio block with a
//!    fresh [`ScopeParams`](trazo_core::ScopeParams) snapshot
//! 3. [`AcquisitionController::release`] (or drop) at teardown
//!
//! Everything else is pull-based from the display thread.

pub mod controller;

pub use controller::{AcquisitionController, CAPTURE_SECONDS, THD_TRANSFORM_ORDER};
