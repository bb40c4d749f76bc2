//! Mathematical utility functions for measurement and display mapping.
//!
//! All functions are allocation-free and suitable for `no_std`.
//!
//! # Level Conversions
//!
//! - [`db_to_linear`] / [`linear_to_db`] - Convert between dB and linear gain
//! - [`gain_to_db_floored`] - dB conversion with an explicit floor, used when
//!   mapping spectrum magnitudes onto a bounded plot range
//!
//! # Utilities
//!
//! - [`map_range`] - Linear remapping between two ranges (plot coordinates)

use libm::{expf, log10f, logf};

/// Convert decibels to linear gain.
///
/// # Example
/// ```rust
/// use trazo_core::db_to_linear;
///
/// assert!((db_to_linear(0.0) - 1.0).abs() < 0.001);
/// assert!((db_to_linear(-6.02) - 0.5).abs() < 0.01);
/// ```
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    // 10^(dB/20) = e^(dB * ln(10)/20)
    const FACTOR: f32 = core::f32::consts::LN_10 / 20.0;
    expf(db * FACTOR)
}

/// Convert linear gain to decibels.
///
/// Returns -100 dB for non-positive input.
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    if linear > 0.0 {
        20.0 / core::f32::consts::LN_10 * logf(linear)
    } else {
        -100.0
    }
}

/// Convert linear gain to decibels, clamped to a floor.
///
/// Non-positive gains map to `floor_db`, and no result is ever below it.
/// This is the conversion the spectrum display uses so that silence lands
/// exactly on the bottom grid line instead of at negative infinity.
#[inline]
pub fn gain_to_db_floored(gain: f32, floor_db: f32) -> f32 {
    if gain > 0.0 {
        let db = 20.0 * log10f(gain);
        if db > floor_db { db } else { floor_db }
    } else {
        floor_db
    }
}

/// Linearly remap `value` from `[src_min, src_max]` to `[dst_min, dst_max]`.
///
/// The source range must not be degenerate. Values outside the source range
/// extrapolate, which is what a plot mapping wants (clipping is the
/// renderer's job).
#[inline]
pub fn map_range(value: f32, src_min: f32, src_max: f32, dst_min: f32, dst_max: f32) -> f32 {
    dst_min + (value - src_min) * (dst_max - dst_min) / (src_max - src_min)
}
