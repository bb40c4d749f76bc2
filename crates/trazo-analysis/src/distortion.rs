//! Total harmonic distortion measurement.
//!
//! THD runs its own forward transform over a captured window, independent of
//! the display engine: the measurement must not change because the spectrum
//! view is averaging or stopped.

use std::f32::consts::PI;

use trazo_core::{SampleWindow, db_to_linear};

use crate::fft::{Fft, Window};

/// Harmonics below this level relative to the fundamental stop the sum.
const HARMONIC_CUTOFF_DB: f32 = -60.0;

/// Harmonics examined before the cutoff is allowed to terminate the sum.
/// Keeps noise riding near the fundamental from ending it prematurely.
const MIN_HARMONICS: usize = 5;

/// THD of channel 0 of a captured window, as a ratio (callers multiply by
/// 100 for percent).
///
/// Takes the first `2^transform_order` samples, applies a periodic Hann
/// window, transforms, zeroes the DC bin and picks the fundamental as the
/// global-maximum bin. Harmonic magnitudes at integer multiples of the
/// fundamental bin are square-summed until a multiple leaves the bin range,
/// or falls below the fundamental by 60 dB once more than [`MIN_HARMONICS`]
/// harmonics have been examined. Returns `sqrt(sum) / fundamental`.
///
/// Returns 0.0 when the window is shorter than the transform or the
/// fundamental magnitude is zero: no signal, no distortion reading.
pub fn compute_thd(window: &SampleWindow, transform_order: u32) -> f32 {
    let fft_size = 1usize << transform_order;
    if window.num_channels() == 0 || window.len() < fft_size {
        return 0.0;
    }

    let mut frame = window.channel(0)[..fft_size].to_vec();
    Window::Hann.apply(&mut frame);

    let fft = Fft::new(fft_size);
    let mut magnitudes = fft.forward_magnitudes(&frame);
    magnitudes[0] = 0.0;

    let mut fundamental_bin = 0;
    let mut fundamental = 0.0f32;
    for (bin, &magnitude) in magnitudes.iter().enumerate() {
        if magnitude > fundamental {
            fundamental = magnitude;
            fundamental_bin = bin;
        }
    }
    if fundamental == 0.0 {
        return 0.0;
    }

    let threshold = fundamental * db_to_linear(HARMONIC_CUTOFF_DB);

    let mut sum_squares = 0.0f32;
    let mut k = 2;
    loop {
        let bin = k * fundamental_bin;
        if bin >= magnitudes.len() {
            break;
        }
        let magnitude = magnitudes[bin];
        if magnitude < threshold && k > MIN_HARMONICS {
            break;
        }
        sum_squares += magnitude * magnitude;
        k += 1;
    }

    sum_squares.sqrt() / fundamental
}

/// Generate a test tone for distortion measurement.
///
/// # Arguments
/// * `sample_rate` - Sample rate in Hz
/// * `frequency` - Tone frequency in Hz
/// * `duration_secs` - Duration in seconds
/// * `amplitude` - Peak amplitude (0.0 to 1.0)
pub fn generate_test_tone(
    sample_rate: f32,
    frequency: f32,
    duration_secs: f32,
    amplitude: f32,
) -> Vec<f32> {
    let num_samples = (duration_secs * sample_rate) as usize;
    (0..num_samples)
        .map(|i| {
            let t = i as f32 / sample_rate;
            amplitude * (2.0 * PI * frequency * t).sin()
        })
        .collect()
}
