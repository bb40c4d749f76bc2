//! Scalar signal measurements.
//!
//! Pure functions over a captured [`SampleWindow`] and configuration
//! scalars. All of them are total: outside their valid domain they return a
//! defined sentinel (0.0, or -1.0 for an unresolvable frequency) instead of
//! failing, so the display can render "no reading" without error plumbing.
//!
//! THD needs the forward transform and lives in `trazo-analysis`.

use libm::sqrt;

use crate::sample_window::SampleWindow;

/// Calibrated RMS level over all channels of a window.
///
/// Every sample of every channel contributes equally to the mean of squares;
/// channels are pooled, not averaged separately. Accumulates in `f64` so
/// long windows do not lose precision. Returns 0.0 for an empty window.
pub fn rms(window: &SampleWindow, calibration_factor: f32) -> f32 {
    let num_channels = window.num_channels();
    let num_samples = window.len();
    if num_channels == 0 || num_samples == 0 {
        return 0.0;
    }

    let mut sum_squares = 0.0f64;
    for channel in window.channels_iter() {
        for &sample in channel {
            let volts = f64::from(sample * calibration_factor);
            sum_squares += volts * volts;
        }
    }

    sqrt(sum_squares / (num_samples * num_channels) as f64) as f32
}

/// Peak-to-peak voltage from the rendered vertical extent of the waveform.
///
/// Converts a pixel-space span back into volts through the display's own
/// scale: `((max_y - min_y) / pixels_per_div) * volts_per_div`. This couples
/// the measurement to the rendering deliberately: it reports what is on
/// screen, so it must be fed the same extrema the renderer computed.
pub fn vpp_from_pixels(min_y: f32, max_y: f32, pixels_per_div: f32, volts_per_div: f32) -> f32 {
    let signal_pixels = max_y - min_y;
    let signal_divisions = signal_pixels / pixels_per_div;
    signal_divisions * volts_per_div
}

/// Fundamental frequency estimate from the first full period on channel 0.
///
/// Finds the first two ascending zero crossings (`prev < 0 <= cur`) and
/// returns `sample_rate / period_samples`. Returns -1.0 when fewer than two
/// crossings exist. Insufficient data is not an error; callers check the
/// sentinel before displaying.
pub fn zero_crossing_frequency(window: &SampleWindow, sample_rate: f32) -> f32 {
    if window.num_channels() == 0 || window.len() < 2 {
        return -1.0;
    }

    let data = window.channel(0);
    let mut first = None;

    for i in 1..data.len() {
        if data[i - 1] < 0.0 && data[i] >= 0.0 {
            match first {
                None => first = Some(i),
                Some(start) => {
                    let period_samples = i - start;
                    return sample_rate / period_samples as f32;
                }
            }
        }
    }

    -1.0
}
