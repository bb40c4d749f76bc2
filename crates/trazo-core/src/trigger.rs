//! Ascending edge trigger for stable time-domain display.
//!
//! A free-running waveform drawn from "the latest N samples" jumps around on
//! every redraw. The trigger picks a reference index instead: the first
//! ascending crossing of a configurable level past a configurable search
//! offset, so that successive captures of a periodic signal line up on
//! screen. When no crossing exists the search start itself is returned and
//! the display simply free-runs; the trigger never fails.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec::Vec;
use libm::roundf;

use crate::sample_window::SampleWindow;

/// Samples in the symmetric smoothing window (odd).
const SMOOTHING_WINDOW: usize = 5;

/// Trigger controls, updated by the display side each redraw tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriggerConfig {
    /// Crossing level in normalized signal units.
    pub level: f32,
    /// Normalized search-start offset in `[0, 1]`, clamped on construction.
    pub offset: f32,
    /// Smooth the channel with a moving average before searching. Keeps
    /// noisy signals from re-triggering on every redraw.
    pub moving_average: bool,
}

impl TriggerConfig {
    /// Creates a config, clamping `offset` into `[0, 1]`.
    pub fn new(level: f32, offset: f32, moving_average: bool) -> Self {
        Self {
            level,
            offset: offset.clamp(0.0, 1.0),
            moving_average,
        }
    }
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self::new(0.0, 0.0, false)
    }
}

/// Edge trigger with a reusable smoothing scratch buffer.
#[derive(Debug, Default)]
pub struct Trigger {
    config: TriggerConfig,
    smoothed: Vec<f32>,
}

impl Trigger {
    /// Creates a trigger with the given configuration.
    pub fn new(config: TriggerConfig) -> Self {
        Self {
            config,
            smoothed: Vec::new(),
        }
    }

    /// Current configuration.
    pub fn config(&self) -> TriggerConfig {
        self.config
    }

    /// Replaces the configuration, clamping the offset.
    pub fn set_config(&mut self, config: TriggerConfig) {
        self.config = TriggerConfig::new(config.level, config.offset, config.moving_average);
    }

    /// Finds the reference sample index for the given channel of a captured
    /// window.
    ///
    /// The search starts at `clamp(round(offset * N), 1, N - 2)` and returns
    /// the first index `i` with `data[i - 1] < level && data[i] >= level`
    /// (ascending crossing). Without a crossing the search start is returned.
    /// Windows shorter than three samples, or an out-of-range channel,
    /// return 0.
    pub fn find_trigger_point(&mut self, window: &SampleWindow, channel: usize) -> usize {
        let num_samples = window.len();
        if num_samples < 3 || channel >= window.num_channels() {
            return 0;
        }

        let input = window.channel(channel);
        let data: &[f32] = if self.config.moving_average {
            moving_average(input, &mut self.smoothed);
            &self.smoothed
        } else {
            input
        };

        let start = (roundf(self.config.offset * num_samples as f32) as usize)
            .clamp(1, num_samples - 2);

        for i in start..num_samples - 1 {
            if data[i - 1] < self.config.level && data[i] >= self.config.level {
                return i;
            }
        }

        start
    }
}

/// Symmetric moving average with edge truncation.
///
/// Each output sample averages up to [`SMOOTHING_WINDOW`] neighbors centered
/// on it; near the edges the window shrinks to what exists instead of
/// reading out of bounds. `output` is resized to match `input`.
pub fn moving_average(input: &[f32], output: &mut Vec<f32>) {
    let n = input.len();
    output.clear();
    output.resize(n, 0.0);

    let radius = SMOOTHING_WINDOW / 2;
    for i in 0..n {
        let lo = i.saturating_sub(radius);
        let hi = (i + radius).min(n - 1);
        let sum: f32 = input[lo..=hi].iter().sum();
        output[i] = sum / (hi - lo + 1) as f32;
    }
}
