//! FFT adapter with periodic windowing functions.
//!
//! Wraps the external transform library behind a real-magnitude contract:
//! the rest of the crate sees sample slices in and magnitude slices out,
//! never complex numbers.

use rustfft::{FftPlanner, num_complex::Complex};
use std::f32::consts::PI;
use std::sync::Arc;

/// Analysis window function types.
///
/// All cosine terms use `2*pi*i/N`, which makes every window *periodic* over
/// the frame (equivalent to an N+1-point symmetric window with the last
/// sample dropped). Periodic windows are the correct choice for repeated,
/// averaged transforms: a symmetric window double-weights the frame
/// boundary and biases the average.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    /// Rectangular (no windowing)
    Rectangular,
    /// Hann window (raised cosine)
    Hann,
    /// Hamming window
    Hamming,
    /// Blackman window
    Blackman,
    /// Blackman-Harris window (better sidelobe suppression)
    BlackmanHarris,
}

impl Window {
    /// Apply window to a buffer
    pub fn apply(&self, buffer: &mut [f32]) {
        let n = buffer.len();
        match self {
            Window::Rectangular => {}
            Window::Hann => {
                for (i, sample) in buffer.iter_mut().enumerate() {
                    let w = 0.5 * (1.0 - (2.0 * PI * i as f32 / n as f32).cos());
                    *sample *= w;
                }
            }
            Window::Hamming => {
                for (i, sample) in buffer.iter_mut().enumerate() {
                    let w = 0.54 - 0.46 * (2.0 * PI * i as f32 / n as f32).cos();
                    *sample *= w;
                }
            }
            Window::Blackman => {
                for (i, sample) in buffer.iter_mut().enumerate() {
                    let x = 2.0 * PI * i as f32 / n as f32;
                    let w = 0.42 - 0.5 * x.cos() + 0.08 * (2.0 * x).cos();
                    *sample *= w;
                }
            }
            Window::BlackmanHarris => {
                for (i, sample) in buffer.iter_mut().enumerate() {
                    let x = 2.0 * PI * i as f32 / n as f32;
                    let w = 0.35875 - 0.48829 * x.cos() + 0.14128 * (2.0 * x).cos()
                        - 0.01168 * (3.0 * x).cos();
                    *sample *= w;
                }
            }
        }
    }

    /// Get window coefficients
    pub fn coefficients(&self, size: usize) -> Vec<f32> {
        let mut coeffs = vec![1.0; size];
        self.apply(&mut coeffs);
        coeffs
    }
}

/// FFT processor with a cached forward plan.
pub struct Fft {
    fft: Arc<dyn rustfft::Fft<f32>>,
    size: usize,
}

impl Fft {
    /// Create a new FFT processor for the given size.
    ///
    /// Plan allocation failure is fatal: there is no spectrum mode without
    /// a transform workspace.
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        Self { fft, size }
    }

    /// Get FFT size
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of magnitude bins produced per frame (`size / 2`).
    pub fn num_bins(&self) -> usize {
        self.size / 2
    }

    /// Perform forward FFT on real input
    ///
    /// Returns complex spectrum (size/2 + 1 bins for positive frequencies)
    pub fn forward(&self, input: &[f32]) -> Vec<Complex<f32>> {
        let mut buffer: Vec<Complex<f32>> = input.iter().map(|&x| Complex::new(x, 0.0)).collect();

        // Pad or truncate to FFT size
        buffer.resize(self.size, Complex::new(0.0, 0.0));

        self.fft.process(&mut buffer);

        // Return only positive frequencies (DC to Nyquist)
        buffer.truncate(self.size / 2 + 1);
        buffer
    }

    /// Magnitude-only forward transform of one real frame.
    ///
    /// Returns `size / 2` amplitude-normalized bin magnitudes: DC scaled by
    /// `1/N`, everything else by `2/N` so a full-scale aligned sine reads
    /// close to its time-domain amplitude (times the window's coherent
    /// gain). The complex representation never leaves this adapter.
    pub fn forward_magnitudes(&self, input: &[f32]) -> Vec<f32> {
        let spectrum = self.forward(input);
        let dc_scale = 1.0 / self.size as f32;
        let ac_scale = 2.0 / self.size as f32;

        spectrum[..self.num_bins()]
            .iter()
            .enumerate()
            .map(|(i, c)| c.norm() * if i == 0 { dc_scale } else { ac_scale })
            .collect()
    }
}
