//! Trazo Analysis - spectral analysis for the oscilloscope's frequency mode
//!
//! This crate owns everything that needs a forward transform:
//!
//! - [`fft`] - FFT adapter with periodic windowing functions
//! - [`engine`] - Background spectrum engine: intake queue, worker thread,
//!   rotating magnitude average, plottable output
//! - [`averager`] - The rotating multi-slot magnitude average itself
//! - [`distortion`] - THD measurement over a captured window
//! - [`plot`] - GUI-free path/rect geometry the display collaborator strokes
//!
//! ## Threading
//!
//! [`engine::SpectrumAnalyzer`] is the only component here that spawns a
//! thread. The audio thread feeds it through a best-effort intake queue
//! (blocks are dropped when the queue is full, never blocked on), the worker
//! transforms one frame at a time, and the display side reads the averaged
//! magnitudes under the engine's single exclusion lock.
//!
//! ## Example
//!
//! ```rust,ignore
//! use trazo_analysis::{SpectrumAnalyzer, PlotPath, Rect};
//!
//! let mut analyzer = SpectrumAnalyzer::new(12, 5);
//! analyzer.configure(48000, 48000.0);
//! analyzer.start();
//!
//! // audio thread, once per block:
//! analyzer.enqueue(&[left, right], 0, 2);
//!
//! // display thread, each tick:
//! if analyzer.has_new_data() {
//!     let mut path = PlotPath::new();
//!     analyzer.build_display_path(&mut path, bounds, 20.0, -100.0, 24.0);
//! }
//! ```

pub mod averager;
pub mod distortion;
pub mod engine;
pub mod fft;
pub mod plot;

// Re-export main types
pub use averager::MagnitudeAverager;
pub use distortion::{compute_thd, generate_test_tone};
pub use engine::{Harmonic, SpectrumAnalyzer};
pub use fft::{Fft, Window};
pub use plot::{PlotPath, Rect};
