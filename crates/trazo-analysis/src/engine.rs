//! Background spectrum engine.
//!
//! [`SpectrumAnalyzer`] is an explicit owned worker: a thread handle plus a
//! locked intake queue in and a locked averager + atomic flag out. The audio
//! thread feeds [`SpectrumAnalyzer::enqueue`] with a best-effort write that
//! drops the block when the queue is full; the worker consumes one transform
//! frame at a time (advancing half a frame, so successive transforms overlap
//! 50 %), windows it, takes the magnitude spectrum and folds it into the
//! rotating average; the display thread polls [`SpectrumAnalyzer::has_new_data`]
//! and pulls the plottable curve and harmonic list.
//!
//! Only the latest spectrum matters, so output is a single coalescing flag
//! rather than a queue: a reader that misses an update sees it on its next
//! tick.

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error};

use crate::averager::MagnitudeAverager;
use crate::fft::{Fft, Window};
use crate::plot::{PlotPath, Rect};
use trazo_core::{gain_to_db_floored, map_range};

/// Default transform order: frames of 2^12 = 4096 samples.
pub const DEFAULT_FFT_ORDER: u32 = 12;

/// Default averager slot count (one sum slot + four frame slots).
pub const DEFAULT_AVERAGING_SLOTS: usize = 5;

/// Bounded wait between intake checks; the exit flag is re-checked at every
/// wakeup so stop latency is at most this.
const INTAKE_WAIT: Duration = Duration::from_millis(100);

/// One spectral line: frequency and magnitude in dB.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Harmonic {
    /// Frequency in Hz.
    pub frequency_hz: f32,
    /// Magnitude in dB, floored by the caller's `db_floor`.
    pub magnitude_db: f32,
}

/// Mono intake ring buffer, protected by the engine's fifo lock.
///
/// The writer sums a channel range into the ring; the worker peeks one
/// frame (two spans around the wrap) and consumes in hops.
#[derive(Debug)]
struct IntakeFifo {
    buffer: Vec<f32>,
    read_pos: usize,
    ready: usize,
}

impl IntakeFifo {
    fn new(capacity: usize) -> Self {
        Self {
            buffer: vec![0.0; capacity],
            read_pos: 0,
            ready: 0,
        }
    }

    fn ready(&self) -> usize {
        self.ready
    }

    fn free_space(&self) -> usize {
        self.buffer.len() - self.ready
    }

    /// Sums channels `start_channel..start_channel + num_channels` of the
    /// block into the ring. Returns false, writing nothing, when the
    /// channel range is empty or free space is insufficient (the caller
    /// drops the block rather than block the audio thread).
    fn write_summed(&mut self, block: &[&[f32]], start_channel: usize, num_channels: usize) -> bool {
        let end = (start_channel + num_channels).min(block.len());
        if start_channel >= end {
            return false;
        }

        let frames = block[start_channel..end]
            .iter()
            .map(|channel| channel.len())
            .min()
            .unwrap_or(0);
        if frames == 0 || self.free_space() < frames {
            return false;
        }

        let capacity = self.buffer.len();
        let write_pos = (self.read_pos + self.ready) % capacity;
        let first = frames.min(capacity - write_pos);
        let second = frames - first;

        let source = block[start_channel];
        self.buffer[write_pos..write_pos + first].copy_from_slice(&source[..first]);
        self.buffer[..second].copy_from_slice(&source[first..frames]);

        for channel in &block[start_channel + 1..end] {
            for i in 0..first {
                self.buffer[write_pos + i] += channel[i];
            }
            for i in 0..second {
                self.buffer[i] += channel[first + i];
            }
        }

        self.ready += frames;
        true
    }

    /// Copies the oldest `out.len()` samples without consuming them.
    /// Returns false when fewer are ready.
    fn peek(&self, out: &mut [f32]) -> bool {
        if out.len() > self.ready {
            return false;
        }

        let capacity = self.buffer.len();
        let first = out.len().min(capacity - self.read_pos);
        let second = out.len() - first;
        out[..first].copy_from_slice(&self.buffer[self.read_pos..self.read_pos + first]);
        out[first..].copy_from_slice(&self.buffer[..second]);
        true
    }

    /// Advances the read position by up to `count` samples.
    fn consume(&mut self, count: usize) {
        let count = count.min(self.ready);
        if count == 0 {
            return;
        }
        self.read_pos = (self.read_pos + count) % self.buffer.len();
        self.ready -= count;
    }
}

/// State shared between the owning side, the audio thread and the worker.
struct EngineShared {
    fifo: Mutex<IntakeFifo>,
    data_ready: Condvar,
    /// Single exclusion region for the averager; the worker holds it for
    /// the whole read-modify-write, readers for their whole traversal.
    averager: Mutex<MagnitudeAverager>,
    new_data: AtomicBool,
    exit: AtomicBool,
}

/// Background spectral analyzer: Idle until started, Running until stopped.
pub struct SpectrumAnalyzer {
    shared: Arc<EngineShared>,
    worker: Option<JoinHandle<()>>,
    fft_size: usize,
    sample_rate: f32,
}

impl SpectrumAnalyzer {
    /// Creates an idle analyzer with frames of `2^fft_order` samples and the
    /// given averager slot count (see [`MagnitudeAverager`]).
    pub fn new(fft_order: u32, averaging_slots: usize) -> Self {
        let fft_size = 1usize << fft_order;
        Self {
            shared: Arc::new(EngineShared {
                fifo: Mutex::new(IntakeFifo::new(0)),
                data_ready: Condvar::new(),
                averager: Mutex::new(MagnitudeAverager::new(averaging_slots, fft_size / 2)),
                new_data: AtomicBool::new(false),
                exit: AtomicBool::new(false),
            }),
            worker: None,
            fft_size,
            sample_rate: 44100.0,
        }
    }

    /// Analyzer with the default frame size and averaging depth.
    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_FFT_ORDER, DEFAULT_AVERAGING_SLOTS)
    }

    /// Transform frame length in samples.
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Magnitude bins per spectrum (`fft_size / 2`).
    pub fn num_bins(&self) -> usize {
        self.fft_size / 2
    }

    /// Width of one bin in Hz at the configured sample rate.
    pub fn bin_width_hz(&self) -> f32 {
        self.sample_rate / self.fft_size as f32
    }

    /// Sizes the intake queue and records the sample rate, clearing any
    /// previous content and averaged state.
    ///
    /// Stops a running worker first; call [`SpectrumAnalyzer::start`] after.
    /// Typical intake capacity is one second of samples.
    pub fn configure(&mut self, intake_capacity: usize, sample_rate: f32) {
        self.stop(Duration::from_secs(1));
        self.sample_rate = sample_rate;
        *self.shared.fifo.lock() = IntakeFifo::new(intake_capacity);
        self.shared.averager.lock().reset();
        self.shared.new_data.store(false, Ordering::Release);
    }

    /// True while the worker thread is running.
    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Spawns the worker thread. No-op when already running.
    pub fn start(&mut self) {
        if self.worker.is_some() {
            return;
        }
        self.shared.exit.store(false, Ordering::Release);

        let shared = Arc::clone(&self.shared);
        let fft_size = self.fft_size;
        let handle = thread::Builder::new()
            .name("trazo-spectrum".into())
            .spawn(move || worker_loop(&shared, fft_size))
            .expect("failed to spawn spectrum worker");
        self.worker = Some(handle);
    }

    /// Requests worker exit and joins with a bounded timeout.
    ///
    /// Returns true when the worker exited (or none was running). On timeout
    /// the handle is abandoned and an error is logged; a stuck worker is
    /// fatal for this instance, there is no retry.
    pub fn stop(&mut self, timeout: Duration) -> bool {
        let Some(handle) = self.worker.take() else {
            return true;
        };

        self.shared.exit.store(true, Ordering::Release);
        self.shared.data_ready.notify_all();

        let deadline = Instant::now() + timeout;
        while !handle.is_finished() {
            if Instant::now() >= deadline {
                error!(timeout_ms = timeout.as_millis() as u64, "spectrum worker did not exit in time");
                return false;
            }
            thread::sleep(Duration::from_millis(1));
        }

        if handle.join().is_err() {
            error!("spectrum worker panicked");
            return false;
        }
        debug!("spectrum worker stopped");
        true
    }

    /// Sums the channel range `start_channel..start_channel + num_channels`
    /// into the intake queue.
    ///
    /// Real-time safe by construction: the fifo lock is only ever held for
    /// short copies, and when the queue lacks space the block is silently
    /// dropped. Backpressure is expected and acceptable for a monitoring
    /// display.
    pub fn enqueue(&self, block: &[&[f32]], start_channel: usize, num_channels: usize) {
        let written = self
            .shared
            .fifo
            .lock()
            .write_summed(block, start_channel, num_channels);
        if written {
            self.shared.data_ready.notify_one();
        }
    }

    /// Atomically reads and clears the new-data flag. True exactly once per
    /// analysis cycle that produced a spectrum since the last call.
    pub fn has_new_data(&self) -> bool {
        self.shared.new_data.swap(false, Ordering::AcqRel)
    }

    /// Builds the averaged spectrum as a connected polyline over `bounds`.
    ///
    /// X is logarithmic in frequency, `log2(freq / min_frequency)` scaled
    /// to ten octaves across the width, and y maps magnitude through
    /// [`gain_to_db_floored`] linearly from `[db_ceiling, db_floor]` onto
    /// `[top, bottom]`. Runs under the averager lock.
    pub fn build_display_path(
        &self,
        path: &mut PlotPath,
        bounds: Rect,
        min_frequency: f32,
        db_floor: f32,
        db_ceiling: f32,
    ) {
        path.clear();

        let averager = self.shared.averager.lock();
        let magnitudes = averager.average();
        if magnitudes.is_empty() {
            return;
        }

        path.reserve(magnitudes.len());
        let octave_width = bounds.width / 10.0;

        let y = |magnitude: f32| {
            map_range(
                gain_to_db_floored(magnitude, db_floor),
                db_floor,
                db_ceiling,
                bounds.bottom(),
                bounds.y,
            )
        };

        path.start(bounds.x + octave_width * self.index_to_octaves(0.0, min_frequency), y(magnitudes[0]));
        for (i, &magnitude) in magnitudes.iter().enumerate().skip(1) {
            let x = bounds.x + octave_width * self.index_to_octaves(i as f32, min_frequency);
            path.line_to(x, y(magnitude));
        }
    }

    /// Extracts the fundamental and its integer-multiple harmonics from the
    /// averaged spectrum as `(frequency Hz, magnitude dB)` pairs.
    ///
    /// The fundamental is the global-maximum bin (DC excluded). Multiples
    /// are emitted for `k = 1..=max_harmonics` until one leaves the bin
    /// range; no magnitude threshold is applied. Empty when the spectrum is
    /// silent. Runs under the averager lock.
    pub fn extract_harmonics(&self, max_harmonics: usize, db_floor: f32) -> Vec<Harmonic> {
        let averager = self.shared.averager.lock();
        let magnitudes = averager.average();

        let mut fundamental_bin = 0;
        let mut max_magnitude = 0.0f32;
        for (bin, &magnitude) in magnitudes.iter().enumerate().skip(1) {
            if magnitude > max_magnitude {
                max_magnitude = magnitude;
                fundamental_bin = bin;
            }
        }

        if max_magnitude <= 0.0 {
            return Vec::new();
        }

        let bin_hz = self.bin_width_hz();
        let mut harmonics = Vec::with_capacity(max_harmonics);
        for k in 1..=max_harmonics {
            let bin = k * fundamental_bin;
            if bin >= magnitudes.len() {
                break;
            }
            harmonics.push(Harmonic {
                frequency_hz: bin as f32 * bin_hz,
                magnitude_db: gain_to_db_floored(magnitudes[bin], db_floor),
            });
        }

        harmonics
    }

    /// Octaves above `min_frequency` for a fractional bin index; 0 for
    /// sub-audio bins so the path starts at the left edge.
    fn index_to_octaves(&self, index: f32, min_frequency: f32) -> f32 {
        let frequency = self.sample_rate * index / self.fft_size as f32;
        if frequency > 0.01 {
            (frequency / min_frequency).log2()
        } else {
            0.0
        }
    }
}

impl Drop for SpectrumAnalyzer {
    fn drop(&mut self) {
        self.stop(Duration::from_secs(1));
    }
}

/// Worker body: wait for a frame of intake, transform, fold into the
/// average, raise the flag. Checks the exit request at every wakeup.
fn worker_loop(shared: &EngineShared, fft_size: usize) {
    let fft = Fft::new(fft_size);
    let window = Window::Hann.coefficients(fft_size);
    let mut frame = vec![0.0f32; fft_size];

    debug!(fft_size, "spectrum worker started");

    loop {
        if shared.exit.load(Ordering::Acquire) {
            break;
        }

        {
            let mut fifo = shared.fifo.lock();
            if fifo.ready() < fft_size {
                let _ = shared.data_ready.wait_for(&mut fifo, INTAKE_WAIT);
                if shared.exit.load(Ordering::Acquire) {
                    break;
                }
                continue;
            }

            fifo.peek(&mut frame);
            // Consume half a frame: successive transforms overlap 50 %.
            fifo.consume(fft_size / 2);
        }

        for (sample, coefficient) in frame.iter_mut().zip(&window) {
            *sample *= coefficient;
        }
        let magnitudes = fft.forward_magnitudes(&frame);

        shared.averager.lock().push(&magnitudes);
        shared.new_data.store(true, Ordering::Release);
    }

    debug!("spectrum worker exiting");
}
