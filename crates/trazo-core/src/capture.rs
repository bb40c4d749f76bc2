//! Lock-free circular capture buffer.
//!
//! [`CaptureBuffer`] is the hand-off point between the real-time audio thread
//! and the display side of the pipeline: the audio thread pushes every block
//! into it, and any consumer can later copy out the most recent N samples as
//! a [`SampleWindow`].
//!
//! # Concurrency contract
//!
//! There is exactly one writer (the audio thread) and any number of readers.
//! No lock is taken on either side. Samples are stored as `f32` bit-cast into
//! `AtomicU32`, the write cursor and fill counter are atomics, and a reader
//! captures both as local copies before computing its copy spans. A reader
//! racing the writer may therefore observe a *torn* window (part old, part
//! new samples), which costs at most one glitched display frame. What the
//! local cursor/fill capture does guarantee is that every index the reader
//! touches is in bounds and was zero-initialized at prepare time.
//!
//! The averaged spectrum path has a stricter invariant and uses a real lock
//! instead; see `trazo-analysis`.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec::Vec;
use core::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use crate::sample_window::SampleWindow;

/// Fixed-capacity multi-channel circular sample buffer.
///
/// Created empty; [`CaptureBuffer::prepare`] sizes it once the stream
/// configuration (sample rate, channel count) is known. Pushing before
/// `prepare` is a no-op and reading yields an empty window.
#[derive(Debug, Default)]
pub struct CaptureBuffer {
    /// Per-channel storage, `f32` bit-cast for lock-free access.
    channels: Vec<Vec<AtomicU32>>,
    capacity: usize,
    /// Next index to write, wraps modulo `capacity`. Single writer.
    write_pos: AtomicUsize,
    /// Valid samples per channel, saturates at `capacity`.
    stored: AtomicUsize,
}

impl CaptureBuffer {
    /// Creates an unprepared buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// (Re)allocates storage for `num_channels x capacity_samples`, zeroing
    /// every sample and resetting the cursor and fill count.
    ///
    /// Takes `&mut self`: preparing is not safe concurrently with push or
    /// read, and exclusive access is how that contract is stated here. Call
    /// it at stream-configuration time, before the audio thread runs.
    pub fn prepare(&mut self, num_channels: usize, capacity_samples: usize) {
        self.channels.clear();
        for _ in 0..num_channels {
            let mut storage = Vec::with_capacity(capacity_samples);
            storage.resize_with(capacity_samples, || AtomicU32::new(0.0f32.to_bits()));
            self.channels.push(storage);
        }
        self.capacity = capacity_samples;
        self.write_pos.store(0, Ordering::Release);
        self.stored.store(0, Ordering::Release);
    }

    /// Capacity in samples per channel.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of channels the buffer was prepared for.
    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    /// Valid samples currently stored per channel, up to capacity.
    pub fn stored_samples(&self) -> usize {
        self.stored.load(Ordering::Acquire).min(self.capacity)
    }

    /// Writes one block of per-channel sample slices at the cursor.
    ///
    /// Channels beyond the prepared count are ignored, as are prepared
    /// channels the block does not provide. The frame count is the shortest
    /// provided channel. Runs on the real-time audio thread: no allocation,
    /// no locking, bounded work per frame.
    pub fn push_block(&self, block: &[&[f32]]) {
        if self.capacity == 0 || block.is_empty() {
            return;
        }

        let num_channels = self.channels.len().min(block.len());
        let frames = block[..num_channels]
            .iter()
            .map(|channel| channel.len())
            .min()
            .unwrap_or(0);
        if frames == 0 {
            return;
        }

        let start = self.write_pos.load(Ordering::Relaxed);
        for (ch, storage) in self.channels.iter().take(num_channels).enumerate() {
            let samples = block[ch];
            for i in 0..frames {
                let index = (start + i) % self.capacity;
                storage[index].store(samples[i].to_bits(), Ordering::Relaxed);
            }
        }

        self.write_pos
            .store((start + frames) % self.capacity, Ordering::Release);

        let stored = self.stored.load(Ordering::Relaxed);
        self.stored
            .store((stored + frames).min(self.capacity), Ordering::Release);
    }

    /// Copies the most recent `num_samples` samples of every channel into
    /// `out`, resizing it to `channels x available`.
    ///
    /// `available` is `min(num_samples, stored)`, so a partially filled
    /// buffer yields a shorter window and an unprepared buffer (or a zero
    /// request) yields an empty one. The copy is served by at most two
    /// contiguous spans around the wrap point.
    ///
    /// Callable from any non-real-time thread. The cursor and fill count are
    /// captured once up front; a concurrent writer may tear the sample data
    /// but can never push the spans out of bounds.
    pub fn most_recent_window(&self, out: &mut SampleWindow, num_samples: usize) {
        let num_channels = self.channels.len();
        if self.capacity == 0 || num_samples == 0 {
            out.resize(num_channels, 0);
            return;
        }

        // Local snapshot of the cursor state; all span math uses these.
        let write_pos = self.write_pos.load(Ordering::Acquire);
        let stored = self.stored.load(Ordering::Acquire).min(self.capacity);

        let available = num_samples.min(stored);
        out.resize(num_channels, available);
        if available == 0 {
            return;
        }

        let start = (write_pos + self.capacity - available) % self.capacity;
        let first = available.min(self.capacity - start);
        let second = available - first;

        for (ch, storage) in self.channels.iter().enumerate() {
            let dst = out.channel_mut(ch);
            for (i, slot) in storage[start..start + first].iter().enumerate() {
                dst[i] = f32::from_bits(slot.load(Ordering::Relaxed));
            }
            for (i, slot) in storage[..second].iter().enumerate() {
                dst[first + i] = f32::from_bits(slot.load(Ordering::Relaxed));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_mono(buffer: &CaptureBuffer, samples: &[f32]) {
        buffer.push_block(&[samples]);
    }

    #[test]
    fn unprepared_reads_empty() {
        let buffer = CaptureBuffer::new();
        let mut out = SampleWindow::new();
        buffer.most_recent_window(&mut out, 16);
        assert!(out.is_empty());
    }

    #[test]
    fn zero_request_reads_empty() {
        let mut buffer = CaptureBuffer::new();
        buffer.prepare(1, 8);
        push_mono(&buffer, &[1.0, 2.0]);
        let mut out = SampleWindow::new();
        buffer.most_recent_window(&mut out, 0);
        assert_eq!(out.len(), 0);
    }

    #[test]
    fn partial_fill_returns_partial_window() {
        let mut buffer = CaptureBuffer::new();
        buffer.prepare(1, 8);
        push_mono(&buffer, &[1.0, 2.0, 3.0]);

        let mut out = SampleWindow::new();
        buffer.most_recent_window(&mut out, 8);
        assert_eq!(out.len(), 3);
        assert_eq!(out.channel(0), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn window_is_most_recent_tail() {
        let mut buffer = CaptureBuffer::new();
        buffer.prepare(1, 8);
        push_mono(&buffer, &[1.0, 2.0, 3.0, 4.0, 5.0]);

        let mut out = SampleWindow::new();
        buffer.most_recent_window(&mut out, 2);
        assert_eq!(out.channel(0), &[4.0, 5.0]);
    }

    #[test]
    fn wraparound_preserves_order() {
        let mut buffer = CaptureBuffer::new();
        buffer.prepare(1, 4);
        push_mono(&buffer, &[1.0, 2.0, 3.0]);
        push_mono(&buffer, &[4.0, 5.0, 6.0]);

        let mut out = SampleWindow::new();
        buffer.most_recent_window(&mut out, 4);
        assert_eq!(out.channel(0), &[3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn fill_saturates_at_capacity() {
        let mut buffer = CaptureBuffer::new();
        buffer.prepare(1, 4);
        for _ in 0..5 {
            push_mono(&buffer, &[0.5, -0.5]);
        }
        assert_eq!(buffer.stored_samples(), 4);

        let mut out = SampleWindow::new();
        buffer.most_recent_window(&mut out, 100);
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn channels_stay_separate() {
        let mut buffer = CaptureBuffer::new();
        buffer.prepare(2, 8);
        buffer.push_block(&[&[1.0, 2.0], &[-1.0, -2.0]]);

        let mut out = SampleWindow::new();
        buffer.most_recent_window(&mut out, 2);
        assert_eq!(out.channel(0), &[1.0, 2.0]);
        assert_eq!(out.channel(1), &[-1.0, -2.0]);
    }

    #[test]
    fn extra_block_channels_are_ignored() {
        let mut buffer = CaptureBuffer::new();
        buffer.prepare(1, 8);
        buffer.push_block(&[&[1.0, 2.0], &[9.0, 9.0]]);

        let mut out = SampleWindow::new();
        buffer.most_recent_window(&mut out, 2);
        assert_eq!(out.num_channels(), 1);
        assert_eq!(out.channel(0), &[1.0, 2.0]);
    }

    #[test]
    fn reprepare_clears_content() {
        let mut buffer = CaptureBuffer::new();
        buffer.prepare(1, 4);
        push_mono(&buffer, &[1.0, 2.0, 3.0, 4.0]);
        buffer.prepare(1, 4);

        assert_eq!(buffer.stored_samples(), 0);
        let mut out = SampleWindow::new();
        buffer.most_recent_window(&mut out, 4);
        assert_eq!(out.len(), 0);
    }
}
