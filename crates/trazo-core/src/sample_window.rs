//! Owned multi-channel sample window.
//!
//! [`SampleWindow`] is the snapshot type the display and measurement side of
//! the pipeline works on: a capture read copies "the most recent N samples"
//! into one, and the trigger and all scalar metrics take it from there. It is
//! channel-major (each channel is one contiguous slice), mirroring how the
//! capture buffer stores its samples.

#[cfg(not(feature = "std"))]
extern crate alloc;

#[cfg(feature = "std")]
extern crate std as alloc;

use alloc::vec::Vec;

/// An owned window of samples, `channels x len`, channel-major.
///
/// A window with zero channels or zero length is empty; every measurement
/// function treats an empty window as its degenerate case rather than an
/// error.
#[derive(Debug, Clone, Default)]
pub struct SampleWindow {
    channels: usize,
    len: usize,
    data: Vec<f32>,
}

impl SampleWindow {
    /// Creates an empty window.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a zeroed window of the given dimensions.
    pub fn with_size(channels: usize, len: usize) -> Self {
        let mut window = Self::new();
        window.resize(channels, len);
        window
    }

    /// Builds a window from per-channel slices. All slices must share one
    /// length; extra samples beyond the shortest channel are dropped.
    pub fn from_channels(channels: &[&[f32]]) -> Self {
        let len = channels.iter().map(|c| c.len()).min().unwrap_or(0);
        let mut window = Self::with_size(channels.len(), len);
        for (ch, source) in channels.iter().enumerate() {
            window.channel_mut(ch).copy_from_slice(&source[..len]);
        }
        window
    }

    /// Resizes to `channels x len`, zeroing all samples.
    ///
    /// Shrinking never reallocates; growing allocates once. Either dimension
    /// being zero produces an empty window.
    pub fn resize(&mut self, channels: usize, len: usize) {
        let total = channels * len;
        self.data.clear();
        self.data.resize(total, 0.0);
        self.channels = channels;
        self.len = len;
    }

    /// Number of channels.
    pub fn num_channels(&self) -> usize {
        self.channels
    }

    /// Samples per channel.
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when the window holds no samples.
    pub fn is_empty(&self) -> bool {
        self.channels == 0 || self.len == 0
    }

    /// Read access to one channel.
    ///
    /// # Panics
    ///
    /// Panics if `channel` is out of range.
    pub fn channel(&self, channel: usize) -> &[f32] {
        assert!(channel < self.channels, "channel {channel} out of range");
        &self.data[channel * self.len..(channel + 1) * self.len]
    }

    /// Mutable access to one channel.
    ///
    /// # Panics
    ///
    /// Panics if `channel` is out of range.
    pub fn channel_mut(&mut self, channel: usize) -> &mut [f32] {
        assert!(channel < self.channels, "channel {channel} out of range");
        &mut self.data[channel * self.len..(channel + 1) * self.len]
    }

    /// Iterator over the channels as slices.
    pub fn channels_iter(&self) -> impl Iterator<Item = &[f32]> {
        self.data.chunks_exact(self.len.max(1)).take(self.channels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_by_default() {
        let window = SampleWindow::new();
        assert!(window.is_empty());
        assert_eq!(window.num_channels(), 0);
        assert_eq!(window.len(), 0);
    }

    #[test]
    fn resize_zeroes_previous_content() {
        let mut window = SampleWindow::with_size(1, 4);
        window.channel_mut(0).copy_from_slice(&[1.0, 2.0, 3.0, 4.0]);
        window.resize(2, 3);
        assert!(window.channel(0).iter().all(|&s| s == 0.0));
        assert!(window.channel(1).iter().all(|&s| s == 0.0));
    }

    #[test]
    fn from_channels_truncates_to_shortest() {
        let window = SampleWindow::from_channels(&[&[1.0, 2.0, 3.0], &[4.0, 5.0]]);
        assert_eq!(window.num_channels(), 2);
        assert_eq!(window.len(), 2);
        assert_eq!(window.channel(0), &[1.0, 2.0]);
        assert_eq!(window.channel(1), &[4.0, 5.0]);
    }

    #[test]
    fn channels_are_independent() {
        let mut window = SampleWindow::with_size(2, 2);
        window.channel_mut(0).copy_from_slice(&[1.0, 2.0]);
        window.channel_mut(1).copy_from_slice(&[3.0, 4.0]);
        assert_eq!(window.channel(0), &[1.0, 2.0]);
        assert_eq!(window.channel(1), &[3.0, 4.0]);
    }
}
