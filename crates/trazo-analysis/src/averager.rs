//! Rotating multi-slot magnitude average.
//!
//! Smooths the displayed spectrum over the last `K - 1` transform frames.
//! Slot 0 holds the running sum (the value consumers read) and the write
//! pointer cycles through slots `1..K`, replacing the oldest contribution
//! each update: subtract it from the sum, write the new magnitudes scaled by
//! `1/(K - 1)`, add them back.
//!
//! Invariant: slot 0 always equals the elementwise sum of slots `1..K`.
//! That is why this structure, unlike the capture buffer, must live behind
//! an exclusion lock shared between the analysis thread (writer) and the
//! display path builder (reader): a torn update would not just glitch a
//! frame, it would corrupt the average until every slot rotated out.

/// Ring of magnitude vectors with a running-sum slot.
#[derive(Debug, Clone)]
pub struct MagnitudeAverager {
    /// `slots[0]` is the running sum; `slots[1..]` hold scaled frames.
    slots: Vec<Vec<f32>>,
    /// Next frame slot to replace, cycles over `1..slots.len()`.
    write_slot: usize,
}

impl MagnitudeAverager {
    /// Creates an averager of `num_slots` vectors (one sum + `num_slots - 1`
    /// frames) of `num_bins` bins each, all zeroed.
    ///
    /// # Panics
    ///
    /// Panics if `num_slots < 2`; there must be at least one frame slot.
    pub fn new(num_slots: usize, num_bins: usize) -> Self {
        assert!(num_slots >= 2, "averager needs a sum slot and a frame slot");
        Self {
            slots: vec![vec![0.0; num_bins]; num_slots],
            write_slot: 1,
        }
    }

    /// Bins per slot.
    pub fn num_bins(&self) -> usize {
        self.slots[0].len()
    }

    /// Total slot count, including the sum slot.
    pub fn num_slots(&self) -> usize {
        self.slots.len()
    }

    /// Replaces the oldest frame with `magnitudes` and updates the sum.
    ///
    /// # Panics
    ///
    /// Panics if `magnitudes.len()` differs from the configured bin count.
    pub fn push(&mut self, magnitudes: &[f32]) {
        let num_bins = self.num_bins();
        assert_eq!(magnitudes.len(), num_bins, "bin count mismatch");

        let scale = 1.0 / (self.slots.len() - 1) as f32;
        let slot = self.write_slot;
        for bin in 0..num_bins {
            let scaled = magnitudes[bin] * scale;
            self.slots[0][bin] += scaled - self.slots[slot][bin];
            self.slots[slot][bin] = scaled;
        }

        self.write_slot += 1;
        if self.write_slot == self.slots.len() {
            self.write_slot = 1;
        }
    }

    /// The averaged magnitudes (the running-sum slot).
    pub fn average(&self) -> &[f32] {
        &self.slots[0]
    }

    /// Zeroes every slot and resets the write pointer.
    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            slot.fill(0.0);
        }
        self.write_slot = 1;
    }

    /// Recomputed elementwise sum of the frame slots, for invariant checks.
    #[cfg(test)]
    fn recomputed_sum(&self) -> Vec<f32> {
        let mut sum = vec![0.0; self.num_bins()];
        for slot in &self.slots[1..] {
            for (acc, &value) in sum.iter_mut().zip(slot) {
                *acc += value;
            }
        }
        sum
    }
}
