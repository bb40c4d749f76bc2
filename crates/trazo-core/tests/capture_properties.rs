//! Property-based tests for the capture buffer.
//!
//! Uses proptest to verify the circular-buffer contract over arbitrary push
//! schedules: the returned window is always exactly the most recent samples,
//! in order, regardless of how the writes were chunked or how often the
//! buffer wrapped.

use proptest::prelude::*;
use trazo_core::{CaptureBuffer, SampleWindow};

/// Push a ramp signal in the given chunk sizes and return the full sequence.
fn push_ramp(buffer: &CaptureBuffer, chunks: &[usize]) -> Vec<f32> {
    let mut pushed = Vec::new();
    let mut next = 0u32;
    for &chunk in chunks {
        let block: Vec<f32> = (0..chunk)
            .map(|_| {
                let value = (next % 65536) as f32;
                next += 1;
                value
            })
            .collect();
        buffer.push_block(&[&block]);
        pushed.extend_from_slice(&block);
    }
    pushed
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// For pushes totaling at most the capacity, any window of N <= total
    /// returns exactly the last N samples pushed, in order.
    #[test]
    fn window_is_exact_tail_without_wrap(
        capacity in 16usize..256,
        chunks in prop::collection::vec(1usize..32, 1..8),
        request_fraction in 0.0f64..=1.0,
    ) {
        let total: usize = chunks.iter().sum();
        prop_assume!(total <= capacity);

        let mut buffer = CaptureBuffer::new();
        buffer.prepare(1, capacity);
        let pushed = push_ramp(&buffer, &chunks);

        let request = ((total as f64) * request_fraction) as usize;
        let mut out = SampleWindow::new();
        buffer.most_recent_window(&mut out, request);

        prop_assert_eq!(out.len(), request.min(total));
        prop_assert_eq!(out.channel(0), &pushed[total - out.len()..]);
    }

    /// Pushing past capacity, any window <= capacity returns the correct
    /// tail of the ramp with no duplication or gaps.
    #[test]
    fn wraparound_returns_correct_tail(
        capacity in 16usize..128,
        overflow in 1usize..512,
        chunk in 1usize..48,
        request_fraction in 0.0f64..=1.0,
    ) {
        let total = capacity + overflow;
        let chunks: Vec<usize> = {
            let mut remaining = total;
            let mut out = Vec::new();
            while remaining > 0 {
                let n = chunk.min(remaining);
                out.push(n);
                remaining -= n;
            }
            out
        };

        let mut buffer = CaptureBuffer::new();
        buffer.prepare(1, capacity);
        let pushed = push_ramp(&buffer, &chunks);

        let request = ((capacity as f64) * request_fraction) as usize;
        let mut out = SampleWindow::new();
        buffer.most_recent_window(&mut out, request);

        prop_assert_eq!(out.len(), request);
        prop_assert_eq!(out.channel(0), &pushed[total - request..]);
    }

    /// After pushing capacity + X samples the fill count reports exactly
    /// capacity, never more.
    #[test]
    fn fill_saturates(
        capacity in 16usize..128,
        overflow in 0usize..512,
    ) {
        let mut buffer = CaptureBuffer::new();
        buffer.prepare(1, capacity);
        let chunks = vec![7; (capacity + overflow).div_ceil(7)];
        push_ramp(&buffer, &chunks);

        prop_assert_eq!(buffer.stored_samples(), capacity);

        let mut out = SampleWindow::new();
        buffer.most_recent_window(&mut out, capacity + 64);
        prop_assert_eq!(out.len(), capacity);
    }
}
