//! Nearest-neighbour rate conversion.

use std::sync::Arc;

use corriente_core::{ConsumerId, InPort, NodeState, OutPort, Worker};

use crate::clock::Clock;

struct ResampleState {
    /// Absolute input index of the last sample carried over.
    current_index: i64,
    /// Carried sample for requests that land before the next fresh input.
    last_sample: f32,
}

/// Converts a stream's rate by picking the nearest input sample.
///
/// `output_ratio` is the number of output samples per input sample; values
/// above one upsample (repeating inputs), below one downsample (skipping
/// inputs). The node owns a private [`Clock`] running at `output_ratio` as
/// an index counter and registers itself as that clock's consumer — the
/// composition pattern in its smallest form. The last input sample is
/// carried across calls so interpolation points never jump at block
/// boundaries.
pub struct NearestResampler {
    /// The stream to resample.
    pub original: InPort<f32>,
    /// The rate-converted stream.
    pub resampled: OutPort<f32>,
    counter: Arc<Clock>,
    counter_id: ConsumerId,
    state: NodeState<ResampleState>,
}

impl NearestResampler {
    /// Creates a resampler emitting `output_ratio` samples per input.
    ///
    /// # Panics
    ///
    /// Panics if `output_ratio` is not positive.
    pub fn new(output_ratio: f64) -> Arc<Self> {
        assert!(output_ratio > 0.0, "resample ratio must be positive");
        let counter = Clock::new(output_ratio);
        let counter_id = counter.time.register_consumer();
        let node = Arc::new(Self {
            original: InPort::new(),
            resampled: OutPort::new(),
            counter,
            counter_id,
            state: NodeState::new(ResampleState {
                current_index: -1,
                last_sample: 0.0,
            }),
        });
        node.resampled.attach(&node);
        node
    }
}

impl Worker for NearestResampler {
    fn work(&self, requested: usize) {
        let ticks = self.counter.time.read(requested, self.counter_id);
        let (offsets, input_amount) = self.state.with(|state| {
            let offsets: Vec<usize> = ticks
                .iter()
                .map(|tick| (tick.round() as i64 - state.current_index).max(0) as usize)
                .collect();
            let input_amount = offsets.iter().copied().max().unwrap_or(0);
            (offsets, input_amount)
        });
        let fresh = self.original.read(input_amount);
        let resampled = self.state.with(|state| {
            // Index 0 addresses the carried sample, 1.. the fresh block.
            let resampled: Vec<f32> = offsets
                .iter()
                .map(|&offset| {
                    if offset == 0 {
                        state.last_sample
                    } else {
                        fresh[offset - 1]
                    }
                })
                .collect();
            if let Some(&last) = fresh.last() {
                state.last_sample = last;
            }
            state.current_index += input_amount as i64;
            resampled
        });
        self.resampled.write(&resampled);
    }
}
