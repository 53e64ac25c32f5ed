//! Time source: the graph's notion of a sample clock.

use std::sync::Arc;

use corriente_core::{NodeState, OutPort, Worker};

/// Emits monotonically increasing time points at a fixed rate.
///
/// Sample `i` of a request carries the time `current + i / rate` seconds;
/// the running time persists across calls, so any partition of pulls
/// yields the same stream. Several composite nodes own a private `Clock` —
/// the oscillators use it as a time base, the resampler as an index
/// counter (where "rate" is the output-per-input ratio rather than Hz).
///
/// Time is `f64`: an `f32` time base loses sample-level resolution within
/// minutes of continuous streaming.
pub struct Clock {
    /// The time stream.
    pub time: OutPort<f64>,
    sample_rate: f64,
    state: NodeState<f64>,
}

impl Clock {
    /// Creates a clock starting at time zero.
    pub fn new(sample_rate: f64) -> Arc<Self> {
        Self::with_offset(sample_rate, 0.0)
    }

    /// Creates a clock starting at `offset` seconds.
    pub fn with_offset(sample_rate: f64, offset: f64) -> Arc<Self> {
        let node = Arc::new(Self {
            time: OutPort::new(),
            sample_rate,
            state: NodeState::new(offset),
        });
        node.time.attach(&node);
        node
    }
}

impl Worker for Clock {
    fn work(&self, requested: usize) {
        let points = self.state.with(|current| {
            let points: Vec<f64> = (0..requested)
                .map(|i| *current + i as f64 / self.sample_rate)
                .collect();
            *current += requested as f64 / self.sample_rate;
            points
        });
        self.time.write(&points);
    }
}
