//! Symbol timing: clock extraction and edge-triggered sampling.

use std::sync::Arc;

use corriente_core::{ConsumerId, InPort, NodeState, OutPort, Worker};

use crate::fir::FirFilter;

/// Recovers a symbol clock from a baseband signal.
///
/// Squaring the signal folds its symbol transitions into a spectral line
/// at the symbol rate; a private peak [`FirFilter`] isolates that line and
/// the result is hard-limited to a ±1 square wave whose rising edges mark
/// symbol centers (after suitable delay alignment chosen by the wiring).
pub struct ClockRecovery {
    /// The baseband signal carrying symbol transitions.
    pub input: InPort<f32>,
    /// The recovered ±1 clock.
    pub clock: OutPort<f32>,
    filter: Arc<FirFilter<f32>>,
    filter_id: ConsumerId,
}

impl ClockRecovery {
    /// Creates a recovery node for a `symbol_rate` Hz clock.
    ///
    /// `margin` is the peak filter's half-width; `taps` its length —
    /// longer filters ring longer but reject more of the data spectrum.
    pub fn new(symbol_rate: f64, margin: f64, taps: usize, sample_rate: f64) -> Arc<Self> {
        let filter = FirFilter::peak(symbol_rate, margin, taps, sample_rate);
        let filter_id = filter.filtered.register_consumer();
        let node = Arc::new(Self {
            input: InPort::new(),
            clock: OutPort::new(),
            filter,
            filter_id,
        });
        node.clock.attach(&node);
        node
    }
}

impl Worker for ClockRecovery {
    fn work(&self, requested: usize) {
        let signal = self.input.read(requested);
        let squared: Vec<f32> = signal.iter().map(|&s| s * s).collect();
        self.filter.input.push(&squared);
        let filtered = self.filter.filtered.read(requested, self.filter_id);
        let clock: Vec<f32> = filtered
            .iter()
            .map(|&s| if s > 0.0 { 1.0 } else { -1.0 })
            .collect();
        self.clock.write(&clock);
    }
}

/// Samples a signal on the rising edges of a clock stream.
///
/// The edge-triggered consumption state machine: the level of the last
/// processed clock sample is carried across calls; each block is scanned
/// for rising transitions against that carry, and one output sample is
/// emitted per transition. Blocks of `block_size` samples are pulled from
/// both inputs in lock step until the requested count is produced — a
/// block with no transition produces nothing and simply pulls more input,
/// while extra transitions become surplus retained downstream.
pub struct EdgeSampler {
    /// The signal to sample.
    pub signal: InPort<f32>,
    /// The sampling clock; rising edges trigger output.
    pub clock: InPort<f32>,
    /// One sample per rising clock edge.
    pub sampled: OutPort<f32>,
    block_size: usize,
    state: NodeState<f32>,
}

impl EdgeSampler {
    /// Creates a sampler pulling `block_size` samples per scan.
    ///
    /// # Panics
    ///
    /// Panics if `block_size` is zero.
    pub fn new(block_size: usize) -> Arc<Self> {
        assert!(block_size > 0, "edge sampler block size must be positive");
        let node = Arc::new(Self {
            signal: InPort::new(),
            clock: InPort::new(),
            sampled: OutPort::new(),
            block_size,
            // Starting high suppresses a spurious edge from a clock that
            // begins at its high level.
            state: NodeState::new(1.0),
        });
        node.sampled.attach(&node);
        node
    }
}

impl Worker for EdgeSampler {
    fn work(&self, requested: usize) {
        let mut picked = Vec::new();
        while picked.len() < requested {
            let signal = self.signal.read(self.block_size);
            let clock = self.clock.read(self.block_size);
            let edges = self.state.with(|last| {
                let mut edges = Vec::new();
                let mut previous = *last;
                for (&level, &sample) in clock.iter().zip(&signal) {
                    if level > previous {
                        edges.push(sample);
                    }
                    previous = level;
                }
                *last = previous;
                edges
            });
            picked.extend(edges);
        }
        self.sampled.write(&picked);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corriente_core::InPort;

    fn square_clock(period: usize, cycles: usize) -> Vec<f32> {
        let mut clock = Vec::with_capacity(period * cycles);
        for _ in 0..cycles {
            clock.extend(std::iter::repeat_n(-1.0, period / 2));
            clock.extend(std::iter::repeat_n(1.0, period - period / 2));
        }
        clock
    }

    #[test]
    fn test_samples_on_rising_edges_only() {
        let sampler = EdgeSampler::new(8);
        // Clock: low half, high half — one rising edge per period.
        sampler.clock.push(&square_clock(4, 4));
        sampler.signal.push(&[
            10.0, 11.0, 12.0, 13.0, 20.0, 21.0, 22.0, 23.0, 30.0, 31.0, 32.0, 33.0, 40.0, 41.0,
            42.0, 43.0,
        ]);
        let sink = InPort::new();
        sink.connect(&sampler.sampled);
        // Edges land at indices 2, 6, 10, 14.
        assert_eq!(sink.read(4), vec![12.0, 22.0, 32.0, 42.0]);
    }

    #[test]
    fn test_initial_high_clock_produces_no_edge() {
        let sampler = EdgeSampler::new(4);
        sampler.clock.push(&[1.0, 1.0, -1.0, 1.0]);
        sampler.signal.push(&[1.0, 2.0, 3.0, 4.0]);
        let sink = InPort::new();
        sink.connect(&sampler.sampled);
        // Only the -1 -> 1 transition at index 3 counts.
        assert_eq!(sink.read(1), vec![4.0]);
    }

    #[test]
    fn test_state_continuity_across_partitions() {
        // A periodic signal sampled over many periods must give the same
        // symbol stream no matter how the pulls are partitioned.
        let period = 10usize;
        let cycles = 8usize;
        let clock = square_clock(period, cycles);
        let signal: Vec<f32> = (0..period * cycles).map(|i| i as f32).collect();

        let partitions: [&[usize]; 3] = [&[8], &[1, 2, 5], &[3, 3, 1, 1]];
        let mut streams = Vec::new();
        for sizes in partitions {
            let sampler = EdgeSampler::new(16);
            sampler.clock.push(&clock);
            sampler.signal.push(&signal);
            let sink = InPort::new();
            sink.connect(&sampler.sampled);
            let mut stream = Vec::new();
            for &size in sizes {
                stream.extend(sink.read(size));
            }
            streams.push(stream);
        }
        assert_eq!(streams[0], streams[1]);
        assert_eq!(streams[0], streams[2]);
        // One sample per period, taken at each rising edge.
        let expected: Vec<f32> = (0..cycles).map(|c| (c * period + period / 2) as f32).collect();
        assert_eq!(streams[0], expected);
    }

    #[test]
    fn test_clock_recovery_emits_square_wave() {
        let recovery = ClockRecovery::new(100.0, 10.0, 101, 1000.0);
        // Alternating ±1 baseband at the symbol rate.
        let baseband: Vec<f32> = (0..400)
            .map(|i| if (i / 5) % 2 == 0 { 1.0 } else { -1.0 })
            .collect();
        recovery.input.push(&baseband);
        let sink = InPort::new();
        sink.connect(&recovery.clock);
        for level in sink.read(400) {
            assert!(level == 1.0 || level == -1.0);
        }
    }
}
