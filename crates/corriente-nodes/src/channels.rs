//! Channel muxing: interleaving lanes into one stream and back.

use std::sync::Arc;

use corriente_core::{InPort, OutPort, Sample, Worker};

/// Merges `k` lanes into one stream, round-robin per sample.
///
/// A request for `n` interleaved samples reads `ceil(n / k)` from every
/// lane, so the output always emits whole frames; any surplus beyond `n`
/// stays buffered downstream.
pub struct Interleaver<T: Sample> {
    /// One input lane per channel, in frame order.
    pub lanes: Vec<InPort<T>>,
    /// The interleaved stream.
    pub interleaved: OutPort<T>,
}

impl<T: Sample> Interleaver<T> {
    /// Creates an interleaver over `lane_count` lanes.
    ///
    /// # Panics
    ///
    /// Panics if `lane_count` is zero.
    pub fn new(lane_count: usize) -> Arc<Self> {
        assert!(lane_count > 0, "interleaver needs at least one lane");
        let node = Arc::new(Self {
            lanes: (0..lane_count).map(|_| InPort::new()).collect(),
            interleaved: OutPort::new(),
        });
        node.interleaved.attach(&node);
        node
    }
}

impl<T: Sample> Worker for Interleaver<T> {
    fn work(&self, requested: usize) {
        let per_lane = requested.div_ceil(self.lanes.len());
        let mut frame = vec![T::ZERO; per_lane * self.lanes.len()];
        for (lane_index, lane) in self.lanes.iter().enumerate() {
            let samples = lane.read(per_lane);
            for (frame_index, sample) in samples.into_iter().enumerate() {
                frame[frame_index * self.lanes.len() + lane_index] = sample;
            }
        }
        self.interleaved.write(&frame);
    }
}

/// Splits one interleaved stream into `k` lanes.
///
/// A request for `n` samples on any lane consumes `n * k` interleaved
/// samples and feeds every lane, so the lanes advance in lock step.
pub struct Deinterleaver<T: Sample> {
    /// The interleaved stream.
    pub interleaved: InPort<T>,
    /// One output lane per channel, in frame order.
    pub lanes: Vec<OutPort<T>>,
}

impl<T: Sample> Deinterleaver<T> {
    /// Creates a deinterleaver over `lane_count` lanes.
    ///
    /// # Panics
    ///
    /// Panics if `lane_count` is zero.
    pub fn new(lane_count: usize) -> Arc<Self> {
        assert!(lane_count > 0, "deinterleaver needs at least one lane");
        let node = Arc::new(Self {
            interleaved: InPort::new(),
            lanes: (0..lane_count).map(|_| OutPort::new()).collect(),
        });
        for lane in &node.lanes {
            lane.attach(&node);
        }
        node
    }
}

impl<T: Sample> Worker for Deinterleaver<T> {
    fn work(&self, requested: usize) {
        let frame = self.interleaved.read(requested * self.lanes.len());
        for (lane_index, lane) in self.lanes.iter().enumerate() {
            let samples: Vec<T> = frame
                .iter()
                .skip(lane_index)
                .step_by(self.lanes.len())
                .copied()
                .collect();
            lane.write(&samples);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corriente_core::InPort;

    #[test]
    fn test_interleave_round_robin() {
        let mux = Interleaver::new(2);
        mux.lanes[0].push(&[1.0f32, 3.0, 5.0]);
        mux.lanes[1].push(&[2.0, 4.0, 6.0]);
        let sink = InPort::new();
        sink.connect(&mux.interleaved);
        assert_eq!(sink.read(6), vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    fn test_interleave_zero_fills_starved_lane() {
        let mux = Interleaver::new(2);
        mux.lanes[0].push(&[1.0f32, 2.0]);
        let sink = InPort::new();
        sink.connect(&mux.interleaved);
        assert_eq!(sink.read(4), vec![1.0, 0.0, 2.0, 0.0]);
    }

    #[test]
    fn test_deinterleave_lanes_advance_in_lock_step() {
        let demux = Deinterleaver::new(3);
        demux.interleaved.push(&[1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let sinks: Vec<InPort<f32>> = demux
            .lanes
            .iter()
            .map(|lane| {
                let sink = InPort::new();
                sink.connect(lane);
                sink
            })
            .collect();
        assert_eq!(sinks[0].read(2), vec![1.0, 4.0]);
        assert_eq!(sinks[1].read(2), vec![2.0, 5.0]);
        assert_eq!(sinks[2].read(2), vec![3.0, 6.0]);
    }

    #[test]
    fn test_mux_demux_is_identity() {
        let mux = Interleaver::new(2);
        let demux = Deinterleaver::new(2);
        demux.interleaved.connect(&mux.interleaved);
        mux.lanes[0].push(&[10.0f32, 11.0, 12.0, 13.0]);
        mux.lanes[1].push(&[20.0, 21.0, 22.0, 23.0]);

        let left = InPort::new();
        left.connect(&demux.lanes[0]);
        let right = InPort::new();
        right.connect(&demux.lanes[1]);
        assert_eq!(left.read(4), vec![10.0, 11.0, 12.0, 13.0]);
        assert_eq!(right.read(4), vec![20.0, 21.0, 22.0, 23.0]);
    }
}
