//! Sample delay, and the cycle-breaking primitive.

use std::sync::Arc;

use corriente_core::{InPort, NodeState, OutPort, Sample, SampleQueue, Worker};

/// Delays a stream by a fixed number of samples.
///
/// The first `amount` output samples are zeros; thereafter output sample
/// `k` equals input sample `k - amount`. The queue is pre-seeded at
/// construction, which makes this node the designated way to break a
/// feedback loop: the first pull around the cycle is served from the
/// pre-seeded samples instead of recursing into itself.
///
/// `work` emits buffered samples *before* pulling the input for the
/// remainder. The emitted sequence is identical either way, but emitting
/// first means a pull that loops back through this node finds data already
/// broadcast, bounding the recursion depth by the request size. A cycle
/// not routed through a pre-seeded delay still recurses without bound —
/// wiring is responsible for breaking every loop.
pub struct Delay<T: Sample> {
    /// The stream to delay.
    pub input: InPort<T>,
    /// The delayed stream.
    pub delayed: OutPort<T>,
    state: NodeState<SampleQueue<T>>,
}

impl<T: Sample> Delay<T> {
    /// Creates a delay of `amount` samples, pre-seeded with zeros.
    pub fn new(amount: usize) -> Arc<Self> {
        let node = Arc::new(Self {
            input: InPort::new(),
            delayed: OutPort::new(),
            state: NodeState::new(SampleQueue::with_zeros(amount)),
        });
        node.delayed.attach(&node);
        node
    }
}

impl<T: Sample> Worker for Delay<T> {
    fn work(&self, requested: usize) {
        // Serve what the queue already holds before touching the input —
        // inside a feedback loop this is what lets the first pull around
        // the cycle complete without recursing into itself.
        let head = self.state.with(|queue| queue.read(requested));
        if !head.is_empty() {
            self.delayed.write(&head);
        }
        let remaining = requested - head.len();
        if remaining > 0 {
            let chunk = self.input.read(remaining);
            let tail = self.state.with(|queue| {
                queue.write(&chunk);
                queue.read(remaining)
            });
            self.delayed.write(&tail);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corriente_core::InPort;

    #[test]
    fn test_output_lags_input_by_amount() {
        let delay = Delay::new(3);
        delay.input.push(&[1.0f32, 2.0, 3.0, 4.0]);
        let sink = InPort::new();
        sink.connect(&delay.delayed);
        assert_eq!(sink.read(7), vec![0.0, 0.0, 0.0, 1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_partition_invariance() {
        let whole = Delay::new(2);
        whole.input.push(&[5.0f32, 6.0, 7.0, 8.0, 9.0]);
        let whole_sink = InPort::new();
        whole_sink.connect(&whole.delayed);
        let expected = whole_sink.read(7);

        let split = Delay::new(2);
        split.input.push(&[5.0f32, 6.0, 7.0, 8.0, 9.0]);
        let split_sink = InPort::new();
        split_sink.connect(&split.delayed);
        let mut stream = split_sink.read(1);
        stream.extend(split_sink.read(4));
        stream.extend(split_sink.read(2));
        assert_eq!(stream, expected);
    }

    #[test]
    fn test_zero_delay_is_passthrough() {
        let delay = Delay::new(0);
        delay.input.push(&[1.0f32, 2.0]);
        let sink = InPort::new();
        sink.connect(&delay.delayed);
        assert_eq!(sink.read(2), vec![1.0, 2.0]);
    }
}
