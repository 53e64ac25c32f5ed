//! Pass-through tap for live observation.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use corriente_core::{InPort, OutPort, Worker};

/// Inline tap: forwards its input unchanged and retains the most recent
/// window of samples for external observers.
///
/// This is the graph's plotting boundary — a UI refresh thread calls
/// [`snapshot`](Probe::snapshot) at its own pace without participating in
/// the pull schedule, while the probe sits transparently inside a chain.
pub struct Probe {
    /// The stream to observe.
    pub input: InPort<f32>,
    /// The forwarded stream, identical to the input.
    pub output: OutPort<f32>,
    window: usize,
    ring: Mutex<VecDeque<f32>>,
}

impl Probe {
    /// Creates a probe retaining the last `window` samples.
    ///
    /// # Panics
    ///
    /// Panics if `window` is zero.
    pub fn new(window: usize) -> Arc<Self> {
        assert!(window > 0, "probe window must be positive");
        let node = Arc::new(Self {
            input: InPort::new(),
            output: OutPort::new(),
            window,
            ring: Mutex::new(VecDeque::with_capacity(window)),
        });
        node.output.attach(&node);
        node
    }

    /// Returns a copy of the retained window, oldest sample first.
    pub fn snapshot(&self) -> Vec<f32> {
        let ring = self.ring.lock().expect("probe ring poisoned");
        ring.iter().copied().collect()
    }
}

impl Worker for Probe {
    fn work(&self, requested: usize) {
        let samples = self.input.read(requested);
        {
            let mut ring = self.ring.lock().expect("probe ring poisoned");
            for &sample in &samples {
                if ring.len() == self.window {
                    ring.pop_front();
                }
                ring.push_back(sample);
            }
        }
        self.output.write(&samples);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forwards_unchanged() {
        let probe = Probe::new(8);
        probe.input.push(&[1.0, 2.0, 3.0]);
        let sink = InPort::new();
        sink.connect(&probe.output);
        assert_eq!(sink.read(3), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_snapshot_keeps_latest_window() {
        let probe = Probe::new(4);
        probe.input.push(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let sink = InPort::new();
        sink.connect(&probe.output);
        sink.read(6);
        assert_eq!(probe.snapshot(), vec![3.0, 4.0, 5.0, 6.0]);
    }
}
