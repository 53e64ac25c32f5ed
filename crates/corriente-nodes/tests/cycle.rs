//! Cycle safety: a feedback edge routed through a pre-seeded delay must
//! terminate for any finite pull, producing the recurrence it encodes.

use std::sync::Arc;

use corriente_core::{InPort, OutPort, Worker};
use corriente_nodes::Delay;

/// One-pole feedback section: `y[k] = 0.5 * x[k] + 1`.
///
/// Wired with its input fed from a delayed copy of its own output, it
/// computes the recurrence `y[k] = 0.5 * y[k - d] + 1`.
struct Section {
    input: InPort<f32>,
    output: OutPort<f32>,
}

impl Section {
    fn new() -> Arc<Self> {
        let node = Arc::new(Self {
            input: InPort::new(),
            output: OutPort::new(),
        });
        node.output.attach(&node);
        node
    }
}

impl Worker for Section {
    fn work(&self, requested: usize) {
        let x = self.input.read(requested);
        let y: Vec<f32> = x.iter().map(|&v| 0.5 * v + 1.0).collect();
        self.output.write(&y);
    }
}

fn feedback_loop(delay: usize) -> (Arc<Section>, Arc<Delay<f32>>, InPort<f32>) {
    let section = Section::new();
    let loop_delay = Delay::new(delay);
    loop_delay.input.connect(&section.output);
    section.input.connect(&loop_delay.delayed);
    let sink = InPort::new();
    sink.connect(&section.output);
    (section, loop_delay, sink)
}

fn recurrence(delay: usize, count: usize) -> Vec<f32> {
    let mut y = Vec::with_capacity(count);
    for k in 0..count {
        let feedback = if k < delay { 0.0 } else { y[k - delay] };
        y.push(0.5 * feedback + 1.0);
    }
    y
}

#[test]
fn one_sample_delay_loop_terminates_sample_by_sample() {
    let (_section, _delay, sink) = feedback_loop(1);
    let mut stream = Vec::new();
    for _ in 0..8 {
        stream.extend(sink.read(1));
    }
    assert_eq!(stream, recurrence(1, 8));
}

#[test]
fn one_sample_delay_loop_terminates_for_batch_pulls() {
    let (_section, _delay, sink) = feedback_loop(1);
    let mut stream = sink.read(3);
    stream.extend(sink.read(5));
    stream.extend(sink.read(2));
    assert_eq!(stream, recurrence(1, 10));
}

#[test]
fn longer_delay_loop_converges_geometrically() {
    let (_section, _delay, sink) = feedback_loop(3);
    let stream = sink.read(12);
    assert_eq!(stream, recurrence(3, 12));
    // The recurrence converges toward 2.0.
    assert!((stream[11] - 2.0).abs() < 0.3);
}
