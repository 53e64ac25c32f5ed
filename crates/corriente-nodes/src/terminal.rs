//! Terminal nodes: where external code meets the graph.

use std::sync::{Arc, Condvar, Mutex};
use std::thread;

use corriente_core::{InPort, OutPort, SampleQueue, Worker};

/// Producer-side terminal with a presence mask.
///
/// External code pushes sample blocks with [`push`](PushSource::push);
/// each pushed sample is broadcast on `samples` together with a `1.0` on
/// the parallel `present` lane. When the graph outruns the pushes, demand
/// is met with zeros on both lanes — `0.0` presence marks the filler, so
/// downstream nodes can tell injected silence from intentional data.
pub struct PushSource {
    /// The sample stream: pushed data, zero-filled under starvation.
    pub samples: OutPort<f32>,
    /// Presence mask aligned one-to-one with `samples`.
    pub present: OutPort<f32>,
}

impl PushSource {
    /// Creates an empty source.
    pub fn new() -> Arc<Self> {
        let node = Arc::new(Self {
            samples: OutPort::new(),
            present: OutPort::new(),
        });
        node.samples.attach(&node);
        node.present.attach(&node);
        node
    }

    /// Feeds a block of genuine samples into the graph.
    pub fn push(&self, block: &[f32]) {
        self.samples.write(block);
        self.present.write(&vec![1.0; block.len()]);
    }
}

impl Worker for PushSource {
    fn work(&self, requested: usize) {
        // Nothing pushed in time: graceful silence, flagged as absent.
        let fallback = vec![0.0; requested];
        self.samples.write(&fallback);
        self.present.write(&fallback);
    }
}

/// Consumer-side terminal: a plain pull surface.
pub struct PullSink {
    /// The stream to drain.
    pub samples: InPort<f32>,
}

impl PullSink {
    /// Creates a sink; wire `samples` to the stream to expose.
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            samples: InPort::new(),
        })
    }

    /// Pulls exactly `count` samples from the graph.
    pub fn read(&self, count: usize) -> Vec<f32> {
        self.samples.read(count)
    }
}

struct RecorderState {
    /// Samples still wanted by the pending `record` call.
    pending: usize,
    captured: SampleQueue<f32>,
}

/// Capture terminal: record N samples and wait.
///
/// A drive thread (started with [`start`](Recorder::start)) continuously
/// pulls fixed blocks through the `audio` input. While a
/// [`record`](Recorder::record) call is armed, pulled samples accumulate
/// until the requested count is reached, at which point the caller is
/// woken; outside an armed window the stream is discarded.
pub struct Recorder {
    /// The stream to capture from.
    pub audio: InPort<f32>,
    block_size: usize,
    state: Mutex<RecorderState>,
    done: Condvar,
}

impl Recorder {
    /// Creates a recorder pulling `block_size` samples per drive step.
    ///
    /// # Panics
    ///
    /// Panics if `block_size` is zero.
    pub fn new(block_size: usize) -> Arc<Self> {
        assert!(block_size > 0, "recorder block size must be positive");
        Arc::new(Self {
            audio: InPort::new(),
            block_size,
            state: Mutex::new(RecorderState {
                pending: 0,
                captured: SampleQueue::new(),
            }),
            done: Condvar::new(),
        })
    }

    /// Spawns the drive thread. It stops once the recorder is dropped.
    pub fn start(self: &Arc<Self>) {
        let weak = Arc::downgrade(self);
        tracing::debug!(block_size = self.block_size, "recorder drive thread starting");
        thread::spawn(move || {
            while let Some(recorder) = weak.upgrade() {
                recorder.step();
            }
        });
    }

    /// Pulls one block and captures it if a recording is armed.
    ///
    /// Public so that a graph without the drive thread (tests, offline
    /// processing) can pace the recorder itself.
    pub fn step(&self) {
        let samples = self.audio.read(self.block_size);
        let mut state = self.state.lock().expect("recorder state poisoned");
        if state.pending > 0 {
            let take = state.pending.min(samples.len());
            state.captured.write(&samples[..take]);
            state.pending -= take;
            if state.pending == 0 {
                self.done.notify_all();
            }
        }
    }

    /// Blocks until `count` samples have streamed past, then returns them.
    pub fn record(&self, count: usize) -> Vec<f32> {
        let mut state = self.state.lock().expect("recorder state poisoned");
        state.pending = count;
        while state.captured.len() < count {
            state = self.done.wait(state).expect("recorder state poisoned");
        }
        state.captured.read(count)
    }
}

/// Discards a stream, pulling fixed blocks forever.
///
/// Keeps a push-fed chain draining when nothing downstream wants the
/// data — the demand-driven equivalent of a muted output.
pub struct NullSink {
    /// The stream to discard.
    pub samples: InPort<f32>,
    block_size: usize,
}

impl NullSink {
    /// Creates a sink pulling `block_size` samples per step.
    pub fn new(block_size: usize) -> Arc<Self> {
        Arc::new(Self {
            samples: InPort::new(),
            block_size,
        })
    }

    /// Spawns the drive thread. It stops once the sink is dropped.
    pub fn start(self: &Arc<Self>) {
        let weak = Arc::downgrade(self);
        tracing::debug!(block_size = self.block_size, "null sink drive thread starting");
        thread::spawn(move || {
            while let Some(sink) = weak.upgrade() {
                sink.samples.read(sink.block_size);
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presence_marks_pushed_samples() {
        let source = PushSource::new();
        let data = InPort::new();
        data.connect(&source.samples);
        let present = InPort::new();
        present.connect(&source.present);

        source.push(&[0.5, -0.5, 0.25]);
        assert_eq!(data.read(3), vec![0.5, -0.5, 0.25]);
        assert_eq!(present.read(3), vec![1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_presence_marks_filler_past_pushed_data() {
        let source = PushSource::new();
        let data = InPort::new();
        data.connect(&source.samples);
        let present = InPort::new();
        present.connect(&source.present);

        source.push(&[1.0, 1.0]);
        assert_eq!(data.read(4), vec![1.0, 1.0, 0.0, 0.0]);
        assert_eq!(present.read(4), vec![1.0, 1.0, 0.0, 0.0]);
    }

    #[test]
    fn test_pull_sink_reads_through() {
        let source = PushSource::new();
        let sink = PullSink::new();
        sink.samples.connect(&source.samples);
        source.push(&[7.0]);
        assert_eq!(sink.read(2), vec![7.0, 0.0]);
    }

    #[test]
    fn test_recorder_captures_armed_window() {
        let source = PushSource::new();
        let recorder = Recorder::new(4);
        recorder.audio.connect(&source.samples);
        source.push(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

        let handle = {
            let recorder = Arc::clone(&recorder);
            thread::spawn(move || recorder.record(5))
        };
        // Pace the recorder from this thread once the waiter is armed.
        while recorder.state.lock().unwrap().pending == 0 {
            thread::yield_now();
        }
        while !handle.is_finished() {
            recorder.step();
        }
        assert_eq!(handle.join().unwrap(), vec![1.0, 2.0, 3.0, 4.0, 5.0]);
    }
}
