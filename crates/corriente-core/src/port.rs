//! Edge endpoints: producing output ports and consuming input ports.
//!
//! An [`OutPort`] owns one private [`SampleQueue`] per registered consumer
//! and a reentrant lock; when a consumer's queue runs short it triggers the
//! owning node's [`Worker::work`] for the shortfall, under that lock. An
//! [`InPort`] owns a local residue queue and an immutable link to at most
//! one producing output port, and fills any remaining deficit with zeros
//! when it has no producer.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, Weak};

use parking_lot::ReentrantMutex;

use crate::node::Worker;
use crate::queue::SampleQueue;
use crate::sample::Sample;

/// Opaque handle identifying one registered consumer of an [`OutPort`].
///
/// Issued by [`OutPort::register_consumer`] from a process-wide counter, so
/// a handle is never reused and never aliases another consumer — including
/// a parent node registering against its own private children.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConsumerId(u64);

impl ConsumerId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(0);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

struct OutPortShared<T: Sample> {
    /// Per-consumer queues. The reentrant lock serializes concurrent pulls
    /// from different threads while still admitting the same thread twice,
    /// which is what a pre-seeded feedback loop needs. `RefCell` borrows
    /// are scoped so that none is ever held across a `work` invocation.
    queues: ReentrantMutex<RefCell<HashMap<ConsumerId, SampleQueue<T>>>>,
    /// The owning node. Attached once, right after node construction.
    worker: OnceLock<Weak<dyn Worker>>,
}

/// The producing end of an edge.
///
/// `OutPort` is a cheap handle over shared state: a node keeps one clone in
/// its own struct, and every connected [`InPort`] keeps another. All clones
/// denote the same port.
///
/// Every registered consumer observes the identical sample sequence in the
/// same order; consumers at different read offsets (fast/slow fan-out) do
/// not interfere, because each has a private queue.
pub struct OutPort<T: Sample> {
    shared: Arc<OutPortShared<T>>,
}

impl<T: Sample> Clone for OutPort<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Sample> Default for OutPort<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Sample> OutPort<T> {
    /// Creates a port with no consumers and no owning node yet.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(OutPortShared {
                queues: ReentrantMutex::new(RefCell::new(HashMap::new())),
                worker: OnceLock::new(),
            }),
        }
    }

    /// Attaches the owning node.
    ///
    /// Node constructors call this once per output port, immediately after
    /// wrapping the node in an `Arc`. The port holds only a weak reference;
    /// ports never keep their node alive.
    ///
    /// # Panics
    ///
    /// Panics if the port already has an owner.
    pub fn attach<W: Worker + 'static>(&self, node: &Arc<W>) {
        let weak = Arc::downgrade(node);
        let worker: Weak<dyn Worker> = weak;
        assert!(
            self.shared.worker.set(worker).is_ok(),
            "output port already attached to a node"
        );
    }

    /// Registers a new consumer and returns its handle.
    ///
    /// Allocates a fresh empty queue; the consumer sees only samples
    /// broadcast after this point.
    pub fn register_consumer(&self) -> ConsumerId {
        let id = ConsumerId::next();
        let guard = self.shared.queues.lock();
        guard.borrow_mut().insert(id, SampleQueue::new());
        tracing::trace!(consumer = id.0, "consumer registered");
        id
    }

    /// Removes and returns `count` samples for `consumer`.
    ///
    /// Under the port's lock: while the consumer's queue holds fewer than
    /// `count` samples, the owning node's [`Worker::work`] is invoked for
    /// the shortfall; then up to `count` samples are popped. An honest
    /// worker (one that writes at least what it was asked for) fills the
    /// queue in one trigger and the read is exact.
    ///
    /// A trigger that makes no net progress for this consumer ends the
    /// loop and the read returns short. That happens only when the owning
    /// node is gone, or when a feedback cycle re-entered this port on the
    /// same thread and consumed the broadcast mid-flight — in a loop
    /// broken by a pre-seeded delay, returning short lets the outer frames
    /// unwind instead of spinning, and the stream stays consistent because
    /// every consumer still sees each broadcast exactly once.
    ///
    /// # Panics
    ///
    /// Panics if `consumer` was never registered with this port.
    pub fn read(&self, count: usize, consumer: ConsumerId) -> Vec<T> {
        let guard = self.shared.queues.lock();
        loop {
            let available = guard
                .borrow()
                .get(&consumer)
                .unwrap_or_else(|| panic!("read for unregistered consumer {consumer:?}"))
                .len();
            if available >= count {
                break;
            }
            let Some(worker) = self.shared.worker.get().and_then(Weak::upgrade) else {
                break;
            };
            // Borrow dropped above: work may re-enter this port.
            worker.work(count - available);
            let now = guard
                .borrow()
                .get(&consumer)
                .map_or(0, SampleQueue::len);
            if now <= available {
                break;
            }
        }
        guard
            .borrow_mut()
            .get_mut(&consumer)
            .unwrap_or_else(|| panic!("read for unregistered consumer {consumer:?}"))
            .read(count)
    }

    /// Appends `samples` to every registered consumer's queue.
    ///
    /// This broadcast is the only way a node emits output, called from its
    /// `work` routine — usually while the triggering read already holds the
    /// port lock, which the reentrant lock admits. Order is preserved
    /// identically into every queue.
    pub fn write(&self, samples: &[T]) {
        let guard = self.shared.queues.lock();
        for queue in guard.borrow_mut().values_mut() {
            queue.write(samples);
        }
    }

    /// Number of currently registered consumers.
    pub fn consumer_count(&self) -> usize {
        let guard = self.shared.queues.lock();
        let count = guard.borrow().len();
        count
    }
}

struct InPortState<T: Sample> {
    queue: SampleQueue<T>,
    producer: Option<(OutPort<T>, ConsumerId)>,
}

/// The receiving end of an edge.
///
/// Owns a local queue for residue a producer over-delivered on a prior
/// call, and an optional link to exactly one producing [`OutPort`]. The
/// link is set once by [`connect`](InPort::connect) and is immutable for
/// the port's lifetime.
pub struct InPort<T: Sample> {
    state: ReentrantMutex<RefCell<InPortState<T>>>,
}

impl<T: Sample> Default for InPort<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Sample> InPort<T> {
    /// Creates an unbound port.
    pub fn new() -> Self {
        Self {
            state: ReentrantMutex::new(RefCell::new(InPortState {
                queue: SampleQueue::new(),
                producer: None,
            })),
        }
    }

    /// Binds this port to a producing output, registering as a consumer.
    ///
    /// # Panics
    ///
    /// Panics if the port is already bound — edges are not re-wired after
    /// construction.
    pub fn connect(&self, producer: &OutPort<T>) {
        let id = producer.register_consumer();
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        assert!(
            state.producer.is_none(),
            "input port is already bound to a producer"
        );
        state.producer = Some((producer.clone(), id));
    }

    /// Returns true if [`connect`](InPort::connect) has been called.
    pub fn is_connected(&self) -> bool {
        let guard = self.state.lock();
        let connected = guard.borrow().producer.is_some();
        connected
    }

    /// Returns `count` samples.
    ///
    /// Drains the local residue queue first, then pulls the exact deficit
    /// from the bound producer. An unbound port fills the deficit with
    /// [`Sample::ZERO`] — a disconnected or not-yet-live input never stalls
    /// or fails the pull, it yields silence.
    ///
    /// The result is exactly `count` samples unless the producer itself
    /// delivered short (see [`OutPort::read`]); the shortfall is passed
    /// through rather than padded, so a feedback loop never has silence
    /// injected into it.
    pub fn read(&self, count: usize) -> Vec<T> {
        let guard = self.state.lock();
        let (mut samples, producer) = {
            let mut state = guard.borrow_mut();
            (state.queue.read(count), state.producer.clone())
        };
        if samples.len() < count {
            match producer {
                Some((port, id)) => {
                    // Borrow released: the pull may recurse back through us.
                    samples.extend(port.read(count - samples.len(), id));
                }
                None => samples.resize(count, T::ZERO),
            }
        }
        samples
    }

    /// Appends samples to the local queue.
    ///
    /// This is the asynchronous external-feed path: a node that accepts
    /// pushed data (a boundary adapter, or a parent feeding a private
    /// child) writes here instead of wiring a producer.
    pub fn push(&self, samples: &[T]) {
        let guard = self.state.lock();
        guard.borrow_mut().queue.write(samples);
    }

    /// Samples currently buffered locally, excluding anything upstream.
    pub fn buffered(&self) -> usize {
        let guard = self.state.lock();
        let len = guard.borrow().queue.len();
        len
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeState;

    /// Emits an endless ramp starting at 0.0, one value per sample.
    struct Ramp {
        output: OutPort<f32>,
        state: NodeState<f32>,
    }

    impl Ramp {
        fn new() -> Arc<Self> {
            let node = Arc::new(Self {
                output: OutPort::new(),
                state: NodeState::new(0.0),
            });
            node.output.attach(&node);
            node
        }
    }

    impl Worker for Ramp {
        fn work(&self, requested: usize) {
            let block = self.state.with(|next| {
                let block: Vec<f32> = (0..requested).map(|i| *next + i as f32).collect();
                *next += requested as f32;
                block
            });
            self.output.write(&block);
        }
    }

    #[test]
    fn test_unbound_input_zero_fills() {
        let port = InPort::<f32>::new();
        assert_eq!(port.read(4), vec![0.0; 4]);
    }

    #[test]
    fn test_residue_drains_before_zero_fill() {
        let port = InPort::<f32>::new();
        port.push(&[5.0, 6.0]);
        assert_eq!(port.read(4), vec![5.0, 6.0, 0.0, 0.0]);
    }

    #[test]
    fn test_demand_exactness_through_producer() {
        let ramp = Ramp::new();
        let input = InPort::new();
        input.connect(&ramp.output);
        assert_eq!(input.read(0), Vec::<f32>::new());
        assert_eq!(input.read(3), vec![0.0, 1.0, 2.0]);
        assert_eq!(input.read(1), vec![3.0]);
    }

    #[test]
    fn test_fan_out_consumers_are_isolated() {
        let ramp = Ramp::new();
        let a = ramp.output.register_consumer();
        let b = ramp.output.register_consumer();
        assert_eq!(ramp.output.read(2, a), vec![0.0, 1.0]);
        assert_eq!(ramp.output.read(4, a), vec![2.0, 3.0, 4.0, 5.0]);
        // b sees the identical sequence even though a ran ahead.
        assert_eq!(ramp.output.read(6, b), vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_surplus_is_retained() {
        let ramp = Ramp::new();
        let a = ramp.output.register_consumer();
        let b = ramp.output.register_consumer();
        // a's pull produces 4 samples; b's queue retains them all.
        assert_eq!(ramp.output.read(4, a), vec![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(ramp.output.read(1, b), vec![0.0]);
        assert_eq!(ramp.output.read(1, b), vec![1.0]);
    }

    #[test]
    #[should_panic(expected = "unregistered consumer")]
    fn test_unregistered_consumer_panics() {
        let ramp = Ramp::new();
        let other = OutPort::<f32>::new();
        let foreign = other.register_consumer();
        ramp.output.read(1, foreign);
    }

    #[test]
    #[should_panic(expected = "already bound")]
    fn test_double_connect_panics() {
        let ramp = Ramp::new();
        let input = InPort::new();
        input.connect(&ramp.output);
        input.connect(&ramp.output);
    }

    #[test]
    fn test_dropped_producer_delivers_short() {
        let input = InPort::new();
        {
            let ramp = Ramp::new();
            input.connect(&ramp.output);
            assert_eq!(input.read(2), vec![0.0, 1.0]);
        }
        // The node is gone; the port can no longer produce. The shortfall
        // is passed through, not padded.
        assert_eq!(input.read(2), Vec::<f32>::new());
    }
}
