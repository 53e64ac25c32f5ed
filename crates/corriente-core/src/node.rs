//! The node production contract and the reentrancy-safe state cell.

use std::cell::RefCell;

use parking_lot::ReentrantMutex;

/// The production routine of a processing node.
///
/// `work(requested)` must pull whatever raw material the node needs from its
/// own input ports (the node decides how much — a resampler routinely reads
/// more or less than `requested`), compute, and write **at least**
/// `requested` fresh samples to its output ports. Writing more than
/// requested is legal; downstream buffers retain the surplus for the next
/// call.
///
/// A node with internal state (filter memory, phase accumulators, carried
/// samples) must persist that state across calls so that block boundaries
/// are transparent to the signal — splitting one long pull into many small
/// ones must produce the identical stream.
///
/// `work` is invoked by an [`OutPort`](crate::OutPort) while that port's
/// lock is held; implementations therefore must not block on anything a
/// broadcast into the same port would need. Waiting on external data is
/// done against separate staging queues (see the boundary adapters).
pub trait Worker: Send + Sync {
    /// Produce at least `requested` samples on every output port.
    fn work(&self, requested: usize);
}

/// Reentrancy-safe cell for per-node DSP state.
///
/// Nodes are shared (`Arc`) and pulled from multiple threads, so their
/// mutable state needs a lock. A plain mutex would deadlock the moment a
/// feedback loop re-enters the owning node's `work` on the same thread;
/// this cell uses a reentrant lock around a `RefCell` instead, so nested
/// same-thread access is allowed while cross-thread access still
/// serializes.
///
/// Access goes through [`with`](NodeState::with), which borrows the state
/// only for the duration of the closure. The closure must not pull from an
/// input port: an upstream pull can recurse back into the same node, and
/// the nested frame needs the borrow released. Keeping pulls outside
/// `with` blocks is the one discipline node implementations must follow.
pub struct NodeState<S> {
    cell: ReentrantMutex<RefCell<S>>,
}

impl<S: Send> NodeState<S> {
    /// Wraps the given initial state.
    pub fn new(state: S) -> Self {
        Self {
            cell: ReentrantMutex::new(RefCell::new(state)),
        }
    }

    /// Runs `f` with exclusive access to the state.
    ///
    /// # Panics
    ///
    /// Panics if `f` re-enters `with` on the same `NodeState` — that only
    /// happens when a closure pulls from an input port, which the contract
    /// above forbids.
    pub fn with<R>(&self, f: impl FnOnce(&mut S) -> R) -> R {
        let guard = self.cell.lock();
        let mut state = guard.borrow_mut();
        f(&mut state)
    }
}
