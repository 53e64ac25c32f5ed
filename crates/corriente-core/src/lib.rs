//! Corriente Core - demand-driven pull scheduling for signal graphs
//!
//! This crate provides the engine underneath every corriente node: a small,
//! general scheduler in which downstream consumers pull exactly the samples
//! they need and the graph recursively produces them on demand. There is no
//! thread pool and no event loop — work happens synchronously on the calling
//! thread, driven purely by demand.
//!
//! # Core Abstractions
//!
//! - [`Sample`] - numeric sample types carried on edges (`f32`, `f64`,
//!   [`Complex<f32>`](num_complex::Complex))
//! - [`SampleQueue`] - FIFO queue of samples, the unit of data movement
//! - [`InPort`] - receiving end of an edge, with zero-fill on starvation
//! - [`OutPort`] - producing end of an edge, with one private buffer per
//!   registered consumer and a reentrant per-port lock
//! - [`Worker`] - the production contract every node implements
//! - [`NodeState`] - reentrancy-safe cell for per-node DSP state
//!
//! # Pull model
//!
//! A consumer calls [`InPort::read`] for `n` samples. The port drains its
//! local residue first, then asks its producer's [`OutPort`] for the exact
//! deficit. The output port, under its lock, invokes the owning node's
//! [`Worker::work`] for any shortfall; the node pulls from its own inputs
//! (recursing upstream) and broadcasts its results to every registered
//! consumer's private buffer. Fast and slow consumers of the same output
//! never interfere — each has its own queue at its own read offset.
//!
//! # Concurrency
//!
//! The graph becomes multi-threaded only at its boundary (a hardware audio
//! callback, a UI refresh thread, application producer/consumer threads).
//! Each output port's buffer map and work triggering are serialized by one
//! reentrant lock scoped to that port; buffers are never shared across
//! ports. Reentrancy lets a pre-seeded feedback delay satisfy a pull that
//! loops back through its own port on the same thread.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use corriente_core::{InPort, OutPort, Worker};
//!
//! /// Emits an endless ramp 0.0, 1.0, 2.0, ...
//! struct Ramp {
//!     output: OutPort<f32>,
//!     state: corriente_core::NodeState<f32>,
//! }
//!
//! impl Ramp {
//!     fn new() -> Arc<Self> {
//!         let node = Arc::new(Self {
//!             output: OutPort::new(),
//!             state: corriente_core::NodeState::new(0.0),
//!         });
//!         node.output.attach(&node);
//!         node
//!     }
//! }
//!
//! impl Worker for Ramp {
//!     fn work(&self, requested: usize) {
//!         let block = self.state.with(|next| {
//!             let block: Vec<f32> = (0..requested).map(|i| *next + i as f32).collect();
//!             *next += requested as f32;
//!             block
//!         });
//!         self.output.write(&block);
//!     }
//! }
//!
//! let ramp = Ramp::new();
//! let input = InPort::new();
//! input.connect(&ramp.output);
//! assert_eq!(input.read(3), vec![0.0, 1.0, 2.0]);
//! ```

mod node;
mod port;
mod queue;
mod sample;

pub use node::{NodeState, Worker};
pub use port::{ConsumerId, InPort, OutPort};
pub use queue::SampleQueue;
pub use sample::Sample;
