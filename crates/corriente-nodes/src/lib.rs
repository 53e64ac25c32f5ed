//! Corriente node library - processing nodes for pull-scheduled graphs.
//!
//! Every node here is an ordinary client of the `corriente-core` engine:
//! it declares typed input/output port fields, implements
//! [`Worker::work`](corriente_core::Worker) to produce on demand, and
//! carries whatever state it needs across calls so that block boundaries
//! are transparent to the signal.
//!
//! # Node inventory
//!
//! Sources and terminals:
//!
//! - [`Clock`] - time points at a fixed rate
//! - [`SymbolSource`] - uniform random symbols in [-1, 1]
//! - [`PushSource`] - externally fed terminal with a presence mask
//! - [`PullSink`] - externally drained terminal
//! - [`Recorder`] - record-N-samples-and-wait capture
//! - [`NullSink`] - discards a stream to keep a graph flowing
//! - [`Probe`] - pass-through tap with a snapshot window for plotting
//!
//! Structure:
//!
//! - [`Interleaver`] / [`Deinterleaver`] - channel muxing
//! - [`NearestResampler`] - nearest-neighbour rate conversion
//! - [`Delay`] - pre-seedable delay, the cycle-breaking primitive
//!
//! Radio:
//!
//! - [`Oscillator`] / [`VariableOscillator`] - complex carriers
//! - [`FmModulator`] / [`FmDemodulator`] - frequency modulation
//! - [`FrequencyShifter`] - spectrum translation
//! - [`ProductModulator`] - sample-wise product of two streams
//! - [`RealPart`] - complex-to-real projection at transport boundaries
//! - [`FirFilter`] and the [`fir`] design module - linear-phase filtering
//! - [`ManchesterEncoder`] - bit-to-line coding
//! - [`ClockRecovery`] / [`EdgeSampler`] - symbol timing recovery
//!
//! Composite nodes (the FM pair, the shifter, clock recovery, the
//! resampler) own private child nodes and register themselves as
//! consumers of the children's ports — ordinary wiring, nothing the
//! engine special-cases.

mod channels;
mod clock;
mod delay;
pub mod fir;
mod manchester;
mod modulation;
mod oscillator;
mod probe;
mod recovery;
mod resampler;
mod source;
mod terminal;

pub use channels::{Deinterleaver, Interleaver};
pub use clock::Clock;
pub use delay::Delay;
pub use fir::FirFilter;
pub use manchester::ManchesterEncoder;
pub use modulation::{FmDemodulator, FmModulator, FrequencyShifter, ProductModulator, RealPart};
pub use oscillator::{Oscillator, VariableOscillator};
pub use probe::Probe;
pub use recovery::{ClockRecovery, EdgeSampler};
pub use resampler::NearestResampler;
pub use source::SymbolSource;
pub use terminal::{NullSink, PullSink, PushSource, Recorder};
