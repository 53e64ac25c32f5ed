//! Sample types carried on graph edges.

use num_complex::Complex;

/// A numeric sample that can travel on a graph edge.
///
/// Edges are typed: an [`InPort<T>`](crate::InPort) only connects to an
/// [`OutPort<T>`](crate::OutPort) of the same sample type. The engine needs
/// nothing from a sample beyond cheap copying and a zero value — the zero is
/// what an unbound input substitutes for missing data (silence fill) and
/// what pre-seeded delay lines start out holding.
pub trait Sample: Copy + Send + Sync + PartialEq + core::fmt::Debug + 'static {
    /// The neutral "silence" value for this sample type.
    const ZERO: Self;
}

impl Sample for f32 {
    const ZERO: Self = 0.0;
}

/// Used for time and index streams, where `f32` would lose sample-level
/// resolution within minutes of continuous running.
impl Sample for f64 {
    const ZERO: Self = 0.0;
}

impl Sample for Complex<f32> {
    const ZERO: Self = Complex { re: 0.0, im: 0.0 };
}
