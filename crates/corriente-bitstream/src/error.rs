//! Error types for bit-level operations.

/// Errors reported by the bitstream library.
///
/// These are all caller contract violations in the sense of the engine's
/// error taxonomy: they surface immediately and locally, and nothing is
/// partially applied when one is returned.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum Error {
    /// A queue or field held fewer bits than the operation needed.
    #[error("needed {needed} bits but only {available} available")]
    Underflow {
        /// Bits the operation asked for.
        needed: usize,
        /// Bits actually present.
        available: usize,
    },

    /// A value had a different length than the target required.
    #[error("expected {expected} bits, got {actual}")]
    SizeMismatch {
        /// Required length in bits.
        expected: usize,
        /// Offered length in bits.
        actual: usize,
    },

    /// An integer did not fit the requested width.
    #[error("value {value} does not fit in {width} bits")]
    ValueTooWide {
        /// The offered value.
        value: u64,
        /// The target width in bits.
        width: usize,
    },

    /// A conversion needed a width the type cannot carry.
    #[error("width {0} exceeds 64 bits")]
    WidthTooLarge(usize),

    /// A bit length that must be byte-aligned was not.
    #[error("length {0} is not a whole number of bytes")]
    NotByteAligned(usize),

    /// A field was read past its filled region.
    #[error("field read past filled region")]
    FieldUnderfilled,

    /// A whole-value accessor was used on a partially filled field.
    #[error("field is not full")]
    FieldNotFull,

    /// Shrinking a field below its current content.
    #[error("size {size} is too small for {filled} filled bits")]
    SizeTooSmall {
        /// The requested size.
        size: usize,
        /// Bits already written.
        filled: usize,
    },

    /// A coder was built from an unusable polynomial.
    #[error("invalid polynomial: {0}")]
    InvalidPolynomial(&'static str),
}

/// Convenience result type for bitstream operations.
pub type Result<T> = std::result::Result<T, Error>;
