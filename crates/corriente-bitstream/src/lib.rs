//! Bit-level framing and channel coding.
//!
//! A self-contained, synchronous bit-manipulation library with no
//! dependency on the streaming engine: the modem wiring feeds its output
//! into the graph as samples, but nothing here pulls or schedules.
//!
//! - [`Bits`] - an ordered bit sequence with byte/integer conversions
//! - [`BitQueue`] - FIFO bit buffer with checked removal
//! - [`Field`], [`FieldGroup`], [`Frame`] - fixed-size bit fields with
//!   cursor-based chunk access and whole-value accessors
//! - [`Crc`] - polynomial checksum over arbitrary-length bit sequences
//! - [`ConvolutionalCoder`] - table-driven rate-1 convolutional coding
//! - [`Puncturer`] - fixed-pattern bit selector

mod bits;
mod coding;
mod error;
mod field;

pub use bits::{BitQueue, Bits};
pub use coding::{ConvolutionalCoder, Crc, Puncturer};
pub use error::{Error, Result};
pub use field::{Field, FieldGroup, Frame};
