//! Boundary adapters between corriente graphs and the outside world.
//!
//! This crate provides:
//!
//! - **Full-duplex audio**: [`AudioDuplex`] drives a graph from a real
//!   hardware device — captured samples enter the graph through output
//!   ports, and the playback callback pulls one hardware block per cycle
//!   straight out of the graph.
//! - **WAV terminals**: [`WavSource`] and [`WavSink`] for offline runs.
//! - **Sample conversion**: linear mapping between the hardware's i16
//!   range and the engine's normalized [-1, 1] floats.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use corriente_io::{AudioDuplex, DuplexConfig};
//!
//! let duplex = AudioDuplex::new(DuplexConfig::default());
//! // wire duplex.audio_in / duplex.audio_out into the graph...
//! let stream = duplex.start()?;
//! // Audio flows until `stream` is dropped.
//! ```

mod convert;
mod duplex;
mod wav;

pub use convert::{fixed_to_norm, norm_to_fixed};
pub use duplex::{AudioDuplex, DuplexConfig, DuplexStream};
pub use wav::{WavSink, WavSource};

/// Error types for boundary adapters.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// WAV file read/write error.
    #[error("WAV file error: {0}")]
    Wav(#[from] hound::Error),

    /// Audio stream setup or runtime error.
    #[error("Audio stream error: {0}")]
    Stream(String),

    /// No audio device available on the system.
    #[error("No audio device available")]
    NoDevice,

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for boundary adapters.
pub type Result<T> = std::result::Result<T, Error>;
