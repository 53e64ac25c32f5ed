//! WAV file terminals for offline graph runs.

use std::path::Path;
use std::sync::Arc;

use corriente_core::{InPort, NodeState, OutPort, Worker};

use crate::convert::norm_to_fixed;
use crate::Result;

struct Playback {
    samples: Vec<f32>,
    position: usize,
}

/// Plays a WAV file into the graph.
///
/// The file is decoded up front and mixed down to mono; multi-channel
/// files average their channels. Past the end of the file the source
/// keeps the stream alive with silence, the engine's standard starvation
/// policy.
pub struct WavSource {
    /// The decoded sample stream, normalized to [-1, 1].
    pub samples: OutPort<f32>,
    sample_rate: u32,
    state: NodeState<Playback>,
}

impl WavSource {
    /// Opens and decodes a WAV file.
    pub fn open(path: impl AsRef<Path>) -> Result<Arc<Self>> {
        let mut reader = hound::WavReader::open(&path)?;
        let spec = reader.spec();
        let channels = usize::from(spec.channels);

        let interleaved: Vec<f32> = match spec.sample_format {
            hound::SampleFormat::Float => {
                reader.samples::<f32>().collect::<std::result::Result<_, _>>()?
            }
            hound::SampleFormat::Int => {
                let scale = f64::from(1u32 << (spec.bits_per_sample - 1));
                reader
                    .samples::<i32>()
                    .map(|sample| sample.map(|s| (f64::from(s) / scale) as f32))
                    .collect::<std::result::Result<_, _>>()?
            }
        };
        let samples: Vec<f32> = interleaved
            .chunks(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32)
            .collect();
        tracing::debug!(
            frames = samples.len(),
            sample_rate = spec.sample_rate,
            "wav source loaded"
        );

        let node = Arc::new(Self {
            samples: OutPort::new(),
            sample_rate: spec.sample_rate,
            state: NodeState::new(Playback {
                samples,
                position: 0,
            }),
        });
        node.samples.attach(&node);
        Ok(node)
    }

    /// The file's sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Frames left before the source turns to silence.
    pub fn remaining(&self) -> usize {
        self.state
            .with(|playback| playback.samples.len().saturating_sub(playback.position))
    }
}

impl Worker for WavSource {
    fn work(&self, requested: usize) {
        let block = self.state.with(|playback| {
            let mut block = Vec::with_capacity(requested);
            let end = (playback.position + requested).min(playback.samples.len());
            block.extend_from_slice(&playback.samples[playback.position..end]);
            playback.position = end;
            block.resize(requested, 0.0);
            block
        });
        self.samples.write(&block);
    }
}

/// Records a graph stream to a WAV file.
///
/// A plain pull terminal: [`save`](WavSink::save) pulls the requested
/// number of samples through the `samples` input and writes them as
/// 16-bit mono.
pub struct WavSink {
    /// The stream to record.
    pub samples: InPort<f32>,
    sample_rate: u32,
}

impl WavSink {
    /// Creates a sink writing files at `sample_rate` Hz.
    pub fn new(sample_rate: u32) -> Arc<Self> {
        Arc::new(Self {
            samples: InPort::new(),
            sample_rate,
        })
    }

    /// Pulls `count` samples and writes them to `path`.
    pub fn save(&self, path: impl AsRef<Path>, count: usize) -> Result<()> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec)?;
        for sample in self.samples.read(count) {
            writer.write_sample(norm_to_fixed(sample))?;
        }
        writer.finalize()?;
        tracing::debug!(frames = count, "wav sink saved");
        Ok(())
    }
}
