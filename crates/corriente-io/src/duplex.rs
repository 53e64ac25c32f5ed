//! Full-duplex audio device adapter.

use std::sync::{Arc, Condvar, Mutex};

use corriente_core::{InPort, OutPort, SampleQueue, Worker};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use crate::convert::{fixed_to_norm, norm_to_fixed};
use crate::{Error, Result};

/// Stream parameters for [`AudioDuplex`].
#[derive(Debug, Clone, Copy)]
pub struct DuplexConfig {
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Channel count on both directions.
    pub channels: u16,
    /// Hardware block size in frames.
    pub block_size: u32,
}

impl Default for DuplexConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channels: 1,
            block_size: 1024,
        }
    }
}

/// One capture lane: hardware pushes in, the graph pulls out.
///
/// The hardware callback cannot write into the out-port directly — a
/// consumer waiting for microphone data sits inside that port's lock, so
/// the callback would deadlock behind it. Instead the callback feeds a
/// staging queue guarded by its own mutex, and this node's `work` (called
/// under the port lock) blocks on the staging condvar until the hardware
/// has delivered, then broadcasts. Pulling microphone data thus paces the
/// caller to the device.
struct CaptureChannel {
    port: OutPort<f32>,
    staging: Mutex<SampleQueue<f32>>,
    ready: Condvar,
}

impl CaptureChannel {
    fn new() -> Arc<Self> {
        let node = Arc::new(Self {
            port: OutPort::new(),
            staging: Mutex::new(SampleQueue::new()),
            ready: Condvar::new(),
        });
        node.port.attach(&node);
        node
    }

    fn push(&self, samples: &[f32]) {
        let mut staging = self.staging.lock().expect("capture staging poisoned");
        staging.write(samples);
        self.ready.notify_all();
    }
}

impl Worker for CaptureChannel {
    fn work(&self, requested: usize) {
        let mut staging = self.staging.lock().expect("capture staging poisoned");
        while staging.len() < requested {
            staging = self
                .ready
                .wait(staging)
                .expect("capture staging poisoned");
        }
        let drained = staging.read(staging.len());
        drop(staging);
        self.port.write(&drained);
    }
}

struct BlockSignal {
    counter: Mutex<u64>,
    advanced: Condvar,
}

impl BlockSignal {
    fn bump(&self) {
        let mut counter = self.counter.lock().expect("block counter poisoned");
        *counter += 1;
        self.advanced.notify_all();
    }
}

/// Full-duplex hardware audio adapter.
///
/// On every hardware cycle the input callback pushes captured samples
/// into the graph (via the per-channel capture lanes behind `audio_in`)
/// and the output callback pulls exactly one hardware block per channel
/// from `audio_out` — a synchronous recursive pull on the real-time
/// thread, like any other consumer. Both callbacks convert between the
/// device's i16 samples and normalized floats by linear interpolation
/// over the i16 range, and signal block completion for external waiters.
pub struct AudioDuplex {
    /// Captured audio entering the graph, one port per channel.
    pub audio_in: Vec<OutPort<f32>>,
    /// Audio leaving the graph for playback, one port per channel.
    pub audio_out: Vec<InPort<f32>>,
    capture: Vec<Arc<CaptureChannel>>,
    blocks: BlockSignal,
    config: DuplexConfig,
}

/// Keeps the device streams alive; dropping it stops the audio.
///
/// cpal streams are not `Send`, so the handle stays with the thread that
/// called [`AudioDuplex::start`].
pub struct DuplexStream {
    _input: cpal::Stream,
    _output: cpal::Stream,
}

impl AudioDuplex {
    /// Creates the adapter node; no device is opened until
    /// [`start`](AudioDuplex::start).
    pub fn new(config: DuplexConfig) -> Arc<Self> {
        let capture: Vec<Arc<CaptureChannel>> =
            (0..config.channels).map(|_| CaptureChannel::new()).collect();
        let audio_in = capture.iter().map(|channel| channel.port.clone()).collect();
        let audio_out = (0..config.channels).map(|_| InPort::new()).collect();
        Arc::new(Self {
            audio_in,
            audio_out,
            capture,
            blocks: BlockSignal {
                counter: Mutex::new(0),
                advanced: Condvar::new(),
            },
            config,
        })
    }

    /// The configured stream parameters.
    pub fn config(&self) -> DuplexConfig {
        self.config
    }

    /// Opens the default devices and starts both streams.
    pub fn start(self: &Arc<Self>) -> Result<DuplexStream> {
        let host = cpal::default_host();
        let input_device = host.default_input_device().ok_or(Error::NoDevice)?;
        let output_device = host.default_output_device().ok_or(Error::NoDevice)?;

        let stream_config = cpal::StreamConfig {
            channels: self.config.channels,
            sample_rate: cpal::SampleRate(self.config.sample_rate),
            buffer_size: cpal::BufferSize::Fixed(self.config.block_size),
        };

        let channels = usize::from(self.config.channels);

        let input_stream = {
            let duplex = Arc::clone(self);
            input_device
                .build_input_stream(
                    &stream_config,
                    move |data: &[i16], _: &cpal::InputCallbackInfo| {
                        for (index, channel) in duplex.capture.iter().enumerate() {
                            let lane: Vec<f32> = data
                                .iter()
                                .skip(index)
                                .step_by(channels)
                                .map(|&sample| fixed_to_norm(sample))
                                .collect();
                            channel.push(&lane);
                        }
                        duplex.blocks.bump();
                    },
                    |err| tracing::warn!(error = %err, "input stream error"),
                    None,
                )
                .map_err(|e| Error::Stream(e.to_string()))?
        };

        let output_stream = {
            let duplex = Arc::clone(self);
            output_device
                .build_output_stream(
                    &stream_config,
                    move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                        data.fill(0);
                        let frames = data.len() / channels;
                        for (index, port) in duplex.audio_out.iter().enumerate() {
                            let lane = port.read(frames);
                            for (frame, &sample) in lane.iter().enumerate() {
                                data[frame * channels + index] = norm_to_fixed(sample);
                            }
                        }
                        duplex.blocks.bump();
                    },
                    |err| tracing::warn!(error = %err, "output stream error"),
                    None,
                )
                .map_err(|e| Error::Stream(e.to_string()))?
        };

        input_stream
            .play()
            .map_err(|e| Error::Stream(e.to_string()))?;
        output_stream
            .play()
            .map_err(|e| Error::Stream(e.to_string()))?;
        tracing::info!(
            sample_rate = self.config.sample_rate,
            channels = self.config.channels,
            block_size = self.config.block_size,
            "duplex audio started"
        );

        Ok(DuplexStream {
            _input: input_stream,
            _output: output_stream,
        })
    }

    /// Blocks until the next hardware block completes in either
    /// direction. Timeouts, if wanted, belong to the caller.
    pub fn wait_block(&self) {
        let mut counter = self
            .blocks
            .counter
            .lock()
            .expect("block counter poisoned");
        let seen = *counter;
        while *counter == seen {
            counter = self
                .blocks
                .advanced
                .wait(counter)
                .expect("block counter poisoned");
        }
    }
}
