//! `corriente modem` - the full-duplex FSK audio modem.
//!
//! Transmit: framed, Manchester-coded chips are pushed into the graph,
//! rate-expanded to the audio rate, frequency-modulated, gated by the
//! presence mask so idle air stays silent, band-shaped and handed to the
//! sound card. Receive: the microphone stream is FM-demodulated, low-pass
//! filtered, a symbol clock is recovered and delay-aligned, and chips are
//! sampled on its rising edges; a sync search on the chip stream yields
//! decoded payloads.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::Args;
use corriente_io::{AudioDuplex, DuplexConfig};
use corriente_nodes::{
    ClockRecovery, Delay, EdgeSampler, FirFilter, FmDemodulator, FmModulator, NearestResampler,
    Probe, ProductModulator, PullSink, PushSource, RealPart,
};

use crate::config::ModemConfig;
use crate::framing::{SyncSearcher, build_frame, manchester_chips};

/// Arguments for the `modem` subcommand.
#[derive(Args)]
pub struct ModemArgs {
    /// Path to a TOML configuration file.
    #[arg(long)]
    pub config: Option<std::path::PathBuf>,

    /// Message to transmit (overrides the config file).
    #[arg(long)]
    pub message: Option<String>,
}

/// The wired graph; dropping it tears the whole chain down.
struct ModemChain {
    audio: Arc<AudioDuplex>,
    input: Arc<PushSource>,
    output: Arc<PullSink>,
    tx_probe: Arc<Probe>,
    rx_probe: Arc<Probe>,
    // Interior nodes, kept alive for the lifetime of the chain.
    _nodes: Vec<Box<dyn std::any::Any + Send + Sync>>,
}

impl ModemChain {
    fn build(config: &ModemConfig) -> anyhow::Result<Self> {
        let fs = config.sample_rate;
        let (center, deviation, baud) = (config.center, config.deviation, config.baud);
        if deviation <= baud {
            bail!("deviation ({deviation} Hz) must exceed the chip rate ({baud} baud)");
        }
        if center <= deviation + baud {
            bail!("center ({center} Hz) too low for deviation {deviation} Hz at {baud} baud");
        }

        let audio = AudioDuplex::new(DuplexConfig {
            sample_rate: fs as u32,
            channels: 1,
            block_size: config.block_size,
        });

        // Transmit path.
        let input = PushSource::new();
        let data_resampler = NearestResampler::new(fs / baud);
        data_resampler.original.connect(&input.samples);
        let presence_resampler = NearestResampler::new(fs / baud);
        presence_resampler.original.connect(&input.present);

        let modulator = FmModulator::new(center, deviation, fs, false);
        modulator.baseband.connect(&data_resampler.resampled);
        let carrier_real = RealPart::new();
        carrier_real.input.connect(&modulator.modulated);

        let gate = ProductModulator::new();
        gate.a.connect(&carrier_real.output);
        gate.b.connect(&presence_resampler.resampled);

        // Pass the two FSK tones, reject everything between and around.
        let (wide, narrow) = (baud, baud / 2.0);
        let low_tone = center - deviation;
        let high_tone = center + deviation;
        let shaping = FirFilter::<f32>::from_response(
            &[
                0.0,
                low_tone - wide,
                low_tone - narrow,
                low_tone + narrow,
                low_tone + wide,
                high_tone - wide,
                high_tone - narrow,
                high_tone + narrow,
                high_tone + wide,
                fs / 2.0,
            ],
            &[0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0],
            256,
            fs,
        );
        shaping.input.connect(&gate.modulated);
        let tx_probe = Probe::new(4096);
        tx_probe.input.connect(&shaping.filtered);
        audio.audio_out[0].connect(&tx_probe.output);

        // Receive path.
        let rx_probe = Probe::new(4096);
        rx_probe.input.connect(&audio.audio_in[0]);
        let demod = FmDemodulator::new(
            center,
            deviation,
            2.0 * (2.0 * deviation),
            0.1 * deviation,
            1024,
            fs,
        );
        demod.modulated.connect(&rx_probe.output);

        let baseband_filter = FirFilter::<f32>::low_pass(baud / 2.0, baud / 2.0, 2048, fs);
        baseband_filter.input.connect(&demod.baseband);

        let clock_taps = 8192usize;
        let clock = ClockRecovery::new(baud, baud * 0.1, clock_taps, fs);
        clock.input.connect(&baseband_filter.filtered);

        // Align the recovered clock with the filtered chips: compensate
        // the peak filter's group delay modulo one chip, then offset by
        // half a chip so edges land mid-chip.
        let chip_samples = (fs / baud) as usize;
        let alignment = (clock_taps / 2) % chip_samples + chip_samples / 2;
        let clock_delay = Delay::new(alignment);
        clock_delay.input.connect(&clock.clock);

        let sampler = EdgeSampler::new(1024);
        sampler.signal.connect(&baseband_filter.filtered);
        sampler.clock.connect(&clock_delay.delayed);

        let output = PullSink::new();
        output.samples.connect(&sampler.sampled);

        tracing::info!(
            sample_rate = fs,
            center,
            deviation,
            baud,
            alignment,
            "modem chain wired"
        );

        Ok(Self {
            audio,
            input,
            output,
            tx_probe,
            rx_probe,
            _nodes: vec![
                Box::new(data_resampler),
                Box::new(presence_resampler),
                Box::new(modulator),
                Box::new(carrier_real),
                Box::new(gate),
                Box::new(shaping),
                Box::new(demod),
                Box::new(baseband_filter),
                Box::new(clock),
                Box::new(clock_delay),
                Box::new(sampler),
            ],
        })
    }
}

fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |peak, &s| peak.max(s.abs()))
}

/// Runs the subcommand.
pub fn run(args: ModemArgs) -> anyhow::Result<()> {
    let mut config = match args.config {
        Some(path) => ModemConfig::load(path)?,
        None => ModemConfig::default(),
    };
    if let Some(message) = args.message {
        config.message = message;
    }

    let chain = ModemChain::build(&config)?;
    let stream = chain.audio.start().context("opening audio device")?;

    let running = Arc::new(AtomicBool::new(true));
    {
        let running = Arc::clone(&running);
        ctrlc::set_handler(move || running.store(false, Ordering::SeqCst))
            .context("installing ctrl-c handler")?;
    }

    // Producer: frame and push the message periodically.
    let producer = {
        let input = Arc::clone(&chain.input);
        let running = Arc::clone(&running);
        let (message, sync, interval) = (
            config.message.clone(),
            config.sync,
            Duration::from_secs_f64(config.interval),
        );
        thread::spawn(move || {
            while running.load(Ordering::SeqCst) {
                let chips = manchester_chips(&build_frame(message.as_bytes(), sync));
                tracing::debug!(chips = chips.len(), "transmitting frame");
                input.push(&chips);
                thread::sleep(interval);
            }
        })
    };

    // Consumer: pull chips one at a time, hunt for frames.
    {
        let output = Arc::clone(&chain.output);
        let running = Arc::clone(&running);
        let (sync, payload_bytes) = (config.sync, config.message.len());
        thread::spawn(move || {
            let mut searcher = SyncSearcher::new(sync, payload_bytes);
            while running.load(Ordering::SeqCst) {
                for chip in output.read(1) {
                    if let Some(payload) = searcher.push_chip(chip > 0.0) {
                        println!("rx: {}", String::from_utf8_lossy(&payload));
                    }
                }
            }
        });
    }

    println!(
        "modem running: {} Hz +/- {} Hz at {} baud (ctrl-c to stop)",
        config.center, config.deviation, config.baud
    );
    while running.load(Ordering::SeqCst) {
        thread::sleep(Duration::from_secs(1));
        tracing::debug!(
            tx_peak = peak(&chain.tx_probe.snapshot()),
            rx_peak = peak(&chain.rx_probe.snapshot()),
            "levels"
        );
    }

    drop(stream);
    let _ = producer.join();
    Ok(())
}
