//! Frequency modulation, demodulation, and mixing.

use std::sync::Arc;

use corriente_core::{ConsumerId, InPort, OutPort, Worker};
use num_complex::Complex;

use crate::delay::Delay;
use crate::fir::FirFilter;
use crate::oscillator::{Oscillator, VariableOscillator};

/// Translates a real signal in frequency by mixing with a complex carrier.
///
/// Owns a private [`Oscillator`] running at the negated shift, so a
/// positive `shift` moves the spectrum down — the usual first step of a
/// receiver centering a channel at baseband.
pub struct FrequencyShifter {
    /// The real signal to translate.
    pub input: InPort<f32>,
    /// The translated complex signal.
    pub shifted: OutPort<Complex<f32>>,
    oscillator: Arc<Oscillator>,
    oscillator_id: ConsumerId,
}

impl FrequencyShifter {
    /// Creates a shifter moving the spectrum by `shift` Hz.
    pub fn new(shift: f64, sample_rate: f64) -> Arc<Self> {
        let oscillator = Oscillator::new(-shift, sample_rate);
        let oscillator_id = oscillator.carrier.register_consumer();
        let node = Arc::new(Self {
            input: InPort::new(),
            shifted: OutPort::new(),
            oscillator,
            oscillator_id,
        });
        node.shifted.attach(&node);
        node
    }
}

impl Worker for FrequencyShifter {
    fn work(&self, requested: usize) {
        let carrier = self.oscillator.carrier.read(requested, self.oscillator_id);
        let signal = self.input.read(requested);
        let shifted: Vec<Complex<f32>> = carrier
            .iter()
            .zip(&signal)
            .map(|(&c, &s)| c * s)
            .collect();
        self.shifted.write(&shifted);
    }
}

/// Sample-wise product of two real streams.
///
/// Serves as an amplitude modulator, a mixer, or — driven by a presence
/// mask — a gate that mutes filler samples.
pub struct ProductModulator {
    /// First factor.
    pub a: InPort<f32>,
    /// Second factor.
    pub b: InPort<f32>,
    /// The product stream.
    pub modulated: OutPort<f32>,
}

impl ProductModulator {
    /// Creates a product modulator.
    pub fn new() -> Arc<Self> {
        let node = Arc::new(Self {
            a: InPort::new(),
            b: InPort::new(),
            modulated: OutPort::new(),
        });
        node.modulated.attach(&node);
        node
    }
}

impl Worker for ProductModulator {
    fn work(&self, requested: usize) {
        let a = self.a.read(requested);
        let b = self.b.read(requested);
        let product: Vec<f32> = a.iter().zip(&b).map(|(&x, &y)| x * y).collect();
        self.modulated.write(&product);
    }
}

/// Projects a complex stream onto its real part.
///
/// The typed edge between a complex carrier chain and a real transport
/// (a sound card, a real-valued filter chain). What a loosely typed
/// graph does implicitly at the boundary is an explicit node here.
pub struct RealPart {
    /// The complex stream.
    pub input: InPort<Complex<f32>>,
    /// Its real projection.
    pub output: OutPort<f32>,
}

impl RealPart {
    /// Creates the projection node.
    pub fn new() -> Arc<Self> {
        let node = Arc::new(Self {
            input: InPort::new(),
            output: OutPort::new(),
        });
        node.output.attach(&node);
        node
    }
}

impl Worker for RealPart {
    fn work(&self, requested: usize) {
        let block = self.input.read(requested);
        let real: Vec<f32> = block.iter().map(|c| c.re).collect();
        self.output.write(&real);
    }
}

/// Frequency modulator: baseband in, complex FM carrier out.
///
/// Owns a private [`VariableOscillator`]; each baseband sample is mapped
/// through `deviation` around `center` and pushed into the oscillator's
/// frequency input, and the resulting carrier is re-emitted. With
/// `continuous_phase` the output is a proper CPFSK/FM signal.
pub struct FmModulator {
    /// The baseband stream, nominally in [-1, 1].
    pub baseband: InPort<f32>,
    /// The modulated complex carrier.
    pub modulated: OutPort<Complex<f32>>,
    center: f32,
    deviation: f32,
    oscillator: Arc<VariableOscillator>,
    oscillator_id: ConsumerId,
}

impl FmModulator {
    /// Creates a modulator around `center` Hz with `deviation` Hz swing.
    pub fn new(center: f64, deviation: f64, sample_rate: f64, continuous_phase: bool) -> Arc<Self> {
        let oscillator = VariableOscillator::new(sample_rate, continuous_phase);
        let oscillator_id = oscillator.carrier.register_consumer();
        let node = Arc::new(Self {
            baseband: InPort::new(),
            modulated: OutPort::new(),
            center: center as f32,
            deviation: deviation as f32,
            oscillator,
            oscillator_id,
        });
        node.modulated.attach(&node);
        node
    }
}

impl Worker for FmModulator {
    fn work(&self, requested: usize) {
        let baseband = self.baseband.read(requested);
        let frequency: Vec<f32> = baseband
            .iter()
            .map(|&b| b * self.deviation + self.center)
            .collect();
        self.oscillator.frequency.push(&frequency);
        let modulated = self.oscillator.carrier.read(requested, self.oscillator_id);
        self.modulated.write(&modulated);
    }
}

/// Frequency demodulator: received real signal in, baseband out.
///
/// A three-stage composite over private children: a [`FrequencyShifter`]
/// centers the channel at baseband, a complex low-pass [`FirFilter`]
/// rejects everything else, and a one-sample [`Delay`] supplies the
/// previous sample for the phase-difference discriminator
/// `-arg(filtered · conj(delayed))`, scaled back into baseband units.
pub struct FmDemodulator {
    /// The received real signal.
    pub modulated: InPort<f32>,
    /// The recovered baseband.
    pub baseband: OutPort<f32>,
    deviation: f32,
    sample_rate: f64,
    shifter: Arc<FrequencyShifter>,
    filter: Arc<FirFilter<Complex<f32>>>,
    filter_id: ConsumerId,
    delay: Arc<Delay<Complex<f32>>>,
    delay_id: ConsumerId,
}

impl FmDemodulator {
    /// Creates a demodulator.
    ///
    /// `bandwidth` is the width of the channel to keep around `center`,
    /// `transition` the filter's transition width, `taps` its length.
    pub fn new(
        center: f64,
        deviation: f64,
        bandwidth: f64,
        transition: f64,
        taps: usize,
        sample_rate: f64,
    ) -> Arc<Self> {
        // Shift up by the center frequency: the conjugate image of the
        // real input lands at baseband with the sign the discriminator
        // expects.
        let shifter = FrequencyShifter::new(-center, sample_rate);
        let filter = FirFilter::low_pass(bandwidth / 2.0, transition, taps, sample_rate);
        filter.input.connect(&shifter.shifted);
        let filter_id = filter.filtered.register_consumer();
        let delay = Delay::new(1);
        delay.input.connect(&filter.filtered);
        let delay_id = delay.delayed.register_consumer();
        let node = Arc::new(Self {
            modulated: InPort::new(),
            baseband: OutPort::new(),
            deviation: deviation as f32,
            sample_rate,
            shifter,
            filter,
            filter_id,
            delay,
            delay_id,
        });
        node.baseband.attach(&node);
        node
    }
}

impl Worker for FmDemodulator {
    fn work(&self, requested: usize) {
        let received = self.modulated.read(requested);
        self.shifter.input.push(&received);
        let filtered = self.filter.filtered.read(requested, self.filter_id);
        let delayed = self.delay.delayed.read(requested, self.delay_id);
        let baseband: Vec<f32> = filtered
            .iter()
            .zip(&delayed)
            .map(|(&now, &before)| {
                let angular_velocity = -(now * before.conj()).arg();
                let frequency =
                    angular_velocity / std::f32::consts::PI * (self.sample_rate as f32) / 2.0;
                frequency / self.deviation
            })
            .collect();
        self.baseband.write(&baseband);
    }
}
