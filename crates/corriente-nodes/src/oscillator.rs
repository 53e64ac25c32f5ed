//! Complex carrier generation.

use std::sync::Arc;

use corriente_core::{ConsumerId, InPort, NodeState, OutPort, Worker};
use num_complex::Complex;

use crate::clock::Clock;

/// Fixed-frequency complex exponential, `e^(j 2π f t)`.
///
/// Owns a private [`Clock`] as its time base and registers itself as that
/// clock's consumer. Phase is computed in `f64` from the clock's time
/// points, so long runs do not drift; the emitted carrier is `Complex<f32>`
/// like the rest of the signal path.
pub struct Oscillator {
    /// The carrier stream.
    pub carrier: OutPort<Complex<f32>>,
    frequency: f64,
    clock: Arc<Clock>,
    clock_id: ConsumerId,
}

impl Oscillator {
    /// Creates an oscillator at `frequency` Hz for the given sample rate.
    ///
    /// Negative frequencies are valid and rotate the carrier the other way
    /// — that is how a down-converting [`FrequencyShifter`] is built.
    ///
    /// [`FrequencyShifter`]: crate::FrequencyShifter
    pub fn new(frequency: f64, sample_rate: f64) -> Arc<Self> {
        let clock = Clock::new(sample_rate);
        let clock_id = clock.time.register_consumer();
        let node = Arc::new(Self {
            carrier: OutPort::new(),
            frequency,
            clock,
            clock_id,
        });
        node.carrier.attach(&node);
        node
    }
}

impl Worker for Oscillator {
    fn work(&self, requested: usize) {
        let time = self.clock.time.read(requested, self.clock_id);
        let block: Vec<Complex<f32>> = time
            .iter()
            .map(|t| {
                let phase = std::f64::consts::TAU * self.frequency * t;
                Complex::new(phase.cos() as f32, phase.sin() as f32)
            })
            .collect();
        self.carrier.write(&block);
    }
}

struct VariablePhase {
    last_phase: f64,
    last_time: f64,
}

/// Oscillator whose frequency is itself a signal.
///
/// Reads one frequency sample per output sample. With `continuous_phase`
/// the instantaneous frequency is integrated into a running phase (no
/// phase jumps when the frequency moves — what an FM transmitter needs);
/// without it the phase is recomputed from absolute time, matching a bank
/// of free-running carriers.
pub struct VariableOscillator {
    /// Frequency control stream, one value per output sample, in Hz.
    pub frequency: InPort<f32>,
    /// The carrier stream.
    pub carrier: OutPort<Complex<f32>>,
    continuous_phase: bool,
    clock: Arc<Clock>,
    clock_id: ConsumerId,
    state: NodeState<VariablePhase>,
}

impl VariableOscillator {
    /// Creates a variable oscillator for the given sample rate.
    pub fn new(sample_rate: f64, continuous_phase: bool) -> Arc<Self> {
        let clock = Clock::new(sample_rate);
        let clock_id = clock.time.register_consumer();
        let node = Arc::new(Self {
            frequency: InPort::new(),
            carrier: OutPort::new(),
            continuous_phase,
            clock,
            clock_id,
            state: NodeState::new(VariablePhase {
                last_phase: 0.0,
                last_time: 0.0,
            }),
        });
        node.carrier.attach(&node);
        node
    }
}

impl Worker for VariableOscillator {
    fn work(&self, requested: usize) {
        let frequency = self.frequency.read(requested);
        let time = self.clock.time.read(requested, self.clock_id);
        let phases: Vec<f64> = if self.continuous_phase {
            self.state.with(|state| {
                time.iter()
                    .zip(&frequency)
                    .map(|(&t, &f)| {
                        let dt = t - state.last_time;
                        state.last_time = t;
                        state.last_phase += dt * std::f64::consts::TAU * f as f64;
                        state.last_phase
                    })
                    .collect()
            })
        } else {
            time.iter()
                .zip(&frequency)
                .map(|(&t, &f)| t * std::f64::consts::TAU * f as f64)
                .collect()
        };
        let block: Vec<Complex<f32>> = phases
            .iter()
            .map(|phase| Complex::new(phase.cos() as f32, phase.sin() as f32))
            .collect();
        self.carrier.write(&block);
    }
}
