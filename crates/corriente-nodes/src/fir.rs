//! Linear-phase FIR filtering: frequency-sampling design plus the filter
//! node.
//!
//! Filters are designed from an arbitrary piecewise-linear magnitude
//! response: the response is interpolated onto a dense grid, given a
//! linear-phase term, transformed to the time domain with an inverse FFT,
//! and shaped with a Hamming window. The node applies the taps by direct
//! convolution, carrying the tail of each block as the next block's
//! history so the filtered stream is independent of how pulls are
//! partitioned.

use std::ops::{Add, Mul};
use std::sync::Arc;

use corriente_core::{InPort, NodeState, OutPort, Sample, Worker};
use num_complex::Complex;
use rustfft::FftPlanner;

/// Designs linear-phase FIR taps for a piecewise-linear magnitude response.
///
/// `frequencies` are breakpoints in Hz, ascending from 0 to the Nyquist
/// frequency; `gains` are the desired magnitudes at those breakpoints,
/// interpolated linearly in between. Returns `taps` coefficients.
///
/// # Panics
///
/// Panics if fewer than two breakpoints are given, the breakpoint and gain
/// counts differ, the breakpoints are not ascending from 0 to Nyquist, or
/// `taps` is zero.
pub fn frequency_sampling(
    taps: usize,
    frequencies: &[f64],
    gains: &[f64],
    sample_rate: f64,
) -> Vec<f32> {
    assert!(taps > 0, "filter needs at least one tap");
    assert!(
        frequencies.len() >= 2 && frequencies.len() == gains.len(),
        "response needs matching frequency/gain breakpoints"
    );
    let nyquist = sample_rate / 2.0;
    assert!(
        frequencies[0] == 0.0
            && (frequencies[frequencies.len() - 1] - nyquist).abs() < 1e-9
            && frequencies.windows(2).all(|pair| pair[0] <= pair[1]),
        "breakpoints must ascend from 0 to the Nyquist frequency"
    );

    // Dense response grid, one power of two above the tap count.
    let nfreqs = taps.next_power_of_two() + 1;
    let fft_len = 2 * (nfreqs - 1);
    let mut spectrum = vec![Complex::new(0.0f64, 0.0); fft_len];
    for k in 0..nfreqs {
        let x = k as f64 / (nfreqs - 1) as f64;
        let gain = interpolate(frequencies, gains, x * nyquist);
        // Linear phase centers the impulse response on (taps - 1) / 2.
        let phase = -(taps as f64 - 1.0) / 2.0 * std::f64::consts::PI * x;
        spectrum[k] = Complex::from_polar(gain, phase);
    }
    // Hermitian symmetry gives a real impulse response.
    for k in 1..nfreqs - 1 {
        spectrum[fft_len - k] = spectrum[k].conj();
    }

    let mut planner = FftPlanner::new();
    planner.plan_fft_inverse(fft_len).process(&mut spectrum);
    tracing::debug!(taps, breakpoints = frequencies.len(), "fir response designed");

    (0..taps)
        .map(|i| {
            let window =
                0.54 - 0.46 * (std::f64::consts::TAU * i as f64 / (taps - 1).max(1) as f64).cos();
            (spectrum[i].re / fft_len as f64 * window) as f32
        })
        .collect()
}

fn interpolate(frequencies: &[f64], gains: &[f64], frequency: f64) -> f64 {
    if frequency <= frequencies[0] {
        return gains[0];
    }
    for pair in 0..frequencies.len() - 1 {
        let (left, right) = (frequencies[pair], frequencies[pair + 1]);
        if frequency <= right {
            if right == left {
                return gains[pair + 1];
            }
            let t = (frequency - left) / (right - left);
            return gains[pair] + (gains[pair + 1] - gains[pair]) * t;
        }
    }
    gains[gains.len() - 1]
}

/// FIR filter node over real or complex streams.
///
/// The taps are always real; the stream type decides whether the
/// convolution runs over `f32` or complex baseband samples. The last
/// `taps - 1` input samples persist across calls as filter memory.
pub struct FirFilter<T: Sample> {
    /// The stream to filter.
    pub input: InPort<T>,
    /// The filtered stream.
    pub filtered: OutPort<T>,
    taps: Vec<f32>,
    state: NodeState<Vec<T>>,
}

impl<T> FirFilter<T>
where
    T: Sample + Add<Output = T> + Mul<f32, Output = T>,
{
    /// Creates a filter from explicit taps.
    ///
    /// # Panics
    ///
    /// Panics if `taps` is empty.
    pub fn new(taps: Vec<f32>) -> Arc<Self> {
        assert!(!taps.is_empty(), "filter needs at least one tap");
        let history = vec![T::ZERO; taps.len() - 1];
        let node = Arc::new(Self {
            input: InPort::new(),
            filtered: OutPort::new(),
            taps,
            state: NodeState::new(history),
        });
        node.filtered.attach(&node);
        node
    }

    /// Creates a filter for an arbitrary magnitude response
    /// (see [`frequency_sampling`]).
    pub fn from_response(
        frequencies: &[f64],
        gains: &[f64],
        taps: usize,
        sample_rate: f64,
    ) -> Arc<Self> {
        Self::new(frequency_sampling(taps, frequencies, gains, sample_rate))
    }

    /// Low-pass: unity below `cutoff`, zero above `cutoff + transition`.
    pub fn low_pass(cutoff: f64, transition: f64, taps: usize, sample_rate: f64) -> Arc<Self> {
        let nyquist = sample_rate / 2.0;
        Self::from_response(
            &[0.0, cutoff, cutoff + transition, nyquist],
            &[1.0, 1.0, 0.0, 0.0],
            taps,
            sample_rate,
        )
    }

    /// Band-pass: unity between `low` and `high`, with `transition`-wide
    /// skirts on both sides.
    pub fn band_pass(
        low: f64,
        high: f64,
        transition: f64,
        taps: usize,
        sample_rate: f64,
    ) -> Arc<Self> {
        let nyquist = sample_rate / 2.0;
        Self::from_response(
            &[0.0, low - transition, low, high, high + transition, nyquist],
            &[0.0, 0.0, 1.0, 1.0, 0.0, 0.0],
            taps,
            sample_rate,
        )
    }

    /// Peak: unity at `frequency` only, falling to zero `transition` away
    /// on either side.
    pub fn peak(frequency: f64, transition: f64, taps: usize, sample_rate: f64) -> Arc<Self> {
        let nyquist = sample_rate / 2.0;
        Self::from_response(
            &[
                0.0,
                frequency - transition,
                frequency,
                frequency + transition,
                nyquist,
            ],
            &[0.0, 0.0, 1.0, 0.0, 0.0],
            taps,
            sample_rate,
        )
    }

    /// The filter's coefficients.
    pub fn taps(&self) -> &[f32] {
        &self.taps
    }
}

impl<T> Worker for FirFilter<T>
where
    T: Sample + Add<Output = T> + Mul<f32, Output = T>,
{
    fn work(&self, requested: usize) {
        let block = self.input.read(requested);
        let filtered = self.state.with(|history| {
            let order = self.taps.len();
            let mut extended = Vec::with_capacity(history.len() + block.len());
            extended.extend_from_slice(history);
            extended.extend_from_slice(&block);
            let filtered: Vec<T> = (0..block.len())
                .map(|k| {
                    let mut acc = T::ZERO;
                    for (j, &tap) in self.taps.iter().enumerate() {
                        acc = acc + extended[k + order - 1 - j] * tap;
                    }
                    acc
                })
                .collect();
            *history = extended[extended.len() - (order - 1)..].to_vec();
            filtered
        });
        self.filtered.write(&filtered);
    }
}
