//! Manchester line coding at the symbol level.

use std::sync::Arc;

use corriente_core::{InPort, OutPort, Worker};

/// Expands each symbol into a two-chip Manchester pair.
///
/// With `low_to_high_zero` a symbol `s` becomes `(-s, s)` — a rising edge
/// for a positive symbol — otherwise `(s, -s)`. Every symbol thus carries
/// a mid-bit transition, which is what downstream clock recovery locks
/// onto. A request for `n` chips reads `ceil(n / 2)` symbols; an odd chip
/// count leaves one surplus chip buffered downstream.
pub struct ManchesterEncoder {
    /// The symbol stream, nominally ±1.
    pub symbols: InPort<f32>,
    /// The chip stream, two chips per symbol.
    pub encoded: OutPort<f32>,
    low_to_high_zero: bool,
}

impl ManchesterEncoder {
    /// Creates an encoder with the given zero-bit polarity.
    pub fn new(low_to_high_zero: bool) -> Arc<Self> {
        let node = Arc::new(Self {
            symbols: InPort::new(),
            encoded: OutPort::new(),
            low_to_high_zero,
        });
        node.encoded.attach(&node);
        node
    }
}

impl Worker for ManchesterEncoder {
    fn work(&self, requested: usize) {
        let symbol_count = requested.div_ceil(2);
        let symbols = self.symbols.read(symbol_count);
        let mut chips = Vec::with_capacity(symbol_count * 2);
        for &symbol in &symbols {
            if self.low_to_high_zero {
                chips.push(-symbol);
                chips.push(symbol);
            } else {
                chips.push(symbol);
                chips.push(-symbol);
            }
        }
        self.encoded.write(&chips);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use corriente_core::InPort;

    #[test]
    fn test_each_symbol_becomes_a_transition() {
        let encoder = ManchesterEncoder::new(true);
        encoder.symbols.push(&[1.0, -1.0]);
        let sink = InPort::new();
        sink.connect(&encoder.encoded);
        assert_eq!(sink.read(4), vec![-1.0, 1.0, 1.0, -1.0]);
    }

    #[test]
    fn test_opposite_polarity() {
        let encoder = ManchesterEncoder::new(false);
        encoder.symbols.push(&[1.0, -1.0]);
        let sink = InPort::new();
        sink.connect(&encoder.encoded);
        assert_eq!(sink.read(4), vec![1.0, -1.0, -1.0, 1.0]);
    }

    #[test]
    fn test_odd_request_retains_surplus_chip() {
        let encoder = ManchesterEncoder::new(true);
        encoder.symbols.push(&[1.0, -1.0]);
        let sink = InPort::new();
        sink.connect(&encoder.encoded);
        assert_eq!(sink.read(3), vec![-1.0, 1.0, 1.0]);
        assert_eq!(sink.read(1), vec![-1.0]);
    }
}
