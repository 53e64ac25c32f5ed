//! Frame assembly and Manchester sync recovery for the modem.
//!
//! The transmit side frames a payload behind a preamble and sync word and
//! expands it into ±1 Manchester chips for the graph. The receive side is
//! the boundary-layer resynchronization loop: it watches the demodulated
//! chip stream at both possible pair alignments, hunts for the sync word,
//! and yields complete payloads.

use corriente_bitstream::{Bits, Field, Frame};

/// Builds the on-air frame: 16 zero preamble bits, a 16-bit sync word,
/// then the payload bytes.
pub fn build_frame(payload: &[u8], sync: u16) -> Bits {
    let mut frame = Frame::new();
    frame.push(
        "preamble",
        Field::with_uint(16, 0).expect("zero fits 16 bits"),
    );
    frame.push(
        "sync",
        Field::with_uint(16, u64::from(sync)).expect("sync fits 16 bits"),
    );
    frame.push("payload", Field::with_bytes(payload));
    frame.bits().expect("every field was just filled")
}

/// Expands frame bits into ±1 Manchester chips: a one becomes `(+1, -1)`,
/// a zero `(-1, +1)`.
pub fn manchester_chips(bits: &Bits) -> Vec<f32> {
    let mut chips = Vec::with_capacity(bits.len() * 2);
    for bit in bits.iter() {
        let level = if bit { 1.0 } else { -1.0 };
        chips.push(level);
        chips.push(-level);
    }
    chips
}

/// Sliding-window sync hunter over a hard-decision chip stream.
///
/// Chip pairs decode to bits at two possible alignments; both are tried
/// on every new chip. Pairs with equal chips (no mid-bit transition)
/// decode to nothing, so a valid frame additionally requires its bits to
/// come from contiguous chip pairs. Once a full frame is seen the
/// consumed chips are dropped and the payload returned.
pub struct SyncSearcher {
    sync: Bits,
    payload_bytes: usize,
    chips: Vec<bool>,
}

impl SyncSearcher {
    /// Creates a searcher for frames carrying `payload_bytes` bytes.
    pub fn new(sync: u16, payload_bytes: usize) -> Self {
        Self {
            sync: Bits::from_uint(u64::from(sync), 16).expect("sync fits 16 bits"),
            payload_bytes,
            chips: Vec::new(),
        }
    }

    /// Number of frame bits after the preamble: sync word plus payload.
    fn frame_bits(&self) -> usize {
        16 + self.payload_bytes * 8
    }

    /// Feeds one hard-decision chip; returns a payload when a complete
    /// frame has been recognized.
    pub fn push_chip(&mut self, chip: bool) -> Option<Vec<u8>> {
        self.chips.push(chip);
        // Keep just enough history for one frame plus its preamble at
        // either alignment.
        let window = (4 + self.payload_bytes) * 8 * 2;
        if self.chips.len() > window {
            let excess = self.chips.len() - window;
            self.chips.drain(..excess);
        }
        self.search()
    }

    fn search(&mut self) -> Option<Vec<u8>> {
        let frame_bits = self.frame_bits();
        for phase in 0..2usize {
            if self.chips.len() <= phase {
                continue;
            }
            let (bits, positions) = demanchesterize(&self.chips[phase..], phase);
            if bits.len() < frame_bits {
                continue;
            }
            'candidates: for start in 0..=bits.len() - frame_bits {
                for k in 0..self.sync.len() {
                    if Some(bits[start + k]) != self.sync.get(k) {
                        continue 'candidates;
                    }
                }
                for k in 1..frame_bits {
                    if positions[start + k] != positions[start] + 2 * k {
                        continue 'candidates;
                    }
                }
                let payload: Bits = bits[start + self.sync.len()..start + frame_bits]
                    .iter()
                    .copied()
                    .collect();
                let bytes = payload.to_bytes().expect("payload is whole bytes");
                let consumed = (positions[start + frame_bits - 1] + 2).min(self.chips.len());
                self.chips.drain(..consumed);
                return Some(bytes);
            }
        }
        None
    }
}

/// Collapses chip pairs into bits, recording each bit's first-chip
/// position; pairs without a transition are skipped.
fn demanchesterize(chips: &[bool], base: usize) -> (Vec<bool>, Vec<usize>) {
    let mut bits = Vec::with_capacity(chips.len() / 2);
    let mut positions = Vec::with_capacity(chips.len() / 2);
    let mut index = 0;
    while index + 1 < chips.len() {
        let (first, second) = (chips[index], chips[index + 1]);
        if first != second {
            bits.push(first);
            positions.push(base + index);
        }
        index += 2;
    }
    (bits, positions)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_stream(searcher: &mut SyncSearcher, chips: &[f32]) -> Vec<Vec<u8>> {
        let mut decoded = Vec::new();
        for &chip in chips {
            if let Some(payload) = searcher.push_chip(chip > 0.0) {
                decoded.push(payload);
            }
        }
        decoded
    }

    #[test]
    fn test_frame_layout() {
        let bits = build_frame(b"hi", 0xC1FA);
        assert_eq!(bits.len(), 16 + 16 + 16);
        // Preamble is all zeros.
        assert_eq!(bits.slice(0, 16).to_uint().unwrap(), 0);
        assert_eq!(bits.slice(16, 32).to_uint().unwrap(), 0xC1FA);
    }

    #[test]
    fn test_chips_alternate_per_bit() {
        let bits = Bits::from_uint(0b10, 2).unwrap();
        assert_eq!(manchester_chips(&bits), vec![1.0, -1.0, -1.0, 1.0]);
    }

    #[test]
    fn test_searcher_recovers_payload() {
        let payload = b"hi!";
        let chips = manchester_chips(&build_frame(payload, 0xC1FA));
        let mut searcher = SyncSearcher::new(0xC1FA, payload.len());
        let decoded = decode_stream(&mut searcher, &chips);
        assert_eq!(decoded, vec![payload.to_vec()]);
    }

    #[test]
    fn test_searcher_handles_misaligned_stream() {
        let payload = b"ok";
        let mut chips = vec![-1.0];
        chips.extend(manchester_chips(&build_frame(payload, 0xC1FA)));
        let mut searcher = SyncSearcher::new(0xC1FA, payload.len());
        let decoded = decode_stream(&mut searcher, &chips);
        assert_eq!(decoded, vec![payload.to_vec()]);
    }

    #[test]
    fn test_searcher_recovers_repeated_frames() {
        let payload = b"abc";
        let frame = manchester_chips(&build_frame(payload, 0xC1FA));
        let mut stream = frame.clone();
        stream.extend(frame);
        let mut searcher = SyncSearcher::new(0xC1FA, payload.len());
        let decoded = decode_stream(&mut searcher, &stream);
        assert_eq!(decoded.len(), 2);
    }

    #[test]
    fn test_searcher_ignores_noise_without_sync() {
        let mut searcher = SyncSearcher::new(0xC1FA, 4);
        let noise: Vec<f32> = (0..200)
            .map(|i| if (i * 7) % 3 == 0 { 1.0 } else { -1.0 })
            .collect();
        assert!(decode_stream(&mut searcher, &noise).is_empty());
    }
}
