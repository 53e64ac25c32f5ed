//! Channel coding: CRC, convolutional coding, puncturing.

use crate::bits::Bits;
use crate::error::{Error, Result};

/// Polynomial checksum over arbitrary-length bit sequences.
///
/// The divisor is a degree-`width` polynomial with its top bit explicit,
/// so a `width` of 8 takes a 9-bit polynomial value. `calculate` performs
/// plain long division over GF(2) with a `width`-bit zero extension;
/// `validate` re-divides data plus checksum and accepts on a zero
/// remainder, so any single bit flip in either part is detected.
pub struct Crc {
    width: usize,
    divisor: Vec<bool>,
}

impl Crc {
    /// Creates a checksum calculator.
    ///
    /// `polynomial` holds the divisor's `width + 1` coefficient bits, top
    /// bit included (e.g. CRC-8/ATM is `width` 8, `polynomial` 0x107).
    pub fn new(width: usize, polynomial: u64) -> Result<Self> {
        if width == 0 {
            return Err(Error::InvalidPolynomial("width must be at least 1"));
        }
        let divisor = Bits::from_uint(polynomial, width + 1)
            .map_err(|_| Error::InvalidPolynomial("polynomial wider than width + 1 bits"))?;
        if divisor.get(0) != Some(true) {
            return Err(Error::InvalidPolynomial("top coefficient must be set"));
        }
        Ok(Self {
            width,
            divisor: divisor.iter().collect(),
        })
    }

    /// The checksum width in bits.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Computes the checksum of `data`.
    pub fn calculate(&self, data: &Bits) -> Bits {
        let mut dividend: Vec<bool> = data.iter().collect();
        dividend.extend(std::iter::repeat_n(false, self.width));
        self.divide(&mut dividend, data.len());
        dividend[data.len()..].iter().copied().collect()
    }

    /// Checks `checksum` against `data`.
    pub fn validate(&self, data: &Bits, checksum: &Bits) -> bool {
        if checksum.len() != self.width {
            return false;
        }
        let mut dividend: Vec<bool> = data.iter().chain(checksum.iter()).collect();
        self.divide(&mut dividend, data.len());
        dividend[data.len()..].iter().all(|&bit| !bit)
    }

    fn divide(&self, dividend: &mut [bool], steps: usize) {
        for i in 0..steps {
            if dividend[i] {
                for (j, &coefficient) in self.divisor.iter().enumerate() {
                    dividend[i + j] ^= coefficient;
                }
            }
        }
    }
}

/// Rate-1 convolutional coder driven by an explicit transition table.
///
/// The generator polynomial's length fixes the constraint length; for
/// every encoder state the table holds the successor state and output bit
/// for each input bit. The two outputs of a state are complementary by
/// construction, which is what makes [`decode`](Self::decode) a simple
/// inverse walk: from the current state, the received bit identifies the
/// input bit uniquely.
pub struct ConvolutionalCoder {
    /// Indexed by state; `[input0, input1]` giving `(next_state, output)`.
    transitions: Vec<[(usize, bool); 2]>,
}

impl ConvolutionalCoder {
    /// Builds the coder for a generator polynomial.
    ///
    /// The polynomial is given as a bit sequence of `constraint + 1`
    /// coefficients; constraint lengths up to 24 are supported (the table
    /// has `2^constraint` states).
    pub fn new(generator: &Bits) -> Result<Self> {
        if generator.len() < 2 {
            return Err(Error::InvalidPolynomial("generator needs at least 2 bits"));
        }
        let constraint = generator.len() - 1;
        if constraint > 24 {
            return Err(Error::InvalidPolynomial("constraint length above 24"));
        }
        // The polynomial tail as a state mask, first coefficient at the
        // state's most significant bit.
        let mask: usize = generator
            .iter()
            .skip(1)
            .fold(0, |mask, bit| (mask << 1) | usize::from(bit));
        let high_bit = 1usize << (constraint - 1);

        let transitions = (0..1usize << constraint)
            .map(|state| {
                let parity = (state & mask).count_ones() % 2 == 1;
                let shifted = state >> 1;
                [
                    (shifted, parity),
                    (shifted | high_bit, !parity),
                ]
            })
            .collect();
        Ok(Self { transitions })
    }

    /// Encodes a bit sequence from the all-zero state.
    pub fn encode(&self, data: &Bits) -> Bits {
        let mut state = 0usize;
        data.iter()
            .map(|bit| {
                let (next, output) = self.transitions[state][usize::from(bit)];
                state = next;
                output
            })
            .collect()
    }

    /// Decodes an encoded sequence from the all-zero state.
    ///
    /// Exact inverse of [`encode`](Self::encode): per state the two
    /// possible outputs differ, so each received bit selects one branch.
    pub fn decode(&self, encoded: &Bits) -> Bits {
        let mut state = 0usize;
        encoded
            .iter()
            .map(|received| {
                let input = self.transitions[state][1].1 == received;
                let (next, _) = self.transitions[state][usize::from(input)];
                state = next;
                input
            })
            .collect()
    }
}

/// Fixed-pattern bit selector.
///
/// Keeps the bits at positions where the repeating pattern holds a one
/// and discards the rest — the transmit half of a punctured code.
/// Depuncturing needs erasure marks and lives outside this library.
pub struct Puncturer {
    pattern: Vec<bool>,
}

impl Puncturer {
    /// Creates a puncturer from a `width`-bit pattern.
    pub fn new(width: usize, pattern: u64) -> Result<Self> {
        if width == 0 {
            return Err(Error::InvalidPolynomial("pattern must not be empty"));
        }
        let pattern = Bits::from_uint(pattern, width)?;
        Ok(Self {
            pattern: pattern.iter().collect(),
        })
    }

    /// Selects the surviving bits of `data`.
    pub fn puncture(&self, data: &Bits) -> Bits {
        data.iter()
            .enumerate()
            .filter(|(index, _)| self.pattern[index % self.pattern.len()])
            .map(|(_, bit)| bit)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn any_bits(max_len: usize) -> impl Strategy<Value = Bits> {
        prop::collection::vec(any::<bool>(), 0..max_len)
            .prop_map(|bits| bits.into_iter().collect())
    }

    #[test]
    fn test_crc8_known_vector() {
        // Plain CRC-8, x^8 + x^2 + x + 1: "123456789" checks as 0xF4.
        let crc = Crc::new(8, 0x107).unwrap();
        let data = Bits::from_bytes(b"123456789");
        let checksum = crc.calculate(&data);
        assert_eq!(checksum.to_uint().unwrap(), 0xF4);
        assert!(crc.validate(&data, &checksum));
    }

    #[test]
    fn test_crc_rejects_wrong_checksum() {
        let crc = Crc::new(8, 0x107).unwrap();
        let data = Bits::from_bytes(b"corriente");
        let mut checksum = crc.calculate(&data);
        checksum.flip(3);
        assert!(!crc.validate(&data, &checksum));
    }

    #[test]
    fn test_crc_width_one() {
        // Width 1 with polynomial x + 1 is a parity bit.
        let crc = Crc::new(1, 0b11).unwrap();
        let even = Bits::from_uint(0b1010, 4).unwrap();
        let odd = Bits::from_uint(0b1011, 4).unwrap();
        assert_eq!(crc.calculate(&even).to_uint().unwrap(), 0);
        assert_eq!(crc.calculate(&odd).to_uint().unwrap(), 1);
    }

    #[test]
    fn test_crc_rejects_bad_polynomials() {
        assert!(Crc::new(0, 0x3).is_err());
        // Top coefficient missing for width 4.
        assert!(Crc::new(4, 0x0F).is_err());
        // Wider than width + 1 bits.
        assert!(Crc::new(2, 0xFF).is_err());
    }

    #[test]
    fn test_convolutional_round_trip_known_polynomial() {
        // The classic seven-coefficient generator 1011011.
        let generator = Bits::from_uint(0b1011011, 7).unwrap();
        let coder = ConvolutionalCoder::new(&generator).unwrap();
        let data = Bits::from_bytes(b"\xC1\xFA\x55");
        assert_eq!(coder.decode(&coder.encode(&data)), data);
    }

    #[test]
    fn test_convolutional_outputs_are_complementary() {
        let generator = Bits::from_uint(0b101, 3).unwrap();
        let coder = ConvolutionalCoder::new(&generator).unwrap();
        for transitions in &coder.transitions {
            assert_ne!(transitions[0].1, transitions[1].1);
        }
    }

    #[test]
    fn test_puncture_keeps_patterned_positions() {
        // Pattern 110: drop every third bit.
        let puncturer = Puncturer::new(3, 0b110).unwrap();
        let data = Bits::from_uint(0b111000111, 9).unwrap();
        let output = puncturer.puncture(&data);
        assert_eq!(output.len(), 6);
        assert_eq!(output.to_uint().unwrap(), 0b110011);
    }

    proptest! {
        #[test]
        fn prop_crc_round_trip(data in any_bits(128), width in 1usize..16) {
            // A dense polynomial with the top and bottom bits set.
            let polynomial = (1u64 << width) | 0b1 | (0b10 & ((1 << width) - 1));
            let crc = Crc::new(width, polynomial | 1).unwrap();
            let checksum = crc.calculate(&data);
            prop_assert!(crc.validate(&data, &checksum));
        }

        #[test]
        fn prop_crc_detects_single_bit_flip(
            data in any_bits(96),
            width in 1usize..16,
            flip_seed: usize,
        ) {
            let polynomial = (1u64 << width) | 1;
            let crc = Crc::new(width, polynomial).unwrap();
            let checksum = crc.calculate(&data);

            // Flip one bit anywhere in data ‖ checksum.
            let total = data.len() + checksum.len();
            let flip = flip_seed % total;
            let mut data = data.clone();
            let mut checksum = checksum.clone();
            if flip < data.len() {
                data.flip(flip);
            } else {
                checksum.flip(flip - data.len());
            }
            prop_assert!(!crc.validate(&data, &checksum));
        }

        #[test]
        fn prop_convolutional_round_trip(data in any_bits(256)) {
            let generator = Bits::from_uint(0b1011011, 7).unwrap();
            let coder = ConvolutionalCoder::new(&generator).unwrap();
            prop_assert_eq!(coder.decode(&coder.encode(&data)), data);
        }
    }
}
