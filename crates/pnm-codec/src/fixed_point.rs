//! Signed-magnitude fixed-point decode for coefficient payloads.
//!
//! Channel-estimate and constellation payloads carry complex samples as
//! pairs of 16-bit signed-magnitude fixed-point words: one sign bit, a
//! configurable split of the remaining 15 bits into integer and
//! fractional fields. The DOCSIS default for channel estimates is
//! 2 integer / 13 fractional bits.

use num_complex::Complex;
use pnm_core::DecodeError;
use serde::{Deserialize, Serialize};

/// (integer bits, fractional bits) split of a 16-bit signed-magnitude word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedPointFormat {
    pub int_bits: u8,
    pub frac_bits: u8,
}

impl Default for FixedPointFormat {
    fn default() -> Self {
        Self {
            int_bits: 2,
            frac_bits: 13,
        }
    }
}

impl FixedPointFormat {
    pub fn new(int_bits: u8, frac_bits: u8) -> Result<Self, DecodeError> {
        let format = Self {
            int_bits,
            frac_bits,
        };
        format.validate()?;
        Ok(format)
    }

    /// Sign + integer + fractional bits must fill the 16-bit word exactly.
    pub fn validate(&self) -> Result<(), DecodeError> {
        if 1 + self.int_bits as u16 + self.frac_bits as u16 != 16 {
            return Err(DecodeError::InvalidFixedPoint {
                int_bits: self.int_bits,
                frac_bits: self.frac_bits,
            });
        }
        Ok(())
    }

    /// Decode one signed-magnitude word: sign × magnitude / 2^frac_bits.
    pub fn decode_word(&self, word: u16) -> f64 {
        let sign = if word & 0x8000 != 0 { -1.0 } else { 1.0 };
        let magnitude = (word & 0x7fff) as f64;
        sign * magnitude / (1u32 << self.frac_bits) as f64
    }

    /// Decode a big-endian real/imaginary word pair into one complex sample.
    pub fn decode_complex(&self, bytes: &[u8; 4]) -> Complex<f64> {
        let re = u16::from_be_bytes([bytes[0], bytes[1]]);
        let im = u16::from_be_bytes([bytes[2], bytes[3]]);
        Complex::new(self.decode_word(re), self.decode_word(im))
    }

    /// Encode a value back to a signed-magnitude word, saturating at the
    /// format's range. Used by synthetic-capture generators.
    pub fn encode_word(&self, value: f64) -> u16 {
        let scale = (1u32 << self.frac_bits) as f64;
        let magnitude = (value.abs() * scale).round().min(0x7fff as f64) as u16;
        if value < 0.0 {
            magnitude | 0x8000
        } else {
            magnitude
        }
    }
}
