//! OFDM downstream channel-estimate coefficients.
//!
//! The modem reports its equalizer's estimate of the channel response as
//! one complex coefficient per subcarrier. Echoes, reflections, and
//! in-channel ingress all leave signatures in the magnitude and phase of
//! this series, which makes it the primary input for group-delay and
//! echo analysis.

use num_complex::Complex;
use pnm_core::{DecodeError, FrequencyAxis};
use serde::{Deserialize, Serialize};

use crate::fixed_point::FixedPointFormat;
use crate::header::CaptureHeader;

/// Decoded channel-estimate capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelEstimateCapture {
    pub header: CaptureHeader,
    pub coefficients: Vec<Complex<f64>>,
    pub axis: FrequencyAxis,
    pub format: FixedPointFormat,
}

impl ChannelEstimateCapture {
    /// Decode with the DOCSIS default (2,13) fixed-point format.
    pub fn decode(header: CaptureHeader, payload: &[u8]) -> Result<Self, DecodeError> {
        Self::decode_with_format(header, payload, FixedPointFormat::default())
    }

    /// Decode 4 bytes per subcarrier: s16 real then s16 imaginary,
    /// signed-magnitude fixed point.
    pub fn decode_with_format(
        header: CaptureHeader,
        payload: &[u8],
        format: FixedPointFormat,
    ) -> Result<Self, DecodeError> {
        format.validate()?;

        if payload.len() % 4 != 0 {
            return Err(DecodeError::Truncated {
                declared: payload.len() / 4 * 4 + 4,
                actual: payload.len(),
            });
        }

        let coefficients: Vec<Complex<f64>> = payload
            .chunks_exact(4)
            .map(|chunk| format.decode_complex(chunk.try_into().expect("4-byte chunk")))
            .collect();
        let axis = header.axis(coefficients.len());

        Ok(Self {
            header,
            coefficients,
            axis,
            format,
        })
    }

    pub fn subcarrier_count(&self) -> usize {
        self.coefficients.len()
    }

    /// Coefficient magnitudes in dB (20·log10|H|), floored for zeros.
    pub fn magnitude_db(&self) -> Vec<f64> {
        self.coefficients
            .iter()
            .map(|c| {
                let norm = c.norm();
                if norm > 0.0 {
                    20.0 * norm.log10()
                } else {
                    f64::NEG_INFINITY
                }
            })
            .collect()
    }
}
