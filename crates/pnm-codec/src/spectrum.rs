//! Downstream spectrum sweep capture.

use pnm_core::DecodeError;
use serde::{Deserialize, Serialize};

use crate::header::CaptureHeader;

/// Length of the sweep parameter block preceding the bin data.
const SWEEP_HEADER_LEN: usize = 16;

/// Sweep geometry reported by the analyzer front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepParams {
    pub start_hz: u32,
    pub stop_hz: u32,
    pub resolution_bw_hz: u32,
    pub bin_count: u32,
}

impl SweepParams {
    /// Center frequency of bin `i`.
    pub fn bin_frequency(&self, i: usize) -> f64 {
        if self.bin_count == 0 {
            return self.start_hz as f64;
        }
        let step = (self.stop_hz as f64 - self.start_hz as f64) / self.bin_count as f64;
        self.start_hz as f64 + (i as f64 + 0.5) * step
    }
}

/// Decoded spectrum sweep: power per bin plus the sweep geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectrumCapture {
    pub header: CaptureHeader,
    pub sweep: SweepParams,
    /// Bin power in dBmV.
    pub power_dbmv: Vec<f64>,
}

impl SpectrumCapture {
    /// Decode a 16-byte sweep parameter block followed by one big-endian
    /// s16 per bin, in hundredths of a dB.
    pub fn decode(header: CaptureHeader, payload: &[u8]) -> Result<Self, DecodeError> {
        if payload.len() < SWEEP_HEADER_LEN {
            return Err(DecodeError::Truncated {
                declared: SWEEP_HEADER_LEN,
                actual: payload.len(),
            });
        }

        let sweep = SweepParams {
            start_hz: u32::from_be_bytes(payload[0..4].try_into().expect("u32")),
            stop_hz: u32::from_be_bytes(payload[4..8].try_into().expect("u32")),
            resolution_bw_hz: u32::from_be_bytes(payload[8..12].try_into().expect("u32")),
            bin_count: u32::from_be_bytes(payload[12..16].try_into().expect("u32")),
        };

        let bin_bytes = &payload[SWEEP_HEADER_LEN..];
        if bin_bytes.len() != sweep.bin_count as usize * 2 {
            return Err(DecodeError::Truncated {
                declared: SWEEP_HEADER_LEN + sweep.bin_count as usize * 2,
                actual: payload.len(),
            });
        }

        let power_dbmv = bin_bytes
            .chunks_exact(2)
            .map(|pair| i16::from_be_bytes(pair.try_into().expect("i16")) as f64 / 100.0)
            .collect();

        Ok(Self {
            header,
            sweep,
            power_dbmv,
        })
    }
}
