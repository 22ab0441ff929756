//! Time-domain sample-level histogram capture.

use pnm_core::DecodeError;
use serde::{Deserialize, Serialize};

use crate::header::CaptureHeader;

/// Bytes per histogram bin: two s16 level bounds + u32 count.
const BIN_RECORD_LEN: usize = 8;

/// One histogram bin: an inclusive level span and its hit count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub start_level: i16,
    pub end_level: i16,
    pub count: u32,
}

/// Decoded histogram capture: ordered (start, end, count) triples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramCapture {
    pub header: CaptureHeader,
    pub bins: Vec<HistogramBin>,
}

impl HistogramCapture {
    pub fn decode(header: CaptureHeader, payload: &[u8]) -> Result<Self, DecodeError> {
        if payload.len() % BIN_RECORD_LEN != 0 {
            return Err(DecodeError::Truncated {
                declared: payload.len() / BIN_RECORD_LEN * BIN_RECORD_LEN + BIN_RECORD_LEN,
                actual: payload.len(),
            });
        }

        let bins = payload
            .chunks_exact(BIN_RECORD_LEN)
            .map(|record| HistogramBin {
                start_level: i16::from_be_bytes(record[0..2].try_into().expect("i16")),
                end_level: i16::from_be_bytes(record[2..4].try_into().expect("i16")),
                count: u32::from_be_bytes(record[4..8].try_into().expect("u32")),
            })
            .collect();

        Ok(Self { header, bins })
    }

    pub fn total_count(&self) -> u64 {
        self.bins.iter().map(|b| b.count as u64).sum()
    }
}
