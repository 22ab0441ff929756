//! Per-subcarrier receive modulation error ratio (RxMER).

use pnm_core::FrequencyAxis;
use serde::{Deserialize, Serialize};

use crate::header::CaptureHeader;

/// Largest RxMER the one-byte encoding can represent (dB).
const RXMER_MAX_DB: f64 = 63.5;

/// Decoded RxMER capture: one dB value per active subcarrier.
///
/// The wire encoding is one byte per subcarrier in quarter-dB steps,
/// clamped to [0, 63.5] dB.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RxMerCapture {
    pub header: CaptureHeader,
    pub values_db: Vec<f64>,
    pub axis: FrequencyAxis,
}

impl RxMerCapture {
    pub fn decode(header: CaptureHeader, payload: &[u8]) -> Self {
        let values_db: Vec<f64> = payload
            .iter()
            .map(|&b| (b as f64 * 0.25).min(RXMER_MAX_DB))
            .collect();
        let axis = header.axis(values_db.len());
        Self {
            header,
            values_db,
            axis,
        }
    }

    pub fn subcarrier_count(&self) -> usize {
        self.values_db.len()
    }

    /// Mean RxMER across the channel, or `None` for an empty capture.
    pub fn mean_db(&self) -> Option<f64> {
        if self.values_db.is_empty() {
            return None;
        }
        Some(self.values_db.iter().sum::<f64>() / self.values_db.len() as f64)
    }
}
