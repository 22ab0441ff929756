//! Soft-decision constellation snapshot.

use num_complex::Complex;
use pnm_core::DecodeError;
use serde::{Deserialize, Serialize};

use crate::fixed_point::FixedPointFormat;
use crate::header::CaptureHeader;

/// Decoded constellation capture: a cloud of complex soft decisions.
///
/// Unlike the per-subcarrier captures, constellation points carry no
/// frequency axis; they are time-ordered equalizer outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConstellationCapture {
    pub header: CaptureHeader,
    pub points: Vec<Complex<f64>>,
    pub format: FixedPointFormat,
}

impl ConstellationCapture {
    pub fn decode(header: CaptureHeader, payload: &[u8]) -> Result<Self, DecodeError> {
        Self::decode_with_format(header, payload, FixedPointFormat::default())
    }

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

        let points = payload
            .chunks_exact(4)
            .map(|chunk| format.decode_complex(chunk.try_into().expect("4-byte chunk")))
            .collect();

        Ok(Self {
            header,
            points,
            format,
        })
    }

    /// RMS distance of all points from the origin.
    pub fn rms_magnitude(&self) -> f64 {
        if self.points.is_empty() {
            return 0.0;
        }
        let sum_sq: f64 = self.points.iter().map(|p| p.norm_sqr()).sum();
        (sum_sq / self.points.len() as f64).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pnm_core::{MacAddress, PnmFileType};

    fn header() -> CaptureHeader {
        CaptureHeader {
            file_type: PnmFileType::Constellation,
            channel_id: 5,
            mac: MacAddress::new([0, 0, 0, 0, 0, 5]),
            zero_frequency_hz: 0,
            first_active_index: 0,
            subcarrier_spacing_hz: 0,
            payload_len: 0,
        }
    }

    #[test]
    fn test_decode_point_cloud() {
        // Two points: (1, 1) and (-1, -1).
        let payload = [0x20, 0x00, 0x20, 0x00, 0xa0, 0x00, 0xa0, 0x00];
        let capture = ConstellationCapture::decode(header(), &payload).unwrap();

        assert_eq!(capture.points.len(), 2);
        assert_eq!(capture.points[0], Complex::new(1.0, 1.0));
        assert_eq!(capture.points[1], Complex::new(-1.0, -1.0));
        assert!((capture.rms_magnitude() - 2.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_ragged_payload_rejected() {
        assert!(matches!(
            ConstellationCapture::decode(header(), &[0u8; 5]),
            Err(DecodeError::Truncated { .. })
        ));
    }
}
