//! FEC codeword counters per modulation profile.

use pnm_core::DecodeError;
use serde::{Deserialize, Serialize};

use crate::header::CaptureHeader;

/// Bytes per profile record: profile id + three u32 counters.
const PROFILE_RECORD_LEN: usize = 13;

/// Codeword counters for one downstream modulation profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FecProfileCounters {
    pub profile_id: u8,
    pub total_codewords: u32,
    pub corrected_codewords: u32,
    pub uncorrectable_codewords: u32,
}

impl FecProfileCounters {
    /// Fraction of codewords the decoder could not correct.
    pub fn uncorrectable_ratio(&self) -> f64 {
        if self.total_codewords == 0 {
            return 0.0;
        }
        self.uncorrectable_codewords as f64 / self.total_codewords as f64
    }
}

/// Decoded FEC summary capture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FecSummaryCapture {
    pub header: CaptureHeader,
    pub profiles: Vec<FecProfileCounters>,
}

impl FecSummaryCapture {
    /// Decode 13 bytes per profile: u8 profile id, then big-endian u32
    /// total / corrected / uncorrectable codeword counts.
    pub fn decode(header: CaptureHeader, payload: &[u8]) -> Result<Self, DecodeError> {
        if payload.len() % PROFILE_RECORD_LEN != 0 {
            return Err(DecodeError::Truncated {
                declared: payload.len() / PROFILE_RECORD_LEN * PROFILE_RECORD_LEN
                    + PROFILE_RECORD_LEN,
                actual: payload.len(),
            });
        }

        let profiles = payload
            .chunks_exact(PROFILE_RECORD_LEN)
            .map(|record| FecProfileCounters {
                profile_id: record[0],
                total_codewords: u32::from_be_bytes(record[1..5].try_into().expect("u32")),
                corrected_codewords: u32::from_be_bytes(record[5..9].try_into().expect("u32")),
                uncorrectable_codewords: u32::from_be_bytes(record[9..13].try_into().expect("u32")),
            })
            .collect();

        Ok(Self { header, profiles })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pnm_core::{MacAddress, PnmFileType};

    fn header() -> CaptureHeader {
        CaptureHeader {
            file_type: PnmFileType::FecSummary,
            channel_id: 3,
            mac: MacAddress::new([0, 0, 0, 0, 0, 3]),
            zero_frequency_hz: 0,
            first_active_index: 0,
            subcarrier_spacing_hz: 0,
            payload_len: 0,
        }
    }

    fn profile_record(id: u8, total: u32, corrected: u32, uncorrectable: u32) -> Vec<u8> {
        let mut record = vec![id];
        record.extend_from_slice(&total.to_be_bytes());
        record.extend_from_slice(&corrected.to_be_bytes());
        record.extend_from_slice(&uncorrectable.to_be_bytes());
        record
    }

    #[test]
    fn test_decode_two_profiles() {
        let mut payload = profile_record(0, 1_000_000, 120, 3);
        payload.extend(profile_record(2, 500_000, 40, 0));

        let capture = FecSummaryCapture::decode(header(), &payload).unwrap();
        assert_eq!(capture.profiles.len(), 2);
        assert_eq!(capture.profiles[0].profile_id, 0);
        assert_eq!(capture.profiles[0].total_codewords, 1_000_000);
        assert_eq!(capture.profiles[0].uncorrectable_codewords, 3);
        assert_eq!(capture.profiles[1].uncorrectable_ratio(), 0.0);
    }

    #[test]
    fn test_ragged_payload_rejected() {
        let payload = profile_record(0, 1, 0, 0);
        let result = FecSummaryCapture::decode(header(), &payload[..10]);
        assert!(matches!(result, Err(DecodeError::Truncated { .. })));
    }

    #[test]
    fn test_zero_total_ratio() {
        let counters = FecProfileCounters {
            profile_id: 0,
            total_codewords: 0,
            corrected_codewords: 0,
            uncorrectable_codewords: 0,
        };
        assert_eq!(counters.uncorrectable_ratio(), 0.0);
    }
}
