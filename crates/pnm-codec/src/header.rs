//! Common PNM capture header.

use pnm_core::{DecodeError, FrequencyAxis, MacAddress, PnmFileType};
use serde::{Deserialize, Serialize};

/// Magic bytes opening every PNM capture file.
pub const MAGIC: [u8; 3] = *b"PNN";

/// Fixed header length in bytes.
pub const HEADER_LEN: usize = 23;

/// Common header of a PNM capture file.
///
/// Layout (big-endian; these files arrive over SNMP/TFTP in network order):
///
/// ```text
/// [0-2]:   magic "PNN"
/// [3]:     file type code
/// [4]:     OFDM channel id
/// [5-10]:  device MAC address
/// [11-14]: zero-subcarrier frequency (Hz, u32)
/// [15-16]: first active subcarrier index (u16)
/// [17-18]: subcarrier spacing (kHz, u16)
/// [19-22]: declared payload length (u32)
/// [23..]:  payload
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureHeader {
    pub file_type: PnmFileType,
    pub channel_id: u8,
    pub mac: MacAddress,
    pub zero_frequency_hz: u32,
    pub first_active_index: u16,
    /// Subcarrier spacing in Hz (wire field is kHz, scaled here by 1000).
    pub subcarrier_spacing_hz: u32,
    pub payload_len: u32,
}

impl CaptureHeader {
    /// Parse the header and split off the payload.
    ///
    /// The declared payload length must equal the remaining byte count
    /// exactly; any mismatch fails the whole artifact as `Truncated`.
    pub fn parse(bytes: &[u8]) -> Result<(Self, &[u8]), DecodeError> {
        if bytes.len() < HEADER_LEN || bytes[0..3] != MAGIC {
            return Err(DecodeError::Truncated {
                declared: HEADER_LEN,
                actual: bytes.len().min(HEADER_LEN),
            });
        }

        let file_type = PnmFileType::from_type_code(bytes[3])
            .ok_or(DecodeError::UnsupportedType(bytes[3]))?;
        let channel_id = bytes[4];
        let mac = MacAddress::new(bytes[5..11].try_into().expect("6-byte slice"));
        let zero_frequency_hz = u32::from_be_bytes(bytes[11..15].try_into().expect("4-byte slice"));
        let first_active_index = u16::from_be_bytes(bytes[15..17].try_into().expect("2-byte slice"));
        let spacing_khz = u16::from_be_bytes(bytes[17..19].try_into().expect("2-byte slice"));
        let payload_len = u32::from_be_bytes(bytes[19..23].try_into().expect("4-byte slice"));

        let payload = &bytes[HEADER_LEN..];
        if payload.len() != payload_len as usize {
            return Err(DecodeError::Truncated {
                declared: payload_len as usize,
                actual: payload.len(),
            });
        }

        Ok((
            Self {
                file_type,
                channel_id,
                mac,
                zero_frequency_hz,
                first_active_index,
                subcarrier_spacing_hz: spacing_khz as u32 * 1000,
                payload_len,
            },
            payload,
        ))
    }

    /// Frequency axis for a series of `len` per-subcarrier samples.
    pub fn axis(&self, len: usize) -> FrequencyAxis {
        FrequencyAxis::derive(
            self.zero_frequency_hz,
            self.subcarrier_spacing_hz,
            self.first_active_index,
            len,
        )
    }

    /// Serialize the header followed by `payload` into one capture file.
    ///
    /// Used by synthetic-capture generators and tests; the declared length
    /// is taken from the payload itself.
    pub fn encode_with_payload(&self, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
        out.extend_from_slice(&MAGIC);
        out.push(self.file_type.type_code());
        out.push(self.channel_id);
        out.extend_from_slice(&self.mac.octets());
        out.extend_from_slice(&self.zero_frequency_hz.to_be_bytes());
        out.extend_from_slice(&self.first_active_index.to_be_bytes());
        out.extend_from_slice(&((self.subcarrier_spacing_hz / 1000) as u16).to_be_bytes());
        out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        out.extend_from_slice(payload);
        out
    }
}
