//! Fundamental types for the PNM capture and analysis system.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

/// Namespace for content-derived transaction ids (UUID v5).
const TRANSACTION_NAMESPACE: Uuid = Uuid::from_bytes([
    0x7a, 0x1d, 0x0c, 0x4e, 0x92, 0x3b, 0x4f, 0x6a, 0x8e, 0x55, 0x01, 0xb2, 0xc9, 0xd4, 0x3f, 0x88,
]);

/// Identifier for one retrieved capture artifact.
///
/// Derived from the artifact's content coordinates (device MAC, capture
/// timestamp, filename, test type), so re-registering the same artifact
/// yields the same id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(pub Uuid);

impl TransactionId {
    pub fn derive(
        mac: MacAddress,
        timestamp: Timestamp,
        filename: &str,
        test_type: PnmFileType,
    ) -> Self {
        let mut content = Vec::with_capacity(filename.len() + 32);
        content.extend_from_slice(&mac.octets());
        content.extend_from_slice(&timestamp.as_nanos().to_be_bytes());
        content.extend_from_slice(filename.as_bytes());
        content.push(test_type.type_code());
        Self(Uuid::new_v5(&TRANSACTION_NAMESPACE, &content))
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier for one capture group (the artifacts of a single session).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupId(pub Uuid);

impl GroupId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for GroupId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Identifier for one running or finished multi-sample session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationId(pub Uuid);

impl OperationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for OperationId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Timestamp wrapper with nanosecond precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn now() -> Self {
        Self(Utc::now().timestamp_nanos_opt().unwrap_or(0))
    }

    pub fn from_nanos(nanos: i64) -> Self {
        Self(nanos)
    }

    pub fn as_nanos(&self) -> i64 {
        self.0
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.0 as f64 / 1_000_000_000.0
    }

    pub fn to_datetime(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_nanos(self.0)
    }
}

/// 48-bit cable-modem MAC address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    pub const fn new(octets: [u8; 6]) -> Self {
        Self(octets)
    }

    pub fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}

impl FromStr for MacAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut octets = [0u8; 6];
        let mut parts = s.split(':');
        for octet in octets.iter_mut() {
            let part = parts
                .next()
                .ok_or_else(|| Error::InvalidInput(format!("malformed MAC address: {s}")))?;
            *octet = u8::from_str_radix(part, 16)
                .map_err(|_| Error::InvalidInput(format!("malformed MAC address: {s}")))?;
        }
        if parts.next().is_some() {
            return Err(Error::InvalidInput(format!("malformed MAC address: {s}")));
        }
        Ok(Self(octets))
    }
}

/// PNM capture file types produced by DOCSIS 3.1 cable modems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PnmFileType {
    /// Per-subcarrier receive modulation error ratio (quarter-dB steps).
    RxMer,
    /// OFDM downstream channel-estimate coefficients.
    ChannelEstimate,
    /// FEC codeword counters per modulation profile.
    FecSummary,
    /// Time-domain sample-level histogram.
    Histogram,
    /// Soft-decision constellation snapshot.
    Constellation,
    /// Downstream spectrum sweep.
    SpectrumSweep,
}

impl PnmFileType {
    /// Wire type code carried in the capture header.
    pub fn type_code(&self) -> u8 {
        match self {
            PnmFileType::RxMer => 0x01,
            PnmFileType::ChannelEstimate => 0x02,
            PnmFileType::FecSummary => 0x03,
            PnmFileType::Histogram => 0x04,
            PnmFileType::Constellation => 0x05,
            PnmFileType::SpectrumSweep => 0x06,
        }
    }

    pub fn from_type_code(code: u8) -> Option<Self> {
        match code {
            0x01 => Some(PnmFileType::RxMer),
            0x02 => Some(PnmFileType::ChannelEstimate),
            0x03 => Some(PnmFileType::FecSummary),
            0x04 => Some(PnmFileType::Histogram),
            0x05 => Some(PnmFileType::Constellation),
            0x06 => Some(PnmFileType::SpectrumSweep),
            _ => None,
        }
    }
}

impl fmt::Display for PnmFileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PnmFileType::RxMer => "rxmer",
            PnmFileType::ChannelEstimate => "chan_est",
            PnmFileType::FecSummary => "fec_summary",
            PnmFileType::Histogram => "histogram",
            PnmFileType::Constellation => "constellation",
            PnmFileType::SpectrumSweep => "spectrum",
        };
        f.write_str(name)
    }
}

/// Lifecycle state of a capture operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationState {
    Running,
    Completed,
    Stopped,
}

impl OperationState {
    /// Completed and Stopped operations refuse further ticks and freeze
    /// their capture group.
    pub fn is_terminal(&self) -> bool {
        matches!(self, OperationState::Completed | OperationState::Stopped)
    }
}
