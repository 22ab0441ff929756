//! Error taxonomy for the PNM capture and analysis system.

use thiserror::Error;

/// Failures while decoding one binary capture artifact.
///
/// A decode failure is local to that artifact; sibling artifacts in the
/// same capture group are unaffected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("unsupported capture type code 0x{0:02x}")]
    UnsupportedType(u8),

    #[error("truncated capture: declared {declared} payload bytes, found {actual}")]
    Truncated { declared: usize, actual: usize },

    #[error("invalid fixed-point format: {int_bits} integer + {frac_bits} fractional bits")]
    InvalidFixedPoint { int_bits: u8, frac_bits: u8 },
}

/// Failures in the durable three-table ledger.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("record not found: {0}")]
    NotFound(String),

    #[error("referential integrity violation: {0}")]
    IntegrityViolation(String),

    #[error("write conflict: {0}")]
    WriteConflict(String),

    #[error("ledger storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("ledger serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failures while driving a device through one capture tick.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrchestratorError {
    #[error("device unreachable: {0}")]
    DeviceUnreachable(String),

    #[error("capture not ready")]
    CaptureNotReady,

    #[error("measurement timed out after {attempts} readiness polls")]
    MeasurementTimeout { attempts: u32 },

    #[error("file retrieval failed: {0}")]
    FileRetrievalFailed(String),
}

/// Failures while reducing a frozen capture group.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("capture group contains no usable captures")]
    EmptyGroup,

    #[error("channel {0} not present in capture group")]
    ChannelNotPresent(u8),

    #[error("misaligned frequency axes: {0}")]
    MisalignedAxes(String),
}

/// Workspace-level error wrapping the component taxonomies.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),

    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, Error>;
