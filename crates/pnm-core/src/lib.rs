//! # PNM-Core
//!
//! Shared types for the PNM (Proactive Network Maintenance) capture and
//! analysis system: record identifiers, device addressing, timestamps,
//! the OFDM frequency-axis law, and the workspace error taxonomy.

pub mod error;
pub mod freq;
pub mod types;

pub use error::{AnalysisError, DecodeError, Error, LedgerError, OrchestratorError, Result};
pub use freq::*;
pub use types::*;
