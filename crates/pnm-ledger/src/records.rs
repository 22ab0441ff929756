//! Ledger record types.

use pnm_core::{
    GroupId, MacAddress, OperationId, OperationState, PnmFileType, Timestamp, TransactionId,
};
use serde::{Deserialize, Serialize};

/// Ledger record for exactly one retrieved capture artifact.
///
/// Immutable once created; the id is derived from the record's own
/// content coordinates, so the same artifact always maps to the same id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub timestamp: Timestamp,
    pub mac_address: MacAddress,
    pub test_type: PnmFileType,
    pub filename: String,
    /// Snapshot of device metadata at capture time (model, firmware, ...).
    pub device_details: serde_json::Value,
}

impl Transaction {
    pub fn new(
        mac_address: MacAddress,
        test_type: PnmFileType,
        filename: String,
        device_details: serde_json::Value,
    ) -> Self {
        let timestamp = Timestamp::now();
        Self {
            id: TransactionId::derive(mac_address, timestamp, &filename, test_type),
            timestamp,
            mac_address,
            test_type,
            filename,
            device_details,
        }
    }
}

/// The ordered set of transactions produced by one capture session.
///
/// Append-only while its owning operation is running; frozen once the
/// operation reaches a terminal state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureGroupRecord {
    pub id: GroupId,
    pub created: Timestamp,
    pub transactions: Vec<TransactionId>,
}

impl CaptureGroupRecord {
    pub fn new() -> Self {
        Self {
            id: GroupId::new(),
            created: Timestamp::now(),
            transactions: Vec::new(),
        }
    }
}

impl Default for CaptureGroupRecord {
    fn default() -> Self {
        Self::new()
    }
}

/// Lifecycle row for one running or finished capture session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationRecord {
    pub id: OperationId,
    pub capture_group_id: GroupId,
    pub created: Timestamp,
    pub state: OperationState,
    pub collected: u32,
    pub time_remaining_secs: u64,
}

impl OperationRecord {
    pub fn new(capture_group_id: GroupId, duration_secs: u64) -> Self {
        Self {
            id: OperationId::new(),
            capture_group_id,
            created: Timestamp::now(),
            state: OperationState::Running,
            collected: 0,
            time_remaining_secs: duration_secs,
        }
    }
}
