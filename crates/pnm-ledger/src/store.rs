//! Three-table keyed store with per-table write serialization.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use parking_lot::Mutex;
use pnm_core::{GroupId, LedgerError, MacAddress, OperationId, OperationState, TransactionId};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::records::{CaptureGroupRecord, OperationRecord, Transaction};

const TRANSACTIONS_FILE: &str = "transactions.json";
const GROUPS_FILE: &str = "capture_groups.json";
const OPERATIONS_FILE: &str = "operations.json";

/// Durable store of transactions, capture groups, and operations.
///
/// Each table has its own mutex; a method locks exactly the tables it
/// touches, one at a time, so concurrent operations writing to distinct
/// groups never observe partial updates.
pub struct Ledger {
    transactions: Mutex<HashMap<TransactionId, Transaction>>,
    groups: Mutex<HashMap<GroupId, CaptureGroupRecord>>,
    operations: Mutex<HashMap<OperationId, OperationRecord>>,
    storage_dir: Option<PathBuf>,
}

impl Ledger {
    /// Volatile ledger for tests and short-lived tooling.
    pub fn in_memory() -> Self {
        Self {
            transactions: Mutex::new(HashMap::new()),
            groups: Mutex::new(HashMap::new()),
            operations: Mutex::new(HashMap::new()),
            storage_dir: None,
        }
    }

    /// Open (or create) a file-backed ledger with one JSON file per table.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, LedgerError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        let ledger = Self {
            transactions: Mutex::new(load_table(&dir.join(TRANSACTIONS_FILE))?),
            groups: Mutex::new(load_table(&dir.join(GROUPS_FILE))?),
            operations: Mutex::new(load_table(&dir.join(OPERATIONS_FILE))?),
            storage_dir: Some(dir),
        };
        Ok(ledger)
    }

    /// Register a retrieved capture artifact.
    ///
    /// Transactions are content-addressed, so re-registering an identical
    /// record overwrites it with an equal value.
    pub fn put_transaction(&self, record: Transaction) -> Result<TransactionId, LedgerError> {
        let id = record.id;
        let mut table = self.transactions.lock();
        table.insert(id, record);
        self.persist(TRANSACTIONS_FILE, &*table)?;
        tracing::debug!(%id, "transaction registered");
        Ok(id)
    }

    pub fn get_transaction(&self, id: TransactionId) -> Result<Transaction, LedgerError> {
        self.transactions
            .lock()
            .get(&id)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(format!("transaction {id}")))
    }

    pub fn create_capture_group(&self) -> Result<GroupId, LedgerError> {
        let record = CaptureGroupRecord::new();
        let id = record.id;
        let mut table = self.groups.lock();
        table.insert(id, record);
        self.persist(GROUPS_FILE, &*table)?;
        Ok(id)
    }

    pub fn get_group(&self, id: GroupId) -> Result<CaptureGroupRecord, LedgerError> {
        self.groups
            .lock()
            .get(&id)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(format!("capture group {id}")))
    }

    /// Append a transaction id to a group's ordered list.
    ///
    /// Appending an id already present is a no-op; appending an id with no
    /// transaction record behind it is an integrity violation. A group whose
    /// owning operation has reached a terminal state is frozen, so further
    /// appends are write conflicts.
    pub fn append_to_group(
        &self,
        group_id: GroupId,
        transaction_id: TransactionId,
    ) -> Result<(), LedgerError> {
        if !self.transactions.lock().contains_key(&transaction_id) {
            return Err(LedgerError::IntegrityViolation(format!(
                "group {group_id} would reference unknown transaction {transaction_id}"
            )));
        }

        // The operation/group relation is 1:1, so one table scan resolves
        // the owner. Dropped before the groups lock is taken.
        if let Some(owner) = self
            .operations
            .lock()
            .values()
            .find(|op| op.capture_group_id == group_id)
        {
            if owner.state.is_terminal() {
                return Err(LedgerError::WriteConflict(format!(
                    "capture group {group_id} is frozen by {:?} operation {}",
                    owner.state, owner.id
                )));
            }
        }

        let mut table = self.groups.lock();
        let group = table
            .get_mut(&group_id)
            .ok_or_else(|| LedgerError::NotFound(format!("capture group {group_id}")))?;

        if group.transactions.contains(&transaction_id) {
            return Ok(());
        }
        group.transactions.push(transaction_id);
        self.persist(GROUPS_FILE, &*table)?;
        Ok(())
    }

    /// Create the lifecycle row for a new operation over `group_id`.
    pub fn create_operation(
        &self,
        group_id: GroupId,
        duration_secs: u64,
    ) -> Result<OperationId, LedgerError> {
        if !self.groups.lock().contains_key(&group_id) {
            return Err(LedgerError::IntegrityViolation(format!(
                "operation would reference unknown capture group {group_id}"
            )));
        }

        let record = OperationRecord::new(group_id, duration_secs);
        let id = record.id;
        let mut table = self.operations.lock();
        table.insert(id, record);
        self.persist(OPERATIONS_FILE, &*table)?;
        Ok(id)
    }

    pub fn get_operation(&self, id: OperationId) -> Result<OperationRecord, LedgerError> {
        self.operations
            .lock()
            .get(&id)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(format!("operation {id}")))
    }

    /// Publish the orchestrator's view of an operation.
    ///
    /// Completed and Stopped rows are immutable; a further update is a
    /// write conflict.
    pub fn update_operation_state(
        &self,
        id: OperationId,
        state: OperationState,
        collected: u32,
        time_remaining_secs: u64,
    ) -> Result<(), LedgerError> {
        let mut table = self.operations.lock();
        let record = table
            .get_mut(&id)
            .ok_or_else(|| LedgerError::NotFound(format!("operation {id}")))?;

        if record.state.is_terminal() {
            return Err(LedgerError::WriteConflict(format!(
                "operation {id} is already {:?}",
                record.state
            )));
        }

        record.state = state;
        record.collected = collected;
        record.time_remaining_secs = time_remaining_secs;
        self.persist(OPERATIONS_FILE, &*table)?;
        Ok(())
    }

    /// All transactions recorded for a device, oldest first.
    pub fn list_by_mac(&self, mac: MacAddress) -> Vec<Transaction> {
        let mut records: Vec<Transaction> = self
            .transactions
            .lock()
            .values()
            .filter(|t| t.mac_address == mac)
            .cloned()
            .collect();
        records.sort_by_key(|t| t.timestamp);
        records
    }

    /// Transactions of an operation, resolved transitively through its
    /// capture group, in arrival order.
    pub fn list_by_operation(
        &self,
        operation_id: OperationId,
    ) -> Result<Vec<Transaction>, LedgerError> {
        let operation = self.get_operation(operation_id)?;
        self.list_by_group(operation.capture_group_id)
    }

    /// Transactions of a capture group, in arrival order.
    pub fn list_by_group(&self, group_id: GroupId) -> Result<Vec<Transaction>, LedgerError> {
        let group = self.get_group(group_id)?;

        let table = self.transactions.lock();
        group
            .transactions
            .iter()
            .map(|id| {
                table.get(id).cloned().ok_or_else(|| {
                    LedgerError::IntegrityViolation(format!(
                        "group {} references missing transaction {id}",
                        group.id
                    ))
                })
            })
            .collect()
    }

    /// Write one table to disk while its lock is held, temp file first so
    /// readers never see a half-written table.
    fn persist<K, V>(&self, file: &str, table: &HashMap<K, V>) -> Result<(), LedgerError>
    where
        K: Serialize + Eq + std::hash::Hash,
        V: Serialize,
    {
        let Some(dir) = &self.storage_dir else {
            return Ok(());
        };
        let path = dir.join(file);
        let tmp = dir.join(format!("{file}.tmp"));
        fs::write(&tmp, serde_json::to_vec_pretty(table)?)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

fn load_table<K, V>(path: &Path) -> Result<HashMap<K, V>, LedgerError>
where
    K: DeserializeOwned + Eq + std::hash::Hash,
    V: DeserializeOwned,
{
    if !path.exists() {
        return Ok(HashMap::new());
    }
    let bytes = fs::read(path)?;
    Ok(serde_json::from_slice(&bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pnm_core::PnmFileType;

    fn mac(last: u8) -> MacAddress {
        MacAddress::new([0, 0, 0, 0, 0, last])
    }

    fn transaction(mac_last: u8, filename: &str) -> Transaction {
        Transaction::new(
            mac(mac_last),
            PnmFileType::RxMer,
            filename.to_string(),
            serde_json::json!({"model": "test-cm"}),
        )
    }

    #[test]
    fn test_transaction_roundtrip() {
        let ledger = Ledger::in_memory();
        let id = ledger.put_transaction(transaction(1, "a.bin")).unwrap();
        assert_eq!(ledger.get_transaction(id).unwrap().filename, "a.bin");
        assert!(matches!(
            ledger.get_transaction(TransactionId::derive(
                mac(9),
                pnm_core::Timestamp::from_nanos(0),
                "missing",
                PnmFileType::RxMer
            )),
            Err(LedgerError::NotFound(_))
        ));
    }

    #[test]
    fn test_idempotent_append() {
        let ledger = Ledger::in_memory();
        let group = ledger.create_capture_group().unwrap();
        let id = ledger.put_transaction(transaction(1, "a.bin")).unwrap();

        ledger.append_to_group(group, id).unwrap();
        ledger.append_to_group(group, id).unwrap();

        assert_eq!(ledger.get_group(group).unwrap().transactions.len(), 1);
    }

    #[test]
    fn test_append_unknown_transaction_is_integrity_violation() {
        let ledger = Ledger::in_memory();
        let group = ledger.create_capture_group().unwrap();
        let phantom = TransactionId::derive(
            mac(9),
            pnm_core::Timestamp::from_nanos(0),
            "phantom.bin",
            PnmFileType::RxMer,
        );
        assert!(matches!(
            ledger.append_to_group(group, phantom),
            Err(LedgerError::IntegrityViolation(_))
        ));
    }

    #[test]
    fn test_operation_requires_existing_group() {
        let ledger = Ledger::in_memory();
        assert!(matches!(
            ledger.create_operation(GroupId::new(), 120),
            Err(LedgerError::IntegrityViolation(_))
        ));
    }

    #[test]
    fn test_terminal_operation_is_immutable() {
        let ledger = Ledger::in_memory();
        let group = ledger.create_capture_group().unwrap();
        let op = ledger.create_operation(group, 120).unwrap();

        ledger
            .update_operation_state(op, OperationState::Stopped, 5, 45)
            .unwrap();
        assert!(matches!(
            ledger.update_operation_state(op, OperationState::Running, 6, 30),
            Err(LedgerError::WriteConflict(_))
        ));
        assert_eq!(ledger.get_operation(op).unwrap().collected, 5);
    }

    #[test]
    fn test_terminal_operation_freezes_its_group() {
        let ledger = Ledger::in_memory();
        let group = ledger.create_capture_group().unwrap();
        let op = ledger.create_operation(group, 120).unwrap();

        let before = ledger.put_transaction(transaction(1, "before.bin")).unwrap();
        ledger.append_to_group(group, before).unwrap();

        ledger
            .update_operation_state(op, OperationState::Stopped, 1, 45)
            .unwrap();

        let after = ledger.put_transaction(transaction(1, "after.bin")).unwrap();
        assert!(matches!(
            ledger.append_to_group(group, after),
            Err(LedgerError::WriteConflict(_))
        ));
        assert_eq!(ledger.get_group(group).unwrap().transactions, vec![before]);
    }

    #[test]
    fn test_list_by_operation_resolves_transitively() {
        let ledger = Ledger::in_memory();
        let group = ledger.create_capture_group().unwrap();
        let op = ledger.create_operation(group, 60).unwrap();

        for i in 0..3 {
            let id = ledger
                .put_transaction(transaction(1, &format!("sample_{i}.bin")))
                .unwrap();
            ledger.append_to_group(group, id).unwrap();
        }

        let listed = ledger.list_by_operation(op).unwrap();
        assert_eq!(listed.len(), 3);
        assert_eq!(listed[0].filename, "sample_0.bin");

        // Every enumerable id must independently resolve.
        for txn in &listed {
            assert!(ledger.get_transaction(txn.id).is_ok());
        }
    }

    #[test]
    fn test_list_by_mac_is_ordered_and_filtered() {
        let ledger = Ledger::in_memory();
        ledger.put_transaction(transaction(1, "first.bin")).unwrap();
        ledger.put_transaction(transaction(2, "other.bin")).unwrap();
        ledger.put_transaction(transaction(1, "second.bin")).unwrap();

        let listed = ledger.list_by_mac(mac(1));
        assert_eq!(listed.len(), 2);
        assert!(listed[0].timestamp <= listed[1].timestamp);
    }

    #[test]
    fn test_file_backed_reload() {
        let dir = tempfile::tempdir().unwrap();

        let (group, op, txn_id) = {
            let ledger = Ledger::open(dir.path()).unwrap();
            let group = ledger.create_capture_group().unwrap();
            let op = ledger.create_operation(group, 120).unwrap();
            let txn_id = ledger.put_transaction(transaction(1, "a.bin")).unwrap();
            ledger.append_to_group(group, txn_id).unwrap();
            (group, op, txn_id)
        };

        let reopened = Ledger::open(dir.path()).unwrap();
        assert_eq!(reopened.get_group(group).unwrap().transactions, vec![txn_id]);
        assert_eq!(
            reopened.get_operation(op).unwrap().state,
            OperationState::Running
        );
        assert_eq!(reopened.get_transaction(txn_id).unwrap().filename, "a.bin");
    }
}
