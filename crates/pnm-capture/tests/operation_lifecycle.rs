//! End-to-end operation lifecycle tests against the mock device.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use async_trait::async_trait;
use pnm_capture::{CaptureManager, CaptureReadiness, MockDevice, OperationConfig, PnmDevice};
use pnm_core::{MacAddress, OperationId, OperationState, OrchestratorError};
use pnm_ledger::{ArtifactStore, Ledger};

fn mac(last: u8) -> MacAddress {
    MacAddress::new([0x00, 0x1a, 0x2b, 0x3c, 0x4d, last])
}

fn manager() -> Arc<CaptureManager> {
    Arc::new(CaptureManager::new(
        Arc::new(Ledger::in_memory()),
        Arc::new(ArtifactStore::in_memory()),
    ))
}

fn manager_with_ledger(ledger: Arc<Ledger>) -> Arc<CaptureManager> {
    Arc::new(CaptureManager::new(
        ledger,
        Arc::new(ArtifactStore::in_memory()),
    ))
}

#[tokio::test(start_paused = true)]
async fn test_duration_yields_scheduled_tick_count() {
    let ledger = Arc::new(Ledger::in_memory());
    let manager = manager_with_ledger(ledger.clone());
    let device = Arc::new(MockDevice::new(mac(1)).with_subcarriers(8));

    let config = OperationConfig::new(Duration::from_secs(120), Duration::from_secs(15));
    let op = manager.start_operation(device, config).await.unwrap();

    let status = manager.wait(op).await.unwrap();
    assert_eq!(status.state, OperationState::Completed);
    assert_eq!(status.collected, 8, "120s / 15s schedules 8 ticks");

    let transactions = ledger.list_by_operation(op).unwrap();
    assert_eq!(transactions.len(), 8);

    // Integrity: every enumerable id resolves independently.
    for txn in &transactions {
        assert!(ledger.get_transaction(txn.id).is_ok());
    }

    // The durable row matches the published terminal status.
    let record = ledger.get_operation(op).unwrap();
    assert_eq!(record.state, OperationState::Completed);
    assert_eq!(record.collected, 8);
}

/// Device wrapper that requests a stop during its fifth armed tick.
struct StopOnFifthArm {
    inner: MockDevice,
    arm_count: std::sync::atomic::AtomicU32,
    target: Arc<OnceLock<(Arc<CaptureManager>, OperationId)>>,
}

#[async_trait]
impl PnmDevice for StopOnFifthArm {
    fn mac(&self) -> MacAddress {
        self.inner.mac()
    }

    fn details(&self) -> serde_json::Value {
        self.inner.details()
    }

    async fn arm_capture(&self, channels: &[u8]) -> Result<(), OrchestratorError> {
        let n = self
            .arm_count
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst)
            + 1;
        if n == 5 {
            if let Some((manager, op)) = self.target.get() {
                manager.stop(*op).await.expect("stop request");
            }
        }
        self.inner.arm_capture(channels).await
    }

    async fn poll_ready(&self) -> Result<CaptureReadiness, OrchestratorError> {
        self.inner.poll_ready().await
    }

    async fn retrieve_file(&self, name_hint: &str) -> Result<Vec<u8>, OrchestratorError> {
        self.inner.retrieve_file(name_hint).await
    }
}

#[tokio::test(start_paused = true)]
async fn test_stop_during_fifth_tick_persists_five() {
    let ledger = Arc::new(Ledger::in_memory());
    let manager = manager_with_ledger(ledger.clone());

    let target = Arc::new(OnceLock::new());
    let device = Arc::new(StopOnFifthArm {
        inner: MockDevice::new(mac(2)).with_subcarriers(8),
        arm_count: std::sync::atomic::AtomicU32::new(0),
        target: target.clone(),
    });

    let config = OperationConfig::new(Duration::from_secs(120), Duration::from_secs(15));
    let op = manager.start_operation(device, config).await.unwrap();
    target.set((manager.clone(), op)).ok().unwrap();

    let status = manager.wait(op).await.unwrap();

    // The stop arrived mid-tick: the in-flight tick still persisted its
    // transaction, then the boundary check stopped the loop.
    assert_eq!(status.state, OperationState::Stopped);
    assert_eq!(status.collected, 5);
    assert!(status.time_remaining_secs > 0);
    assert_eq!(ledger.list_by_operation(op).unwrap().len(), 5);
}

#[tokio::test(start_paused = true)]
async fn test_failed_ticks_are_skipped_not_fatal() {
    let ledger = Arc::new(Ledger::in_memory());
    let manager = manager_with_ledger(ledger.clone());
    // Every second arm request fails as unreachable.
    let device = Arc::new(
        MockDevice::new(mac(3))
            .with_subcarriers(8)
            .with_failing_arm_every(2),
    );

    let config = OperationConfig::new(Duration::from_secs(120), Duration::from_secs(15));
    let op = manager.start_operation(device, config).await.unwrap();

    let status = manager.wait(op).await.unwrap();
    assert_eq!(status.state, OperationState::Completed);
    assert_eq!(status.collected, 4, "ticks 2, 4, 6, 8 were skipped");
    assert_eq!(ledger.list_by_operation(op).unwrap().len(), 4);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_operations_do_not_interfere() {
    let ledger = Arc::new(Ledger::in_memory());
    let manager = manager_with_ledger(ledger.clone());

    let config = OperationConfig::new(Duration::from_secs(60), Duration::from_secs(15));
    let op_a = manager
        .start_operation(Arc::new(MockDevice::new(mac(4)).with_subcarriers(8)), config.clone())
        .await
        .unwrap();
    let op_b = manager
        .start_operation(Arc::new(MockDevice::new(mac(5)).with_subcarriers(8)), config)
        .await
        .unwrap();

    assert_eq!(manager.wait(op_a).await.unwrap().collected, 4);
    assert_eq!(manager.wait(op_b).await.unwrap().collected, 4);

    let group_a = manager.group_of(op_a).await.unwrap();
    let group_b = manager.group_of(op_b).await.unwrap();
    assert_ne!(group_a, group_b);

    // Each group only holds its own device's transactions.
    for txn in ledger.list_by_operation(op_a).unwrap() {
        assert_eq!(txn.mac_address, mac(4));
    }
    for txn in ledger.list_by_operation(op_b).unwrap() {
        assert_eq!(txn.mac_address, mac(5));
    }
}

#[tokio::test(start_paused = true)]
async fn test_prune_finished_evicts_terminal_handles() {
    let ledger = Arc::new(Ledger::in_memory());
    let manager = manager_with_ledger(ledger.clone());
    let config = OperationConfig::new(Duration::from_secs(30), Duration::from_secs(15));
    let op = manager
        .start_operation(Arc::new(MockDevice::new(mac(7)).with_subcarriers(8)), config)
        .await
        .unwrap();

    assert_eq!(
        manager.prune_finished().await,
        0,
        "running operations stay registered"
    );

    manager.wait(op).await.unwrap();
    assert_eq!(manager.prune_finished().await, 1);
    assert!(manager.status(op).await.is_err());

    // The durable row outlives the in-memory handle.
    assert_eq!(
        ledger.get_operation(op).unwrap().state,
        OperationState::Completed
    );
}

#[tokio::test(start_paused = true)]
async fn test_groups_keep_their_artifacts_across_operations() {
    let ledger = Arc::new(Ledger::in_memory());
    let artifacts = Arc::new(ArtifactStore::in_memory());
    let manager = Arc::new(CaptureManager::new(ledger.clone(), artifacts.clone()));

    let config = OperationConfig::new(Duration::from_secs(30), Duration::from_secs(15));
    let op_a = manager
        .start_operation(
            Arc::new(MockDevice::new(mac(6)).with_subcarriers(8)),
            config.clone(),
        )
        .await
        .unwrap();
    manager.wait(op_a).await.unwrap();
    let txns_a = ledger.list_by_operation(op_a).unwrap();
    let bytes_a = artifacts.load(&txns_a[0].filename).unwrap();

    // A later session on the same device must not disturb the frozen
    // group's bytes.
    let op_b = manager
        .start_operation(
            Arc::new(MockDevice::new(mac(6)).with_subcarriers(16)),
            config,
        )
        .await
        .unwrap();
    manager.wait(op_b).await.unwrap();
    let txns_b = ledger.list_by_operation(op_b).unwrap();

    assert_ne!(txns_a[0].filename, txns_b[0].filename);
    assert_eq!(artifacts.load(&txns_a[0].filename).unwrap(), bytes_a);

    match pnm_codec::decode(&bytes_a).unwrap() {
        pnm_codec::DecodedCapture::ChannelEstimate(est) => assert_eq!(est.subcarrier_count(), 8),
        other => panic!("wrong variant: {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn test_status_of_unknown_operation() {
    let manager = manager();
    assert!(manager.status(OperationId::new()).await.is_err());
}
