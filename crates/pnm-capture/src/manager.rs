//! Operation registry exposing the start / status / stop surface.

use std::collections::HashMap;
use std::sync::Arc;

use pnm_core::{Error, GroupId, LedgerError, OperationId, OperationState};
use pnm_ledger::{ArtifactStore, Ledger};
use tokio::sync::{watch, Mutex, RwLock};
use tokio::task::JoinHandle;

use crate::device::PnmDevice;
use crate::orchestrator::{run_operation, OperationConfig, OperationStatus};

struct OperationHandle {
    group_id: GroupId,
    stop_tx: watch::Sender<bool>,
    status: Arc<RwLock<OperationStatus>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

/// Entry point for the API/CLI layers: starts operations, reports their
/// status, and requests cooperative stops.
///
/// Multiple operations run concurrently, against the same or different
/// devices; the only shared mutable state is the injected ledger.
pub struct CaptureManager {
    ledger: Arc<Ledger>,
    artifacts: Arc<ArtifactStore>,
    operations: RwLock<HashMap<OperationId, Arc<OperationHandle>>>,
}

impl CaptureManager {
    pub fn new(ledger: Arc<Ledger>, artifacts: Arc<ArtifactStore>) -> Self {
        Self {
            ledger,
            artifacts,
            operations: RwLock::new(HashMap::new()),
        }
    }

    /// Create a capture group and operation row, then spawn the sampling
    /// loop for it.
    pub async fn start_operation(
        &self,
        device: Arc<dyn PnmDevice>,
        config: OperationConfig,
    ) -> Result<OperationId, Error> {
        let group_id = self.ledger.create_capture_group()?;
        let operation_id = self
            .ledger
            .create_operation(group_id, config.duration.as_secs())?;

        let (stop_tx, stop_rx) = watch::channel(false);
        let status = Arc::new(RwLock::new(OperationStatus {
            state: OperationState::Running,
            collected: 0,
            time_remaining_secs: config.duration.as_secs(),
        }));

        tracing::info!(
            %operation_id,
            %group_id,
            mac = %device.mac(),
            test_type = %config.test_type,
            duration_secs = config.duration.as_secs(),
            interval_secs = config.interval.as_secs(),
            "starting capture operation"
        );

        let task = tokio::spawn(run_operation(
            device,
            self.ledger.clone(),
            self.artifacts.clone(),
            operation_id,
            group_id,
            config,
            stop_rx,
            status.clone(),
        ));

        let handle = Arc::new(OperationHandle {
            group_id,
            stop_tx,
            status,
            task: Mutex::new(Some(task)),
        });
        self.operations.write().await.insert(operation_id, handle);
        Ok(operation_id)
    }

    /// Live status of an operation.
    pub async fn status(&self, operation_id: OperationId) -> Result<OperationStatus, Error> {
        let handle = self.handle(operation_id).await?;
        let status = *handle.status.read().await;
        Ok(status)
    }

    /// Capture group an operation writes into.
    pub async fn group_of(&self, operation_id: OperationId) -> Result<GroupId, Error> {
        Ok(self.handle(operation_id).await?.group_id)
    }

    /// Request a cooperative stop.
    ///
    /// Only raises a flag; the loop observes it at the next tick boundary,
    /// after any in-flight tick has persisted its transaction.
    pub async fn stop(&self, operation_id: OperationId) -> Result<(), Error> {
        let handle = self.handle(operation_id).await?;
        // Send only fails when the loop has already exited, which makes
        // the stop a no-op on an already-terminal operation.
        let _ = handle.stop_tx.send(true);
        tracing::info!(%operation_id, "stop requested");
        Ok(())
    }

    /// Wait for an operation's loop to reach a terminal state.
    pub async fn wait(&self, operation_id: OperationId) -> Result<OperationStatus, Error> {
        let handle = self.handle(operation_id).await?;
        let task = handle.task.lock().await.take();
        if let Some(task) = task {
            let _ = task.await;
        }
        let status = *handle.status.read().await;
        Ok(status)
    }

    /// Evict registry handles of operations that reached a terminal state,
    /// returning how many were dropped. Their durable rows stay in the
    /// ledger; only the in-memory start/status/stop surface forgets them.
    pub async fn prune_finished(&self) -> usize {
        let mut operations = self.operations.write().await;
        let mut finished = Vec::new();
        for (id, handle) in operations.iter() {
            if handle.status.read().await.state.is_terminal() {
                finished.push(*id);
            }
        }
        for id in &finished {
            operations.remove(id);
        }
        if !finished.is_empty() {
            tracing::debug!(count = finished.len(), "pruned finished operations");
        }
        finished.len()
    }

    async fn handle(&self, operation_id: OperationId) -> Result<Arc<OperationHandle>, Error> {
        self.operations
            .read()
            .await
            .get(&operation_id)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(format!("operation {operation_id}")).into())
    }
}
