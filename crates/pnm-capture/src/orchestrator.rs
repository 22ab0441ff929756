//! Per-operation sampling loop.

use std::sync::Arc;
use std::time::Duration;

use pnm_core::{Error, GroupId, OperationId, OperationState, PnmFileType, TransactionId};
use pnm_ledger::{ArtifactStore, Ledger, Transaction};
use serde::{Deserialize, Serialize};
use tokio::sync::{watch, RwLock};
use tokio::time::Instant;

use crate::device::{CaptureReadiness, PnmDevice};

/// Bounded readiness-poll budget with exponential backoff.
#[derive(Debug, Clone)]
pub struct PollConfig {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_secs(4),
        }
    }
}

/// Configuration of one bounded sampling session.
#[derive(Debug, Clone)]
pub struct OperationConfig {
    /// Measurement kind each tick arms on the device.
    pub test_type: PnmFileType,
    /// Target OFDM channels; empty means all downstream channels.
    pub channels: Vec<u8>,
    pub duration: Duration,
    pub interval: Duration,
    pub poll: PollConfig,
}

impl OperationConfig {
    pub fn new(duration: Duration, interval: Duration) -> Self {
        Self {
            test_type: PnmFileType::ChannelEstimate,
            channels: Vec::new(),
            duration,
            interval,
            poll: PollConfig::default(),
        }
    }

    pub fn with_test_type(mut self, test_type: PnmFileType) -> Self {
        self.test_type = test_type;
        self
    }

    pub fn with_channels(mut self, channels: Vec<u8>) -> Self {
        self.channels = channels;
        self
    }
}

/// Live view of an operation, published after every state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationStatus {
    pub state: OperationState,
    pub collected: u32,
    pub time_remaining_secs: u64,
}

/// Run one operation to a terminal state.
///
/// Each tick arms, polls, retrieves, and registers one capture. A failed
/// tick is logged and skipped; only duration expiry or a stop request end
/// the loop. The stop flag is observed exclusively at tick boundaries, so
/// an in-flight tick always finishes its ledger write first.
pub(crate) async fn run_operation(
    device: Arc<dyn PnmDevice>,
    ledger: Arc<Ledger>,
    artifacts: Arc<ArtifactStore>,
    operation_id: OperationId,
    group_id: GroupId,
    config: OperationConfig,
    mut stop_rx: watch::Receiver<bool>,
    status: Arc<RwLock<OperationStatus>>,
) {
    let started = Instant::now();
    let mut collected = 0u32;
    let mut tick_index = 0u32;

    let final_state = loop {
        if *stop_rx.borrow() {
            break OperationState::Stopped;
        }
        if started.elapsed() >= config.duration {
            break OperationState::Completed;
        }

        tick_index += 1;
        match run_tick(
            device.as_ref(),
            &ledger,
            &artifacts,
            group_id,
            &config,
            tick_index,
        )
        .await
        {
            Ok(transaction_id) => {
                collected += 1;
                tracing::debug!(%operation_id, tick = tick_index, %transaction_id, "tick persisted");
            }
            Err(e) => {
                tracing::warn!(%operation_id, tick = tick_index, error = %e, "tick failed, skipping");
            }
        }

        let remaining = remaining_secs(&config, started);
        publish(
            &ledger,
            &status,
            operation_id,
            OperationState::Running,
            collected,
            remaining,
        )
        .await;

        if started.elapsed() >= config.duration {
            break OperationState::Completed;
        }

        // A stop request short-circuits the inter-tick sleep; the flag
        // itself is re-checked at the top of the loop.
        tokio::select! {
            _ = tokio::time::sleep(config.interval) => {}
            _ = stop_rx.changed() => {}
        }
    };

    let remaining = remaining_secs(&config, started);
    publish(
        &ledger,
        &status,
        operation_id,
        final_state,
        collected,
        remaining,
    )
    .await;
    tracing::info!(%operation_id, ?final_state, collected, "operation finished");
}

fn remaining_secs(config: &OperationConfig, started: Instant) -> u64 {
    config.duration.saturating_sub(started.elapsed()).as_secs()
}

async fn publish(
    ledger: &Ledger,
    status: &RwLock<OperationStatus>,
    operation_id: OperationId,
    state: OperationState,
    collected: u32,
    time_remaining_secs: u64,
) {
    *status.write().await = OperationStatus {
        state,
        collected,
        time_remaining_secs,
    };
    if let Err(e) = ledger.update_operation_state(operation_id, state, collected, time_remaining_secs)
    {
        tracing::error!(%operation_id, error = %e, "failed to write operation state");
    }
}

/// One capture tick: arm, poll with backoff, retrieve, register.
async fn run_tick(
    device: &dyn PnmDevice,
    ledger: &Ledger,
    artifacts: &ArtifactStore,
    group_id: GroupId,
    config: &OperationConfig,
    tick_index: u32,
) -> Result<TransactionId, Error> {
    device.arm_capture(&config.channels).await?;
    poll_until_ready(device, &config.poll).await?;

    let mac_hex: String = device
        .mac()
        .octets()
        .iter()
        .map(|o| format!("{o:02x}"))
        .collect();
    // The group id keeps filenames from colliding across operations on
    // the same device; a frozen group's artifacts must stay untouched.
    let filename = format!(
        "{}_{}_{}_{:04}.bin",
        config.test_type,
        mac_hex,
        group_id.0.simple(),
        tick_index
    );

    let bytes = device.retrieve_file(&filename).await?;
    artifacts.save(&filename, &bytes)?;

    let transaction = Transaction::new(
        device.mac(),
        config.test_type,
        filename,
        device.details(),
    );
    let id = ledger.put_transaction(transaction)?;
    ledger.append_to_group(group_id, id)?;
    Ok(id)
}

/// Poll device readiness within a bounded attempt budget.
async fn poll_until_ready(
    device: &dyn PnmDevice,
    poll: &PollConfig,
) -> Result<(), pnm_core::OrchestratorError> {
    let mut backoff = poll.initial_backoff;

    for _ in 0..poll.max_attempts {
        match device.poll_ready().await? {
            CaptureReadiness::Ready => return Ok(()),
            CaptureReadiness::Fault => return Err(pnm_core::OrchestratorError::CaptureNotReady),
            CaptureReadiness::Pending => {
                tokio::time::sleep(backoff).await;
                backoff = (backoff * 2).min(poll.max_backoff);
            }
        }
    }

    Err(pnm_core::OrchestratorError::MeasurementTimeout {
        attempts: poll.max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::MockDevice;
    use pnm_core::{MacAddress, OrchestratorError};

    fn mac() -> MacAddress {
        MacAddress::new([0, 0, 0, 0, 0, 0x10])
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_budget_exhaustion_times_out() {
        let device = MockDevice::new(mac()).with_pending_polls(u32::MAX);
        device.arm_capture(&[]).await.unwrap();

        let poll = PollConfig {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(1),
        };
        assert_eq!(
            poll_until_ready(&device, &poll).await,
            Err(OrchestratorError::MeasurementTimeout { attempts: 3 })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_recovers_after_pending() {
        let device = MockDevice::new(mac()).with_pending_polls(4);
        device.arm_capture(&[]).await.unwrap();

        let poll = PollConfig::default();
        assert!(poll_until_ready(&device, &poll).await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_registers_transaction() {
        let ledger = Ledger::in_memory();
        let artifacts = ArtifactStore::in_memory();
        let group = ledger.create_capture_group().unwrap();
        let device = MockDevice::new(mac()).with_subcarriers(8);
        let config = OperationConfig::new(Duration::from_secs(60), Duration::from_secs(15));

        let id = run_tick(&device, &ledger, &artifacts, group, &config, 1)
            .await
            .unwrap();

        let transaction = ledger.get_transaction(id).unwrap();
        assert_eq!(transaction.mac_address, mac());
        assert_eq!(ledger.get_group(group).unwrap().transactions, vec![id]);

        // The artifact behind the transaction decodes.
        let bytes = artifacts.load(&transaction.filename).unwrap();
        assert!(pnm_codec::decode(&bytes).is_ok());
    }
}
