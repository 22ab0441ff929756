//! Device collaborator interface and synthetic test device.

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use pnm_codec::header::CaptureHeader;
use pnm_codec::FixedPointFormat;
use pnm_core::{MacAddress, OrchestratorError, PnmFileType};

/// Device-side capture readiness, as reported by a poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureReadiness {
    /// The capture file is ready for retrieval.
    Ready,
    /// The measurement is still running; poll again.
    Pending,
    /// The device aborted the measurement.
    Fault,
}

/// The three capabilities the orchestrator needs from a device.
///
/// Implementations wrap the real command/retrieval plumbing (SNMP arm,
/// TFTP fetch); the orchestrator only sees these calls.
#[async_trait]
pub trait PnmDevice: Send + Sync {
    /// MAC address identifying the device in ledger records.
    fn mac(&self) -> MacAddress;

    /// Metadata snapshot stored on every transaction (model, firmware, ...).
    fn details(&self) -> serde_json::Value;

    /// Arm a capture for the given OFDM channels; an empty slice means
    /// all downstream channels of the measured kind.
    async fn arm_capture(&self, channels: &[u8]) -> Result<(), OrchestratorError>;

    /// Poll whether the armed capture has produced its file.
    async fn poll_ready(&self) -> Result<CaptureReadiness, OrchestratorError>;

    /// Retrieve the capture file produced by the last armed measurement.
    async fn retrieve_file(&self, name_hint: &str) -> Result<Vec<u8>, OrchestratorError>;
}

/// Synthetic device producing flat channel-estimate captures.
///
/// Stands in for a real modem in tests and demos: each retrieval yields a
/// well-formed capture file whose coefficients are 1.0 + 0.0j across the
/// configured subcarrier count.
pub struct MockDevice {
    mac: MacAddress,
    channel_id: u8,
    subcarriers: usize,
    /// Polls answered `Pending` before each capture reports `Ready`.
    pending_polls: u32,
    /// Every n-th arm call fails as unreachable (0 = never).
    fail_arm_every: u32,
    arm_counter: AtomicU32,
    poll_counter: AtomicU32,
}

impl MockDevice {
    pub fn new(mac: MacAddress) -> Self {
        Self {
            mac,
            channel_id: 33,
            subcarriers: 64,
            pending_polls: 0,
            fail_arm_every: 0,
            arm_counter: AtomicU32::new(0),
            poll_counter: AtomicU32::new(0),
        }
    }

    pub fn with_channel_id(mut self, channel_id: u8) -> Self {
        self.channel_id = channel_id;
        self
    }

    pub fn with_subcarriers(mut self, subcarriers: usize) -> Self {
        self.subcarriers = subcarriers;
        self
    }

    pub fn with_pending_polls(mut self, pending_polls: u32) -> Self {
        self.pending_polls = pending_polls;
        self
    }

    pub fn with_failing_arm_every(mut self, n: u32) -> Self {
        self.fail_arm_every = n;
        self
    }

    pub fn arm_count(&self) -> u32 {
        self.arm_counter.load(Ordering::SeqCst)
    }

    fn capture_bytes(&self) -> Vec<u8> {
        let format = FixedPointFormat::default();
        let one = format.encode_word(1.0).to_be_bytes();
        let zero = format.encode_word(0.0).to_be_bytes();

        let mut payload = Vec::with_capacity(self.subcarriers * 4);
        for _ in 0..self.subcarriers {
            payload.extend_from_slice(&one);
            payload.extend_from_slice(&zero);
        }

        let header = CaptureHeader {
            file_type: PnmFileType::ChannelEstimate,
            channel_id: self.channel_id,
            mac: self.mac,
            zero_frequency_hz: 600_000_000,
            first_active_index: 148,
            subcarrier_spacing_hz: 50_000,
            payload_len: payload.len() as u32,
        };
        header.encode_with_payload(&payload)
    }
}

#[async_trait]
impl PnmDevice for MockDevice {
    fn mac(&self) -> MacAddress {
        self.mac
    }

    fn details(&self) -> serde_json::Value {
        serde_json::json!({
            "model": "mock-cm",
            "firmware": "0.1.0",
        })
    }

    async fn arm_capture(&self, _channels: &[u8]) -> Result<(), OrchestratorError> {
        let n = self.arm_counter.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_arm_every != 0 && n % self.fail_arm_every == 0 {
            return Err(OrchestratorError::DeviceUnreachable(format!(
                "mock device dropped arm request {n}"
            )));
        }
        self.poll_counter.store(0, Ordering::SeqCst);
        Ok(())
    }

    async fn poll_ready(&self) -> Result<CaptureReadiness, OrchestratorError> {
        let polls = self.poll_counter.fetch_add(1, Ordering::SeqCst);
        if polls < self.pending_polls {
            Ok(CaptureReadiness::Pending)
        } else {
            Ok(CaptureReadiness::Ready)
        }
    }

    async fn retrieve_file(&self, _name_hint: &str) -> Result<Vec<u8>, OrchestratorError> {
        Ok(self.capture_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mac() -> MacAddress {
        MacAddress::new([0, 0x1a, 0x2b, 0x3c, 0x4d, 0x5e])
    }

    #[tokio::test]
    async fn test_mock_capture_decodes() {
        let device = MockDevice::new(mac()).with_subcarriers(16);
        device.arm_capture(&[]).await.unwrap();
        assert_eq!(device.poll_ready().await.unwrap(), CaptureReadiness::Ready);

        let bytes = device.retrieve_file("hint").await.unwrap();
        let decoded = pnm_codec::decode(&bytes).unwrap();
        match decoded {
            pnm_codec::DecodedCapture::ChannelEstimate(est) => {
                assert_eq!(est.subcarrier_count(), 16);
                assert_eq!(est.coefficients[0].re, 1.0);
                assert_eq!(est.coefficients[0].im, 0.0);
            }
            other => panic!("wrong variant: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_pending_polls_then_ready() {
        let device = MockDevice::new(mac()).with_pending_polls(2);
        device.arm_capture(&[]).await.unwrap();

        assert_eq!(device.poll_ready().await.unwrap(), CaptureReadiness::Pending);
        assert_eq!(device.poll_ready().await.unwrap(), CaptureReadiness::Pending);
        assert_eq!(device.poll_ready().await.unwrap(), CaptureReadiness::Ready);

        // Re-arming resets the poll budget.
        device.arm_capture(&[]).await.unwrap();
        assert_eq!(device.poll_ready().await.unwrap(), CaptureReadiness::Pending);
    }

    #[tokio::test]
    async fn test_failing_arm() {
        let device = MockDevice::new(mac()).with_failing_arm_every(2);
        assert!(device.arm_capture(&[]).await.is_ok());
        assert!(matches!(
            device.arm_capture(&[]).await,
            Err(OrchestratorError::DeviceUnreachable(_))
        ));
    }
}
