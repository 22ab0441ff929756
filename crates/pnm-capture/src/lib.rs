//! # PNM-Capture
//!
//! Capture orchestration against a live cable modem.
//!
//! An **operation** is one bounded sampling session: every `interval`
//! seconds the orchestrator arms a capture on the device, polls readiness
//! with a bounded backoff budget, retrieves the resulting binary artifact,
//! and registers it in the ledger under the operation's capture group.
//! The loop runs until the configured duration elapses (Completed) or a
//! stop request is observed at a tick boundary (Stopped).
//!
//! The orchestrator decodes nothing itself; it moves bytes and records.
//! The device is an injected [`PnmDevice`] collaborator, so operations can
//! run against real hardware or the synthetic [`MockDevice`].

pub mod device;
pub mod manager;
pub mod orchestrator;

pub use device::{CaptureReadiness, MockDevice, PnmDevice};
pub use manager::CaptureManager;
pub use orchestrator::{OperationConfig, OperationStatus, PollConfig};
