//! # PNM-Ledger
//!
//! Durable, referentially-linked store for the three record kinds a
//! capture session produces:
//!
//! - **Transaction**: one retrieved capture artifact (immutable).
//! - **Capture group**: the ordered transaction list of one session.
//! - **Operation**: the lifecycle row of one session.
//!
//! The [`Ledger`] is an explicit instance injected into the orchestrator
//! and the analysis pipeline; whoever composes the system owns its
//! lifecycle. Each table is guarded by its own mutex so writes are
//! serialized per table, and optional JSON file persistence keeps one
//! file per table (written to a temp file and renamed, so a crash never
//! leaves a half-written table).

pub mod artifacts;
pub mod records;
pub mod store;

pub use artifacts::ArtifactStore;
pub use records::{CaptureGroupRecord, OperationRecord, Transaction};
pub use store::Ledger;
