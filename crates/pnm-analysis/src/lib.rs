//! # PNM-Analysis
//!
//! Frequency-domain reduction of a completed capture group into
//! diagnostic metrics:
//!
//! - **min-avg-max**: per-subcarrier magnitude envelope across samples.
//! - **group delay**: phase derivative of the averaged channel estimate.
//! - **LTE detection**: binned group-delay ripple scan for narrowband
//!   ingress.
//! - **echo detection**: inverse FFT of the averaged channel estimate,
//!   exposing micro-reflections as time-domain taps.
//!
//! The pipeline reads a snapshot of the group from the ledger, decodes
//! each member through `pnm-codec` (skipping undecodable artifacts),
//! partitions by OFDM channel, aligns the series per channel, and
//! reduces. Output is structured numeric data for renderers to consume.

pub mod align;
pub mod echo;
pub mod engine;
pub mod group_delay;
pub mod lte;
pub mod stats;

pub use echo::{EchoProcessor, EchoResponse};
pub use engine::{
    AnalysisEngine, AnalysisKind, AnalysisReport, AnalysisTarget, ChannelAnalysis, ChannelMetrics,
};
pub use group_delay::GroupDelaySeries;
pub use lte::{LteBin, LteDetectorConfig, LteFindings};
pub use stats::MinAvgMaxSeries;
