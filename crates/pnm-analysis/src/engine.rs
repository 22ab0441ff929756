//! Analysis entry point over a frozen capture group.

use std::sync::Arc;

use pnm_codec::DecodedCapture;
use pnm_core::{AnalysisError, Error, GroupId, OperationId};
use pnm_ledger::{ArtifactStore, Ledger};
use serde::{Deserialize, Serialize};

use crate::align::{align, complex_series, scalar_series, ChannelPartition};
use crate::echo::{EchoProcessor, EchoResponse};
use crate::group_delay::{group_delay, GroupDelaySeries};
use crate::lte::{detect, LteDetectorConfig, LteFindings};
use crate::stats::{min_avg_max, MinAvgMaxSeries};

/// What to analyze: an operation (resolved to its group) or a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisTarget {
    Operation(OperationId),
    Group(GroupId),
}

/// Which reduction to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalysisKind {
    MinAvgMax,
    GroupDelay,
    LteDetection,
    EchoDetection,
}

/// Per-channel metric payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ChannelMetrics {
    MinAvgMax(MinAvgMaxSeries),
    GroupDelay(GroupDelaySeries),
    Lte(LteFindings),
    Echo(EchoResponse),
}

/// Result for one OFDM channel of the group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelAnalysis {
    pub channel_id: u8,
    /// Number of captures that contributed to the reduction.
    pub capture_count: usize,
    pub metrics: ChannelMetrics,
}

/// Structured analysis output, independent of any rendering step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub group_id: GroupId,
    pub kind: AnalysisKind,
    pub channels: Vec<ChannelAnalysis>,
    pub warnings: Vec<String>,
}

/// Frequency-domain analysis over frozen capture groups.
///
/// Takes one snapshot of the group's transaction list per run and never
/// mutates ledger state, so it is safe to run concurrently with a
/// still-appending operation (later appends are simply not seen).
pub struct AnalysisEngine {
    ledger: Arc<Ledger>,
    artifacts: Arc<ArtifactStore>,
    lte: LteDetectorConfig,
}

impl AnalysisEngine {
    pub fn new(ledger: Arc<Ledger>, artifacts: Arc<ArtifactStore>) -> Self {
        Self {
            ledger,
            artifacts,
            lte: LteDetectorConfig::default(),
        }
    }

    pub fn with_lte_config(mut self, lte: LteDetectorConfig) -> Self {
        self.lte = lte;
        self
    }

    /// Analyze every channel present in the target group.
    pub fn run(&self, target: AnalysisTarget, kind: AnalysisKind) -> Result<AnalysisReport, Error> {
        self.run_channels(target, kind, &[])
    }

    /// Analyze the requested channels; an absent channel is an error.
    pub fn run_channels(
        &self,
        target: AnalysisTarget,
        kind: AnalysisKind,
        channels: &[u8],
    ) -> Result<AnalysisReport, Error> {
        let group_id = match target {
            AnalysisTarget::Group(id) => id,
            AnalysisTarget::Operation(id) => self.ledger.get_operation(id)?.capture_group_id,
        };

        let mut warnings = Vec::new();
        let partition = self.snapshot(group_id, &mut warnings)?;

        let channel_ids: Vec<u8> = if channels.is_empty() {
            partition.channel_ids()
        } else {
            for &ch in channels {
                if !partition.channels.contains_key(&ch) {
                    return Err(AnalysisError::ChannelNotPresent(ch).into());
                }
            }
            channels.to_vec()
        };

        let mut results = Vec::new();
        for channel_id in channel_ids {
            let captures = &partition.channels[&channel_id];
            match self.analyze_channel(channel_id, captures, kind, &mut warnings)? {
                Some(result) => results.push(result),
                None => warnings.push(format!(
                    "channel {channel_id}: no usable series for {kind:?}"
                )),
            }
        }

        if results.is_empty() {
            return Err(AnalysisError::EmptyGroup.into());
        }

        Ok(AnalysisReport {
            group_id,
            kind,
            channels: results,
            warnings,
        })
    }

    /// Snapshot and decode the group's transaction list.
    fn snapshot(
        &self,
        group_id: GroupId,
        warnings: &mut Vec<String>,
    ) -> Result<ChannelPartition, Error> {
        let transactions = self.ledger.list_by_group(group_id)?;

        let mut partition = ChannelPartition::default();
        for transaction in &transactions {
            let bytes = match self.artifacts.load(&transaction.filename) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!(id = %transaction.id, error = %e, "artifact missing, skipping");
                    warnings.push(format!("{}: artifact missing", transaction.filename));
                    continue;
                }
            };
            // A decode failure is local to this artifact.
            match pnm_codec::decode(&bytes) {
                Ok(capture) => partition.insert(capture),
                Err(e) => {
                    tracing::warn!(id = %transaction.id, error = %e, "undecodable capture, skipping");
                    warnings.push(format!("{}: {e}", transaction.filename));
                }
            }
        }

        if partition.is_empty() {
            return Err(AnalysisError::EmptyGroup.into());
        }
        Ok(partition)
    }

    fn analyze_channel(
        &self,
        channel_id: u8,
        captures: &[DecodedCapture],
        kind: AnalysisKind,
        warnings: &mut Vec<String>,
    ) -> Result<Option<ChannelAnalysis>, Error> {
        let result = match kind {
            AnalysisKind::MinAvgMax => {
                let series: Vec<_> = captures.iter().filter_map(scalar_series).collect();
                if series.is_empty() {
                    return Ok(None);
                }
                let capture_count = series.len();
                let (axis, stack) = align(series, warnings)?;
                ChannelAnalysis {
                    channel_id,
                    capture_count,
                    metrics: ChannelMetrics::MinAvgMax(min_avg_max(&axis, &stack)),
                }
            }
            AnalysisKind::GroupDelay => {
                let series: Vec<_> = captures.iter().filter_map(complex_series).collect();
                if series.is_empty() {
                    return Ok(None);
                }
                let capture_count = series.len();
                let (axis, stack) = align(series, warnings)?;
                ChannelAnalysis {
                    channel_id,
                    capture_count,
                    metrics: ChannelMetrics::GroupDelay(group_delay(&axis, &stack)),
                }
            }
            AnalysisKind::LteDetection => {
                let series: Vec<_> = captures.iter().filter_map(complex_series).collect();
                if series.is_empty() {
                    return Ok(None);
                }
                let capture_count = series.len();
                let (axis, stack) = align(series, warnings)?;
                let delay = group_delay(&axis, &stack);
                ChannelAnalysis {
                    channel_id,
                    capture_count,
                    metrics: ChannelMetrics::Lte(detect(&self.lte, &delay)),
                }
            }
            AnalysisKind::EchoDetection => {
                let series: Vec<_> = captures.iter().filter_map(complex_series).collect();
                if series.is_empty() {
                    return Ok(None);
                }
                let capture_count = series.len();
                let (axis, stack) = align(series, warnings)?;
                let response = EchoProcessor::new().compute(&axis, &stack);
                ChannelAnalysis {
                    channel_id,
                    capture_count,
                    metrics: ChannelMetrics::Echo(response),
                }
            }
        };
        Ok(Some(result))
    }
}
