//! Group snapshot, channel partition, and frequency-axis alignment.

use std::collections::BTreeMap;

use num_complex::Complex;
use pnm_codec::DecodedCapture;
use pnm_core::{AnalysisError, FrequencyAxis};

/// Relative tolerance for spacing comparison between two axes.
const SPACING_TOLERANCE: f64 = 1e-9;

/// One decodable per-subcarrier series with its axis.
#[derive(Debug, Clone)]
pub struct AxisSeries<T> {
    pub axis: FrequencyAxis,
    pub values: Vec<T>,
}

/// Decoded captures of one group, partitioned by OFDM channel id.
///
/// Built once from a snapshot of the group's transaction list; later
/// appends to a still-running group are simply not seen.
#[derive(Debug, Default)]
pub struct ChannelPartition {
    pub channels: BTreeMap<u8, Vec<DecodedCapture>>,
}

impl ChannelPartition {
    pub fn insert(&mut self, capture: DecodedCapture) {
        self.channels
            .entry(capture.channel_id())
            .or_default()
            .push(capture);
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn channel_ids(&self) -> Vec<u8> {
        self.channels.keys().copied().collect()
    }
}

/// Scalar magnitude series of a capture, where one exists.
pub fn scalar_series(capture: &DecodedCapture) -> Option<AxisSeries<f64>> {
    match capture {
        DecodedCapture::RxMer(c) => Some(AxisSeries {
            axis: c.axis.clone(),
            values: c.values_db.clone(),
        }),
        DecodedCapture::ChannelEstimate(c) => Some(AxisSeries {
            axis: c.axis.clone(),
            values: c.magnitude_db(),
        }),
        _ => None,
    }
}

/// Complex coefficient series of a capture, where one exists.
pub fn complex_series(capture: &DecodedCapture) -> Option<AxisSeries<Complex<f64>>> {
    match capture {
        DecodedCapture::ChannelEstimate(c) => Some(AxisSeries {
            axis: c.axis.clone(),
            values: c.coefficients.clone(),
        }),
        _ => None,
    }
}

/// Align M series of one channel to their shortest common frequency axis.
///
/// All series must share start frequency (within half a spacing) and
/// spacing; a grid mismatch is fatal. A length-only mismatch truncates
/// every series to the shortest and records a warning instead.
pub fn align<T: Clone>(
    series: Vec<AxisSeries<T>>,
    warnings: &mut Vec<String>,
) -> Result<(FrequencyAxis, Vec<Vec<T>>), AnalysisError> {
    let mut usable: Vec<AxisSeries<T>> = series
        .into_iter()
        .filter(|s| !s.axis.is_empty() && !s.values.is_empty())
        .collect();
    if usable.is_empty() {
        return Err(AnalysisError::EmptyGroup);
    }

    let reference = usable[0].axis.clone();
    for s in &usable[1..] {
        let spacing_delta = (s.axis.spacing_hz - reference.spacing_hz).abs();
        if spacing_delta > reference.spacing_hz.abs() * SPACING_TOLERANCE {
            return Err(AnalysisError::MisalignedAxes(format!(
                "subcarrier spacing {} Hz vs {} Hz",
                s.axis.spacing_hz, reference.spacing_hz
            )));
        }
        if (s.axis.start_hz - reference.start_hz).abs() > reference.spacing_hz / 2.0 {
            return Err(AnalysisError::MisalignedAxes(format!(
                "start frequency {} Hz vs {} Hz",
                s.axis.start_hz, reference.start_hz
            )));
        }
    }

    let min_len = usable.iter().map(|s| s.values.len()).min().unwrap_or(0);
    let max_len = usable.iter().map(|s| s.values.len()).max().unwrap_or(0);
    if min_len != max_len {
        warnings.push(format!(
            "series lengths differ ({min_len}..{max_len}); truncated to {min_len} subcarriers"
        ));
    }

    let aligned = usable
        .iter_mut()
        .map(|s| {
            s.values.truncate(min_len);
            std::mem::take(&mut s.values)
        })
        .collect();

    let axis = FrequencyAxis {
        start_hz: reference.start_hz,
        spacing_hz: reference.spacing_hz,
        len: min_len,
    };
    Ok((axis, aligned))
}
