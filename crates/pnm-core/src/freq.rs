//! OFDM frequency-axis derivation for decoded capture series.
//!
//! Every per-subcarrier capture carries, in its header, the frequency of
//! subcarrier zero, the index of the first active subcarrier, and the
//! subcarrier spacing. The axis for a series of n decoded values is
//!
//! ```text
//! start = zero_freq + spacing * first_active_index
//! f[i]  = start + i * spacing        for i in [0, n)
//! ```

use serde::{Deserialize, Serialize};

/// Derived frequency axis for one sample series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrequencyAxis {
    /// Frequency of the first sample (Hz).
    pub start_hz: f64,

    /// Subcarrier spacing (Hz).
    pub spacing_hz: f64,

    /// Number of samples on the axis.
    pub len: usize,
}

impl FrequencyAxis {
    /// Derive the axis from capture-header fields.
    ///
    /// Returns an empty axis (never an error) when the spacing or length
    /// is degenerate.
    pub fn derive(zero_freq_hz: u32, spacing_hz: u32, first_active_index: u16, len: usize) -> Self {
        if spacing_hz == 0 || len == 0 {
            return Self::empty();
        }
        let start_hz = zero_freq_hz as f64 + spacing_hz as f64 * first_active_index as f64;
        Self {
            start_hz,
            spacing_hz: spacing_hz as f64,
            len,
        }
    }

    pub fn empty() -> Self {
        Self {
            start_hz: 0.0,
            spacing_hz: 0.0,
            len: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Frequency of sample `i`, or `None` past the end of the axis.
    pub fn frequency(&self, i: usize) -> Option<f64> {
        (i < self.len).then(|| self.start_hz + i as f64 * self.spacing_hz)
    }

    /// Materialize the full axis.
    pub fn values(&self) -> Vec<f64> {
        (0..self.len)
            .map(|i| self.start_hz + i as f64 * self.spacing_hz)
            .collect()
    }
}
