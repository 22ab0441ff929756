//! LTE ingress detection from group-delay ripple.
//!
//! A narrowband interferer (an LTE uplink leaking into the cable plant
//! is the classic case) distorts the phase response locally, which shows
//! up as a delay excursion confined to a few MHz. The detector bins the
//! group-delay series into fixed-width frequency windows and flags bins
//! whose peak-to-peak ripple exceeds a threshold.

use serde::{Deserialize, Serialize};

use crate::group_delay::GroupDelaySeries;

/// Detector tuning.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LteDetectorConfig {
    /// Width of each analysis bin (Hz).
    pub bin_width_hz: f64,

    /// Peak-to-peak delay ripple above which a bin is anomalous (µs).
    pub ripple_threshold_us: f64,
}

impl Default for LteDetectorConfig {
    fn default() -> Self {
        Self {
            bin_width_hz: 6_000_000.0,
            ripple_threshold_us: 0.5,
        }
    }
}

/// One analysis bin over the delay series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LteBin {
    pub start_hz: f64,
    pub stop_hz: f64,
    /// Peak-to-peak group-delay ripple within the bin (µs).
    pub ripple_us: f64,
    pub flagged: bool,
}

/// Detector output: every bin, plus a count of flagged ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LteFindings {
    pub bins: Vec<LteBin>,
    pub anomaly_count: usize,
    pub threshold_us: f64,
}

/// Scan a group-delay series for localized ripple anomalies.
pub fn detect(config: &LteDetectorConfig, delay: &GroupDelaySeries) -> LteFindings {
    let mut bins = Vec::new();

    if !delay.frequency_hz.is_empty() && config.bin_width_hz > 0.0 {
        let band_start = delay.frequency_hz[0];
        let band_stop = *delay.frequency_hz.last().expect("non-empty");
        let mut bin_start = band_start;

        while bin_start < band_stop {
            let bin_stop = (bin_start + config.bin_width_hz).min(band_stop);
            let is_last = bin_stop >= band_stop;

            let values: Vec<f64> = delay
                .frequency_hz
                .iter()
                .zip(&delay.delay_us)
                .filter(|(f, _)| **f >= bin_start && (**f < bin_stop || is_last))
                .map(|(_, d)| *d)
                .collect();

            if !values.is_empty() {
                let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
                let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
                let ripple_us = max - min;
                bins.push(LteBin {
                    start_hz: bin_start,
                    stop_hz: bin_stop,
                    ripple_us,
                    flagged: ripple_us > config.ripple_threshold_us,
                });
            }

            bin_start += config.bin_width_hz;
        }
    }

    let anomaly_count = bins.iter().filter(|b| b.flagged).count();
    LteFindings {
        bins,
        anomaly_count,
        threshold_us: config.ripple_threshold_us,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn delay_series(spacing_hz: f64, delay_us: Vec<f64>) -> GroupDelaySeries {
        let frequency_hz = (0..delay_us.len())
            .map(|i| 6e8 + i as f64 * spacing_hz)
            .collect();
        GroupDelaySeries {
            frequency_hz,
            delay_us,
        }
    }

    #[test]
    fn test_flat_delay_flags_nothing() {
        let config = LteDetectorConfig::default();
        let findings = detect(&config, &delay_series(50_000.0, vec![0.2; 400]));
        assert_eq!(findings.anomaly_count, 0);
        assert!(findings.bins.iter().all(|b| !b.flagged));
    }

    #[test]
    fn test_localized_excursion_flags_one_bin() {
        let config = LteDetectorConfig {
            bin_width_hz: 1_000_000.0,
            ripple_threshold_us: 0.5,
        };

        // 50 kHz spacing: 20 subcarriers per 1 MHz bin. Spike the third bin.
        let mut delay = vec![0.0; 100];
        for d in delay.iter_mut().skip(45).take(5) {
            *d = 2.0;
        }
        let findings = detect(&config, &delay_series(50_000.0, delay));

        assert_eq!(findings.anomaly_count, 1);
        let flagged: Vec<&LteBin> = findings.bins.iter().filter(|b| b.flagged).collect();
        assert!((flagged[0].ripple_us - 2.0).abs() < 1e-12);
        assert!(flagged[0].start_hz >= 6e8 + 2_000_000.0 - 1.0);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let config = LteDetectorConfig {
            bin_width_hz: 1_000_000.0,
            ripple_threshold_us: 1.0,
        };
        // Ripple exactly at the threshold is not an anomaly.
        let mut delay = vec![0.0; 40];
        delay[10] = 1.0;
        let findings = detect(&config, &delay_series(50_000.0, delay));
        assert_eq!(findings.anomaly_count, 0);
    }

    #[test]
    fn test_empty_series() {
        let config = LteDetectorConfig::default();
        let findings = detect(&config, &delay_series(50_000.0, vec![]));
        assert!(findings.bins.is_empty());
        assert_eq!(findings.anomaly_count, 0);
    }
}
