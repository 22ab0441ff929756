//! Echo detection via inverse FFT of the channel estimate.
//!
//! The frequency-domain channel response and the time-domain impulse
//! response are a Fourier pair: a micro-reflection at delay τ appears as
//! a secondary peak at index τ·sample_rate in |h(t)|. The coefficients
//! are averaged across the group's captures, placed on a uniform grid
//! (zero-padding any gaps), and transformed with an inverse FFT.

use std::sync::Arc;

use num_complex::Complex;
use pnm_core::FrequencyAxis;
use rustfft::{Fft, FftPlanner};
use serde::{Deserialize, Serialize};

use crate::group_delay::mean_coefficients;

/// Time-domain impulse-response magnitude.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EchoResponse {
    /// |h(t)| per time-domain sample.
    pub magnitude: Vec<f64>,

    /// Implied sample rate: subcarrier spacing × N (Hz).
    pub sample_rate_hz: f64,

    /// Time per sample (µs).
    pub time_step_us: f64,

    /// Index of the dominant peak.
    pub peak_index: usize,
}

impl EchoResponse {
    /// One-way distance to the reflector behind tap `tap`, in meters.
    ///
    /// `velocity_ratio` is the cable's propagation velocity relative to c
    /// (0.87 is typical for hardline coax). The echo path is a round trip,
    /// hence the halving.
    pub fn tap_distance_m(&self, tap: usize, velocity_ratio: f64) -> f64 {
        const C_M_PER_S: f64 = 299_792_458.0;
        let delay_s = tap as f64 * self.time_step_us * 1e-6;
        delay_s * C_M_PER_S * velocity_ratio / 2.0
    }
}

/// Echo processor with a pre-planned inverse FFT per series length.
pub struct EchoProcessor {
    planner: FftPlanner<f64>,
}

impl EchoProcessor {
    pub fn new() -> Self {
        Self {
            planner: FftPlanner::new(),
        }
    }

    /// Reduce an aligned coefficient stack to an impulse-response magnitude.
    pub fn compute(&mut self, axis: &FrequencyAxis, stack: &[Vec<Complex<f64>>]) -> EchoResponse {
        let n = axis.len;
        if n == 0 || axis.spacing_hz <= 0.0 {
            return EchoResponse {
                magnitude: Vec::new(),
                sample_rate_hz: 0.0,
                time_step_us: 0.0,
                peak_index: 0,
            };
        }

        // Mean over the group's captures; the aligned grid is uniform, so
        // padding only fills any truncation at the band edge.
        let mut buffer = mean_coefficients(stack, n);

        let ifft: Arc<dyn Fft<f64>> = self.planner.plan_fft_inverse(n);
        ifft.process(&mut buffer);

        let scale = 1.0 / n as f64;
        let magnitude: Vec<f64> = buffer.iter().map(|c| c.norm() * scale).collect();

        let peak_index = magnitude
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(i, _)| i)
            .unwrap_or(0);

        let sample_rate_hz = axis.spacing_hz * n as f64;
        EchoResponse {
            magnitude,
            sample_rate_hz,
            time_step_us: 1e6 / sample_rate_hz,
            peak_index,
        }
    }
}

impl Default for EchoProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn axis(n: usize) -> FrequencyAxis {
        FrequencyAxis {
            start_hz: 6e8,
            spacing_hz: 50_000.0,
            len: n,
        }
    }

    #[test]
    fn test_flat_zero_phase_peaks_at_zero() {
        let n = 64;
        let coeffs = vec![Complex::new(1.0, 0.0); n];
        let response = EchoProcessor::new().compute(&axis(n), &[coeffs]);

        assert_eq!(response.peak_index, 0, "flat spectrum is an impulse at t=0");
        assert!((response.magnitude[0] - 1.0).abs() < 1e-9);
        assert!(response.magnitude[1..].iter().all(|&m| m < 1e-9));
        assert_eq!(response.sample_rate_hz, 50_000.0 * 64.0);
    }

    #[test]
    fn test_linear_phase_shifts_the_peak() {
        // e^{-j 2π k m / N} transforms to an impulse at index m.
        let n = 64;
        let m = 5;
        let coeffs: Vec<Complex<f64>> = (0..n)
            .map(|k| Complex::from_polar(1.0, -2.0 * PI * k as f64 * m as f64 / n as f64))
            .collect();

        let response = EchoProcessor::new().compute(&axis(n), &[coeffs]);
        assert_eq!(response.peak_index, m);
    }

    #[test]
    fn test_two_path_channel_shows_secondary_tap() {
        // Direct path plus a -12 dB echo at tap 8.
        let n = 128;
        let echo_tap = 8;
        let echo_amp = 0.25;
        let coeffs: Vec<Complex<f64>> = (0..n)
            .map(|k| {
                let direct = Complex::new(1.0, 0.0);
                let reflected = Complex::from_polar(
                    echo_amp,
                    -2.0 * PI * k as f64 * echo_tap as f64 / n as f64,
                );
                direct + reflected
            })
            .collect();

        let response = EchoProcessor::new().compute(&axis(n), &[coeffs]);
        assert_eq!(response.peak_index, 0);
        assert!((response.magnitude[echo_tap] - echo_amp).abs() < 1e-9);

        // 8 taps at 1/(50 kHz * 128) per tap, one way at 0.87c.
        let delay_s = 8.0 / (50_000.0 * 128.0);
        let expected_m = delay_s * 299_792_458.0 * 0.87 / 2.0;
        assert!((response.tap_distance_m(echo_tap, 0.87) - expected_m).abs() < 1e-6);
    }

    #[test]
    fn test_empty_input() {
        let response = EchoProcessor::new().compute(&FrequencyAxis::empty(), &[]);
        assert!(response.magnitude.is_empty());
        assert_eq!(response.sample_rate_hz, 0.0);
    }
}
