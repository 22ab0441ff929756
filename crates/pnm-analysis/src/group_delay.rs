//! Group delay from averaged channel-estimate coefficients.
//!
//! Group delay is the derivative of phase with respect to frequency.
//! A clean channel has flat delay across the band; echoes and ingress
//! bend or ripple it. The coefficient series is averaged across the
//! group's captures first, so uncorrelated noise cancels before the
//! phase is differentiated.

use num_complex::Complex;
use pnm_core::FrequencyAxis;
use serde::{Deserialize, Serialize};

/// Group delay per subcarrier, in microseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupDelaySeries {
    pub frequency_hz: Vec<f64>,
    pub delay_us: Vec<f64>,
}

/// Average M aligned coefficient series into one per-subcarrier mean.
pub fn mean_coefficients(stack: &[Vec<Complex<f64>>], n: usize) -> Vec<Complex<f64>> {
    let m = stack.len() as f64;
    let mut sum = vec![Complex::new(0.0, 0.0); n];
    for series in stack {
        for (i, c) in series.iter().take(n).enumerate() {
            sum[i] += c;
        }
    }
    sum.into_iter().map(|c| c / m).collect()
}

/// Unwrap phase to remove 2π discontinuities across subcarriers.
pub fn unwrap_phase(phase: &mut [f64]) {
    if phase.len() < 2 {
        return;
    }

    let mut cumulative_offset = 0.0;
    let threshold = std::f64::consts::PI;
    let mut prev_raw = phase[0];

    for i in 1..phase.len() {
        let raw = phase[i];
        let diff = raw - prev_raw;
        if diff > threshold {
            cumulative_offset -= 2.0 * std::f64::consts::PI;
        } else if diff < -threshold {
            cumulative_offset += 2.0 * std::f64::consts::PI;
        }
        prev_raw = raw;
        phase[i] = raw + cumulative_offset;
    }
}

/// Compute the group-delay series over an aligned coefficient stack.
///
/// `delay_us[i] = -dφ/df / (2π) × 1e6`, with a centered difference at
/// interior subcarriers and one-sided differences at the band edges.
pub fn group_delay(axis: &FrequencyAxis, stack: &[Vec<Complex<f64>>]) -> GroupDelaySeries {
    let n = axis.len;
    let spacing = axis.spacing_hz;

    if n < 2 || spacing <= 0.0 {
        return GroupDelaySeries {
            frequency_hz: axis.values(),
            delay_us: vec![0.0; n],
        };
    }

    let mean = mean_coefficients(stack, n);
    let mut phase: Vec<f64> = mean.iter().map(|c| c.arg()).collect();
    unwrap_phase(&mut phase);

    let two_pi = 2.0 * std::f64::consts::PI;
    let mut delay_us = Vec::with_capacity(n);
    for i in 0..n {
        let dphi_df = if i == 0 {
            (phase[1] - phase[0]) / spacing
        } else if i == n - 1 {
            (phase[n - 1] - phase[n - 2]) / spacing
        } else {
            (phase[i + 1] - phase[i - 1]) / (2.0 * spacing)
        };
        delay_us.push(-dphi_df / two_pi * 1e6);
    }

    GroupDelaySeries {
        frequency_hz: axis.values(),
        delay_us,
    }
}
