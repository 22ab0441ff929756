//! Per-subcarrier magnitude statistics across a capture group.

use pnm_core::FrequencyAxis;
use serde::{Deserialize, Serialize};

/// Elementwise minimum, mean, and maximum magnitude per subcarrier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinAvgMaxSeries {
    pub frequency_hz: Vec<f64>,
    pub min: Vec<f64>,
    pub avg: Vec<f64>,
    pub max: Vec<f64>,
}

/// Reduce M aligned magnitude series to min/avg/max per subcarrier.
pub fn min_avg_max(axis: &FrequencyAxis, stack: &[Vec<f64>]) -> MinAvgMaxSeries {
    let n = axis.len;
    let m = stack.len() as f64;

    let mut min = vec![f64::INFINITY; n];
    let mut sum = vec![0.0; n];
    let mut max = vec![f64::NEG_INFINITY; n];

    for series in stack {
        for (i, &value) in series.iter().take(n).enumerate() {
            if value < min[i] {
                min[i] = value;
            }
            if value > max[i] {
                max[i] = value;
            }
            sum[i] += value;
        }
    }

    let avg = sum.into_iter().map(|s| s / m).collect();

    MinAvgMaxSeries {
        frequency_hz: axis.values(),
        min,
        avg,
        max,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axis(n: usize) -> FrequencyAxis {
        FrequencyAxis {
            start_hz: 1e8,
            spacing_hz: 5e4,
            len: n,
        }
    }

    #[test]
    fn test_elementwise_reduction() {
        let stack = vec![vec![1.0, 5.0, 3.0], vec![2.0, 4.0, 9.0], vec![3.0, 3.0, 0.0]];
        let result = min_avg_max(&axis(3), &stack);

        assert_eq!(result.min, vec![1.0, 3.0, 0.0]);
        assert_eq!(result.max, vec![3.0, 5.0, 9.0]);
        assert_eq!(result.avg, vec![2.0, 4.0, 4.0]);
        assert_eq!(result.frequency_hz.len(), 3);
    }

    #[test]
    fn test_single_series_collapses_to_itself() {
        let stack = vec![vec![7.5, -2.0]];
        let result = min_avg_max(&axis(2), &stack);
        assert_eq!(result.min, result.max);
        assert_eq!(result.min, result.avg);
        assert_eq!(result.min, vec![7.5, -2.0]);
    }

    #[test]
    fn test_deterministic_over_repeat_runs() {
        let stack = vec![vec![1.125, 2.25, 3.5], vec![0.0625, 9.75, 3.5]];
        let first = min_avg_max(&axis(3), &stack);
        let second = min_avg_max(&axis(3), &stack);
        assert_eq!(first, second, "reduction must be bit-identical");
    }
}
