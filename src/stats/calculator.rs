//! Statistics Calculator Module
//! Descriptive statistics and curve fitting for the chart views.

use statrs::distribution::{Continuous, Normal};

/// Handles the numeric computations behind the derived views.
pub struct StatsCalculator;

impl StatsCalculator {
    /// Arithmetic mean. NaN for an empty slice.
    pub fn mean(values: &[f64]) -> f64 {
        if values.is_empty() {
            return f64::NAN;
        }
        values.iter().sum::<f64>() / values.len() as f64
    }

    /// Population median: middle element, or the average of the two
    /// middle elements for even counts. NaN for an empty slice.
    pub fn median(values: &[f64]) -> f64 {
        let n = values.len();
        if n == 0 {
            return f64::NAN;
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        if n % 2 == 0 {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        } else {
            sorted[n / 2]
        }
    }

    /// Ordinary least-squares fit of `y = slope * x + intercept`.
    ///
    /// None when fewer than two points are given or all x values
    /// coincide (the slope is undefined).
    pub fn linear_fit(pairs: &[(f64, f64)]) -> Option<(f64, f64)> {
        let n = pairs.len() as f64;
        if pairs.len() < 2 {
            return None;
        }

        let mean_x = pairs.iter().map(|(x, _)| x).sum::<f64>() / n;
        let mean_y = pairs.iter().map(|(_, y)| y).sum::<f64>() / n;

        let sxx = pairs.iter().map(|(x, _)| (x - mean_x).powi(2)).sum::<f64>();
        if sxx == 0.0 {
            return None;
        }
        let sxy = pairs
            .iter()
            .map(|(x, y)| (x - mean_x) * (y - mean_y))
            .sum::<f64>();

        let slope = sxy / sxx;
        let intercept = mean_y - slope * mean_x;
        Some((slope, intercept))
    }

    /// Gaussian kernel density estimate sampled on a uniform grid over
    /// the value range, with Scott's-rule bandwidth.
    ///
    /// Empty when there are fewer than two distinct values; a density
    /// curve over a constant sample carries no information.
    pub fn kde_curve(values: &[f64], grid_points: usize) -> Vec<(f64, f64)> {
        let n = values.len();
        if n < 2 || grid_points < 2 {
            return Vec::new();
        }

        let mean = Self::mean(values);
        let variance = values.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        let std = variance.sqrt();
        if std == 0.0 {
            return Vec::new();
        }

        // Scott's rule
        let bandwidth = std * (n as f64).powf(-0.2);

        let Ok(kernel) = Normal::new(0.0, 1.0) else {
            return Vec::new();
        };

        let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let step = (max - min) / (grid_points - 1) as f64;

        (0..grid_points)
            .map(|i| {
                let x = min + step * i as f64;
                let density = values
                    .iter()
                    .map(|&xi| kernel.pdf((x - xi) / bandwidth))
                    .sum::<f64>()
                    / (n as f64 * bandwidth);
                (x, density)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_odd_and_even_counts() {
        assert_eq!(StatsCalculator::median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(StatsCalculator::median(&[100.0, 300.0]), 200.0);
        assert!(StatsCalculator::median(&[]).is_nan());
    }

    #[test]
    fn mean_is_arithmetic_average() {
        assert!((StatsCalculator::mean(&[1.0, 2.0, 6.0]) - 3.0).abs() < 1e-6);
        assert!(StatsCalculator::mean(&[]).is_nan());
    }

    #[test]
    fn linear_fit_recovers_exact_line() {
        let pairs: Vec<(f64, f64)> = (0..10).map(|i| (i as f64, 2.0 * i as f64 + 5.0)).collect();
        let (slope, intercept) = StatsCalculator::linear_fit(&pairs).unwrap();
        assert!((slope - 2.0).abs() < 1e-9);
        assert!((intercept - 5.0).abs() < 1e-9);
    }

    #[test]
    fn linear_fit_rejects_degenerate_input() {
        assert!(StatsCalculator::linear_fit(&[(1.0, 2.0)]).is_none());
        assert!(StatsCalculator::linear_fit(&[(1.0, 2.0), (1.0, 3.0)]).is_none());
    }

    #[test]
    fn kde_curve_is_nonnegative_and_spans_the_range() {
        let values = [1.0, 2.0, 2.5, 3.0, 10.0];
        let curve = StatsCalculator::kde_curve(&values, 64);
        assert_eq!(curve.len(), 64);
        assert_eq!(curve[0].0, 1.0);
        assert_eq!(curve[63].0, 10.0);
        assert!(curve.iter().all(|&(_, d)| d >= 0.0));
    }

    #[test]
    fn kde_curve_empty_for_constant_sample() {
        assert!(StatsCalculator::kde_curve(&[5.0, 5.0, 5.0], 32).is_empty());
    }
}
