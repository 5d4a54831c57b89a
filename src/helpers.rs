//! Small numerical helpers shared by the metric and decomposition modules.

/// Small epsilon for numerical comparisons (e.g., avoiding division by zero).
pub const NUMERICAL_EPS: f64 = 1e-10;

/// Default convergence tolerance for iterative decompositions.
pub const DEFAULT_CONVERGENCE_TOL: f64 = 1e-4;

/// Default iteration cap for iterative decompositions.
pub const DEFAULT_MAX_ITER: usize = 1000;

/// Arithmetic mean. Returns `NaN` for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n - 1 denominator).
///
/// Returns `None` for fewer than two values.
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let mu = mean(values);
    let ss: f64 = values.iter().map(|&v| (v - mu) * (v - mu)).sum();
    Some((ss / (n - 1) as f64).sqrt())
}

/// Minimum and maximum of the finite values, or `None` if there are none.
pub fn finite_min_max(values: &[f64]) -> Option<(f64, f64)> {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean() {
        assert!((mean(&[1.0, 2.0, 3.0, 6.0]) - 3.0).abs() < NUMERICAL_EPS);
        assert!(mean(&[]).is_nan());
    }

    #[test]
    fn test_sample_std_dev() {
        // var = ((-1.5)^2 + (-0.5)^2 + 0.5^2 + 1.5^2) / 3 = 5/3
        let sd = sample_std_dev(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert!((sd - (5.0f64 / 3.0).sqrt()).abs() < NUMERICAL_EPS);
        assert!(sample_std_dev(&[1.0]).is_none());
    }

    #[test]
    fn test_finite_min_max_skips_nan() {
        assert_eq!(finite_min_max(&[f64::NAN, 3.0, -1.0, 2.0]), Some((-1.0, 3.0)));
        assert_eq!(finite_min_max(&[f64::NAN]), None);
    }
}
