//! Principal component analysis of a window.

use nalgebra::DMatrix;

use super::{center_columns, leading_svd, normalize_signs, FitError};

/// Scores `U * S` of the centered window, components ordered by explained
/// variance.
pub fn fit_transform(x: &DMatrix<f64>, n_components: usize) -> Result<DMatrix<f64>, FitError> {
    let (n, m) = x.shape();
    let ncomp = n_components.min(n).min(m);
    let centered = center_columns(x);
    let svd = leading_svd(&centered, ncomp)?;

    let mut scores = svd.u.clone();
    for (k, &s) in svd.values.iter().enumerate() {
        scores.column_mut(k).scale_mut(s);
    }
    let mut loadings = svd.v_t;
    normalize_signs(&mut scores, &mut loadings);
    Ok(scores)
}

/// Fraction of total variance carried by each of the leading components.
pub fn explained_variance_ratio(
    x: &DMatrix<f64>,
    n_components: usize,
) -> Result<Vec<f64>, FitError> {
    if x.iter().any(|v| !v.is_finite()) {
        return Err(FitError::InvalidInput(
            "matrix contains missing or non-finite values".to_string(),
        ));
    }
    let centered = center_columns(x);
    let all = leading_svd(&centered, x.nrows().min(x.ncols()))?;
    let total: f64 = all.values.iter().map(|s| s * s).sum();
    if total <= 0.0 {
        return Ok(vec![0.0; n_components.min(all.values.len())]);
    }
    Ok(all
        .values
        .iter()
        .take(n_components)
        .map(|s| s * s / total)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decomposition::tests::sample_window;

    #[test]
    fn test_scores_are_centered() {
        let x = sample_window().to_dmatrix();
        let scores = fit_transform(&x, 2).unwrap();
        for k in 0..scores.ncols() {
            assert!(scores.column(k).sum().abs() < 1e-10);
        }
    }

    #[test]
    fn test_single_direction_recovered() {
        // every row lies on the line (t, 2t)
        let x = DMatrix::from_fn(6, 2, |i, j| (i as f64) * (j as f64 + 1.0));
        let scores = fit_transform(&x, 2).unwrap();
        // second component carries no variance
        assert!(scores.column(1).norm() < 1e-8);
        // first component is monotone in time with a positive loading convention
        let first = scores.column(0);
        assert!(first[5] > first[0]);
        let expected = (1.0f64 + 4.0).sqrt() * (5.0 - 2.5);
        assert!((first[5] - expected).abs() < 1e-8);
    }

    #[test]
    fn test_constant_window_scores_zero() {
        let x = DMatrix::from_element(5, 3, 0.4);
        let scores = fit_transform(&x, 1).unwrap();
        assert!(scores.iter().all(|v| v.abs() < 1e-12));
    }

    #[test]
    fn test_explained_variance_ratio_sums_to_one() {
        let x = sample_window().to_dmatrix();
        let ratio = explained_variance_ratio(&x, 3).unwrap();
        assert!((ratio.iter().sum::<f64>() - 1.0).abs() < 1e-10);
        assert!(ratio[0] >= ratio[1]);
    }
}
