//! Maximum-likelihood factor analysis of a window.
//!
//! The EM iteration works on the SVD of the noise-scaled data: each step
//! rescales the centered window by the current per-series noise variances
//! `psi`, takes the leading singular triplets to update the loadings, and
//! re-estimates `psi` from the unexplained variance. Iteration stops once the
//! log-likelihood gains less than `tol`.

use std::f64::consts::PI;

use nalgebra::DMatrix;

use super::{center_columns, leading_svd, normalize_signs, FitError};

/// Floor for noise variances and singular values inside logarithms.
const SMALL: f64 = 1e-12;

/// Posterior mean of the latent factors for every time step.
pub fn fit_transform(
    x: &DMatrix<f64>,
    n_components: usize,
    max_iter: usize,
    tol: f64,
) -> Result<DMatrix<f64>, FitError> {
    let (n, p) = x.shape();
    let k = n_components.min(n).min(p);
    let centered = center_columns(x);
    if centered.norm() <= SMALL {
        return Ok(DMatrix::zeros(n, k));
    }

    let nf = n as f64;
    let variance: Vec<f64> = (0..p)
        .map(|j| centered.column(j).norm_squared() / nf)
        .collect();
    let ll_const = p as f64 * (2.0 * PI).ln() + k as f64;
    let n_sqrt = nf.sqrt();

    let mut psi = vec![1.0f64; p];
    let mut loadings = DMatrix::zeros(k, p);
    let mut old_ll = f64::NEG_INFINITY;
    let mut converged = false;

    for _ in 0..max_iter {
        let sqrt_psi: Vec<f64> = psi.iter().map(|v| v.sqrt() + SMALL).collect();
        let scaled = DMatrix::from_fn(n, p, |i, j| centered[(i, j)] / (sqrt_psi[j] * n_sqrt));
        let svd = leading_svd(&scaled, k)?;
        let s2: Vec<f64> = svd.values.iter().map(|s| s * s).collect();
        let unexplained = scaled.norm_squared() - s2.iter().sum::<f64>();

        loadings = DMatrix::from_fn(k, p, |c, j| {
            (s2[c] - 1.0).max(0.0).sqrt() * svd.v_t[(c, j)] * sqrt_psi[j]
        });

        let ll = -nf / 2.0
            * (ll_const
                + s2.iter().map(|s| s.max(SMALL).ln()).sum::<f64>()
                + unexplained
                + psi.iter().map(|v| v.ln()).sum::<f64>());
        if ll - old_ll < tol {
            converged = true;
            break;
        }
        old_ll = ll;

        for j in 0..p {
            let explained: f64 = (0..k).map(|c| loadings[(c, j)] * loadings[(c, j)]).sum();
            psi[j] = (variance[j] - explained).max(SMALL);
        }
    }
    if !converged {
        return Err(FitError::NotConverged(max_iter));
    }

    // z = X Wpsi^T (I + Wpsi W^T)^-1 with Wpsi = W / psi
    let w_psi = DMatrix::from_fn(k, p, |c, j| loadings[(c, j)] / psi[j]);
    let precision = DMatrix::identity(k, k) + &w_psi * loadings.transpose();
    let cov_z = precision.try_inverse().ok_or_else(|| {
        FitError::InvalidInput("latent covariance is singular".to_string())
    })?;
    let mut scores = &centered * w_psi.transpose() * cov_z;
    normalize_signs(&mut scores, &mut loadings);
    Ok(scores)
}
