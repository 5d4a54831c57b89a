//! Kernel PCA with a Gaussian (RBF) kernel.

use std::cmp::Ordering;

use nalgebra::{DMatrix, SymmetricEigen};

use super::FitError;
use crate::helpers::NUMERICAL_EPS;

/// `K[a, b] = exp(-gamma * ||x_a - x_b||^2)` over the rows of `x`.
fn rbf_kernel(x: &DMatrix<f64>, gamma: f64) -> DMatrix<f64> {
    let n = x.nrows();
    DMatrix::from_fn(n, n, |a, b| {
        let d2 = (x.row(a) - x.row(b)).norm_squared();
        (-gamma * d2).exp()
    })
}

/// Double-center a kernel matrix in feature space.
fn center_kernel(k: &DMatrix<f64>) -> DMatrix<f64> {
    let n = k.nrows();
    let nf = n as f64;
    let row_means: Vec<f64> = (0..n).map(|a| k.row(a).sum() / nf).collect();
    let col_means: Vec<f64> = (0..n).map(|b| k.column(b).sum() / nf).collect();
    let grand = k.sum() / (nf * nf);
    DMatrix::from_fn(n, n, |a, b| k[(a, b)] - row_means[a] - col_means[b] + grand)
}

/// Projections of the window's rows onto the leading kernel components.
///
/// Components with a non-positive eigenvalue carry no variance and score zero.
pub fn fit_transform(
    x: &DMatrix<f64>,
    n_components: usize,
    gamma: Option<f64>,
) -> Result<DMatrix<f64>, FitError> {
    let (n, p) = x.shape();
    let gamma = gamma.unwrap_or(1.0 / p as f64);
    if !gamma.is_finite() || gamma <= 0.0 {
        return Err(FitError::InvalidInput(format!(
            "gamma must be positive, got {}",
            gamma
        )));
    }
    let k = n_components.min(n);

    let eig = SymmetricEigen::new(center_kernel(&rbf_kernel(x, gamma)));
    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| {
        eig.eigenvalues[b]
            .partial_cmp(&eig.eigenvalues[a])
            .unwrap_or(Ordering::Equal)
    });

    let mut scores = DMatrix::zeros(n, k);
    for (c, &idx) in order.iter().take(k).enumerate() {
        let lambda = eig.eigenvalues[idx];
        if lambda <= NUMERICAL_EPS {
            continue;
        }
        let v = eig.eigenvectors.column(idx);
        let mut pivot = 0.0f64;
        for &e in v.iter() {
            if e.abs() > pivot.abs() {
                pivot = e;
            }
        }
        let sign = if pivot < 0.0 { -1.0 } else { 1.0 };
        for i in 0..n {
            scores[(i, c)] = sign * v[i] * lambda.sqrt();
        }
    }
    Ok(scores)
}
