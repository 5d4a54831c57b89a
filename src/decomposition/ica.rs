//! FastICA on a window.
//!
//! The window is centered and whitened through its leading singular vectors,
//! then a square unmixing matrix is found with the symmetric fixed-point
//! update and the log-cosh contrast (`g = tanh`). The unmixing matrix is
//! started from a seeded Gaussian draw, so a fixed seed gives identical
//! sources.
//!
//! On short windows the plain fixed-point map can settle into a cycle. When
//! the change between iterates grows, the step towards the next fixed-point
//! iterate is halved.

use nalgebra::{DMatrix, SymmetricEigen};
use rand::prelude::*;
use rand_distr::StandardNormal;

use super::{center_columns, leading_svd, normalize_signs, FitError};
use crate::helpers::NUMERICAL_EPS;

/// `(W W^T)^{-1/2} W`
fn symmetric_decorrelation(w: &DMatrix<f64>) -> Result<DMatrix<f64>, FitError> {
    let gram = w * w.transpose();
    let eig = SymmetricEigen::new(gram);
    if eig.eigenvalues.iter().any(|&d| d <= NUMERICAL_EPS) {
        return Err(FitError::InvalidInput(
            "unmixing matrix became singular".to_string(),
        ));
    }
    let inv_sqrt = DMatrix::from_diagonal(&eig.eigenvalues.map(|d| 1.0 / d.sqrt()));
    let e = &eig.eigenvectors;
    Ok(e * inv_sqrt * e.transpose() * w)
}

/// Rows of `next` reordered and sign-flipped to best match the rows of `current`.
fn align_rows(next: &DMatrix<f64>, current: &DMatrix<f64>) -> DMatrix<f64> {
    let k = current.nrows();
    let overlap = next * current.transpose();
    let mut used = vec![false; k];
    let mut aligned = DMatrix::<f64>::zeros(k, next.ncols());
    for c in 0..k {
        let best = (0..k)
            .filter(|&r| !used[r])
            .max_by(|&a, &b| overlap[(a, c)].abs().total_cmp(&overlap[(b, c)].abs()));
        if let Some(r) = best {
            used[r] = true;
            let sign = if overlap[(r, c)] < 0.0 { -1.0f64 } else { 1.0 };
            aligned.set_row(c, &(next.row(r) * sign));
        }
    }
    aligned
}

/// Independent sources of the window, one column per component.
pub fn fit_transform(
    x: &DMatrix<f64>,
    n_components: usize,
    max_iter: usize,
    tol: f64,
    seed: u64,
) -> Result<DMatrix<f64>, FitError> {
    let n = x.nrows();
    let centered = center_columns(x);
    let svd = leading_svd(&centered, n_components.min(n).min(x.ncols()))?;

    let top = svd.values.first().copied().unwrap_or(0.0);
    if top <= NUMERICAL_EPS {
        return Err(FitError::InvalidInput(
            "window has no variance to separate".to_string(),
        ));
    }
    // Directions without variance cannot be whitened.
    let k = svd
        .values
        .iter()
        .take_while(|&&s| s > top * 1e-8)
        .count();

    // Whitened data with unit-variance columns: X1 = U_k * sqrt(n).
    let scale = (n as f64).sqrt();
    let x1 = svd.u.columns(0, k) * scale;
    // Whitening matrix K (p x k) mapping centered data onto X1.
    let whitening =
        DMatrix::from_fn(x.ncols(), k, |j, c| svd.v_t[(c, j)] / svd.values[c] * scale);

    let mut rng = StdRng::seed_from_u64(seed);
    let w_init = DMatrix::from_fn(k, k, |_, _| rng.sample::<f64, _>(StandardNormal));
    let mut w = symmetric_decorrelation(&w_init)?;

    let mut step = 1.0f64;
    let mut previous_lim = f64::INFINITY;
    let mut converged = false;
    for _ in 0..max_iter {
        // n x k projections
        let wx = &x1 * w.transpose();
        let g = wx.map(f64::tanh);
        let g_prime_mean: Vec<f64> = (0..k)
            .map(|c| g.column(c).iter().map(|t| 1.0 - t * t).sum::<f64>() / n as f64)
            .collect();

        let mut w_next = g.transpose() * &x1 / n as f64;
        for c in 0..k {
            for j in 0..k {
                w_next[(c, j)] -= g_prime_mean[c] * w[(c, j)];
            }
        }
        let mut w_next = symmetric_decorrelation(&w_next)?;
        if step < 1.0 {
            let target = align_rows(&w_next, &w);
            w_next = symmetric_decorrelation(&(&w * (1.0 - step) + target * step))?;
        }

        let agreement = &w_next * w.transpose();
        let lim = (0..k)
            .map(|c| (agreement[(c, c)].abs() - 1.0).abs())
            .fold(0.0, f64::max);
        w = w_next;
        if lim < tol {
            converged = true;
            break;
        }
        if lim > previous_lim {
            step *= 0.5;
        }
        previous_lim = lim;
    }
    if !converged {
        return Err(FitError::NotConverged(max_iter));
    }

    let mut sources = &x1 * w.transpose();
    // Unmixing in series space, k x p.
    let mut unmixing = &w * whitening.transpose();
    normalize_signs(&mut sources, &mut unmixing);
    Ok(sources)
}
