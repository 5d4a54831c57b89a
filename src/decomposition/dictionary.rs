//! Sparse dictionary learning on a window.
//!
//! Minimizes `0.5 * ||X - C D||_F^2 + alpha * ||C||_1` over codes `C` (n x k)
//! and unit-norm atoms `D` (k x p), alternating ISTA code updates with
//! block-coordinate atom updates. Codes and atoms start from the window's
//! leading SVD; an atom that loses all support is redrawn from the seeded
//! generator. The returned scores are the sparse codes.

use nalgebra::{DMatrix, RowDVector, SymmetricEigen};
use rand::prelude::*;
use rand_distr::StandardNormal;

use super::{leading_svd, normalize_signs, FitError};
use crate::helpers::NUMERICAL_EPS;

/// ISTA steps per outer iteration.
const CODE_STEPS: usize = 50;

#[inline]
fn soft_threshold(v: f64, t: f64) -> f64 {
    if v > t {
        v - t
    } else if v < -t {
        v + t
    } else {
        0.0
    }
}

fn objective(x: &DMatrix<f64>, code: &DMatrix<f64>, dict: &DMatrix<f64>, alpha: f64) -> f64 {
    let residual = x - code * dict;
    0.5 * residual.norm_squared() + alpha * code.iter().map(|c| c.abs()).sum::<f64>()
}

/// Proximal-gradient update of the codes for a fixed dictionary.
fn update_code(x: &DMatrix<f64>, code: &mut DMatrix<f64>, dict: &DMatrix<f64>, alpha: f64) {
    let gram = dict * dict.transpose();
    let lipschitz = SymmetricEigen::new(gram.clone())
        .eigenvalues
        .iter()
        .fold(0.0f64, |acc, &v| acc.max(v));
    if lipschitz <= NUMERICAL_EPS {
        code.fill(0.0);
        return;
    }
    let step = 1.0 / lipschitz;
    let cov = x * dict.transpose();
    for _ in 0..CODE_STEPS {
        let gradient = &*code * &gram - &cov;
        let next = (&*code - gradient * step).map(|v| soft_threshold(v, step * alpha));
        let change = (&next - &*code).norm();
        *code = next;
        if change <= NUMERICAL_EPS {
            break;
        }
    }
}

/// One pass of block-coordinate descent over the atoms.
fn update_dict(x: &DMatrix<f64>, code: &DMatrix<f64>, dict: &mut DMatrix<f64>, rng: &mut StdRng) {
    let (k, p) = dict.shape();
    let mut residual = x - code * &*dict;
    for a in 0..k {
        let c = code.column(a);
        residual += &c * dict.row(a);
        let mut atom = c.transpose() * &residual;
        let mut norm = atom.norm();
        if norm <= NUMERICAL_EPS {
            atom = RowDVector::from_iterator(
                p,
                (0..p).map(|_| rng.sample::<f64, _>(StandardNormal)),
            );
            norm = atom.norm();
        }
        dict.set_row(a, &(atom / norm.max(NUMERICAL_EPS)));
        residual -= &c * dict.row(a);
    }
}

pub fn fit_transform(
    x: &DMatrix<f64>,
    n_components: usize,
    alpha: f64,
    max_iter: usize,
    tol: f64,
    seed: u64,
) -> Result<DMatrix<f64>, FitError> {
    if !alpha.is_finite() || alpha < 0.0 {
        return Err(FitError::InvalidInput(format!(
            "alpha must be non-negative, got {}",
            alpha
        )));
    }
    let (n, p) = x.shape();
    let k = n_components.min(n).min(p);
    let svd = leading_svd(x, k)?;
    let mut code = svd.u.clone();
    for (c, &s) in svd.values.iter().enumerate() {
        code.column_mut(c).scale_mut(s);
    }
    let mut dict = svd.v_t;
    let mut rng = StdRng::seed_from_u64(seed);

    let mut previous = objective(x, &code, &dict, alpha);
    let mut converged = false;
    for _ in 0..max_iter {
        update_code(x, &mut code, &dict, alpha);
        update_dict(x, &code, &mut dict, &mut rng);
        let current = objective(x, &code, &dict, alpha);
        if (previous - current).abs() <= tol * current.max(NUMERICAL_EPS) {
            converged = true;
            break;
        }
        previous = current;
    }
    if !converged {
        return Err(FitError::NotConverged(max_iter));
    }

    // Codes for the final dictionary.
    update_code(x, &mut code, &dict, alpha);
    normalize_signs(&mut code, &mut dict);
    Ok(code)
}
