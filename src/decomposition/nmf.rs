//! Non-negative matrix factorization `X ≈ W H` of a window.
//!
//! Multiplicative updates (Frobenius loss) from a seeded random start. Every
//! `CHECK_EVERY` iterations the fit stops once the loss has dropped by less
//! than `tol * ||X||` since the last check, or the loss itself is below
//! `tol * ||X||`. The returned scores are `W` (one row per time step), with
//! components ordered by their share of the reconstruction,
//! `||W_k|| * ||H_k||`, largest first.

use std::cmp::Ordering;

use nalgebra::DMatrix;
use rand::prelude::*;
use rand_distr::StandardNormal;

use super::FitError;
use crate::helpers::NUMERICAL_EPS;

/// Convergence is checked every this many iterations.
const CHECK_EVERY: usize = 10;

pub fn fit_transform(
    x: &DMatrix<f64>,
    n_components: usize,
    max_iter: usize,
    tol: f64,
    seed: u64,
) -> Result<DMatrix<f64>, FitError> {
    let (n, m) = x.shape();
    if x.iter().any(|&v| v < 0.0) {
        return Err(FitError::InvalidInput(
            "negative values in window; scale into a non-negative range first".to_string(),
        ));
    }
    let k = n_components.min(n).min(m);
    let mean = x.mean();
    if mean <= NUMERICAL_EPS {
        return Ok(DMatrix::zeros(n, k));
    }

    let avg = (mean / k as f64).sqrt();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut h = DMatrix::from_fn(k, m, |_, _| avg * rng.sample::<f64, _>(StandardNormal).abs());
    let mut w = DMatrix::from_fn(n, k, |_, _| avg * rng.sample::<f64, _>(StandardNormal).abs());

    let x_norm = x.norm();
    let mut previous_error = (x - &w * &h).norm();
    let mut converged = previous_error <= NUMERICAL_EPS;

    let mut iter = 0;
    while !converged && iter < max_iter {
        let numerator = w.transpose() * x;
        let denominator = w.transpose() * &w * &h;
        h.zip_apply(&(numerator.zip_map(&denominator, |a, b| a / (b + NUMERICAL_EPS))), |v, r| {
            *v *= r
        });

        let numerator = x * h.transpose();
        let denominator = &w * &h * h.transpose();
        w.zip_apply(&(numerator.zip_map(&denominator, |a, b| a / (b + NUMERICAL_EPS))), |v, r| {
            *v *= r
        });

        iter += 1;
        if iter % CHECK_EVERY == 0 {
            let error = (x - &w * &h).norm();
            if (previous_error - error) / x_norm < tol || error / x_norm < tol {
                converged = true;
            }
            previous_error = error;
        }
    }
    if !converged {
        return Err(FitError::NotConverged(max_iter));
    }

    let mut order: Vec<usize> = (0..k).collect();
    let energy: Vec<f64> = (0..k)
        .map(|c| w.column(c).norm() * h.row(c).norm())
        .collect();
    order.sort_by(|&a, &b| energy[b].partial_cmp(&energy[a]).unwrap_or(Ordering::Equal));
    Ok(DMatrix::from_fn(n, k, |i, c| w[(i, order[c])]))
}
