//! Latent-component decompositions fitted on a single window.
//!
//! [`DecompositionMethod`] is a tagged enumeration: every variant is fitted
//! through the same [`DecompositionMethod::fit_transform`] call, which takes a
//! window (rows = time steps, columns = series) and returns component scores
//! with one row per time step and the leading component in column 0.
//!
//! Component signs are normalized so that the largest-magnitude loading of
//! every component is positive. Without this, neighbouring windows could
//! report the same structure with opposite signs.

pub mod dictionary;
pub mod factor;
pub mod ica;
pub mod kernel_pca;
pub mod nmf;
pub mod pca;

use std::cmp::Ordering;

use nalgebra::{DMatrix, SVD};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::helpers::{DEFAULT_CONVERGENCE_TOL, DEFAULT_MAX_ITER};
use crate::matrix::DataMatrix;

/// Why a single fit failed.
///
/// The summarizer attaches the method name and window index and reports it as
/// [`NltsaError::DecompositionFailed`](crate::NltsaError::DecompositionFailed).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    #[error("did not converge after {0} iterations")]
    NotConverged(usize),

    #[error("{0}")]
    InvalidInput(String),
}

fn default_n_components() -> usize {
    2
}
fn default_max_iter() -> usize {
    DEFAULT_MAX_ITER
}
fn default_tol() -> f64 {
    DEFAULT_CONVERGENCE_TOL
}
fn default_nmf_max_iter() -> usize {
    5000
}
fn default_fa_max_iter() -> usize {
    1000
}
fn default_fa_tol() -> f64 {
    1e-2
}
fn default_dict_alpha() -> f64 {
    0.1
}
fn default_dict_tol() -> f64 {
    1e-6
}

/// A decomposition method and its configuration.
///
/// Deserializes from a tagged object, e.g.
/// `{"method": "ica", "n_components": 2, "seed": 7}`; omitted fields take the
/// same defaults as the constructor of each variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum DecompositionMethod {
    /// Principal component analysis via SVD of the centered window.
    Pca {
        #[serde(default = "default_n_components")]
        n_components: usize,
    },
    /// FastICA (symmetric update, log-cosh contrast) on the whitened window.
    Ica {
        #[serde(default = "default_n_components")]
        n_components: usize,
        #[serde(default = "default_max_iter")]
        max_iter: usize,
        #[serde(default = "default_tol")]
        tol: f64,
        #[serde(default)]
        seed: u64,
    },
    /// Non-negative matrix factorization with multiplicative updates.
    Nmf {
        #[serde(default = "default_n_components")]
        n_components: usize,
        #[serde(default = "default_nmf_max_iter")]
        max_iter: usize,
        #[serde(default = "default_tol")]
        tol: f64,
        #[serde(default)]
        seed: u64,
    },
    /// Maximum-likelihood factor analysis (SVD-based EM).
    FactorAnalysis {
        #[serde(default = "default_n_components")]
        n_components: usize,
        #[serde(default = "default_fa_max_iter")]
        max_iter: usize,
        #[serde(default = "default_fa_tol")]
        tol: f64,
    },
    /// Kernel PCA with an RBF kernel; `gamma` defaults to `1 / n_series`.
    KernelPca {
        #[serde(default = "default_n_components")]
        n_components: usize,
        #[serde(default)]
        gamma: Option<f64>,
    },
    /// Sparse dictionary learning (ISTA codes, block-coordinate atom updates).
    DictionaryLearning {
        #[serde(default = "default_n_components")]
        n_components: usize,
        #[serde(default = "default_dict_alpha")]
        alpha: f64,
        #[serde(default = "default_max_iter")]
        max_iter: usize,
        #[serde(default = "default_dict_tol")]
        tol: f64,
        #[serde(default)]
        seed: u64,
    },
}

impl DecompositionMethod {
    pub fn pca(n_components: usize) -> Self {
        Self::Pca { n_components }
    }

    pub fn ica(n_components: usize, seed: u64) -> Self {
        Self::Ica {
            n_components,
            max_iter: default_max_iter(),
            tol: default_tol(),
            seed,
        }
    }

    pub fn nmf(n_components: usize, seed: u64) -> Self {
        Self::Nmf {
            n_components,
            max_iter: default_nmf_max_iter(),
            tol: default_tol(),
            seed,
        }
    }

    pub fn factor_analysis(n_components: usize) -> Self {
        Self::FactorAnalysis {
            n_components,
            max_iter: default_fa_max_iter(),
            tol: default_fa_tol(),
        }
    }

    pub fn kernel_pca(n_components: usize) -> Self {
        Self::KernelPca {
            n_components,
            gamma: None,
        }
    }

    pub fn dictionary_learning(n_components: usize, seed: u64) -> Self {
        Self::DictionaryLearning {
            n_components,
            alpha: default_dict_alpha(),
            max_iter: default_max_iter(),
            tol: default_dict_tol(),
            seed,
        }
    }

    /// Every supported method with shared component count and seed.
    pub fn all(n_components: usize, seed: u64) -> Vec<Self> {
        vec![
            Self::pca(n_components),
            Self::ica(n_components, seed),
            Self::nmf(n_components, seed),
            Self::factor_analysis(n_components),
            Self::kernel_pca(n_components),
            Self::dictionary_learning(n_components, seed),
        ]
    }

    /// Stable method name, identical to the serde tag.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pca { .. } => "pca",
            Self::Ica { .. } => "ica",
            Self::Nmf { .. } => "nmf",
            Self::FactorAnalysis { .. } => "factor_analysis",
            Self::KernelPca { .. } => "kernel_pca",
            Self::DictionaryLearning { .. } => "dictionary_learning",
        }
    }

    pub fn n_components(&self) -> usize {
        match self {
            Self::Pca { n_components }
            | Self::Ica { n_components, .. }
            | Self::Nmf { n_components, .. }
            | Self::FactorAnalysis { n_components, .. }
            | Self::KernelPca { n_components, .. }
            | Self::DictionaryLearning { n_components, .. } => *n_components,
        }
    }

    /// Fit the method on `window` and return its component scores.
    ///
    /// The result has one row per window row and at most `n_components`
    /// columns, leading component first.
    pub fn fit_transform(&self, window: &DataMatrix) -> Result<DataMatrix, FitError> {
        check_window(window)?;
        if self.n_components() == 0 {
            return Err(FitError::InvalidInput(
                "n_components must be at least 1".to_string(),
            ));
        }
        let x = window.to_dmatrix();
        let scores = match *self {
            Self::Pca { n_components } => pca::fit_transform(&x, n_components)?,
            Self::Ica {
                n_components,
                max_iter,
                tol,
                seed,
            } => ica::fit_transform(&x, n_components, max_iter, tol, seed)?,
            Self::Nmf {
                n_components,
                max_iter,
                tol,
                seed,
            } => nmf::fit_transform(&x, n_components, max_iter, tol, seed)?,
            Self::FactorAnalysis {
                n_components,
                max_iter,
                tol,
            } => factor::fit_transform(&x, n_components, max_iter, tol)?,
            Self::KernelPca {
                n_components,
                gamma,
            } => kernel_pca::fit_transform(&x, n_components, gamma)?,
            Self::DictionaryLearning {
                n_components,
                alpha,
                max_iter,
                tol,
                seed,
            } => dictionary::fit_transform(&x, n_components, alpha, max_iter, tol, seed)?,
        };
        Ok(DataMatrix::from_dmatrix(&scores))
    }
}

impl std::fmt::Display for DecompositionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Reject windows a fit cannot use.
fn check_window(window: &DataMatrix) -> Result<(), FitError> {
    if window.nrows() < 2 || window.ncols() == 0 {
        return Err(FitError::InvalidInput(format!(
            "need at least 2 rows and 1 column, got {}x{}",
            window.nrows(),
            window.ncols()
        )));
    }
    if window.as_slice().iter().any(|v| !v.is_finite()) {
        return Err(FitError::InvalidInput(
            "window contains missing or non-finite values".to_string(),
        ));
    }
    Ok(())
}

/// Subtract each column's mean.
pub(crate) fn center_columns(x: &DMatrix<f64>) -> DMatrix<f64> {
    let n = x.nrows() as f64;
    let mut centered = x.clone();
    for j in 0..x.ncols() {
        let mean = x.column(j).sum() / n;
        for i in 0..x.nrows() {
            centered[(i, j)] -= mean;
        }
    }
    centered
}

/// The `k` largest singular triplets, in descending order of singular value.
pub(crate) struct LeadingSvd {
    pub values: Vec<f64>,
    /// n x k
    pub u: DMatrix<f64>,
    /// k x p
    pub v_t: DMatrix<f64>,
}

pub(crate) fn leading_svd(x: &DMatrix<f64>, k: usize) -> Result<LeadingSvd, FitError> {
    let svd = SVD::new(x.clone(), true, true);
    let u = svd
        .u
        .as_ref()
        .ok_or_else(|| FitError::InvalidInput("SVD produced no left vectors".to_string()))?;
    let v_t = svd
        .v_t
        .as_ref()
        .ok_or_else(|| FitError::InvalidInput("SVD produced no right vectors".to_string()))?;

    let sv = &svd.singular_values;
    let mut order: Vec<usize> = (0..sv.len()).collect();
    order.sort_by(|&a, &b| sv[b].partial_cmp(&sv[a]).unwrap_or(Ordering::Equal));
    let k = k.min(order.len());

    Ok(LeadingSvd {
        values: order[..k].iter().map(|&i| sv[i]).collect(),
        u: DMatrix::from_fn(x.nrows(), k, |r, c| u[(r, order[c])]),
        v_t: DMatrix::from_fn(k, x.ncols(), |r, c| v_t[(order[r], c)]),
    })
}

/// Make the largest-magnitude loading of every component positive.
///
/// `loadings` is k x p (one row per component), `scores` is n x k.
pub(crate) fn normalize_signs(scores: &mut DMatrix<f64>, loadings: &mut DMatrix<f64>) {
    for c in 0..loadings.nrows() {
        let mut pivot = 0.0f64;
        for j in 0..loadings.ncols() {
            let v = loadings[(c, j)];
            if v.abs() > pivot.abs() {
                pivot = v;
            }
        }
        if pivot < 0.0 {
            loadings.row_mut(c).neg_mut();
            scores.column_mut(c).neg_mut();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 8 x 3 window with one dominant direction plus small wiggles.
    pub(crate) fn sample_window() -> DataMatrix {
        let rows: Vec<Vec<f64>> = (0..8)
            .map(|i| {
                let t = i as f64 / 7.0;
                vec![
                    t,
                    0.8 * t + 0.05 * ((i * 3) % 5) as f64 / 5.0,
                    1.0 - t + 0.1 * ((i * 2) % 3) as f64 / 3.0,
                ]
            })
            .collect();
        DataMatrix::from_rows(&rows).unwrap()
    }

    #[test]
    fn test_names_match_serde_tags() {
        for method in DecompositionMethod::all(2, 0) {
            let json = serde_json::to_value(&method).unwrap();
            assert_eq!(json["method"], method.name());
        }
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let method: DecompositionMethod =
            serde_json::from_str(r#"{"method": "ica", "seed": 7}"#).unwrap();
        assert_eq!(method, DecompositionMethod::ica(2, 7));
        let method: DecompositionMethod =
            serde_json::from_str(r#"{"method": "factor_analysis", "n_components": 1}"#).unwrap();
        assert_eq!(method, DecompositionMethod::factor_analysis(1));
    }

    /// 40 x 4 weekly profiles, each series scaled into [0, 1].
    pub(crate) fn weekly_profiles() -> DMatrix<f64> {
        let raw = DMatrix::from_fn(40, 4, |i, j| {
            100.0 + 10.0 * ((i % 7) as f64 - 3.0).abs() + ((j * i) % 5) as f64
        });
        let mut scaled = raw.clone();
        for j in 0..raw.ncols() {
            let lo = raw.column(j).min();
            let hi = raw.column(j).max();
            scaled.column_mut(j).apply(|v| *v = (*v - lo) / (hi - lo));
        }
        scaled
    }

    #[test]
    fn test_every_method_returns_one_row_per_time_step() {
        let window = sample_window();
        for method in DecompositionMethod::all(2, 3) {
            let scores = method
                .fit_transform(&window)
                .unwrap_or_else(|e| panic!("{} failed: {}", method, e));
            assert_eq!(scores.nrows(), 8, "{}", method);
            assert!(scores.ncols() >= 1 && scores.ncols() <= 2, "{}", method);
            assert!(scores.as_slice().iter().all(|v| v.is_finite()), "{}", method);
        }
    }

    #[test]
    fn test_every_method_fits_every_weekly_window() {
        let x = weekly_profiles();
        for method in DecompositionMethod::all(2, 42) {
            for start in 0..=(x.nrows() - 7) {
                let window = DataMatrix::from_dmatrix(&x.rows(start, 7).into_owned());
                let scores = method
                    .fit_transform(&window)
                    .unwrap_or_else(|e| panic!("{} on window {}: {}", method, start, e));
                assert!(scores.as_slice().iter().all(|v| v.is_finite()), "{}", method);
            }
        }
    }

    #[test]
    fn test_missing_values_rejected() {
        let mut rows = vec![vec![0.1, 0.2]; 4];
        rows[2][1] = f64::NAN;
        let window = DataMatrix::from_rows(&rows).unwrap();
        assert!(matches!(
            DecompositionMethod::pca(1).fit_transform(&window),
            Err(FitError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_zero_components_rejected() {
        assert!(DecompositionMethod::pca(0)
            .fit_transform(&sample_window())
            .is_err());
    }

    #[test]
    fn test_leading_svd_is_sorted() {
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 0.0, 5.0, 0.0, 0.0]);
        let svd = leading_svd(&x, 2).unwrap();
        assert!((svd.values[0] - 5.0).abs() < 1e-10);
        assert!((svd.values[1] - 1.0).abs() < 1e-10);
        assert_eq!(svd.u.shape(), (3, 2));
        assert_eq!(svd.v_t.shape(), (2, 2));
    }

    #[test]
    fn test_normalize_signs() {
        let mut scores = DMatrix::from_row_slice(2, 1, &[1.0, -2.0]);
        let mut loadings = DMatrix::from_row_slice(1, 2, &[0.3, -0.9]);
        normalize_signs(&mut scores, &mut loadings);
        assert_eq!(loadings[(0, 1)], 0.9);
        assert_eq!(scores[(0, 0)], -1.0);
    }
}
