//! # nltsa-core
//!
//! Windowed complexity metrics for multivariate mobility time series.
//!
//! This crate provides:
//! - Min-max scaling into a bounded range
//! - Fluctuation intensity (mean absolute step size per trailing window)
//! - Distribution uniformity (normalized histogram entropy per trailing window)
//! - Complexity resonance and cumulative complexity with significant peaks
//! - Sliding-window decomposition summaries (PCA, FastICA, NMF, factor
//!   analysis, kernel PCA, dictionary learning)
//! - An end-to-end [`pipeline::analyze`] driven by [`AnalysisConfig`]
//!
//! ## Data Layout
//!
//! Series are stored column-major in a [`DataMatrix`]: for `n` time steps and
//! `m` series, `data[i + j * n]` is series `j` at step `i`. A [`TimeFrame`]
//! adds row labels (oldest first) and series keys. Missing cells are `NaN`
//! ([`MISSING`]) and are never imputed.
//!
//! ## Windows
//!
//! Every windowed result is trailing-aligned: the window of length `win` ending
//! at row `t` is labelled with row `t`'s label, and the first `win - 1` rows
//! produce no output.
//!
//! ```
//! use nltsa_core::{analyze, AnalysisConfig, TimeFrame};
//!
//! let index: Vec<String> = (0..20).map(|i| format!("2020-03-{:02}", i + 1)).collect();
//! let walking: Vec<Option<f64>> = (0..20).map(|i| Some((i % 7) as f64)).collect();
//! let driving: Vec<Option<f64>> = (0..20).map(|i| Some(((i * 3) % 5) as f64)).collect();
//! let frame = TimeFrame::from_series(
//!     index,
//!     vec![
//!         ("Finland-Helsinki-walking".to_string(), walking),
//!         ("Finland-Helsinki-driving".to_string(), driving),
//!     ],
//! )
//! .unwrap();
//!
//! let report = analyze(&frame, &AnalysisConfig::default()).unwrap();
//! assert_eq!(report.resonance.nrows(), 14);
//! ```

#![allow(clippy::needless_range_loop)]
#![allow(clippy::too_many_arguments)]

pub mod parallel;

pub mod config;
pub mod decomposition;
pub mod error;
pub mod fluctuation;
pub mod frame;
pub mod helpers;
pub mod matrix;
pub mod peaks;
pub mod pipeline;
pub mod resonance;
pub mod scaling;
pub mod summarizer;
pub mod uniformity;
pub mod window;

// Re-export commonly used items
pub use config::AnalysisConfig;
pub use decomposition::{DecompositionMethod, FitError};
pub use error::{NltsaError, Result};
pub use fluctuation::fluctuation_intensity;
pub use frame::{column_key, LongRecord, TimeFrame};
pub use helpers::NUMERICAL_EPS;
pub use matrix::{is_missing, DataMatrix, MISSING};
pub use peaks::{cumulative_complexity_peaks, CumulativePeaks};
pub use pipeline::{analyze, ComplexityReport};
pub use resonance::complexity_resonance;
pub use scaling::{scale_columns, FeatureRange};
pub use summarizer::{
    compare_methods, summarize_windows, ComponentTrajectory, SummarizerOptions, TrajectoryRecord,
    WindowFailurePolicy,
};
pub use uniformity::distribution_uniformity;
