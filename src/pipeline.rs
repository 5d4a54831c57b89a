//! End-to-end complexity analysis of a wide mobility table.
//!
//! [`analyze`] runs the stages in order:
//!
//! 1. keep series whose key matches `column_filter` (if set),
//! 2. drop series without more than `min_valid_rows` observations,
//! 3. optionally drop rows with any missing cell,
//! 4. scale every series into `range`,
//! 5. fluctuation intensity and distribution uniformity per window,
//! 6. their product (complexity resonance),
//! 7. cumulative complexity and significant peaks,
//! 8. the decomposition trajectory, when `methods` is not empty.

use log::{debug, info};

use crate::config::AnalysisConfig;
use crate::error::{NltsaError, Result};
use crate::fluctuation::fluctuation_intensity;
use crate::frame::TimeFrame;
use crate::peaks::{cumulative_complexity_peaks, CumulativePeaks};
use crate::resonance::complexity_resonance;
use crate::scaling::scale_columns;
use crate::summarizer::{compare_methods, ComponentTrajectory};
use crate::uniformity::distribution_uniformity;
use crate::window::resolve_columns;

/// Every intermediate result of [`analyze`].
#[derive(Debug, Clone)]
pub struct ComplexityReport {
    /// Input after column filtering and sparse-series/row removal.
    pub cleaned: TimeFrame,
    /// `cleaned` scaled into the configured range.
    pub scaled: TimeFrame,
    pub fluctuation: TimeFrame,
    pub uniformity: TimeFrame,
    pub resonance: TimeFrame,
    pub peaks: CumulativePeaks,
    /// Present when the config lists at least one decomposition method.
    pub trajectory: Option<ComponentTrajectory>,
}

/// Filtering and missing-data handling ahead of scaling.
fn clean(frame: &TimeFrame, config: &AnalysisConfig) -> Result<TimeFrame> {
    let filtered = match &config.column_filter {
        Some(pattern) => frame.filter_columns(pattern),
        None => frame.clone(),
    };
    let dense = filtered.drop_sparse_columns(config.min_valid_rows)?;
    if config.drop_incomplete_rows {
        Ok(dense.drop_incomplete_rows())
    } else {
        Ok(dense)
    }
}

/// Run the full analysis on `frame`.
///
/// # Errors
/// `TooLarge` for frames over `config.summarizer.max_rows`,
/// `InsufficientColumns` when no series survives cleaning, and any error of
/// the individual stages.
pub fn analyze(frame: &TimeFrame, config: &AnalysisConfig) -> Result<ComplexityReport> {
    config.validate()?;
    if frame.nrows() > config.summarizer.max_rows {
        return Err(NltsaError::TooLarge {
            rows: frame.nrows(),
            max_rows: config.summarizer.max_rows,
        });
    }

    let cleaned = clean(frame, config)?;
    debug!("cleaned {} -> {}", frame, cleaned);

    let scaled = scale_columns(&cleaned, Some(config.range))?;
    let (col_first, col_last) = config.column_bounds(scaled.ncols());
    let fluctuation =
        fluctuation_intensity(&scaled, config.window, config.range, col_first, col_last)?;
    let uniformity =
        distribution_uniformity(&scaled, config.window, config.range, col_first, col_last)?;
    let resonance = complexity_resonance(&fluctuation, &uniformity)?;
    let peaks = cumulative_complexity_peaks(&resonance, config.peak_k)?;

    let trajectory = if config.methods.is_empty() {
        None
    } else {
        let positions = resolve_columns(scaled.ncols(), col_first, col_last)?;
        let selected = scaled.select_columns(&positions);
        Some(compare_methods(
            &selected,
            config.window,
            &config.methods,
            &config.summarizer,
        )?)
    };

    info!(
        "analyzed {} series over {} windows (win={}): {} significant peaks",
        resonance.ncols(),
        resonance.nrows(),
        config.window,
        peaks.n_peaks()
    );

    Ok(ComplexityReport {
        cleaned,
        scaled,
        fluctuation,
        uniformity,
        resonance,
        peaks,
        trajectory,
    })
}
