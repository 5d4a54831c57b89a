//! Trailing-window bookkeeping shared by the windowed metrics.
//!
//! A window of length `win` ending at row `t` covers rows `t + 1 - win ..= t`.
//! Only complete windows are produced, so a series of `n` rows yields
//! `n - win + 1` windows labelled by their last row.

use std::ops::Range;

use log::debug;

use crate::error::{NltsaError, Result};
use crate::frame::TimeFrame;
use crate::iter_maybe_parallel;
use crate::matrix::{is_missing, DataMatrix, MISSING};
#[cfg(feature = "parallel")]
use rayon::iter::ParallelIterator;

/// Require `2 <= win <= rows`.
pub fn validate_window(win: usize, rows: usize) -> Result<()> {
    if win < 2 || win > rows {
        return Err(NltsaError::InvalidWindow { window: win, rows });
    }
    Ok(())
}

/// Number of complete trailing windows.
#[inline]
pub fn window_count(rows: usize, win: usize) -> usize {
    rows + 1 - win
}

/// Row range of the window starting at `start`.
#[inline]
pub fn window_rows(start: usize, win: usize) -> Range<usize> {
    start..start + win
}

/// Labels of the trailing row of each window.
pub fn trailing_labels(index: &[String], win: usize) -> Vec<String> {
    index[win - 1..].to_vec()
}

/// Resolve an inclusive, 1-indexed column range into 0-based positions.
///
/// `col_first = 1, col_last = ncols` selects every series.
pub fn resolve_columns(ncols: usize, col_first: usize, col_last: usize) -> Result<Vec<usize>> {
    if col_first < 1 || col_first > col_last || col_last > ncols {
        return Err(NltsaError::invalid_parameter(
            "columns",
            format!(
                "need 1 <= col_first <= col_last <= {}, got {}..={}",
                ncols, col_first, col_last
            ),
        ));
    }
    Ok((col_first - 1..col_last).collect())
}

/// Apply a per-window statistic to the selected series of a frame.
///
/// A window containing any missing cell yields a missing result. The output
/// frame keeps the selected series (in selection order) and the trailing
/// labels of each window.
pub(crate) fn map_windows<F>(
    frame: &TimeFrame,
    win: usize,
    col_first: usize,
    col_last: usize,
    stat: F,
) -> Result<TimeFrame>
where
    F: Fn(&[f64]) -> f64 + Sync + Send,
{
    let rows = frame.nrows();
    validate_window(win, rows)?;
    let cols = resolve_columns(frame.ncols(), col_first, col_last)?;
    let n_windows = window_count(rows, win);
    let values = frame.values();

    let columns: Vec<Vec<f64>> = iter_maybe_parallel!(cols.clone())
        .map(|j| {
            (0..n_windows)
                .map(|start| {
                    let w = values.window(j, window_rows(start, win));
                    if w.iter().any(|v| is_missing(*v)) {
                        MISSING
                    } else {
                        stat(w)
                    }
                })
                .collect()
        })
        .collect();

    let data: Vec<f64> = columns.into_iter().flatten().collect();
    let out = DataMatrix::from_column_major(data, n_windows, cols.len()).ok_or_else(|| {
        NltsaError::ShapeMismatch {
            expected: format!("{}x{}", n_windows, cols.len()),
            got: "windowed output of a different size".to_string(),
        }
    })?;
    debug!(
        "windowed {} with win={} over {} columns -> {} windows",
        frame,
        win,
        cols.len(),
        n_windows
    );

    TimeFrame::new(
        trailing_labels(frame.index(), win),
        cols.iter().map(|&j| frame.columns()[j].clone()).collect(),
        out,
    )
}
