//! Cumulative complexity and significant-peak flagging.
//!
//! The step-wise complexity at a time step is the sum of resonance over all
//! series. Its running sum is the cumulative trend. A step is a *significant
//! peak* when its step-wise value exceeds `mean + k * sd` of all step-wise
//! values. This is a single global outlier threshold: it does not look for
//! local maxima, so a plateau above the threshold is flagged at every step and
//! a small local bump below it is never flagged.

use log::{debug, info};

use crate::error::{NltsaError, Result};
use crate::frame::TimeFrame;
use crate::helpers::{mean, sample_std_dev, NUMERICAL_EPS};
use crate::matrix::{is_missing, DataMatrix};

/// Key of the single series in [`CumulativePeaks::trend`].
pub const TREND_COLUMN: &str = "cumulative_complexity";

/// Key of the single series in [`CumulativePeaks::significant`].
pub const PEAK_COLUMN: &str = "complexity";

/// Default threshold multiplier `k`.
pub const DEFAULT_PEAK_K: f64 = 1.0;

/// Output of [`cumulative_complexity_peaks`].
#[derive(Debug, Clone)]
pub struct CumulativePeaks {
    /// Step-wise complexity (row sums of the resonance frame).
    pub step: Vec<f64>,
    /// Running sum of `step`, one row per resonance row.
    pub trend: TimeFrame,
    /// `flags[i]` is true when row `i` is a significant peak.
    pub flags: Vec<bool>,
    /// Flagged rows only, with their step-wise (non-cumulative) value.
    pub significant: TimeFrame,
    /// `mean + k * sd`, or `None` when the spread is zero or undefined.
    pub threshold: Option<f64>,
}

impl CumulativePeaks {
    /// Number of significant peaks.
    pub fn n_peaks(&self) -> usize {
        self.significant.nrows()
    }
}

/// Sum each row across series, skipping missing cells.
fn row_sums(values: &DataMatrix) -> Vec<f64> {
    (0..values.nrows())
        .map(|i| {
            (0..values.ncols())
                .map(|j| values[(i, j)])
                .filter(|v| !is_missing(*v))
                .sum()
        })
        .collect()
}

fn single_column(index: Vec<String>, name: &str, values: Vec<f64>) -> Result<TimeFrame> {
    let n = values.len();
    let data = DataMatrix::from_column_major(values, n, 1).ok_or_else(|| {
        NltsaError::ShapeMismatch {
            expected: format!("{} values", n),
            got: "a different length".to_string(),
        }
    })?;
    TimeFrame::new(index, vec![name.to_string()], data)
}

/// Aggregate a resonance frame into a cumulative trend and flag significant peaks.
///
/// A zero (or undefined, for fewer than two rows) standard deviation of the
/// step-wise values yields no peaks rather than dividing by zero.
///
/// # Errors
/// `InvalidParameter` when `k` is negative or not finite.
pub fn cumulative_complexity_peaks(resonance: &TimeFrame, k: f64) -> Result<CumulativePeaks> {
    if !k.is_finite() || k < 0.0 {
        return Err(NltsaError::invalid_parameter(
            "k",
            format!("must be a finite non-negative multiplier, got {}", k),
        ));
    }

    let step = row_sums(resonance.values());
    let trend_values: Vec<f64> = step
        .iter()
        .scan(0.0, |acc, &s| {
            *acc += s;
            Some(*acc)
        })
        .collect();

    let threshold = match sample_std_dev(&step) {
        Some(sd) if sd > NUMERICAL_EPS => Some(mean(&step) + k * sd),
        _ => None,
    };
    let flags: Vec<bool> = match threshold {
        Some(t) => step.iter().map(|&s| s > t).collect(),
        None => vec![false; step.len()],
    };

    let (peak_labels, peak_values): (Vec<String>, Vec<f64>) = flags
        .iter()
        .enumerate()
        .filter(|(_, f)| **f)
        .map(|(i, _)| (resonance.index()[i].clone(), step[i]))
        .unzip();

    debug!("peak threshold {:?} with k={}", threshold, k);
    info!(
        "cumulative complexity over {} steps: total {:.4}, {} significant peaks",
        step.len(),
        trend_values.last().copied().unwrap_or(0.0),
        peak_labels.len()
    );

    Ok(CumulativePeaks {
        trend: single_column(resonance.index().to_vec(), TREND_COLUMN, trend_values)?,
        significant: single_column(peak_labels, PEAK_COLUMN, peak_values)?,
        step,
        flags,
        threshold,
    })
}
