//! Distribution uniformity: how evenly a window's values cover the value range.

use crate::error::Result;
use crate::frame::TimeFrame;
use crate::scaling::FeatureRange;
use crate::window::map_windows;

/// Upper bound on the histogram bin count.
pub const MAX_BINS: usize = 10;

/// Number of histogram bins used for a window of length `win`: `min(win, 10)`.
#[inline]
pub fn bin_count(win: usize) -> usize {
    win.min(MAX_BINS)
}

/// Equal-width histogram over `range`.
///
/// Values equal to `xmax` land in the last bin; values outside the range are
/// clamped into the edge bins.
fn histogram(window: &[f64], range: FeatureRange, bins: usize) -> Vec<usize> {
    let mut counts = vec![0usize; bins];
    for &v in window {
        let pos = (v - range.xmin) / range.span() * bins as f64;
        let idx = if pos <= 0.0 {
            0
        } else {
            (pos.floor() as usize).min(bins - 1)
        };
        counts[idx] += 1;
    }
    counts
}

/// Distribution uniformity of one complete window.
///
/// Shannon entropy of the bin proportions divided by `ln(bins)`, which equals
/// one minus the normalized entropy deficit against a uniform histogram.
/// 1 means the values are spread evenly over the bins, 0 means they all share
/// one bin.
pub fn window_uniformity(window: &[f64], range: FeatureRange) -> f64 {
    let bins = bin_count(window.len());
    if bins < 2 {
        return 0.0;
    }
    let n = window.len() as f64;
    let entropy: f64 = histogram(window, range, bins)
        .into_iter()
        .filter(|&c| c > 0)
        .map(|c| {
            let p = c as f64 / n;
            -p * p.ln()
        })
        .sum();
    (entropy / (bins as f64).ln()).clamp(0.0, 1.0)
}

/// Windowed distribution uniformity for series `col_first..=col_last` (1-indexed).
///
/// Same alignment, column selection and missing-data policy as
/// [`fluctuation_intensity`](crate::fluctuation::fluctuation_intensity).
pub fn distribution_uniformity(
    frame: &TimeFrame,
    win: usize,
    range: FeatureRange,
    col_first: usize,
    col_last: usize,
) -> Result<TimeFrame> {
    range.validate()?;
    map_windows(frame, win, col_first, col_last, |w| {
        window_uniformity(w, range)
    })
}
