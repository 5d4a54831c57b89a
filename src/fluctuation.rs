//! Fluctuation intensity: local step-to-step variability of a series.

use crate::error::Result;
use crate::frame::TimeFrame;
use crate::scaling::FeatureRange;
use crate::window::map_windows;

/// Fluctuation intensity of one complete window.
///
/// Mean absolute first difference divided by the width of the value range,
/// clamped into `[0, 1]`. A flat window scores 0; a window jumping between the
/// range bounds at every step scores 1.
pub fn window_fluctuation(window: &[f64], range: FeatureRange) -> f64 {
    if window.len() < 2 {
        return 0.0;
    }
    let total: f64 = window.windows(2).map(|p| (p[1] - p[0]).abs()).sum();
    let mean_step = total / (window.len() - 1) as f64;
    (mean_step / range.span()).clamp(0.0, 1.0)
}

/// Windowed fluctuation intensity for series `col_first..=col_last` (1-indexed).
///
/// The input should already be scaled into `range`. The output has one row per
/// complete trailing window (`rows - win + 1`), labelled by the window's last
/// row, and only the selected series. Windows containing a missing cell are
/// missing in the output.
///
/// # Errors
/// [`NltsaError::InvalidWindow`](crate::NltsaError::InvalidWindow) when
/// `win < 2` or `win` exceeds the row count; `InvalidParameter` for a bad range
/// or column selection.
pub fn fluctuation_intensity(
    frame: &TimeFrame,
    win: usize,
    range: FeatureRange,
    col_first: usize,
    col_last: usize,
) -> Result<TimeFrame> {
    range.validate()?;
    map_windows(frame, win, col_first, col_last, |w| {
        window_fluctuation(w, range)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NltsaError;
    use crate::matrix::is_missing;

    fn frame(series: Vec<Vec<f64>>) -> TimeFrame {
        let n = series[0].len();
        TimeFrame::from_series(
            (0..n).map(|i| format!("t{}", i)).collect(),
            series
                .into_iter()
                .enumerate()
                .map(|(j, s)| (format!("s{}", j), s.into_iter().map(Some).collect()))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_window_fluctuation_extremes() {
        let range = FeatureRange::default();
        assert_eq!(window_fluctuation(&[0.3; 6], range), 0.0);
        assert!((window_fluctuation(&[0.0, 1.0, 0.0, 1.0], range) - 1.0).abs() < 1e-12);
        // steps 0.5, 0.25 -> mean 0.375
        assert!((window_fluctuation(&[0.0, 0.5, 0.25], range) - 0.375).abs() < 1e-12);
    }

    #[test]
    fn test_window_fluctuation_uses_range_width() {
        let range = FeatureRange::new(0.0, 4.0).unwrap();
        assert!((window_fluctuation(&[0.0, 2.0, 0.0], range) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_output_shape_and_labels() {
        let f = frame(vec![(0..12).map(|i| i as f64 / 11.0).collect()]);
        let fi = fluctuation_intensity(&f, 5, FeatureRange::default(), 1, 1).unwrap();
        assert_eq!(fi.nrows(), 12 - 5 + 1);
        assert_eq!(fi.index()[0], "t4");
        assert_eq!(fi.index().last().unwrap(), "t11");
    }

    #[test]
    fn test_flat_column_is_zero() {
        let f = frame(vec![vec![0.5; 10], (0..10).map(|i| (i % 3) as f64 / 2.0).collect()]);
        let fi = fluctuation_intensity(&f, 4, FeatureRange::default(), 1, 2).unwrap();
        assert!(fi.values().column(0).iter().all(|&v| v == 0.0));
        assert!(fi
            .values()
            .column(1)
            .iter()
            .all(|&v| (0.0..=1.0).contains(&v)));
    }

    #[test]
    fn test_column_subset_is_omitted_not_passed_through() {
        let f = frame(vec![vec![0.0; 6], vec![1.0; 6], vec![0.5; 6]]);
        let fi = fluctuation_intensity(&f, 3, FeatureRange::default(), 2, 3).unwrap();
        assert_eq!(fi.columns(), &["s1", "s2"]);
    }

    #[test]
    fn test_missing_cell_yields_missing_window() {
        let f = TimeFrame::from_series(
            (0..4).map(|i| i.to_string()).collect(),
            vec![("a".to_string(), vec![Some(0.0), Some(1.0), None, Some(0.0)])],
        )
        .unwrap();
        let fi = fluctuation_intensity(&f, 2, FeatureRange::default(), 1, 1).unwrap();
        let col = fi.values().column(0);
        assert_eq!(col[0], 1.0);
        assert!(is_missing(col[1]));
        assert!(is_missing(col[2]));
    }

    #[test]
    fn test_invalid_window() {
        let f = frame(vec![vec![0.0; 5]]);
        assert_eq!(
            fluctuation_intensity(&f, 6, FeatureRange::default(), 1, 1).unwrap_err(),
            NltsaError::InvalidWindow { window: 6, rows: 5 }
        );
        assert_eq!(
            fluctuation_intensity(&f, 1, FeatureRange::default(), 1, 1).unwrap_err(),
            NltsaError::InvalidWindow { window: 1, rows: 5 }
        );
    }
}
