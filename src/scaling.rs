//! Min-max scaling of series into a bounded target range.
//!
//! Every bounded-domain metric assumes its input has been passed through
//! [`scale_columns`] with the same [`FeatureRange`].

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{NltsaError, Result};
use crate::frame::TimeFrame;
use crate::helpers::finite_min_max;
use crate::matrix::{is_missing, DataMatrix};

/// Target interval `[xmin, xmax]` for scaling.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureRange {
    pub xmin: f64,
    pub xmax: f64,
}

impl FeatureRange {
    /// Create a validated range.
    pub fn new(xmin: f64, xmax: f64) -> Result<Self> {
        let range = Self { xmin, xmax };
        range.validate()?;
        Ok(range)
    }

    /// Require finite bounds with `xmin < xmax`.
    pub fn validate(&self) -> Result<()> {
        if !self.xmin.is_finite() || !self.xmax.is_finite() {
            return Err(NltsaError::invalid_parameter(
                "range",
                format!("bounds must be finite, got [{}, {}]", self.xmin, self.xmax),
            ));
        }
        if self.xmin >= self.xmax {
            return Err(NltsaError::invalid_parameter(
                "range",
                format!("xmin must be below xmax, got [{}, {}]", self.xmin, self.xmax),
            ));
        }
        Ok(())
    }

    #[inline]
    pub fn span(&self) -> f64 {
        self.xmax - self.xmin
    }

    #[inline]
    pub fn midpoint(&self) -> f64 {
        (self.xmin + self.xmax) / 2.0
    }
}

impl Default for FeatureRange {
    fn default() -> Self {
        Self {
            xmin: 0.0,
            xmax: 1.0,
        }
    }
}

/// Rescale one series in place. Missing cells are left untouched.
fn scale_series(values: &mut [f64], range: FeatureRange) {
    let Some((lo, hi)) = finite_min_max(values) else {
        return;
    };
    let width = hi - lo;
    for v in values.iter_mut().filter(|v| !is_missing(**v)) {
        *v = if width > 0.0 {
            // Pin the extremes so re-scaling is exact at the bounds.
            if *v == lo {
                range.xmin
            } else if *v == hi {
                range.xmax
            } else {
                (range.xmin + (*v - lo) / width * range.span()).clamp(range.xmin, range.xmax)
            }
        } else {
            range.midpoint()
        };
    }
}

/// Scale every column of a matrix independently into `range`.
pub fn scale_matrix(data: &DataMatrix, range: FeatureRange) -> DataMatrix {
    let mut out = data.clone();
    for j in 0..out.ncols() {
        scale_series(out.column_mut(j), range);
    }
    out
}

/// Scale every series of a frame into `range` (default `[0, 1]`).
///
/// Each series' minimum maps to `xmin` and its maximum to `xmax`. A constant
/// series maps to the midpoint of the range. Missing cells pass through and
/// are ignored when finding the extremes.
pub fn scale_columns(frame: &TimeFrame, range: Option<FeatureRange>) -> Result<TimeFrame> {
    let range = range.unwrap_or_default();
    range.validate()?;
    debug!("scaling {} into [{}, {}]", frame, range.xmin, range.xmax);
    frame.with_values(scale_matrix(frame.values(), range))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::helpers::NUMERICAL_EPS;

    fn frame(series: Vec<Vec<Option<f64>>>) -> TimeFrame {
        let n = series[0].len();
        TimeFrame::from_series(
            (0..n).map(|i| i.to_string()).collect(),
            series
                .into_iter()
                .enumerate()
                .map(|(j, s)| (format!("s{}", j), s))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn test_scale_default_range() {
        let f = frame(vec![vec![Some(10.0), Some(20.0), Some(15.0), Some(30.0)]]);
        let scaled = scale_columns(&f, None).unwrap();
        let col = scaled.values().column(0);
        assert_eq!(col[0], 0.0);
        assert_eq!(col[3], 1.0);
        assert!((col[1] - 0.5).abs() < NUMERICAL_EPS);
        assert!((col[2] - 0.25).abs() < NUMERICAL_EPS);
    }

    #[test]
    fn test_scale_custom_range_bounds() {
        let f = frame(vec![vec![Some(-3.0), Some(7.0), Some(1.0), Some(2.5)]]);
        let range = FeatureRange::new(-1.0, 2.0).unwrap();
        let scaled = scale_columns(&f, Some(range)).unwrap();
        for &v in scaled.values().column(0) {
            assert!((-1.0..=2.0).contains(&v));
        }
        assert_eq!(scaled.values().column(0)[0], -1.0);
        assert_eq!(scaled.values().column(0)[1], 2.0);
    }

    #[test]
    fn test_constant_column_maps_to_midpoint() {
        let f = frame(vec![vec![Some(4.0); 5]]);
        let range = FeatureRange::new(2.0, 6.0).unwrap();
        let scaled = scale_columns(&f, Some(range)).unwrap();
        assert!(scaled.values().column(0).iter().all(|&v| v == 4.0));
    }

    #[test]
    fn test_missing_passes_through() {
        let f = frame(vec![vec![Some(1.0), None, Some(3.0)]]);
        let scaled = scale_columns(&f, None).unwrap();
        let col = scaled.values().column(0);
        assert_eq!(col[0], 0.0);
        assert!(is_missing(col[1]));
        assert_eq!(col[2], 1.0);
    }

    #[test]
    fn test_scaling_is_idempotent() {
        let f = frame(vec![
            vec![Some(3.0), Some(-2.0), Some(8.5), Some(0.1), Some(4.4)],
            vec![Some(100.0), Some(90.0), Some(95.0), Some(91.0), Some(99.0)],
        ]);
        let once = scale_columns(&f, None).unwrap();
        let twice = scale_columns(&once, None).unwrap();
        for (a, b) in once.values().as_slice().iter().zip(twice.values().as_slice()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn test_invalid_range_rejected() {
        assert!(FeatureRange::new(1.0, 1.0).is_err());
        assert!(FeatureRange::new(f64::NAN, 1.0).is_err());
        let f = frame(vec![vec![Some(1.0), Some(2.0)]]);
        let bad = FeatureRange { xmin: 2.0, xmax: 0.0 };
        assert!(matches!(
            scale_columns(&f, Some(bad)),
            Err(NltsaError::InvalidParameter { .. })
        ));
    }
}
