//! Time-indexed frames of named series.
//!
//! A [`TimeFrame`] pairs a [`DataMatrix`] with chronological row labels and
//! series keys. Every analysis stage consumes and returns frames so stages can
//! be chained; row order is never permuted by any operation in this module.

use log::{debug, warn};
use serde::Serialize;

use crate::error::{NltsaError, Result};
use crate::matrix::{is_missing, DataMatrix};

/// Build a composite series key such as `"Finland-Helsinki-walking"`.
///
/// Parts are trimmed and joined with `-`; empty parts are kept so that keys of
/// country-level series (no country, only a region) stay distinguishable,
/// e.g. `"-Netherlands-driving"`.
pub fn column_key(parts: &[&str]) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .collect::<Vec<_>>()
        .join("-")
        .trim()
        .to_string()
}

/// One cell of a frame in long form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LongRecord {
    pub label: String,
    pub column: String,
    /// `None` for missing cells.
    pub value: Option<f64>,
}

/// A matrix of series indexed by time labels.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeFrame {
    index: Vec<String>,
    columns: Vec<String>,
    values: DataMatrix,
}

impl TimeFrame {
    /// Create a frame, checking that labels match the matrix dimensions.
    pub fn new(index: Vec<String>, columns: Vec<String>, values: DataMatrix) -> Result<Self> {
        if index.len() != values.nrows() || columns.len() != values.ncols() {
            return Err(NltsaError::ShapeMismatch {
                expected: format!("{}x{} labels", index.len(), columns.len()),
                got: format!("{}x{} values", values.nrows(), values.ncols()),
            });
        }
        Ok(Self {
            index,
            columns,
            values,
        })
    }

    /// Create a frame from named series where `None` marks a missing cell.
    pub fn from_series(
        index: Vec<String>,
        series: Vec<(String, Vec<Option<f64>>)>,
    ) -> Result<Self> {
        let (columns, cells): (Vec<String>, Vec<Vec<Option<f64>>>) = series.into_iter().unzip();
        let nrows = index.len();
        if let Some(bad) = cells.iter().position(|c| c.len() != nrows) {
            return Err(NltsaError::ShapeMismatch {
                expected: format!("{} rows in series '{}'", nrows, columns[bad]),
                got: format!("{} rows", cells[bad].len()),
            });
        }
        let values = if cells.is_empty() {
            DataMatrix::zeros(nrows, 0)
        } else {
            DataMatrix::from_options(&cells).ok_or_else(|| NltsaError::ShapeMismatch {
                expected: "rectangular series".to_string(),
                got: "ragged series".to_string(),
            })?
        };
        Self::new(index, columns, values)
    }

    /// Row labels, oldest first.
    pub fn index(&self) -> &[String] {
        &self.index
    }

    /// Series keys.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &DataMatrix {
        &self.values
    }

    pub fn nrows(&self) -> usize {
        self.values.nrows()
    }

    pub fn ncols(&self) -> usize {
        self.values.ncols()
    }

    pub fn column_position(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Values of a series by key.
    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.column_position(name).map(|j| self.values.column(j))
    }

    /// Replace the values while keeping labels. The shapes must agree.
    pub(crate) fn with_values(&self, values: DataMatrix) -> Result<Self> {
        Self::new(self.index.clone(), self.columns.clone(), values)
    }

    /// Keep the series at the given positions, in the given order.
    pub fn select_columns(&self, positions: &[usize]) -> Self {
        Self {
            index: self.index.clone(),
            columns: positions.iter().map(|&j| self.columns[j].clone()).collect(),
            values: self.values.select_columns(positions),
        }
    }

    /// Keep only series whose key contains `pattern`.
    pub fn filter_columns(&self, pattern: &str) -> Self {
        let keep: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .filter(|(_, c)| c.contains(pattern))
            .map(|(j, _)| j)
            .collect();
        debug!(
            "filter '{}' kept {} of {} columns",
            pattern,
            keep.len(),
            self.ncols()
        );
        self.select_columns(&keep)
    }

    /// Drop series that do not have more than `min_valid_rows` observations.
    ///
    /// Returns [`NltsaError::InsufficientColumns`] when no series survives.
    pub fn drop_sparse_columns(&self, min_valid_rows: usize) -> Result<Self> {
        let mut keep = Vec::with_capacity(self.ncols());
        for j in 0..self.ncols() {
            let valid = self.values.valid_count(j);
            if valid > min_valid_rows {
                keep.push(j);
            } else {
                warn!(
                    "dropping column '{}': {} valid rows, need more than {}",
                    self.columns[j], valid, min_valid_rows
                );
            }
        }
        if keep.is_empty() {
            return Err(NltsaError::InsufficientColumns {
                total: self.ncols(),
                min_valid_rows,
            });
        }
        Ok(self.select_columns(&keep))
    }

    /// Drop every row that has a missing cell in any series.
    pub fn drop_incomplete_rows(&self) -> Self {
        let keep: Vec<usize> = (0..self.nrows())
            .filter(|&i| (0..self.ncols()).all(|j| !is_missing(self.values[(i, j)])))
            .collect();
        if keep.len() < self.nrows() {
            debug!("dropping {} incomplete rows", self.nrows() - keep.len());
        }
        Self {
            index: keep.iter().map(|&i| self.index[i].clone()).collect(),
            columns: self.columns.clone(),
            values: self.values.select_rows(&keep),
        }
    }

    /// Check that two frames share row labels and series keys exactly.
    pub fn ensure_aligned(&self, other: &TimeFrame) -> Result<()> {
        if self.values.shape() != other.values.shape() {
            return Err(NltsaError::MisalignedSeries(format!(
                "shape {:?} vs {:?}",
                self.values.shape(),
                other.values.shape()
            )));
        }
        if self.columns != other.columns {
            return Err(NltsaError::MisalignedSeries(
                "column sets differ".to_string(),
            ));
        }
        if let Some(i) = (0..self.nrows()).find(|&i| self.index[i] != other.index[i]) {
            return Err(NltsaError::MisalignedSeries(format!(
                "row {} labelled '{}' vs '{}'",
                i, self.index[i], other.index[i]
            )));
        }
        Ok(())
    }

    /// Flatten to `(label, column, value)` records, series by series.
    pub fn to_long(&self) -> Vec<LongRecord> {
        let mut out = Vec::with_capacity(self.nrows() * self.ncols());
        for (j, column) in self.columns.iter().enumerate() {
            for (i, label) in self.index.iter().enumerate() {
                let v = self.values[(i, j)];
                out.push(LongRecord {
                    label: label.clone(),
                    column: column.clone(),
                    value: if is_missing(v) { None } else { Some(v) },
                });
            }
        }
        out
    }
}

impl std::fmt::Display for TimeFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TimeFrame({}x{})", self.nrows(), self.ncols())
    }
}
