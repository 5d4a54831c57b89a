//! Column-major numeric matrix backing every time-indexed frame.
//!
//! [`DataMatrix`] stores rows (time steps) × columns (series) in a flat
//! column-major `Vec<f64>`. Each series is therefore a contiguous slice, and a
//! window over one series is a sub-slice of it: windowed metrics never copy.
//!
//! Missing observations are stored as [`MISSING`] (`NaN`). They are only ever
//! created explicitly, through [`DataMatrix::from_options`] or by a metric that
//! propagates missingness.

use std::ops::Range;

use nalgebra::DMatrix;

/// Marker stored in cells that hold no observation.
pub const MISSING: f64 = f64::NAN;

/// Whether a cell value is the missing marker.
#[inline]
pub fn is_missing(value: f64) -> bool {
    value.is_nan()
}

/// Column-major matrix of time steps × series.
///
/// Element `(row, col)` lives at index `row + col * nrows`.
///
/// # Examples
///
/// ```
/// use nltsa_core::matrix::DataMatrix;
///
/// // 3 time steps, 2 series
/// let mat = DataMatrix::from_column_major(vec![1.0, 2.0, 3.0, 10.0, 20.0, 30.0], 3, 2).unwrap();
///
/// assert_eq!(mat[(1, 1)], 20.0);
/// assert_eq!(mat.column(0), &[1.0, 2.0, 3.0]);
/// assert_eq!(mat.window(1, 1..3), &[20.0, 30.0]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DataMatrix {
    data: Vec<f64>,
    nrows: usize,
    ncols: usize,
}

impl DataMatrix {
    /// Create from flat column-major data.
    ///
    /// Returns `None` if `data.len() != nrows * ncols`.
    pub fn from_column_major(data: Vec<f64>, nrows: usize, ncols: usize) -> Option<Self> {
        if data.len() != nrows * ncols {
            return None;
        }
        Some(Self { data, nrows, ncols })
    }

    /// Create from row-major nested vectors (one inner vector per time step).
    ///
    /// Returns `None` if the rows are ragged.
    pub fn from_rows(rows: &[Vec<f64>]) -> Option<Self> {
        let nrows = rows.len();
        let ncols = rows.first().map_or(0, |r| r.len());
        if rows.iter().any(|r| r.len() != ncols) {
            return None;
        }
        let mut data = Vec::with_capacity(nrows * ncols);
        for j in 0..ncols {
            data.extend(rows.iter().map(|r| r[j]));
        }
        Some(Self { data, nrows, ncols })
    }

    /// Create from per-series columns where `None` marks a missing observation.
    ///
    /// Returns `None` if the columns have different lengths.
    pub fn from_options(columns: &[Vec<Option<f64>>]) -> Option<Self> {
        let ncols = columns.len();
        let nrows = columns.first().map_or(0, |c| c.len());
        if columns.iter().any(|c| c.len() != nrows) {
            return None;
        }
        let data = columns
            .iter()
            .flat_map(|c| c.iter().map(|v| v.unwrap_or(MISSING)))
            .collect();
        Some(Self { data, nrows, ncols })
    }

    /// Create a zero-filled matrix.
    pub fn zeros(nrows: usize, ncols: usize) -> Self {
        Self {
            data: vec![0.0; nrows * ncols],
            nrows,
            ncols,
        }
    }

    #[inline]
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    #[inline]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Dimensions as `(nrows, ncols)`.
    #[inline]
    pub fn shape(&self) -> (usize, usize) {
        (self.nrows, self.ncols)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Contiguous slice holding one series.
    ///
    /// # Panics
    /// Panics if `col >= ncols`.
    #[inline]
    pub fn column(&self, col: usize) -> &[f64] {
        let start = col * self.nrows;
        &self.data[start..start + self.nrows]
    }

    #[inline]
    pub fn column_mut(&mut self, col: usize) -> &mut [f64] {
        let start = col * self.nrows;
        &mut self.data[start..start + self.nrows]
    }

    /// Zero-copy view of rows `rows` of series `col`.
    ///
    /// # Panics
    /// Panics if the range or the column is out of bounds.
    #[inline]
    pub fn window(&self, col: usize, rows: Range<usize>) -> &[f64] {
        &self.column(col)[rows]
    }

    /// Extract a single time step across all series.
    pub fn row(&self, row: usize) -> Vec<f64> {
        (0..self.ncols)
            .map(|j| self.data[row + j * self.nrows])
            .collect()
    }

    /// Copy a contiguous block of rows into a new matrix.
    ///
    /// Decomposition fits need an owned block; the metric paths use
    /// [`DataMatrix::window`] instead.
    pub fn row_block(&self, rows: Range<usize>) -> Self {
        let nrows = rows.len();
        let mut data = Vec::with_capacity(nrows * self.ncols);
        for j in 0..self.ncols {
            data.extend_from_slice(&self.column(j)[rows.clone()]);
        }
        Self {
            data,
            nrows,
            ncols: self.ncols,
        }
    }

    /// Copy the given columns, in the given order, into a new matrix.
    pub fn select_columns(&self, cols: &[usize]) -> Self {
        let mut data = Vec::with_capacity(self.nrows * cols.len());
        for &j in cols {
            data.extend_from_slice(self.column(j));
        }
        Self {
            data,
            nrows: self.nrows,
            ncols: cols.len(),
        }
    }

    /// Copy the given rows, in the given order, into a new matrix.
    pub fn select_rows(&self, rows: &[usize]) -> Self {
        let mut data = Vec::with_capacity(rows.len() * self.ncols);
        for j in 0..self.ncols {
            let col = self.column(j);
            data.extend(rows.iter().map(|&i| col[i]));
        }
        Self {
            data,
            nrows: rows.len(),
            ncols: self.ncols,
        }
    }

    /// Number of non-missing cells in a column.
    pub fn valid_count(&self, col: usize) -> usize {
        self.column(col).iter().filter(|v| !is_missing(**v)).count()
    }

    /// Whether any cell holds the missing marker.
    pub fn has_missing(&self) -> bool {
        self.data.iter().any(|v| is_missing(*v))
    }

    #[inline]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Convert to a nalgebra `DMatrix<f64>`. Both layouts are column-major.
    pub fn to_dmatrix(&self) -> DMatrix<f64> {
        DMatrix::from_column_slice(self.nrows, self.ncols, &self.data)
    }

    pub fn from_dmatrix(mat: &DMatrix<f64>) -> Self {
        let (nrows, ncols) = mat.shape();
        Self {
            data: mat.as_slice().to_vec(),
            nrows,
            ncols,
        }
    }

    /// Get element at (row, col) with bounds checking.
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.nrows && col < self.ncols {
            Some(self.data[row + col * self.nrows])
        } else {
            None
        }
    }
}

impl std::ops::Index<(usize, usize)> for DataMatrix {
    type Output = f64;

    #[inline]
    fn index(&self, (row, col): (usize, usize)) -> &f64 {
        debug_assert!(
            row < self.nrows && col < self.ncols,
            "DataMatrix index ({}, {}) out of bounds for {}x{} matrix",
            row,
            col,
            self.nrows,
            self.ncols
        );
        &self.data[row + col * self.nrows]
    }
}

impl std::ops::IndexMut<(usize, usize)> for DataMatrix {
    #[inline]
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut f64 {
        debug_assert!(
            row < self.nrows && col < self.ncols,
            "DataMatrix index ({}, {}) out of bounds for {}x{} matrix",
            row,
            col,
            self.nrows,
            self.ncols
        );
        &mut self.data[row + col * self.nrows]
    }
}

impl std::fmt::Display for DataMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "DataMatrix({}x{})", self.nrows, self.ncols)
    }
}
