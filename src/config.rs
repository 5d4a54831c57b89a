//! Analysis configuration.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::decomposition::DecompositionMethod;
use crate::error::{NltsaError, Result};
use crate::peaks::DEFAULT_PEAK_K;
use crate::scaling::FeatureRange;
use crate::summarizer::{SummarizerOptions, WindowFailurePolicy};

/// Default trailing window length (one week of daily data).
pub const DEFAULT_WINDOW: usize = 7;

/// Default minimum valid-row threshold for keeping a series.
pub const DEFAULT_MIN_VALID_ROWS: usize = 10;

/// Settings for [`analyze`](crate::pipeline::analyze) and the decomposition
/// trajectory.
///
/// Every field has a default, so a JSON config only needs the fields it
/// changes:
///
/// ```
/// use nltsa_core::AnalysisConfig;
///
/// let config = AnalysisConfig::from_json_str(r#"{"window": 14, "column_filter": "Finland"}"#)
///     .unwrap();
/// assert_eq!(config.window, 14);
/// assert_eq!(config.peak_k, 1.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Trailing window length, at least 2.
    pub window: usize,
    /// Target range for scaling and the bounded metrics.
    pub range: FeatureRange,
    /// First processed series, 1-indexed. `None` means the first series.
    pub col_first: Option<usize>,
    /// Last processed series, inclusive. `None` means the last series.
    pub col_last: Option<usize>,
    /// Peak threshold multiplier `k` in `mean + k * sd`.
    pub peak_k: f64,
    /// Series need more than this many valid rows to be analyzed.
    pub min_valid_rows: usize,
    /// Keep only series whose key contains this text.
    pub column_filter: Option<String>,
    /// Drop every row with a missing cell before scaling.
    pub drop_incomplete_rows: bool,
    /// Methods for the window decomposition trajectory. Empty skips it.
    pub methods: Vec<DecompositionMethod>,
    pub summarizer: SummarizerOptions,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            window: DEFAULT_WINDOW,
            range: FeatureRange::default(),
            col_first: None,
            col_last: None,
            peak_k: DEFAULT_PEAK_K,
            min_valid_rows: DEFAULT_MIN_VALID_ROWS,
            column_filter: None,
            drop_incomplete_rows: false,
            methods: Vec::new(),
            summarizer: SummarizerOptions::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            ..Self::default()
        }
    }

    pub fn with_range(mut self, range: FeatureRange) -> Self {
        self.range = range;
        self
    }

    pub fn with_columns(mut self, col_first: usize, col_last: usize) -> Self {
        self.col_first = Some(col_first);
        self.col_last = Some(col_last);
        self
    }

    pub fn with_peak_k(mut self, k: f64) -> Self {
        self.peak_k = k;
        self
    }

    pub fn with_min_valid_rows(mut self, min_valid_rows: usize) -> Self {
        self.min_valid_rows = min_valid_rows;
        self
    }

    pub fn with_column_filter(mut self, pattern: impl Into<String>) -> Self {
        self.column_filter = Some(pattern.into());
        self
    }

    pub fn with_drop_incomplete_rows(mut self, drop: bool) -> Self {
        self.drop_incomplete_rows = drop;
        self
    }

    pub fn with_methods(mut self, methods: Vec<DecompositionMethod>) -> Self {
        self.methods = methods;
        self
    }

    pub fn with_failure_policy(mut self, policy: WindowFailurePolicy) -> Self {
        self.summarizer.failure_policy = policy;
        self
    }

    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.summarizer.max_rows = max_rows;
        self
    }

    /// Resolve the column selection against a frame with `ncols` series.
    pub fn column_bounds(&self, ncols: usize) -> (usize, usize) {
        (self.col_first.unwrap_or(1), self.col_last.unwrap_or(ncols))
    }

    /// Check the settings that do not depend on the data.
    ///
    /// Window length against the row count and the column range against the
    /// series count are checked when the analysis runs.
    pub fn validate(&self) -> Result<()> {
        if self.window < 2 {
            return Err(NltsaError::invalid_parameter(
                "window",
                format!("must be at least 2, got {}", self.window),
            ));
        }
        self.range.validate()?;
        if !self.peak_k.is_finite() || self.peak_k < 0.0 {
            return Err(NltsaError::invalid_parameter(
                "peak_k",
                format!("must be a finite non-negative multiplier, got {}", self.peak_k),
            ));
        }
        if self.col_first == Some(0) {
            return Err(NltsaError::invalid_parameter(
                "col_first",
                "columns are 1-indexed",
            ));
        }
        if let (Some(first), Some(last)) = (self.col_first, self.col_last) {
            if first > last {
                return Err(NltsaError::invalid_parameter(
                    "col_last",
                    format!("must not precede col_first ({} > {})", first, last),
                ));
            }
        }
        if self.summarizer.max_rows == 0 {
            return Err(NltsaError::invalid_parameter(
                "max_rows",
                "must be positive",
            ));
        }
        Ok(())
    }

    /// Parse and validate a JSON config.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| NltsaError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| NltsaError::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| NltsaError::InvalidConfig(e.to_string()))
    }
}
