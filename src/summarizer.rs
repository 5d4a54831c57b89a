//! Sliding-window decomposition summaries.
//!
//! Each complete trailing window of a frame (all series, `window` rows) is fed
//! to a [`DecompositionMethod`]; the window is summarized by the leading
//! component's score at its last row. Repeating this for every window gives a
//! trajectory with one value per window, labelled like the metric series.
//!
//! Windows are fitted independently and, with the `parallel` feature, on the
//! rayon pool. Results are collected by window index in either build.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::decomposition::{DecompositionMethod, FitError};
use crate::error::{NltsaError, Result};
use crate::frame::TimeFrame;
use crate::iter_maybe_parallel;
use crate::matrix::{is_missing, DataMatrix, MISSING};
use crate::window::{trailing_labels, validate_window, window_count, window_rows};
#[cfg(feature = "parallel")]
use rayon::iter::ParallelIterator;

/// Default upper bound on input rows.
pub const DEFAULT_MAX_ROWS: usize = 100_000;

/// What to do when a single window cannot be summarized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowFailurePolicy {
    /// Fail the run with the lowest-index failing window.
    #[default]
    Abort,
    /// Record the window as missing, log a warning and continue.
    Skip,
}

/// Options shared by every summarizer run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummarizerOptions {
    pub failure_policy: WindowFailurePolicy,
    /// Frames with more rows are rejected with [`NltsaError::TooLarge`].
    pub max_rows: usize,
}

impl Default for SummarizerOptions {
    fn default() -> Self {
        Self {
            failure_policy: WindowFailurePolicy::default(),
            max_rows: DEFAULT_MAX_ROWS,
        }
    }
}

impl SummarizerOptions {
    pub fn with_failure_policy(mut self, policy: WindowFailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    pub fn with_max_rows(mut self, max_rows: usize) -> Self {
        self.max_rows = max_rows;
        self
    }
}

/// One trajectory value in long form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrajectoryRecord {
    pub method: String,
    pub label: String,
    /// `None` for skipped windows.
    pub value: Option<f64>,
}

/// Per-window summaries of one or more methods.
///
/// One column per method (keyed by [`DecompositionMethod::name`]) and one row
/// per complete window, labelled by the window's trailing row.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentTrajectory {
    frame: TimeFrame,
}

impl ComponentTrajectory {
    /// Method names in column order.
    pub fn methods(&self) -> &[String] {
        self.frame.columns()
    }

    /// Trailing row label of every window.
    pub fn index(&self) -> &[String] {
        self.frame.index()
    }

    pub fn len(&self) -> usize {
        self.frame.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.frame.nrows() == 0
    }

    /// Trajectory of a single method.
    pub fn values(&self, method: &str) -> Option<&[f64]> {
        self.frame.column(method)
    }

    pub fn frame(&self) -> &TimeFrame {
        &self.frame
    }

    pub fn into_frame(self) -> TimeFrame {
        self.frame
    }

    /// Flatten to `(method, label, value)` records, method by method.
    pub fn to_long(&self) -> Vec<TrajectoryRecord> {
        self.frame
            .to_long()
            .into_iter()
            .map(|r| TrajectoryRecord {
                method: r.column,
                label: r.label,
                value: r.value,
            })
            .collect()
    }
}

impl std::fmt::Display for ComponentTrajectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ComponentTrajectory({} windows, methods: {})",
            self.len(),
            self.methods().join(", ")
        )
    }
}

/// Leading component score at the last row of `block`.
pub fn window_summary(
    block: &DataMatrix,
    method: &DecompositionMethod,
) -> std::result::Result<f64, FitError> {
    let scores = method.fit_transform(block)?;
    if scores.nrows() == 0 || scores.ncols() == 0 {
        return Err(FitError::InvalidInput(
            "decomposition returned no components".to_string(),
        ));
    }
    Ok(scores[(scores.nrows() - 1, 0)])
}

fn check_size(frame: &TimeFrame, window: usize, options: &SummarizerOptions) -> Result<()> {
    if frame.nrows() > options.max_rows {
        return Err(NltsaError::TooLarge {
            rows: frame.nrows(),
            max_rows: options.max_rows,
        });
    }
    validate_window(window, frame.nrows())?;
    if frame.ncols() == 0 {
        return Err(NltsaError::invalid_parameter(
            "frame",
            "at least one series is required",
        ));
    }
    Ok(())
}

/// Summaries for every window, in window order, after applying the policy.
fn summary_values(
    frame: &TimeFrame,
    window: usize,
    method: &DecompositionMethod,
    policy: WindowFailurePolicy,
) -> Result<Vec<f64>> {
    let values = frame.values();
    let n_windows = window_count(frame.nrows(), window);

    let outcomes: Vec<std::result::Result<f64, FitError>> = iter_maybe_parallel!(0..n_windows)
        .map(|start| window_summary(&values.row_block(window_rows(start, window)), method))
        .collect();

    let mut summaries = Vec::with_capacity(n_windows);
    for (w, outcome) in outcomes.into_iter().enumerate() {
        match outcome {
            Ok(v) => summaries.push(v),
            Err(e) => match policy {
                WindowFailurePolicy::Abort => {
                    return Err(NltsaError::DecompositionFailed {
                        method: method.name().to_string(),
                        window: w,
                        reason: e.to_string(),
                    });
                }
                WindowFailurePolicy::Skip => {
                    warn!(
                        "{} skipped window {} ending at '{}': {}",
                        method,
                        w,
                        frame.index()[w + window - 1],
                        e
                    );
                    summaries.push(MISSING);
                }
            },
        }
    }
    Ok(summaries)
}

/// Summarize every complete window of `frame` with one method.
///
/// Returns a single-column frame keyed by the method name with
/// `rows - window + 1` rows.
///
/// # Errors
/// `TooLarge` when the frame exceeds `options.max_rows`; `InvalidWindow` for
/// a window outside `2..=rows`; `DecompositionFailed` for the lowest failing
/// window under [`WindowFailurePolicy::Abort`].
pub fn summarize_windows(
    frame: &TimeFrame,
    window: usize,
    method: &DecompositionMethod,
    options: &SummarizerOptions,
) -> Result<TimeFrame> {
    check_size(frame, window, options)?;
    let summaries = summary_values(frame, window, method, options.failure_policy)?;
    let n = summaries.len();
    debug!("{} summarized {} windows of {}", method, n, frame);

    let values = DataMatrix::from_column_major(summaries, n, 1).ok_or_else(|| {
        NltsaError::ShapeMismatch {
            expected: format!("{} summaries", n),
            got: "a different length".to_string(),
        }
    })?;
    TimeFrame::new(
        trailing_labels(frame.index(), window),
        vec![method.name().to_string()],
        values,
    )
}

/// Summarize every window with each method and collect the trajectories.
///
/// # Errors
/// `InvalidParameter` for an empty method list or a method listed twice, plus
/// every error of [`summarize_windows`].
pub fn compare_methods(
    frame: &TimeFrame,
    window: usize,
    methods: &[DecompositionMethod],
    options: &SummarizerOptions,
) -> Result<ComponentTrajectory> {
    if methods.is_empty() {
        return Err(NltsaError::invalid_parameter(
            "methods",
            "at least one decomposition method is required",
        ));
    }
    for (i, m) in methods.iter().enumerate() {
        if methods[..i].iter().any(|other| other.name() == m.name()) {
            return Err(NltsaError::invalid_parameter(
                "methods",
                format!("'{}' is listed more than once", m.name()),
            ));
        }
    }
    check_size(frame, window, options)?;

    let n_windows = window_count(frame.nrows(), window);
    let mut data = Vec::with_capacity(n_windows * methods.len());
    for method in methods {
        data.extend(summary_values(frame, window, method, options.failure_policy)?);
    }
    let skipped = data.iter().filter(|v| is_missing(**v)).count();
    info!(
        "compared {} methods over {} windows ({} skipped)",
        methods.len(),
        n_windows,
        skipped
    );

    let values = DataMatrix::from_column_major(data, n_windows, methods.len()).ok_or_else(|| {
        NltsaError::ShapeMismatch {
            expected: format!("{}x{}", n_windows, methods.len()),
            got: "trajectories of different lengths".to_string(),
        }
    })?;
    let frame = TimeFrame::new(
        trailing_labels(frame.index(), window),
        methods.iter().map(|m| m.name().to_string()).collect(),
        values,
    )?;
    Ok(ComponentTrajectory { frame })
}
