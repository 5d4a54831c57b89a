//! Error types for windowed complexity analysis.

use thiserror::Error;

/// Errors returned by the analysis components.
///
/// Every variant is a local, recoverable condition. Nothing in the crate
/// retries internally: all computations are deterministic given their inputs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NltsaError {
    #[error("Invalid window: length {window} with {rows} available rows (need 2 <= window <= rows)")]
    InvalidWindow { window: usize, rows: usize },

    #[error("Misaligned series: {0}")]
    MisalignedSeries(String),

    #[error("Insufficient columns: none of {total} columns has more than {min_valid_rows} valid rows")]
    InsufficientColumns { total: usize, min_valid_rows: usize },

    #[error("Decomposition failed: {method} on window {window}: {reason}")]
    DecompositionFailed {
        method: String,
        window: usize,
        reason: String,
    },

    #[error("Invalid parameter: {name} - {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("Shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: String, got: String },

    #[error("Input too large: {rows} rows exceeds the limit of {max_rows}")]
    TooLarge { rows: usize, max_rows: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl NltsaError {
    pub(crate) fn invalid_parameter(name: &str, reason: impl Into<String>) -> Self {
        NltsaError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type for analysis operations.
pub type Result<T> = std::result::Result<T, NltsaError>;
