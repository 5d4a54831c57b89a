//! Complexity resonance: co-occurrence of fluctuation and uniformity.

use log::debug;

use crate::error::{NltsaError, Result};
use crate::frame::TimeFrame;
use crate::matrix::DataMatrix;

/// Element-wise product of aligned fluctuation-intensity and
/// distribution-uniformity frames.
///
/// Resonance is high only where a series is both strongly fluctuating and
/// evenly distributed inside the window. Both inputs must come from the same
/// scaled frame, window length and range; differing shapes, row labels or
/// series keys are rejected with
/// [`NltsaError::MisalignedSeries`](crate::NltsaError::MisalignedSeries).
/// A missing cell in either input is missing in the output.
pub fn complexity_resonance(fluctuation: &TimeFrame, uniformity: &TimeFrame) -> Result<TimeFrame> {
    fluctuation.ensure_aligned(uniformity)?;
    let product: Vec<f64> = fluctuation
        .values()
        .as_slice()
        .iter()
        .zip(uniformity.values().as_slice())
        .map(|(&a, &b)| a * b)
        .collect();
    let (nrows, ncols) = fluctuation.values().shape();
    debug!("resonance over {}x{}", nrows, ncols);
    let values = DataMatrix::from_column_major(product, nrows, ncols).ok_or_else(|| {
        NltsaError::MisalignedSeries(format!("value buffers differ from {}x{}", nrows, ncols))
    })?;
    fluctuation.with_values(values)
}
