//! Feature-gated parallel iteration.
//!
//! With the `parallel` feature (on by default) per-window and per-series work
//! is spread over rayon's pool; without it the same code runs sequentially.
//! Indexed rayon iterators keep their order on `collect`, so results are
//! assembled by window index in both builds.
//!
//! ```ignore
//! use crate::iter_maybe_parallel;
//!
//! let values: Vec<f64> = iter_maybe_parallel!(0..n_windows)
//!     .map(|w| summarize(w))
//!     .collect();
//! ```

/// Iterate a range or an owned collection, in parallel when `parallel` is enabled.
#[macro_export]
macro_rules! iter_maybe_parallel {
    ($expr:expr) => {{
        #[cfg(feature = "parallel")]
        {
            use rayon::iter::IntoParallelIterator;

            IntoParallelIterator::into_par_iter($expr)
        }
        #[cfg(not(feature = "parallel"))]
        {
            IntoIterator::into_iter($expr)
        }
    }};
}
