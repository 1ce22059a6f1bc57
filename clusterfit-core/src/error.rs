//! Error types for clusterfit-core.

use thiserror::Error;

use crate::state::Component;

/// Result type alias for clusterfit operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for clusterfit operations.
///
/// Numerically degenerate but physically valid situations (an axis with
/// no measurements, a pair with zero accumulated weight) are handled by
/// policy inside the fit and never surface here; these variants cover
/// structural contract violations only.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A moment matrix of the wrong dimensionality was supplied.
    #[error("moment matrix shape mismatch: expected 3x3, got {rows}x{cols}")]
    ShapeMismatch {
        /// Supplied row count.
        rows: usize,
        /// Supplied column count.
        cols: usize,
    },

    /// A state component outside the cluster's active layout was accessed.
    #[error("component {0:?} is not active in this cluster state")]
    InactiveComponent(Component),
}
