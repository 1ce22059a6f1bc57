//! Charge-weighted second-moment matrix of a cluster.

use nalgebra::{DMatrix, Matrix3};

use crate::error::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Symmetric 3x3 charge-weighted second moment of hit positions about the
/// fitted mean (X, Y, Z only, independent of which axes are measured).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MomentMatrix(Matrix3<f64>);

impl MomentMatrix {
    /// Diagonal value for an axis with no charge measured: the cluster is
    /// treated as spread over the entire detector volume instead of being
    /// spuriously tight.
    pub const UNCONSTRAINED: f64 = 1e9;

    /// Creates a zero moment matrix.
    #[must_use]
    pub fn zeros() -> Self {
        Self(Matrix3::zeros())
    }

    /// Wraps an existing symmetric matrix.
    ///
    /// The lower triangle is mirrored from the upper one, so a slightly
    /// asymmetric input cannot produce an asymmetric moment matrix.
    #[must_use]
    pub fn from_matrix(m: Matrix3<f64>) -> Self {
        let mut out = Self(m);
        for row in 0..3 {
            for col in row..3 {
                out.0[(col, row)] = out.0[(row, col)];
            }
        }
        out
    }

    /// Builds a moment matrix from a dynamically sized matrix, as handed
    /// over by persistence layers.
    ///
    /// # Errors
    /// Returns [`Error::ShapeMismatch`] unless the input is 3x3. A wrong
    /// shape means the caller and this library disagree on the moment
    /// dimensionality, which is a programming error and fails loudly.
    pub fn try_from_dmatrix(m: &DMatrix<f64>) -> Result<Self> {
        if m.nrows() != 3 || m.ncols() != 3 {
            return Err(Error::ShapeMismatch {
                rows: m.nrows(),
                cols: m.ncols(),
            });
        }
        Ok(Self::from_matrix(Matrix3::from_fn(|r, c| m[(r, c)])))
    }

    /// Returns one entry.
    #[inline]
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.0[(row, col)]
    }

    /// Sets one entry, mirroring to keep the matrix symmetric.
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.0[(row, col)] = value;
        self.0[(col, row)] = value;
    }

    /// Returns the underlying matrix.
    #[inline]
    #[must_use]
    pub fn matrix(&self) -> &Matrix3<f64> {
        &self.0
    }
}
