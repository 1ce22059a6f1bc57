//! Principal-axis extraction and per-axis extents.
//!
//! The moment matrix is symmetric, so its eigen-decomposition yields
//! three orthogonal axes. They are ordered by decreasing spread (long,
//! major, minor), scaled by the square root of their eigenvalue so the
//! vector length encodes the spread, and oriented by a deterministic
//! sign convention.
//!
//! The sign convention is a contract, not physics: eigen-solvers choose
//! signs arbitrarily, and downstream comparisons depend on a reproducible
//! choice. The long axis is flipped so its first component of magnitude
//! above `SIGN_EPSILON` in the X, Y, Z cycle is positive; the major axis
//! uses the same rule cycled to Y, Z, X; the minor axis completes a
//! right-handed frame.

use std::cmp::Ordering;

use clusterfit_core::hit::Hit;
use clusterfit_core::moments::MomentMatrix;
use nalgebra::{SymmetricEigen, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Components smaller than this are treated as zero by the sign
/// tie-breaks (length units).
pub const SIGN_EPSILON: f64 = 1e-6;

/// Axis magnitude below which an extent is reported as zero instead of
/// dividing by a vanishing length.
const DEGENERATE_AXIS: f64 = 1e-12;

/// The three orthogonal principal axes of a cluster, ordered by
/// decreasing spread and scaled by the square root of the corresponding
/// eigenvalue.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PrincipalAxes {
    /// Direction of largest spread.
    pub long: Vector3<f64>,
    /// Direction of second-largest spread.
    pub major: Vector3<f64>,
    /// Direction of smallest spread; completes a right-handed frame.
    pub minor: Vector3<f64>,
}

/// Extracts the principal axes of a moment matrix.
#[must_use]
pub fn principal_axes(moments: &MomentMatrix) -> PrincipalAxes {
    let eigen = SymmetricEigen::new(*moments.matrix());

    let mut order = [0usize, 1, 2];
    order.sort_by(|&a, &b| {
        eigen.eigenvalues[b]
            .partial_cmp(&eigen.eigenvalues[a])
            .unwrap_or(Ordering::Equal)
    });

    let scaled = |rank: usize| -> Vector3<f64> {
        let k = order[rank];
        let v: Vector3<f64> = eigen.eigenvectors.column(k).into_owned();
        // Tiny negative eigenvalues are numerical noise on a PSD matrix.
        v * eigen.eigenvalues[k].max(0.0).sqrt()
    };

    let mut long = scaled(0);
    let mut major = scaled(1);
    let mut minor = scaled(2);

    orient(&mut long, [0, 1, 2]);
    orient(&mut major, [1, 2, 0]);
    if long.cross(&major).dot(&minor) < 0.0 {
        minor = -minor;
    }

    PrincipalAxes { long, major, minor }
}

/// Flips `axis` so that its first component of magnitude above
/// `SIGN_EPSILON` in `cycle` order is positive. If the first two cycle
/// components are both within epsilon of zero, the last one decides at
/// exactly 0.0.
fn orient(axis: &mut Vector3<f64>, cycle: [usize; 3]) {
    for (rank, &i) in cycle.iter().enumerate() {
        let c = axis[i];
        if rank == cycle.len() - 1 {
            if c < 0.0 {
                *axis = -*axis;
            }
            return;
        }
        if c > SIGN_EPSILON {
            return;
        }
        if c < -SIGN_EPSILON {
            *axis = -*axis;
            return;
        }
    }
}

/// Half-length along `axis` encompassing every hit's footprint, in units
/// of the axis's own (eigenvalue-scaled) length.
///
/// Each hit reaches `|projection| + ||footprint||` from `center`; the
/// maximum over the hits is divided by the axis magnitude.
#[must_use]
pub fn extent<H: Hit>(hits: &[H], center: &Vector3<f64>, axis: &Vector3<f64>) -> f64 {
    let magnitude = axis.norm();
    if magnitude <= DEGENERATE_AXIS {
        return 0.0;
    }
    let mut max_len = 0.0f64;
    for hit in hits {
        let diff = hit.position() - center;
        let reach = hit.size().norm() + diff.dot(axis).abs();
        max_len = max_len.max(reach);
    }
    max_len / magnitude
}
