//! Charge-weighted second-moment computation.

use clusterfit_core::hit::Hit;
use clusterfit_core::moments::MomentMatrix;
use nalgebra::{Matrix3, Vector3};

/// Charge below which an axis is considered to carry no measurements.
const MIN_CHARGE: f64 = 1e-6;

/// Computes the charge-weighted second moment of the hit positions about
/// `center`, with a finite-size correction on the diagonal.
///
/// Diagonal entries with no accumulated charge are set to
/// [`MomentMatrix::UNCONSTRAINED`] (the cluster could be anywhere in the
/// detector volume on that axis); off-diagonal entries with no charge
/// carry no correlation and stay zero.
#[must_use]
pub fn compute_moments<H: Hit>(hits: &[H], center: &Vector3<f64>) -> MomentMatrix {
    let mut moments = Matrix3::<f64>::zeros();
    let mut charge_sum = Matrix3::<f64>::zeros();

    for hit in hits {
        let charge = hit.charge();
        let diff = hit.position() - center;
        let size = hit.size();
        for row in 0..3 {
            for col in row..3 {
                moments[(row, col)] += diff[row] * diff[col] * charge;
                if row == col {
                    moments[(row, col)] += size[row] * size[row] * charge;
                }
                charge_sum[(row, col)] += charge;
            }
        }
    }

    let mut out = MomentMatrix::zeros();
    for row in 0..3 {
        for col in row..3 {
            let value = if charge_sum[(row, col)] > MIN_CHARGE {
                moments[(row, col)] / charge_sum[(row, col)]
            } else if row == col {
                MomentMatrix::UNCONSTRAINED
            } else {
                0.0
            };
            out.set(row, col, value);
        }
    }
    out
}

/// Charge-weighted mean of the hit positions, falling back to the plain
/// arithmetic mean when no charge was deposited.
#[must_use]
pub fn charge_weighted_mean<H: Hit>(hits: &[H]) -> Vector3<f64> {
    let mut sum = Vector3::zeros();
    let mut total = 0.0;
    for hit in hits {
        sum += hit.position() * hit.charge();
        total += hit.charge();
    }
    if total > MIN_CHARGE {
        return sum / total;
    }
    if hits.is_empty() {
        return Vector3::zeros();
    }
    let mut sum = Vector3::zeros();
    for hit in hits {
        sum += hit.position();
    }
    #[allow(clippy::cast_precision_loss)]
    let n = hits.len() as f64;
    sum / n
}
