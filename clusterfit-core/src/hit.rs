//! Hit traits and types for detector cluster fitting.

use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Core data structure for a single calibrated detector hit.
///
/// Positions are in length units, times in time units. The `size` vector
/// holds the physical half-extent of the sensitive region along each axis
/// (the hit "footprint"), and `uncertainty` the positional standard
/// deviation along each axis.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HitData {
    /// Hit position.
    pub position: Vector3<f64>,
    /// Physical half-extent of the hit along each axis.
    pub size: Vector3<f64>,
    /// Positional standard deviation along each axis.
    pub uncertainty: Vector3<f64>,
    /// Deposited charge (non-negative, proportional to energy).
    pub charge: f64,
    /// Hit time.
    pub time: f64,
    /// Time standard deviation.
    pub time_uncertainty: f64,
}

impl HitData {
    /// Creates a new hit.
    #[inline]
    #[must_use]
    pub fn new(
        position: Vector3<f64>,
        size: Vector3<f64>,
        uncertainty: Vector3<f64>,
        charge: f64,
        time: f64,
        time_uncertainty: f64,
    ) -> Self {
        Self {
            position,
            size,
            uncertainty,
            charge,
            time,
            time_uncertainty,
        }
    }
}

/// Trait for hit data from detector frontends.
///
/// This trait provides a common interface for different detector types to
/// expose their calibrated hits in a uniform way. The fitting code only
/// reads hits; ownership stays with the caller.
pub trait Hit: Send + Sync {
    /// Returns the hit position.
    fn position(&self) -> Vector3<f64>;

    /// Returns the physical half-extent along each axis.
    fn size(&self) -> Vector3<f64>;

    /// Returns the positional standard deviation along each axis.
    fn uncertainty(&self) -> Vector3<f64>;

    /// Returns the deposited charge.
    fn charge(&self) -> f64;

    /// Returns the hit time.
    fn time(&self) -> f64;

    /// Returns the time standard deviation.
    fn time_uncertainty(&self) -> f64;
}

impl Hit for HitData {
    #[inline]
    fn position(&self) -> Vector3<f64> {
        self.position
    }

    #[inline]
    fn size(&self) -> Vector3<f64> {
        self.size
    }

    #[inline]
    fn uncertainty(&self) -> Vector3<f64> {
        self.uncertainty
    }

    #[inline]
    fn charge(&self) -> f64 {
        self.charge
    }

    #[inline]
    fn time(&self) -> f64 {
        self.time
    }

    #[inline]
    fn time_uncertainty(&self) -> f64 {
        self.time_uncertainty
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_hit_data_accessors() {
        let hit = HitData::new(
            Vector3::new(1.0, 2.0, 3.0),
            Vector3::new(0.5, 0.5, 0.5),
            Vector3::new(0.3, 0.3, 0.3),
            12.0,
            100.0,
            1.5,
        );
        assert_eq!(hit.position().x, 1.0);
        assert_eq!(hit.size().z, 0.5);
        assert_eq!(hit.uncertainty().y, 0.3);
        assert!((hit.charge() - 12.0).abs() < f64::EPSILON);
        assert!((hit.time() - 100.0).abs() < f64::EPSILON);
        assert!((hit.time_uncertainty() - 1.5).abs() < f64::EPSILON);
    }
}
