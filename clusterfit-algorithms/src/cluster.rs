//! Fitted cluster container: state, moments and cached shape.

use std::sync::OnceLock;

use clusterfit_core::cluster::Cluster;
use clusterfit_core::error::Result;
use clusterfit_core::hit::{Hit, HitData};
use clusterfit_core::moments::MomentMatrix;
use clusterfit_core::state::{ClusterState, Component, FitSummary, MeasuredAxes, Variance};
use nalgebra::{DMatrix, Vector3};

use crate::axes::{extent, principal_axes};
use crate::estimator::StateEstimator;
use crate::moments::{charge_weighted_mean, compute_moments};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Principal axes and extents derived from the moment matrix, cached
/// between fits.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClusterShape {
    /// Direction of largest spread, scaled by the spread.
    pub long_axis: Vector3<f64>,
    /// Direction of second-largest spread.
    pub major_axis: Vector3<f64>,
    /// Direction of smallest spread (right-handed frame).
    pub minor_axis: Vector3<f64>,
    /// Maximum hit reach along the long axis, in axis lengths.
    pub long_extent: f64,
    /// Maximum hit reach along the major axis, in axis lengths.
    pub major_extent: f64,
    /// Maximum hit reach along the minor axis, in axis lengths.
    pub minor_extent: f64,
}

/// A cluster under reconstruction: its hits, fitted state, moment matrix
/// and lazily computed shape.
///
/// The shape cache is invalidated whenever the moment matrix changes and
/// recomputed on first read. Reading axes or extents before any
/// successful fit sees the zero-initialized moment matrix; fit-then-read
/// ordering is the caller's contract.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ReconCluster<H = HitData> {
    hits: Cluster<H>,
    state: ClusterState,
    moments: MomentMatrix,
    summary: FitSummary,
    #[cfg_attr(feature = "serde", serde(skip))]
    shape: OnceLock<ClusterShape>,
}

impl<H: Hit> ReconCluster<H> {
    /// Creates an unfitted cluster from grouped hits and the geometry's
    /// measured-axes declaration.
    #[must_use]
    pub fn new(hits: Cluster<H>, axes: MeasuredAxes) -> Self {
        Self {
            hits,
            state: ClusterState::new(axes),
            moments: MomentMatrix::zeros(),
            summary: FitSummary::default(),
            shape: OnceLock::new(),
        }
    }

    /// Returns the hits.
    #[must_use]
    pub fn hits(&self) -> &[H] {
        self.hits.hits()
    }

    /// Returns the fitted state.
    #[must_use]
    pub fn state(&self) -> &ClusterState {
        &self.state
    }

    /// Returns the last fit's status, quality and degrees of freedom.
    #[must_use]
    pub fn summary(&self) -> FitSummary {
        self.summary
    }

    /// Returns the moment matrix.
    #[must_use]
    pub fn moments(&self) -> &MomentMatrix {
        &self.moments
    }

    /// Re-fits the state and the moment matrix from the hits.
    ///
    /// With no hits the state and moments are left untouched and the
    /// returned summary reports the fit was skipped. The shape cache is
    /// invalidated either way.
    ///
    /// # Errors
    /// Propagates structural layout errors from the state; a cluster
    /// built through [`ReconCluster::new`] cannot produce one.
    pub fn update_from_hits(&mut self, estimator: &StateEstimator) -> Result<FitSummary> {
        self.shape.take();
        let summary = estimator.fit(self.hits.hits(), &mut self.state)?;
        self.summary = summary;
        if summary.is_success() {
            let center = self.moment_center();
            self.moments = compute_moments(self.hits.hits(), &center);
        }
        Ok(summary)
    }

    /// Replaces the moment matrix, invalidating the cached shape.
    pub fn set_moments(&mut self, moments: MomentMatrix) {
        self.shape.take();
        self.moments = moments;
    }

    /// Replaces the moment matrix from a dynamically sized matrix.
    ///
    /// # Errors
    /// Returns [`clusterfit_core::Error::ShapeMismatch`] unless the
    /// input is 3x3.
    pub fn set_moments_dyn(&mut self, moments: &DMatrix<f64>) -> Result<()> {
        let moments = MomentMatrix::try_from_dmatrix(moments)?;
        self.set_moments(moments);
        Ok(())
    }

    /// Returns the cluster shape, computing it on first access after a
    /// moment-matrix change.
    pub fn shape(&self) -> &ClusterShape {
        self.shape.get_or_init(|| {
            let axes = principal_axes(&self.moments);
            let center = self.moment_center();
            let hits = self.hits.hits();
            ClusterShape {
                long_axis: axes.long,
                major_axis: axes.major,
                minor_axis: axes.minor,
                long_extent: extent(hits, &center, &axes.long),
                major_extent: extent(hits, &center, &axes.major),
                minor_extent: extent(hits, &center, &axes.minor),
            }
        })
    }

    /// Direction of largest spread.
    pub fn long_axis(&self) -> Vector3<f64> {
        self.shape().long_axis
    }

    /// Direction of second-largest spread.
    pub fn major_axis(&self) -> Vector3<f64> {
        self.shape().major_axis
    }

    /// Direction of smallest spread.
    pub fn minor_axis(&self) -> Vector3<f64> {
        self.shape().minor_axis
    }

    /// Maximum hit reach along the long axis, in axis lengths.
    pub fn long_extent(&self) -> f64 {
        self.shape().long_extent
    }

    /// Maximum hit reach along the major axis, in axis lengths.
    pub fn major_extent(&self) -> f64 {
        self.shape().major_extent
    }

    /// Maximum hit reach along the minor axis, in axis lengths.
    pub fn minor_extent(&self) -> f64 {
        self.shape().minor_extent
    }

    /// Total deposited energy.
    #[must_use]
    pub fn energy_deposit(&self) -> f64 {
        self.state.energy_deposit()
    }

    /// Variance of the deposited energy.
    #[must_use]
    pub fn energy_deposit_variance(&self) -> Variance {
        self.state
            .variance(Component::EnergyDeposit)
            .unwrap_or(Variance::Free)
    }

    /// Fitted position (0.0 on axes the geometry does not measure).
    #[must_use]
    pub fn position(&self) -> Vector3<f64> {
        self.state.position()
    }

    /// Fitted time.
    #[must_use]
    pub fn time(&self) -> f64 {
        self.state.time()
    }

    /// Variance of the fitted time.
    #[must_use]
    pub fn time_variance(&self) -> Variance {
        self.state.variance(Component::Time).unwrap_or(Variance::Free)
    }

    /// Returns true if this cluster constrains X.
    #[must_use]
    pub fn is_x_measured(&self) -> bool {
        self.state.is_measured(Component::X)
    }

    /// Returns true if this cluster constrains Y.
    #[must_use]
    pub fn is_y_measured(&self) -> bool {
        self.state.is_measured(Component::Y)
    }

    /// Returns true if this cluster constrains Z.
    #[must_use]
    pub fn is_z_measured(&self) -> bool {
        self.state.is_measured(Component::Z)
    }

    /// Number of spatial axes this cluster constrains.
    #[must_use]
    pub fn spatial_dimension(&self) -> usize {
        self.state.spatial_dimension()
    }

    /// Center for the moment and extent computation: the fitted value on
    /// active axes, the charge-weighted hit mean elsewhere.
    fn moment_center(&self) -> Vector3<f64> {
        let state = &self.state;
        if state.is_active(Component::X)
            && state.is_active(Component::Y)
            && state.is_active(Component::Z)
        {
            return state.position();
        }
        let fallback = charge_weighted_mean(self.hits.hits());
        Vector3::new(
            state.value(Component::X).unwrap_or(fallback.x),
            state.value(Component::Y).unwrap_or(fallback.y),
            state.value(Component::Z).unwrap_or(fallback.z),
        )
    }
}
