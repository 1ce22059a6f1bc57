//! Cluster state: fitted values and covariance over the active components.

use nalgebra::{DMatrix, DVector, Vector3};

use crate::error::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A component of the cluster state vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Component {
    /// Total deposited energy (charge).
    EnergyDeposit,
    /// X position.
    X,
    /// Y position.
    Y,
    /// Z position.
    Z,
    /// Time.
    Time,
}

impl Component {
    /// Returns the spatial axis index (X=0, Y=1, Z=2) for position
    /// components, `None` for energy and time.
    #[must_use]
    pub fn axis_index(self) -> Option<usize> {
        match self {
            Component::X => Some(0),
            Component::Y => Some(1),
            Component::Z => Some(2),
            Component::EnergyDeposit | Component::Time => None,
        }
    }
}

/// Which spatial axes a cluster's detector geometry measures.
///
/// This is a fixed property of the detector context, decided upstream, not
/// derived from the hits themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MeasuredAxes {
    /// X is measured.
    pub x: bool,
    /// Y is measured.
    pub y: bool,
    /// Z is measured.
    pub z: bool,
}

impl MeasuredAxes {
    /// All three spatial axes measured.
    #[must_use]
    pub fn xyz() -> Self {
        Self {
            x: true,
            y: true,
            z: true,
        }
    }

    /// No spatial axis measured (energy and time only).
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Sets whether X is measured.
    #[must_use]
    pub fn with_x(mut self, x: bool) -> Self {
        self.x = x;
        self
    }

    /// Sets whether Y is measured.
    #[must_use]
    pub fn with_y(mut self, y: bool) -> Self {
        self.y = y;
        self
    }

    /// Sets whether Z is measured.
    #[must_use]
    pub fn with_z(mut self, z: bool) -> Self {
        self.z = z;
        self
    }

    /// Number of measured spatial axes.
    #[must_use]
    pub fn count(&self) -> usize {
        usize::from(self.x) + usize::from(self.y) + usize::from(self.z)
    }
}

/// Variance of a state component.
///
/// `Free` marks a component the cluster does not constrain (too few
/// independent measurements, or an axis the geometry never measures). It
/// replaces the magic-number sentinel some reconstruction codes store in
/// the covariance diagonal, so an unconstrained variance can never leak
/// into arithmetic unnoticed.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Variance {
    /// The component is constrained with this variance.
    Measured(f64),
    /// The component is unconstrained.
    Free,
}

impl Variance {
    /// Returns true for `Free`.
    #[must_use]
    pub fn is_free(&self) -> bool {
        matches!(self, Variance::Free)
    }
}

/// Outcome of a state fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum FitStatus {
    /// No successful fit has run (e.g. the hit collection was empty).
    #[default]
    NotFitted,
    /// The fit completed.
    Success,
}

/// Status, quality and degrees of freedom reported by a fit.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FitSummary {
    /// Fit status.
    pub status: FitStatus,
    /// Fit quality (1.0 for a plain weighted-statistics fit).
    pub quality: f64,
    /// Degrees of freedom, `max(1, hits - 1)`.
    pub degrees_of_freedom: u32,
}

impl FitSummary {
    /// Returns true if the fit completed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == FitStatus::Success
    }
}

/// Fitted cluster state: a value and a full symmetric covariance matrix
/// over the active components (energy, the measured spatial subset, time).
///
/// The active layout is fixed at construction from [`MeasuredAxes`];
/// energy and time are always active. Within the active layout, the fit
/// may still mark a diagonal [`Variance::Free`] when too few independent
/// hits constrain it — that flag, not any stored number, decides whether
/// the cluster measures an axis.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ClusterState {
    components: Vec<Component>,
    values: DVector<f64>,
    covariance: DMatrix<f64>,
    free: Vec<bool>,
}

impl ClusterState {
    /// Creates an unfitted state for the given geometry.
    ///
    /// All values start at zero and every variance starts `Free`.
    #[must_use]
    pub fn new(axes: MeasuredAxes) -> Self {
        let mut components = Vec::with_capacity(5);
        components.push(Component::EnergyDeposit);
        if axes.x {
            components.push(Component::X);
        }
        if axes.y {
            components.push(Component::Y);
        }
        if axes.z {
            components.push(Component::Z);
        }
        components.push(Component::Time);

        let dim = components.len();
        Self {
            components,
            values: DVector::zeros(dim),
            covariance: DMatrix::zeros(dim, dim),
            free: vec![true; dim],
        }
    }

    /// Returns the active components in state order.
    #[must_use]
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// Number of active state components (energy + measured spatial axes
    /// + time).
    ///
    /// This is the dimension of the value vector and covariance matrix,
    /// and it is distinct from [`ClusterState::spatial_dimension`]: a
    /// geometry measuring zero spatial axes still has two active
    /// components (energy and time).
    #[must_use]
    pub fn active_dimension(&self) -> usize {
        self.components.len()
    }

    /// Number of spatial axes this cluster actually constrains, i.e. with
    /// a `Measured` variance. Used for cluster classification.
    #[must_use]
    pub fn spatial_dimension(&self) -> usize {
        self.components
            .iter()
            .zip(&self.free)
            .filter(|(c, free)| c.axis_index().is_some() && !**free)
            .count()
    }

    /// Returns the state index of a component, `None` if inactive.
    #[must_use]
    pub fn index_of(&self, component: Component) -> Option<usize> {
        self.components.iter().position(|&c| c == component)
    }

    /// Returns true if the component is part of this state's layout.
    #[must_use]
    pub fn is_active(&self, component: Component) -> bool {
        self.index_of(component).is_some()
    }

    /// Returns true if the component is active and constrained.
    #[must_use]
    pub fn is_measured(&self, component: Component) -> bool {
        self.index_of(component).is_some_and(|i| !self.free[i])
    }

    /// Returns a component's fitted value, `None` if inactive.
    #[must_use]
    pub fn value(&self, component: Component) -> Option<f64> {
        self.index_of(component).map(|i| self.values[i])
    }

    /// Sets a component's fitted value.
    ///
    /// # Errors
    /// Returns [`Error::InactiveComponent`] if the component is not part
    /// of this state's layout.
    pub fn set_value(&mut self, component: Component, value: f64) -> Result<()> {
        let i = self
            .index_of(component)
            .ok_or(Error::InactiveComponent(component))?;
        self.values[i] = value;
        Ok(())
    }

    /// Returns a component's variance, `None` if inactive.
    #[must_use]
    pub fn variance(&self, component: Component) -> Option<Variance> {
        self.index_of(component).map(|i| {
            if self.free[i] {
                Variance::Free
            } else {
                Variance::Measured(self.covariance[(i, i)])
            }
        })
    }

    /// Sets a component's variance.
    ///
    /// # Errors
    /// Returns [`Error::InactiveComponent`] if the component is not part
    /// of this state's layout.
    pub fn set_variance(&mut self, component: Component, variance: Variance) -> Result<()> {
        let i = self
            .index_of(component)
            .ok_or(Error::InactiveComponent(component))?;
        match variance {
            Variance::Measured(v) => {
                self.free[i] = false;
                self.covariance[(i, i)] = v;
            }
            Variance::Free => {
                self.free[i] = true;
                self.covariance[(i, i)] = 0.0;
            }
        }
        Ok(())
    }

    /// Returns the covariance between two components.
    ///
    /// `None` when either component is inactive, or for the diagonal of a
    /// `Free` component (an unconstrained variance is not a number).
    #[must_use]
    pub fn covariance(&self, a: Component, b: Component) -> Option<f64> {
        let i = self.index_of(a)?;
        let j = self.index_of(b)?;
        if i == j && self.free[i] {
            return None;
        }
        Some(self.covariance[(i, j)])
    }

    /// Sets the covariance between two components, keeping the matrix
    /// symmetric. Setting a diagonal entry marks the component measured.
    ///
    /// # Errors
    /// Returns [`Error::InactiveComponent`] if either component is not
    /// part of this state's layout.
    pub fn set_covariance(&mut self, a: Component, b: Component, value: f64) -> Result<()> {
        let i = self.index_of(a).ok_or(Error::InactiveComponent(a))?;
        let j = self.index_of(b).ok_or(Error::InactiveComponent(b))?;
        if i == j {
            self.free[i] = false;
        }
        self.covariance[(i, j)] = value;
        self.covariance[(j, i)] = value;
        Ok(())
    }

    /// Returns the total deposited energy (0.0 before any fit).
    #[must_use]
    pub fn energy_deposit(&self) -> f64 {
        self.value(Component::EnergyDeposit).unwrap_or(0.0)
    }

    /// Returns the fitted time (0.0 before any fit).
    #[must_use]
    pub fn time(&self) -> f64 {
        self.value(Component::Time).unwrap_or(0.0)
    }

    /// Returns the fitted position, 0.0 on axes the geometry does not
    /// measure.
    #[must_use]
    pub fn position(&self) -> Vector3<f64> {
        Vector3::new(
            self.value(Component::X).unwrap_or(0.0),
            self.value(Component::Y).unwrap_or(0.0),
            self.value(Component::Z).unwrap_or(0.0),
        )
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_layout_all_axes() {
        let state = ClusterState::new(MeasuredAxes::xyz());
        assert_eq!(state.active_dimension(), 5);
        assert_eq!(
            state.components(),
            &[
                Component::EnergyDeposit,
                Component::X,
                Component::Y,
                Component::Z,
                Component::Time
            ]
        );
        // Unfitted: everything free, nothing constrained yet.
        assert_eq!(state.spatial_dimension(), 0);
        assert_eq!(state.variance(Component::X), Some(Variance::Free));
    }

    #[test]
    fn test_layout_no_spatial_axes() {
        // Energy and time survive even when the geometry measures no
        // spatial axis at all.
        let state = ClusterState::new(MeasuredAxes::none());
        assert_eq!(state.active_dimension(), 2);
        assert!(!state.is_active(Component::X));
        assert!(state.is_active(Component::EnergyDeposit));
        assert!(state.is_active(Component::Time));
        assert_eq!(state.value(Component::Y), None);
    }

    #[test]
    fn test_set_value_inactive_component_fails() {
        let mut state = ClusterState::new(MeasuredAxes::none().with_x(true));
        assert!(state.set_value(Component::X, 1.0).is_ok());
        assert!(state.set_value(Component::Y, 1.0).is_err());
    }

    #[test]
    fn test_covariance_stays_symmetric() {
        let mut state = ClusterState::new(MeasuredAxes::xyz());
        state
            .set_covariance(Component::X, Component::Time, 0.25)
            .unwrap();
        assert_eq!(state.covariance(Component::Time, Component::X), Some(0.25));
        assert_eq!(state.covariance(Component::X, Component::Time), Some(0.25));
    }

    #[test]
    fn test_free_diagonal_reads_as_none() {
        let mut state = ClusterState::new(MeasuredAxes::xyz());
        state.set_variance(Component::X, Variance::Free).unwrap();
        assert_eq!(state.covariance(Component::X, Component::X), None);
        assert!(state.variance(Component::X).unwrap().is_free());
        assert!(!state.is_measured(Component::X));

        state
            .set_variance(Component::X, Variance::Measured(4.0))
            .unwrap();
        assert_eq!(state.covariance(Component::X, Component::X), Some(4.0));
        assert_eq!(state.spatial_dimension(), 1);
    }
}
