//! Weighted-statistics state estimator.
//!
//! Fits the cluster state (energy, measured position axes, time) and its
//! full covariance from a hit collection. Position and time averages are
//! charge-weighted and inverse-variance-weighted; the covariance is
//! estimated in two stages (raw weighted spread, then conversion to the
//! standard error of the mean via the effective degrees of freedom), with
//! a finite-hit-size correction on the diagonal and a Poisson variance
//! for the deposited energy.

use clusterfit_core::error::Result;
use clusterfit_core::hit::Hit;
use clusterfit_core::state::{ClusterState, Component, FitStatus, FitSummary, Variance};
use nalgebra::{DMatrix, DVector};

/// Configuration for the state estimator.
#[derive(Clone, Debug)]
pub struct FitConfig {
    /// Weight position/time averages by deposited charge in addition to
    /// inverse variance.
    pub energy_weighted: bool,
    /// Minimum effective degrees of freedom for a covariance entry to be
    /// kept; below this, diagonals become `Free` and off-diagonals zero.
    pub dof_threshold: f64,
    /// Accumulated precision below which an axis is treated as carrying
    /// no measurements (skips the finite-size correction).
    pub min_weight: f64,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            energy_weighted: true,
            dof_threshold: 0.9,
            min_weight: 1e-8,
        }
    }
}

impl FitConfig {
    /// Sets charge weighting of the position/time averages.
    #[must_use]
    pub fn with_energy_weighted(mut self, energy_weighted: bool) -> Self {
        self.energy_weighted = energy_weighted;
        self
    }

    /// Sets the degrees-of-freedom threshold.
    #[must_use]
    pub fn with_dof_threshold(mut self, threshold: f64) -> Self {
        self.dof_threshold = threshold;
        self
    }

    /// Sets the negligible-precision threshold.
    #[must_use]
    pub fn with_min_weight(mut self, min_weight: f64) -> Self {
        self.min_weight = min_weight;
        self
    }
}

/// Weighted-statistics estimator for the cluster state.
#[derive(Clone, Debug, Default)]
pub struct StateEstimator {
    config: FitConfig,
}

/// Per-hit sample for the covariance passes: deviation from the mean, its
/// standard deviation, and the footprint entering the effective
/// degrees-of-freedom count.
#[derive(Clone, Copy, Default)]
struct Sample {
    delta: f64,
    sigma: f64,
    footprint: f64,
}

impl StateEstimator {
    /// Creates an estimator with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an estimator with a custom configuration.
    #[must_use]
    pub fn with_config(config: FitConfig) -> Self {
        Self { config }
    }

    /// Returns the current configuration.
    #[must_use]
    pub fn config(&self) -> &FitConfig {
        &self.config
    }

    /// Fits `state` from `hits`.
    ///
    /// An empty hit collection is a no-op: the state is left untouched
    /// and the returned summary carries [`FitStatus::NotFitted`]. Axes
    /// with zero accumulated weight or too few effective degrees of
    /// freedom are marked [`Variance::Free`] rather than erroring out.
    ///
    /// # Errors
    /// Only structural contract violations inside the state layout are
    /// errors; a state constructed via [`ClusterState::new`] cannot
    /// produce one.
    pub fn fit<H: Hit>(&self, hits: &[H], state: &mut ClusterState) -> Result<FitSummary> {
        if hits.is_empty() {
            return Ok(FitSummary::default());
        }

        let components: Vec<Component> = state.components().to_vec();
        let dim = components.len();

        // Pass 1: energy sum and charge-weighted, inverse-variance-weighted
        // averages of the remaining components.
        let mut sums = DVector::<f64>::zeros(dim);
        let mut norms = DVector::<f64>::zeros(dim);
        for hit in hits {
            let charge = hit.charge();
            let mass = if self.config.energy_weighted {
                charge
            } else {
                1.0
            };
            for (i, &component) in components.iter().enumerate() {
                if component == Component::EnergyDeposit {
                    sums[i] += charge;
                    norms[i] = 1.0;
                    continue;
                }
                let (value, sigma) = mean_sample(component, hit);
                let weight = 1.0 / (sigma * sigma);
                if !weight.is_finite() {
                    continue;
                }
                sums[i] += mass * value * weight;
                norms[i] += mass * weight;
            }
        }
        let mut means = DVector::<f64>::zeros(dim);
        for i in 0..dim {
            if norms[i] > 0.0 {
                means[i] = sums[i] / norms[i];
            }
        }

        // Pass 2: weighted spread and effective degrees of freedom for
        // every pair of components.
        let mut cov = DMatrix::<f64>::zeros(dim, dim);
        let mut weights = DMatrix::<f64>::zeros(dim, dim);
        let mut dof = DMatrix::<f64>::zeros(dim, dim);
        let mut samples = [Sample::default(); 5];
        for hit in hits {
            for (i, &component) in components.iter().enumerate() {
                samples[i] = spread_sample(component, hit, means[i]);
            }
            for row in 0..dim {
                for col in row..dim {
                    let r = samples[row];
                    let c = samples[col];
                    let weight = 1.0 / (r.sigma * c.sigma);
                    if weight.is_finite() {
                        cov[(row, col)] += weight * r.delta * c.delta;
                        weights[(row, col)] += weight;
                    }
                    // Each hit contributes fractional degrees of freedom
                    // according to its footprint; time has no physical
                    // size, so the time-time entry counts one per hit.
                    let degrees = if components[row] == Component::Time
                        && components[col] == Component::Time
                    {
                        1.0
                    } else {
                        4.0 * r.footprint * c.footprint / (12.0 * r.sigma * c.sigma)
                    };
                    if degrees.is_finite() {
                        dof[(row, col)] += degrees;
                    }
                }
            }
        }

        // Normalize the spread, then turn it into the uncertainty of the
        // mean. Entries with too few effective degrees of freedom cannot
        // constrain a mean: diagonals go free, off-diagonals to zero.
        let mut free = vec![false; dim];
        for row in 0..dim {
            for col in row..dim {
                if weights[(row, col)] > 0.0 {
                    cov[(row, col)] /= weights[(row, col)];
                } else {
                    cov[(row, col)] = 0.0;
                }
                if dof[(row, col)] > self.config.dof_threshold {
                    cov[(row, col)] /= dof[(row, col)].sqrt();
                } else if row == col {
                    free[row] = true;
                } else {
                    cov[(row, col)] = 0.0;
                }
            }
        }

        // Finite-hit-size correction: the nonzero footprint blurs each
        // measured diagonal by the inverse of the accumulated precision.
        let mut precision = vec![0.0f64; dim];
        for hit in hits {
            for (i, &component) in components.iter().enumerate() {
                let sigma = spread_sample(component, hit, 0.0).sigma;
                let weight = 1.0 / (sigma * sigma);
                if weight.is_finite() {
                    precision[i] += weight;
                }
            }
        }
        for i in 0..dim {
            if precision[i] < self.config.min_weight || free[i] {
                continue;
            }
            cov[(i, i)] += 1.0 / precision[i];
        }

        // The deposited energy is Poisson distributed: variance = mean,
        // regardless of what the spread passes produced.
        let e = components
            .iter()
            .position(|&c| c == Component::EnergyDeposit)
            .unwrap_or(0);
        cov[(e, e)] = means[e];
        free[e] = false;

        for (i, &component) in components.iter().enumerate() {
            state.set_value(component, means[i])?;
            for (j, &other) in components.iter().enumerate().skip(i) {
                state.set_covariance(component, other, cov[(i, j)])?;
            }
        }
        for (i, &component) in components.iter().enumerate() {
            if free[i] {
                state.set_variance(component, Variance::Free)?;
            }
        }

        #[allow(clippy::cast_possible_truncation)]
        let degrees_of_freedom = hits.len().saturating_sub(1).max(1) as u32;
        Ok(FitSummary {
            status: FitStatus::Success,
            quality: 1.0,
            degrees_of_freedom,
        })
    }
}

/// Value/uncertainty pair entering the weighted mean.
fn mean_sample<H: Hit>(component: Component, hit: &H) -> (f64, f64) {
    match component {
        Component::EnergyDeposit => (hit.charge(), 1.0),
        Component::X => (hit.position().x, hit.uncertainty().x),
        Component::Y => (hit.position().y, hit.uncertainty().y),
        Component::Z => (hit.position().z, hit.uncertainty().z),
        Component::Time => (hit.time(), hit.time_uncertainty()),
    }
}

/// Deviation/uncertainty/footprint triple entering the covariance passes.
fn spread_sample<H: Hit>(component: Component, hit: &H, mean: f64) -> Sample {
    match component {
        Component::EnergyDeposit => Sample {
            delta: hit.charge() - mean,
            sigma: hit.charge().sqrt(),
            footprint: 0.0,
        },
        Component::X => Sample {
            delta: hit.position().x - mean,
            sigma: hit.uncertainty().x,
            footprint: hit.size().x,
        },
        Component::Y => Sample {
            delta: hit.position().y - mean,
            sigma: hit.uncertainty().y,
            footprint: hit.size().y,
        },
        Component::Z => Sample {
            delta: hit.position().z - mean,
            sigma: hit.uncertainty().z,
            footprint: hit.size().z,
        },
        Component::Time => Sample {
            delta: hit.time() - mean,
            sigma: hit.time_uncertainty(),
            footprint: hit.time_uncertainty(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use clusterfit_core::hit::HitData;
    use clusterfit_core::state::MeasuredAxes;
    use nalgebra::Vector3;

    fn uniform_hit(x: f64, y: f64, z: f64, charge: f64, time: f64) -> HitData {
        HitData::new(
            Vector3::new(x, y, z),
            Vector3::new(0.5, 0.5, 0.5),
            Vector3::new(1.0, 1.0, 1.0),
            charge,
            time,
            1.0,
        )
    }

    #[test]
    fn test_empty_hits_is_noop() {
        let estimator = StateEstimator::new();
        let mut state = ClusterState::new(MeasuredAxes::xyz());
        let before = state.clone();
        let summary = estimator.fit::<HitData>(&[], &mut state).unwrap();
        assert_eq!(summary.status, FitStatus::NotFitted);
        assert_eq!(state, before);
    }

    #[test]
    fn test_uniform_hits_mean_is_arithmetic_mean() {
        // Equal charge and equal uncertainties everywhere: the weighted
        // mean must reduce to the plain arithmetic mean.
        let hits: Vec<HitData> = (0..4)
            .map(|i| uniform_hit(f64::from(i), 2.0 * f64::from(i), 0.0, 5.0, f64::from(i)))
            .collect();
        let estimator = StateEstimator::new();
        let mut state = ClusterState::new(MeasuredAxes::xyz());
        let summary = estimator.fit(&hits, &mut state).unwrap();

        assert!(summary.is_success());
        assert_relative_eq!(state.value(Component::X).unwrap(), 1.5);
        assert_relative_eq!(state.value(Component::Y).unwrap(), 3.0);
        assert_relative_eq!(state.value(Component::Z).unwrap(), 0.0);
        assert_relative_eq!(state.value(Component::Time).unwrap(), 1.5);
        assert_relative_eq!(state.value(Component::EnergyDeposit).unwrap(), 20.0);
        assert_eq!(summary.degrees_of_freedom, 3);
    }

    #[test]
    fn test_energy_variance_is_poisson() {
        let hits = vec![
            uniform_hit(0.0, 0.0, 0.0, 3.0, 0.0),
            uniform_hit(1.0, 0.0, 0.0, 7.0, 0.0),
        ];
        let estimator = StateEstimator::new();
        let mut state = ClusterState::new(MeasuredAxes::xyz());
        estimator.fit(&hits, &mut state).unwrap();

        assert_eq!(
            state.variance(Component::EnergyDeposit),
            Some(Variance::Measured(10.0))
        );
    }

    #[test]
    fn test_single_hit_spatial_axes_are_free() {
        let hits = vec![uniform_hit(1.0, 2.0, 3.0, 9.0, 5.0)];
        let estimator = StateEstimator::new();
        let mut state = ClusterState::new(MeasuredAxes::xyz());
        let summary = estimator.fit(&hits, &mut state).unwrap();

        assert!(summary.is_success());
        assert_eq!(summary.degrees_of_freedom, 1);
        // One hit with a footprint of 0.5 and sigma 1.0 contributes
        // 0.25/3 effective dof per spatial diagonal: below threshold.
        for c in [Component::X, Component::Y, Component::Z] {
            assert_eq!(state.variance(c), Some(Variance::Free));
        }
        // Time is forced to one degree of freedom per hit, so it stays
        // measured: zero spread plus the finite-size term sigma_t^2.
        assert_eq!(
            state.variance(Component::Time),
            Some(Variance::Measured(1.0))
        );
        assert_eq!(
            state.variance(Component::EnergyDeposit),
            Some(Variance::Measured(9.0))
        );
        assert_eq!(state.spatial_dimension(), 0);
    }

    #[test]
    fn test_unmeasured_axes_stay_out_of_state() {
        let hits = vec![
            uniform_hit(0.0, 5.0, 0.0, 1.0, 0.0),
            uniform_hit(10.0, 5.0, 0.0, 1.0, 0.0),
        ];
        let estimator = StateEstimator::new();
        let mut state = ClusterState::new(MeasuredAxes::none().with_x(true));
        let summary = estimator.fit(&hits, &mut state).unwrap();

        assert!(summary.is_success());
        assert_eq!(state.active_dimension(), 3);
        assert_relative_eq!(state.value(Component::X).unwrap(), 5.0);
        assert_eq!(state.value(Component::Y), None);
        assert_eq!(state.value(Component::Z), None);
    }

    #[test]
    fn test_zero_spatial_axes_boundary() {
        // A geometry measuring no spatial axis still fits energy and time.
        let hits = vec![
            uniform_hit(0.0, 0.0, 0.0, 4.0, 10.0),
            uniform_hit(0.0, 0.0, 0.0, 4.0, 12.0),
        ];
        let estimator = StateEstimator::new();
        let mut state = ClusterState::new(MeasuredAxes::none());
        let summary = estimator.fit(&hits, &mut state).unwrap();

        assert!(summary.is_success());
        assert_eq!(state.active_dimension(), 2);
        assert_relative_eq!(state.energy_deposit(), 8.0);
        assert_relative_eq!(state.time(), 11.0);
        assert_eq!(state.spatial_dimension(), 0);
    }

    #[test]
    fn test_unweighted_mean_ignores_charge() {
        let a = uniform_hit(0.0, 0.0, 0.0, 30.0, 0.0);
        let b = uniform_hit(10.0, 0.0, 0.0, 10.0, 0.0);

        let estimator =
            StateEstimator::with_config(FitConfig::default().with_energy_weighted(false));
        let mut state = ClusterState::new(MeasuredAxes::xyz());
        estimator.fit(&[a, b], &mut state).unwrap();
        // Plain inverse-variance average with equal sigmas: midpoint.
        assert_relative_eq!(state.value(Component::X).unwrap(), 5.0);

        let estimator = StateEstimator::new();
        let mut state = ClusterState::new(MeasuredAxes::xyz());
        estimator.fit(&[a, b], &mut state).unwrap();
        // Charge-weighted: pulled toward the heavy hit.
        assert_relative_eq!(state.value(Component::X).unwrap(), 2.5);
    }

    #[test]
    fn test_covariance_symmetry() {
        let hits: Vec<HitData> = (0..6)
            .map(|i| {
                uniform_hit(
                    f64::from(i),
                    f64::from(i % 3),
                    -f64::from(i),
                    2.0 + f64::from(i),
                    f64::from(i) * 0.5,
                )
            })
            .collect();
        let estimator = StateEstimator::new();
        let mut state = ClusterState::new(MeasuredAxes::xyz());
        estimator.fit(&hits, &mut state).unwrap();

        let components = state.components().to_vec();
        for &a in &components {
            for &b in &components {
                assert_eq!(state.covariance(a, b), state.covariance(b, a));
            }
        }
    }
}
