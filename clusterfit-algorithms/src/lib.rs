//! clusterfit-algorithms: State estimation and axis analysis for hit
//! clusters.
//!
//! Two components, used in order:
//! - **State estimator** — fits the cluster state (energy, measured
//!   position axes, time) and its covariance from a hit collection.
//! - **Axis analyzer** — turns the charge-weighted second-moment matrix
//!   into three ordered, deterministically signed principal axes and
//!   per-axis extents.
//!
//! [`ReconCluster`] ties both together with a lazily cached shape.
//!
#![warn(missing_docs)]

pub mod axes;
pub mod cluster;
pub mod estimator;
pub mod moments;
pub mod processing;

pub use axes::{extent, principal_axes, PrincipalAxes, SIGN_EPSILON};
pub use cluster::{ClusterShape, ReconCluster};
pub use estimator::{FitConfig, StateEstimator};
pub use moments::{charge_weighted_mean, compute_moments};
pub use processing::{fit_clusters, fit_clusters_seq};

// Re-export the core data model.
pub use clusterfit_core::{
    Cluster, ClusterState, Component, Error, FitStatus, FitSummary, Hit, HitData, MeasuredAxes,
    MomentMatrix, Result, Variance,
};
