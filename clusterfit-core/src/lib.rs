//! clusterfit-core: Core types for detector hit cluster fitting.
//!
//! This crate provides the foundational data model for reconstructing a
//! compact statistical description of a hit cluster: hit records, the
//! per-cluster hit collection, the fitted state with its covariance, and
//! the second-moment matrix feeding principal-axis analysis.
//!

pub mod cluster;
pub mod error;
pub mod hit;
pub mod moments;
pub mod state;

pub use cluster::Cluster;
pub use error::{Error, Result};
pub use hit::{Hit, HitData};
pub use moments::MomentMatrix;
pub use state::{ClusterState, Component, FitStatus, FitSummary, MeasuredAxes, Variance};
