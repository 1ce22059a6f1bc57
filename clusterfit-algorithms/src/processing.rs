//! High-level helpers for fitting many clusters.

use clusterfit_core::error::Result;
use clusterfit_core::hit::Hit;
use rayon::prelude::*;

use crate::cluster::ReconCluster;
use crate::estimator::StateEstimator;

/// Fits every cluster in parallel.
///
/// Clusters are independent (each owns its state, moments and cache), so
/// the batch is embarrassingly parallel and needs no locking.
///
/// # Errors
/// Propagates the first structural layout error; clusters built through
/// [`ReconCluster::new`] cannot produce one.
pub fn fit_clusters<H>(
    clusters: &mut [ReconCluster<H>],
    estimator: &StateEstimator,
) -> Result<()>
where
    H: Hit + Send + Sync,
{
    clusters
        .par_iter_mut()
        .try_for_each(|cluster| cluster.update_from_hits(estimator).map(|_| ()))
}

/// Fits every cluster sequentially, in order.
///
/// # Errors
/// Propagates the first structural layout error.
pub fn fit_clusters_seq<H: Hit>(
    clusters: &mut [ReconCluster<H>],
    estimator: &StateEstimator,
) -> Result<()> {
    for cluster in clusters {
        cluster.update_from_hits(estimator)?;
    }
    Ok(())
}
