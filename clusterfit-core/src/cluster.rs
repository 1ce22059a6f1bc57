//! Hit collection for a single cluster.

use crate::hit::HitData;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An ordered collection of hits belonging to one cluster.
///
/// Which hits belong together is decided by an upstream grouping stage;
/// this container just carries them to the fitting code in order.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Cluster<H = HitData> {
    /// Hits belonging to this cluster.
    pub hits: Vec<H>,
}

impl<H> Cluster<H> {
    /// Creates an empty cluster.
    #[must_use]
    pub fn new() -> Self {
        Self { hits: Vec::new() }
    }

    /// Creates a cluster with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            hits: Vec::with_capacity(capacity),
        }
    }

    /// Adds a hit to the cluster.
    pub fn push(&mut self, hit: H) {
        self.hits.push(hit);
    }

    /// Returns the number of hits in the cluster.
    #[must_use]
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// Returns true if the cluster is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// Returns the hits as a slice.
    #[must_use]
    pub fn hits(&self) -> &[H] {
        &self.hits
    }

    /// Returns an iterator over the hits.
    pub fn iter(&self) -> impl Iterator<Item = &H> {
        self.hits.iter()
    }
}

impl<H> FromIterator<H> for Cluster<H> {
    fn from_iter<I: IntoIterator<Item = H>>(iter: I) -> Self {
        Self {
            hits: iter.into_iter().collect(),
        }
    }
}
