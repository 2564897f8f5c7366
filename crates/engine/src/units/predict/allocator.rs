//! Lazy Cluster Allocator.
//!
//! Maps chunk ids to their transition rows without reserving memory for
//! chunks that never appear as the source of a transition:
//! 1. **Arena:** Rows live in a dense `Vec`.
//! 2. **Clusters:** Each cluster (`chunk / cluster_size`) holds a map from chunk offset to arena index, created with its first row.
//! 3. **Allocate on write:** Only `get_or_allocate` creates rows or clusters. `get` is a pure lookup.
//!
//! # Performance
//!
//! - **Time Complexity:** `get()` and `get_or_allocate()` are O(1) expected.
//! - **Space Complexity:** O(R) where R is the number of distinct chunks ever left by a transition.

use std::collections::HashMap;

use super::TransitionPredictor;
use crate::common::{ChunkId, ClusterId, Geometry};
use crate::stats::TableUsage;

/// Modeled size of one row: three 32-bit chunk ids and three 32-bit counters.
pub const ROW_BYTES: u64 = 24;

/// Sparse, cluster-grouped store of transition rows.
#[derive(Debug)]
pub struct ClusterAllocator<P> {
    geometry: Geometry,
    /// Cluster id to (offset in cluster to arena index).
    clusters: HashMap<ClusterId, HashMap<u64, usize>>,
    rows: Vec<P>,
}

impl<P: TransitionPredictor> ClusterAllocator<P> {
    /// Creates an empty allocator for the given geometry.
    pub fn new(geometry: Geometry) -> Self {
        Self {
            geometry,
            clusters: HashMap::new(),
            rows: Vec::new(),
        }
    }

    /// Returns the row for `chunk`, allocating an empty one on first use.
    pub fn get_or_allocate(&mut self, chunk: ChunkId) -> &mut P {
        let cluster = self
            .clusters
            .entry(self.geometry.cluster_of(chunk))
            .or_default();
        let rows = &mut self.rows;
        let idx = *cluster
            .entry(self.geometry.offset_in_cluster(chunk))
            .or_insert_with(|| {
                rows.push(P::default());
                rows.len() - 1
            });
        &mut self.rows[idx]
    }

    /// Returns the row for `chunk` if one exists. Never allocates.
    pub fn get(&self, chunk: ChunkId) -> Option<&P> {
        self.clusters
            .get(&self.geometry.cluster_of(chunk))?
            .get(&self.geometry.offset_in_cluster(chunk))
            .map(|&idx| &self.rows[idx])
    }

    /// Number of rows allocated so far.
    pub fn count_allocated(&self) -> u64 {
        self.rows.len() as u64
    }

    /// Number of clusters holding at least one row.
    pub fn cluster_count(&self) -> u64 {
        self.clusters.len() as u64
    }

    /// Rows allocated in `cluster`.
    pub fn rows_in_cluster(&self, cluster: ClusterId) -> u64 {
        self.clusters.get(&cluster).map_or(0, |c| c.len() as u64)
    }

    /// Modeled memory held by all rows.
    pub fn memory_bytes(&self) -> u64 {
        self.count_allocated() * ROW_BYTES
    }

    /// Row, cluster and memory totals for the metrics record.
    pub fn usage(&self) -> TableUsage {
        TableUsage {
            rows: self.count_allocated(),
            clusters: self.cluster_count(),
            bytes: self.memory_bytes(),
        }
    }

    /// Iterates over `(chunk, row)` pairs in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (ChunkId, &P)> + '_ {
        let cluster_size = self.geometry.cluster_size();
        self.clusters.iter().flat_map(move |(&cluster, offsets)| {
            offsets
                .iter()
                .map(move |(&offset, &idx)| (cluster * cluster_size + offset, &self.rows[idx]))
        })
    }
}
