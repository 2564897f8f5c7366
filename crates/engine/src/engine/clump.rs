//! CluMP Engine.
//!
//! Learned chunk-level prefetching. Every demand access runs the same
//! fixed protocol:
//! 1. **Lookup:** Map the block to its chunk and query the cache, demand-fetching on a miss.
//! 2. **Learn:** Record the transition from the previous chunk in that chunk's row, allocating the row on first use.
//! 3. **Predict:** Ask the current chunk's row (without allocating) for its most likely successor and how much of it to fetch.
//! 4. **Prefetch:** Install up to that many blocks (at most `prefetch_window_blocks` for `McRow`) from the base of the predicted chunk.
//!
//! The previous chunk is the only state carried between accesses besides
//! the rows and the cache.
//!
//! # Performance
//!
//! - **Time Complexity:** O(W) per access where W is the prefetch window.
//! - **Space Complexity:** O(C + R) where C is the cache capacity and R the allocated rows.

use tracing::{debug, trace};

use super::AccessEngine;
use crate::common::{AddressSpace, BlockId, ChunkId, ConfigError, Geometry};
use crate::config::ClumpConfig;
use crate::stats::{HitRateHistory, Metrics, RunCounters};
use crate::units::cache::PrefetchCache;
use crate::units::predict::{ClusterAllocator, McRow, TransitionPredictor};

/// CluMP engine state, generic over the transition predictor.
#[derive(Debug)]
pub struct ClumpEngine<P = McRow> {
    geometry: Geometry,
    space: AddressSpace,
    /// Blocks prefetched per prediction.
    window: u64,
    /// Record `A -> A` when consecutive accesses share a chunk.
    record_self: bool,
    cache: PrefetchCache,
    tables: ClusterAllocator<P>,
    previous_chunk: Option<ChunkId>,
    /// Prediction issued on the last access, checked against the next chunk.
    pending_prediction: Option<ChunkId>,
    counters: RunCounters,
    history: HitRateHistory,
}

impl ClumpEngine<McRow> {
    /// Creates an engine with the plain three-slot `McRow` predictor.
    ///
    /// # Arguments
    ///
    /// * `config` - Geometry, cache and window parameters.
    ///
    /// # Errors
    ///
    /// `ConfigError::ZeroParameter` naming the first zero parameter, checked
    /// in the order chunk size, cluster size, cache capacity, prefetch window,
    /// address space.
    pub fn new(config: &ClumpConfig) -> Result<Self, ConfigError> {
        Self::with_predictor(config)
    }
}

impl<P: TransitionPredictor> ClumpEngine<P> {
    /// Creates an engine using predictor `P` for every row.
    ///
    /// # Errors
    ///
    /// Same as [`ClumpEngine::new`].
    pub fn with_predictor(config: &ClumpConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let geometry = Geometry::new(config.chunk_size_blocks, config.cluster_size_chunks)?;
        let cache = PrefetchCache::new(config.cache_capacity_blocks)?;
        let space = AddressSpace::from_limit(config.total_address_space_blocks);

        debug!(
            engine = P::ENGINE_NAME,
            chunk_size = geometry.chunk_size(),
            cluster_size = geometry.cluster_size(),
            cache_capacity = cache.capacity(),
            prefetch_window = config.prefetch_window_blocks,
            address_space = ?space.limit(),
            record_self_transitions = config.record_self_transitions,
            "clump engine created"
        );

        Ok(Self {
            geometry,
            space,
            window: config.prefetch_window_blocks,
            record_self: config.record_self_transitions,
            cache,
            tables: ClusterAllocator::new(geometry),
            previous_chunk: None,
            pending_prediction: None,
            counters: RunCounters::default(),
            history: HitRateHistory::new(0),
        })
    }

    /// Samples the cumulative hit rate every `interval` accesses (0 disables).
    #[must_use]
    pub fn with_history_interval(mut self, interval: u64) -> Self {
        self.history = HitRateHistory::new(interval);
        self
    }

    /// Runs one demand access through the protocol.
    ///
    /// # Arguments
    ///
    /// * `block` - The block being read.
    ///
    /// # Returns
    ///
    /// `true` on a cache hit. Out-of-range blocks are skipped and return `false`.
    pub fn process_access(&mut self, block: BlockId) -> bool {
        if !self.space.contains(block) {
            trace!(block, "demand access outside address space skipped");
            return false;
        }

        let chunk = self.geometry.chunk_of(block);
        let hit = self.cache.access(block);
        if !hit {
            self.cache.insert(block, false);
        }
        self.counters.record_access(hit);
        self.history.record(&self.counters);

        if self.pending_prediction.take() == Some(chunk) {
            self.counters.predictions_correct += 1;
        }

        if let Some(prev) = self.previous_chunk
            && (self.record_self || prev != chunk)
        {
            self.tables.get_or_allocate(prev).update(chunk);
        }

        let decision = self
            .tables
            .get(chunk)
            .and_then(|row| Some((row.predict()?, row.prefetch_window(self.window)?)));
        if let Some((predicted, window)) = decision {
            self.counters.predictions_issued += 1;
            self.pending_prediction = Some(predicted);
            self.prefetch_chunk(predicted, window);
        }

        self.previous_chunk = Some(chunk);
        hit
    }

    /// Installs the first `window` blocks of `chunk` that are in range and not cached.
    fn prefetch_chunk(&mut self, chunk: ChunkId, window: u64) {
        let base = self.geometry.chunk_base(chunk);
        let mut issued = 0_u64;
        for offset in 0..window {
            let Some(block) = base.checked_add(offset) else {
                break;
            };
            if !self.space.contains(block) {
                trace!(block, "prefetch candidate outside address space skipped");
                break;
            }
            if self.cache.contains(block) {
                continue;
            }
            self.cache.insert(block, true);
            issued += 1;
        }
        trace!(chunk, window, issued, "prefetch");
    }

    /// Read-only metrics snapshot.
    pub fn metrics(&self) -> Metrics {
        Metrics::collect(
            &self.counters,
            self.cache.stats(),
            self.cache.evictions(),
            self.tables.usage(),
            &self.history,
        )
    }

    /// The row owned by `chunk`, if one was ever allocated.
    pub fn table(&self, chunk: ChunkId) -> Option<&P> {
        self.tables.get(chunk)
    }

    /// All allocated rows.
    pub const fn tables(&self) -> &ClusterAllocator<P> {
        &self.tables
    }

    /// The engine's cache.
    pub const fn cache(&self) -> &PrefetchCache {
        &self.cache
    }

    /// Chunk of the last in-range access.
    pub const fn previous_chunk(&self) -> Option<ChunkId> {
        self.previous_chunk
    }

    /// Address mapping in use.
    pub const fn geometry(&self) -> Geometry {
        self.geometry
    }
}

impl<P: TransitionPredictor> AccessEngine for ClumpEngine<P> {
    fn name(&self) -> &'static str {
        P::ENGINE_NAME
    }

    fn process_access(&mut self, block: BlockId) -> bool {
        Self::process_access(self, block)
    }

    fn metrics(&self) -> Metrics {
        Self::metrics(self)
    }
}
