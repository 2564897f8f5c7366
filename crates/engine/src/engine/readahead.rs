//! Sequential Readahead Baseline.
//!
//! A model of the kernel's stream readahead that CluMP is compared against.
//! It detects strictly ascending block streams (stride +1) and prefetches
//! ahead of them:
//! 1. **Detect:** An access is sequential when it is exactly one past the previous block.
//! 2. **Grow:** Every `sequential_threshold` consecutive sequential accesses double the window, up to its ceiling.
//! 3. **Reset:** A non-sequential access drops the window back to its initial size and prefetches nothing.
//!
//! Shares the cache and metrics of the CluMP engine, so both are scored the same way.

use tracing::{debug, trace};

use super::AccessEngine;
use crate::common::{AddressSpace, BlockId, ConfigError};
use crate::config::ReadaheadConfig;
use crate::stats::{HitRateHistory, Metrics, RunCounters, TableUsage};
use crate::units::cache::PrefetchCache;

/// Readahead baseline state.
#[derive(Debug)]
pub struct ReadaheadBaseline {
    space: AddressSpace,
    initial_window: u64,
    max_window: u64,
    threshold: u64,
    /// Current window in blocks, within `[initial_window, max_window]`.
    window: u64,
    /// Consecutive sequential accesses since the last doubling or reset.
    run: u64,
    last_block: Option<BlockId>,
    cache: PrefetchCache,
    counters: RunCounters,
    history: HitRateHistory,
}

impl ReadaheadBaseline {
    /// Creates a baseline engine.
    ///
    /// # Arguments
    ///
    /// * `config` - Cache, window and threshold parameters.
    ///
    /// # Errors
    ///
    /// `ConfigError::ZeroParameter` for the first zero parameter, or
    /// `ConfigError::WindowOrder` if the initial window exceeds the maximum.
    pub fn new(config: &ReadaheadConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let cache = PrefetchCache::new(config.cache_capacity_blocks)?;
        let space = AddressSpace::from_limit(config.total_address_space_blocks);

        debug!(
            cache_capacity = cache.capacity(),
            initial_window = config.initial_window_blocks,
            max_window = config.max_window_blocks,
            threshold = config.sequential_threshold,
            address_space = ?space.limit(),
            "readahead baseline created"
        );

        Ok(Self {
            space,
            initial_window: config.initial_window_blocks,
            max_window: config.max_window_blocks,
            threshold: config.sequential_threshold,
            window: config.initial_window_blocks,
            run: 0,
            last_block: None,
            cache,
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

    /// Current readahead window in blocks.
    pub const fn window(&self) -> u64 {
        self.window
    }

    /// The engine's cache.
    pub const fn cache(&self) -> &PrefetchCache {
        &self.cache
    }

    /// Processes one demand access.
    ///
    /// # Returns
    ///
    /// `true` on a cache hit. Out-of-range blocks are skipped and return `false`.
    pub fn process_access(&mut self, block: BlockId) -> bool {
        if !self.space.contains(block) {
            trace!(block, "demand access outside address space skipped");
            return false;
        }

        let hit = self.cache.access(block);
        if !hit {
            self.cache.insert(block, false);
        }
        self.counters.record_access(hit);
        self.history.record(&self.counters);

        let sequential = self
            .last_block
            .is_some_and(|last| last.checked_add(1) == Some(block));

        if sequential {
            self.run += 1;
            if self.run >= self.threshold {
                self.window = self.window.saturating_mul(2).min(self.max_window);
                self.run = 0;
            }
            self.read_ahead(block);
        } else {
            self.run = 0;
            self.window = self.initial_window;
        }

        self.last_block = Some(block);
        hit
    }

    /// Prefetches `window` blocks following `block`.
    fn read_ahead(&mut self, block: BlockId) {
        let mut issued = 0_u64;
        for distance in 1..=self.window {
            let Some(candidate) = block.checked_add(distance) else {
                break;
            };
            if !self.space.contains(candidate) {
                trace!(block = candidate, "prefetch candidate outside address space skipped");
                break;
            }
            if self.cache.contains(candidate) {
                continue;
            }
            self.cache.insert(candidate, true);
            issued += 1;
        }
        trace!(block, window = self.window, issued, "readahead");
    }

    /// Read-only metrics snapshot; every prediction and table field is 0.
    pub fn metrics(&self) -> Metrics {
        Metrics::collect(
            &self.counters,
            self.cache.stats(),
            self.cache.evictions(),
            TableUsage::default(),
            &self.history,
        )
    }
}

impl AccessEngine for ReadaheadBaseline {
    fn name(&self) -> &'static str {
        "readahead"
    }

    fn process_access(&mut self, block: BlockId) -> bool {
        Self::process_access(self, block)
    }

    fn metrics(&self) -> Metrics {
        Self::metrics(self)
    }
}
