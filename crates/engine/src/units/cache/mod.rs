//! Instrumented LRU Prefetch Cache.
//!
//! This module implements the fully associative block cache both engines
//! share. Besides hit/miss it records the fate of every prefetched block:
//! 1. **Recency:** An index-linked list over an entry arena; head is MRU, tail is LRU.
//! 2. **Tagging:** Each entry remembers whether it was prefetched and whether it was referenced since.
//! 3. **Accounting:** Prefetches issued, prefetches used, and prefetches evicted unused.
//!
//! # Performance
//!
//! - **Time Complexity:** `access()`, `contains()` and `insert()` are O(1) expected.
//! - **Space Complexity:** O(C) where C is the capacity in blocks.
//! - **Best Case:** Working sets smaller than the capacity.
//! - **Worst Case:** Scans larger than the capacity (every prefetch is evicted before use).

use std::collections::HashMap;

use crate::common::{BlockId, ConfigError};
use crate::stats::PrefetchStats;

/// Arena slot for one resident block.
#[derive(Clone, Debug)]
struct Entry {
    block: BlockId,
    prefetched: bool,
    used: bool,
    /// Towards MRU.
    prev: Option<usize>,
    /// Towards LRU.
    next: Option<usize>,
}

impl Entry {
    const fn new(block: BlockId, prefetched: bool) -> Self {
        Self {
            block,
            prefetched,
            used: false,
            prev: None,
            next: None,
        }
    }
}

/// Fixed-capacity LRU block cache with prefetch accounting.
///
/// Invariant: `len() <= capacity()`; `prefetch_used` and `prefetch_wasted`
/// never exceed `prefetch_total`.
#[derive(Debug)]
pub struct PrefetchCache {
    entries: Vec<Entry>,
    index: HashMap<BlockId, usize>,
    head: Option<usize>,
    tail: Option<usize>,
    capacity: usize,

    prefetch_total: u64,
    prefetch_used: u64,
    /// Prefetched blocks evicted before any reference.
    prefetch_evicted_unused: u64,
    /// Resident prefetched blocks not yet referenced.
    prefetch_pending: u64,
    evictions: u64,
}

impl PrefetchCache {
    /// Creates an empty cache.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Maximum number of resident blocks.
    ///
    /// # Errors
    ///
    /// `ConfigError::ZeroParameter` if `capacity` is zero.
    pub fn new(capacity: u64) -> Result<Self, ConfigError> {
        ConfigError::require_positive("cache_capacity_blocks", capacity)?;
        let capacity = usize::try_from(capacity).unwrap_or(usize::MAX);
        // Large caches are rarely filled by short traces; grow lazily past 64K.
        let reserve = capacity.min(1 << 16);
        Ok(Self {
            entries: Vec::with_capacity(reserve),
            index: HashMap::with_capacity(reserve),
            head: None,
            tail: None,
            capacity,
            prefetch_total: 0,
            prefetch_used: 0,
            prefetch_evicted_unused: 0,
            prefetch_pending: 0,
            evictions: 0,
        })
    }

    /// Looks up a block on behalf of a demand access.
    ///
    /// On a hit the block becomes most recent; the first hit on a prefetched
    /// block counts it as used.
    ///
    /// # Returns
    ///
    /// `true` on a hit. On a miss the caller decides whether to `insert`.
    pub fn access(&mut self, block: BlockId) -> bool {
        let Some(&idx) = self.index.get(&block) else {
            return false;
        };
        self.touch(idx);

        let entry = &mut self.entries[idx];
        if entry.prefetched && !entry.used {
            entry.used = true;
            self.prefetch_used += 1;
            self.prefetch_pending -= 1;
        }
        true
    }

    /// Returns `true` if the block is resident. Does not change recency or flags.
    pub fn contains(&self, block: BlockId) -> bool {
        self.index.contains_key(&block)
    }

    /// Installs a block as most recent.
    ///
    /// If the block is already resident its prefetch flag is OR-ed with
    /// `is_prefetch` and its used flag is kept. A demand block re-tagged this
    /// way counts once toward `total`, so `used` and `wasted` stay bounded by
    /// it. Otherwise, when the cache is full, the least recently used block
    /// is evicted first.
    ///
    /// # Arguments
    ///
    /// * `block` - Block to install.
    /// * `is_prefetch` - `true` for speculative fetches, `false` for demand fetches.
    pub fn insert(&mut self, block: BlockId, is_prefetch: bool) {
        if let Some(&idx) = self.index.get(&block) {
            let entry = &mut self.entries[idx];
            // Only the false -> true flip counts; later re-tags are no-ops.
            if is_prefetch && !entry.prefetched {
                entry.prefetched = true;
                self.prefetch_total += 1;
                if !entry.used {
                    self.prefetch_pending += 1;
                }
            }
            self.touch(idx);
            return;
        }

        let idx = if self.index.len() < self.capacity {
            self.entries.push(Entry::new(block, is_prefetch));
            self.entries.len() - 1
        } else {
            let victim = self.evict_lru();
            self.entries[victim] = Entry::new(block, is_prefetch);
            victim
        };

        if is_prefetch {
            self.prefetch_total += 1;
            self.prefetch_pending += 1;
        }
        let _ = self.index.insert(block, idx);
        self.push_front(idx);
    }

    /// Prefetch accounting, reconciled for reporting.
    ///
    /// Resident prefetched blocks that were never referenced are counted as
    /// wasted here without changing any live state.
    pub const fn stats(&self) -> PrefetchStats {
        PrefetchStats {
            total: self.prefetch_total,
            used: self.prefetch_used,
            wasted: self.prefetch_evicted_unused + self.prefetch_pending,
            evicted_unused: self.prefetch_evicted_unused,
        }
    }

    /// Number of resident blocks.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns `true` if no block is resident.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Maximum number of resident blocks.
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Total evictions so far.
    pub const fn evictions(&self) -> u64 {
        self.evictions
    }

    /// Resident blocks from most to least recently used.
    pub fn iter(&self) -> impl Iterator<Item = BlockId> + '_ {
        std::iter::successors(self.head, |&idx| self.entries[idx].next)
            .map(|idx| self.entries[idx].block)
    }

    /// Removes the LRU entry and returns its now free arena slot.
    fn evict_lru(&mut self) -> usize {
        // Only called when full, and capacity is non-zero.
        let victim = self.tail.unwrap_or_default();
        self.unlink(victim);

        let entry = &self.entries[victim];
        let _ = self.index.remove(&entry.block);
        if entry.prefetched && !entry.used {
            self.prefetch_evicted_unused += 1;
            self.prefetch_pending -= 1;
        }
        self.evictions += 1;
        tracing::trace!(
            block = entry.block,
            wasted = entry.prefetched && !entry.used,
            "evict"
        );
        victim
    }

    fn touch(&mut self, idx: usize) {
        if self.head != Some(idx) {
            self.unlink(idx);
            self.push_front(idx);
        }
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = (self.entries[idx].prev, self.entries[idx].next);
        match prev {
            Some(p) => self.entries[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.entries[n].prev = prev,
            None => self.tail = prev,
        }
        self.entries[idx].prev = None;
        self.entries[idx].next = None;
    }

    fn push_front(&mut self, idx: usize) {
        self.entries[idx].prev = None;
        self.entries[idx].next = self.head;
        if let Some(h) = self.head {
            self.entries[h].prev = Some(idx);
        }
        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }
    }
}
