//! Chunk transition predictors.
//!
//! This module contains the interface and implementations for the per-chunk
//! Markov rows that learn "after chunk A, chunk B is likely next".
//!
//! Every row keeps three ranked `(successor, frequency)` slots. Rows are
//! allocated lazily by [`ClusterAllocator`] the first time a transition out of
//! their chunk is observed.

/// Lazily allocated, cluster-grouped store of rows.
pub mod allocator;

/// Confidence-gated row with adaptive weighting and decay.
pub mod confidence;

/// Plain three-slot Markov row.
pub mod mcrow;

pub use self::allocator::{ClusterAllocator, ROW_BYTES};
pub use self::confidence::ConfidenceRow;
pub use self::mcrow::McRow;

use std::cmp::Reverse;
use std::fmt;

use crate::common::ChunkId;

/// Number of candidate successors a row tracks.
pub const SLOTS: usize = 3;

/// Trait for chunk transition predictors.
///
/// A predictor observes the successor of its owning chunk on every transition
/// and names at most one chunk it expects next. Both the plain `McRow` and
/// the confidence-gated variant implement it, so the engine can be
/// instantiated with either.
pub trait TransitionPredictor: Default + fmt::Debug + Send {
    /// Report name of a CluMP engine built on this predictor.
    const ENGINE_NAME: &'static str;

    /// Records that `successor` followed the owning chunk.
    fn update(&mut self, successor: ChunkId);

    /// The single most likely successor, if any.
    fn predict(&self) -> Option<ChunkId>;

    /// Blocks to prefetch for a prediction, given the engine's window.
    ///
    /// `None` withholds the prefetch even though `predict` named a chunk.
    /// The default always prefetches the full window.
    fn prefetch_window(&self, window: u64) -> Option<u64> {
        Some(window)
    }

    /// Current slots, highest ranked first.
    fn slots(&self) -> [Slot; SLOTS];
}

/// One candidate successor.
///
/// An empty slot has no chunk and zero frequency.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Slot {
    /// Successor chunk, or `None` for an empty slot.
    pub chunk: Option<ChunkId>,
    /// Reinforcement count.
    pub frequency: u32,
    /// Row-local time of the last reinforcement; ranks equal frequencies.
    stamp: u64,
}

impl Slot {
    /// Returns `true` if the slot holds no successor.
    pub const fn is_empty(&self) -> bool {
        self.chunk.is_none()
    }
}

/// Three slots kept sorted by `(frequency desc, last update desc)`.
///
/// Shared by both predictors; only the weight they add and the way they
/// gate `predict` differ.
#[derive(Clone, Debug, Default)]
pub(crate) struct RankedSlots {
    slots: [Slot; SLOTS],
    clock: u64,
}

impl RankedSlots {
    /// Reinforces `successor` by `weight`, or replaces the lowest slot with it.
    pub(crate) fn reinforce(&mut self, successor: ChunkId, weight: u32) {
        self.clock += 1;
        let clock = self.clock;

        if let Some(slot) = self.slots.iter_mut().find(|s| s.chunk == Some(successor)) {
            slot.frequency = slot.frequency.saturating_add(weight);
            slot.stamp = clock;
        } else {
            self.slots[SLOTS - 1] = Slot {
                chunk: Some(successor),
                frequency: weight,
                stamp: clock,
            };
        }

        self.sort();
    }

    /// Applies `f` to the frequency of every occupied slot, then re-sorts.
    pub(crate) fn rescale(&mut self, f: impl Fn(u32) -> u32) {
        for slot in self.slots.iter_mut().filter(|s| !s.is_empty()) {
            slot.frequency = f(slot.frequency);
        }
        self.sort();
    }

    /// Highest ranked chunk with non-zero frequency.
    pub(crate) fn top(&self) -> Option<ChunkId> {
        let first = self.slots[0];
        if first.frequency > 0 { first.chunk } else { None }
    }

    pub(crate) const fn first(&self) -> Slot {
        self.slots[0]
    }

    pub(crate) const fn slots(&self) -> [Slot; SLOTS] {
        self.slots
    }

    fn sort(&mut self) {
        self.slots
            .sort_unstable_by_key(|s| (Reverse(s.frequency), Reverse(s.stamp)));
    }
}
