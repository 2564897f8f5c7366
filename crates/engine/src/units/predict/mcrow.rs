//! Markov Chain Row (MCRow).
//!
//! The per-chunk transition record of CluMP. It holds three candidate
//! successor chunks (`CN1..CN3`) with their frequencies (`P1..P3`):
//! 1. **Reinforce:** A successor already held gains one count.
//! 2. **Replace:** An unseen successor overwrites the third slot with a count of one.
//! 3. **Rank:** Slots are re-sorted after every update by frequency, most recent update first on ties.
//!
//! # Performance
//!
//! - **Time Complexity:** `update()` and `predict()` are O(1); the sort runs over exactly three slots.
//! - **Space Complexity:** Modeled as 24 bytes per row (three chunk ids and three counters).

use super::{RankedSlots, SLOTS, Slot, TransitionPredictor};
use crate::common::ChunkId;

/// Three-slot frequency-ranked transition row.
///
/// Invariant: `slots()[0].frequency >= slots()[1].frequency >= slots()[2].frequency`,
/// and no successor appears in two slots.
#[derive(Clone, Debug, Default)]
pub struct McRow {
    ranked: RankedSlots,
}

impl McRow {
    /// Creates a row with all slots empty.
    pub fn new() -> Self {
        Self::default()
    }
}

impl TransitionPredictor for McRow {
    const ENGINE_NAME: &'static str = "clump";

    /// Records one transition to `successor`.
    fn update(&mut self, successor: ChunkId) {
        self.ranked.reinforce(successor, 1);
    }

    /// Returns `CN1` if its frequency is non-zero.
    fn predict(&self) -> Option<ChunkId> {
        self.ranked.top()
    }

    fn slots(&self) -> [Slot; SLOTS] {
        self.ranked.slots()
    }
}
