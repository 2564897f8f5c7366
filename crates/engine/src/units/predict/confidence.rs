//! Confidence-Gated Transition Row.
//!
//! A variant of the MCRow that only predicts once it trusts itself. It keeps
//! the same three ranked slots and adds:
//! 1. **Adaptive weight:** A learning rate in `[0.5, 2.0]` grows after correct top-slot guesses and shrinks after wrong ones; each update adds `max(1, floor(rate))`.
//! 2. **Decay:** Every 100 updates all counts are scaled by 0.99 (never below 1), so stale successors fade.
//! 3. **Gate:** `predict` stays silent until the top count reaches 3, and while recent accuracy is below 30%.
//! 4. **Prefetch sizing:** A prediction only prefetches above 0.4 confidence, with the window scaled by `min(2 * confidence, 1)` and floored at four blocks.
//!
//! # Performance
//!
//! - **Time Complexity:** `update()` and `predict()` are O(1).
//! - **Space Complexity:** Modeled at the same 24-byte row size as `McRow`; the extra state is simulator bookkeeping.

use super::{RankedSlots, SLOTS, Slot, TransitionPredictor};
use crate::common::ChunkId;

/// Minimum top-slot frequency before any prediction is made.
const MIN_FREQUENCY: u32 = 3;

/// Number of recent outcomes considered for accuracy.
const HISTORY_DEPTH: u32 = 10;

/// Mask selecting the last `HISTORY_DEPTH` outcomes.
const HISTORY_MASK: u16 = (1 << HISTORY_DEPTH) - 1;

/// Recent accuracy below which predictions are withheld.
const MIN_ACCURACY: f64 = 0.3;

/// Confidence at or below which a prediction prefetches nothing.
const PREFETCH_CONFIDENCE: f64 = 0.4;

/// Smallest scaled prefetch window, unless the engine window is smaller.
const MIN_PREFETCH_WINDOW: u64 = 4;

/// Outcomes needed before `confidence` trusts the history over a neutral 0.5.
const CONFIDENCE_HISTORY: u64 = 5;

/// Updates between two decay passes.
const DECAY_PERIOD: u64 = 100;

const RATE_MIN: f64 = 0.5;
const RATE_MAX: f64 = 2.0;
const RATE_GROWTH: f64 = 1.05;
const RATE_SHRINK: f64 = 0.95;

/// Three-slot row with adaptive weighting, periodic decay and an accuracy gate.
#[derive(Clone, Debug)]
pub struct ConfidenceRow {
    ranked: RankedSlots,
    learning_rate: f64,
    updates: u64,
    /// Bit `i` is set if the `i`-th most recent top-slot guess was right.
    outcomes: u16,
    /// Number of outcomes recorded so far.
    observed: u64,
}

impl Default for ConfidenceRow {
    fn default() -> Self {
        Self {
            ranked: RankedSlots::default(),
            learning_rate: 1.0,
            updates: 0,
            outcomes: 0,
            observed: 0,
        }
    }
}

impl ConfidenceRow {
    /// Creates a row with all slots empty and a neutral learning rate.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current learning rate.
    pub const fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    /// Fraction of the last ten top-slot guesses that were right.
    ///
    /// `None` until more than ten outcomes exist.
    pub fn recent_accuracy(&self) -> Option<f64> {
        (self.observed > u64::from(HISTORY_DEPTH))
            .then(|| f64::from((self.outcomes & HISTORY_MASK).count_ones()) / f64::from(HISTORY_DEPTH))
    }

    /// Blend of the top slot's share of all counts and recent accuracy.
    ///
    /// Accuracy counts as 0.5 until more than five outcomes exist, then it
    /// is taken over the last `min(10, outcomes)` of them.
    pub fn confidence(&self) -> f64 {
        let slots = self.ranked.slots();
        let total: u64 = slots.iter().map(|s| u64::from(s.frequency)).sum();
        if total == 0 || self.ranked.first().is_empty() {
            return 0.0;
        }
        let share = f64::from(self.ranked.first().frequency) / total as f64;
        let history = self.short_history_accuracy().unwrap_or(0.5);
        (share + history) / 2.0
    }

    fn short_history_accuracy(&self) -> Option<f64> {
        if self.observed <= CONFIDENCE_HISTORY {
            return None;
        }
        let depth = self.observed.min(u64::from(HISTORY_DEPTH)) as u32;
        let mask = (1_u16 << depth) - 1;
        Some(f64::from((self.outcomes & mask).count_ones()) / f64::from(depth))
    }

    fn record_outcome(&mut self, correct: bool) {
        self.outcomes = (self.outcomes << 1) | u16::from(correct);
        self.observed += 1;
        self.learning_rate = if correct {
            (self.learning_rate * RATE_GROWTH).min(RATE_MAX)
        } else {
            (self.learning_rate * RATE_SHRINK).max(RATE_MIN)
        };
    }
}

impl TransitionPredictor for ConfidenceRow {
    const ENGINE_NAME: &'static str = "clump-conf";

    fn update(&mut self, successor: ChunkId) {
        self.updates += 1;
        if let Some(top) = self.ranked.top() {
            self.record_outcome(top == successor);
        }

        let weight = (self.learning_rate.floor() as u32).max(1);
        self.ranked.reinforce(successor, weight);

        if self.updates % DECAY_PERIOD == 0 {
            self.ranked
                .rescale(|f| (u64::from(f) * 99 / 100).max(1) as u32);
        }
    }

    fn predict(&self) -> Option<ChunkId> {
        let top = self.ranked.first();
        if top.frequency < MIN_FREQUENCY {
            return None;
        }
        if self.recent_accuracy().is_some_and(|acc| acc < MIN_ACCURACY) {
            return None;
        }
        top.chunk
    }

    /// `None` at or below 0.4 confidence; otherwise `window` scaled by
    /// `min(2 * confidence, 1)`, never below four blocks or the window itself.
    fn prefetch_window(&self, window: u64) -> Option<u64> {
        let confidence = self.confidence();
        if confidence <= PREFETCH_CONFIDENCE {
            return None;
        }
        let scaled = (window as f64 * (confidence * 2.0).min(1.0)) as u64;
        Some(scaled.max(MIN_PREFETCH_WINDOW.min(window)))
    }

    fn slots(&self) -> [Slot; SLOTS] {
        self.ranked.slots()
    }
}
