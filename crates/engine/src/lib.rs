//! CluMP block-prefetching simulator library.
//!
//! This crate replays a sequence of storage block addresses against two
//! prefetching policies and measures how well each one feeds the page cache:
//! 1. **Prediction:** Per-chunk bounded Markov rows (`McRow`) held in a lazily allocated, cluster-indexed table.
//! 2. **Caching:** An LRU block cache that classifies every entry as demand-fetched or prefetched, and every eviction as useful or wasted.
//! 3. **Engines:** The CluMP access state machine and a window-doubling sequential readahead baseline behind one contract.
//! 4. **Simulation:** Configuration, trace parsing, seeded workload generation, run driver and statistics.

/// Common types (address mapping, errors).
pub mod common;
/// Simulator configuration (defaults, presets, hierarchical config structures).
pub mod config;
/// Access engines (CluMP and sequential readahead).
pub mod engine;
/// Trace input, workload generation and the run driver.
pub mod sim;
/// Per-run metrics and comparison reporting.
pub mod stats;
/// Building blocks of the engines: transition predictors and the prefetch cache.
pub mod units;

/// Root configuration type; use `Config::default()`, a preset, or deserialize from JSON.
pub use crate::config::Config;
/// Shared contract of every engine.
pub use crate::engine::AccessEngine;
/// CluMP engine; generic over the transition predictor strategy.
pub use crate::engine::ClumpEngine;
/// Sequential readahead baseline engine.
pub use crate::engine::ReadaheadBaseline;
/// Metrics snapshot returned by every engine.
pub use crate::stats::Metrics;
