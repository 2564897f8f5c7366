//! Engine building blocks.
//!
//! 1. **Predict:** Transition predictors (`McRow`, `ConfidenceRow`) and the lazy cluster allocator.
//! 2. **Cache:** The instrumented LRU prefetch cache.

/// Instrumented LRU block cache.
pub mod cache;

/// Chunk transition predictors and their allocator.
pub mod predict;
