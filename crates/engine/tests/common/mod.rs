//! Shared fixtures for simulator tests.

use clump_core::config::{ClumpConfig, Predictor, ReadaheadConfig};

/// Result type for tests that propagate setup errors with `?`.
pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Small CluMP geometry: 4-block chunks, 2-chunk clusters, 100-block cache,
/// 4-block prefetch window, 1000-block device.
pub fn clump_config() -> ClumpConfig {
    ClumpConfig {
        chunk_size_blocks: 4,
        cluster_size_chunks: 2,
        cache_capacity_blocks: 100,
        prefetch_window_blocks: 4,
        total_address_space_blocks: Some(1000),
        predictor: Predictor::McRow,
        record_self_transitions: true,
    }
}

/// Readahead baseline with a 100-block cache, window 4 to 32, threshold 2, unbounded device.
pub fn readahead_config() -> ReadaheadConfig {
    ReadaheadConfig {
        cache_capacity_blocks: 100,
        initial_window_blocks: 4,
        max_window_blocks: 32,
        sequential_threshold: 2,
        total_address_space_blocks: None,
    }
}
