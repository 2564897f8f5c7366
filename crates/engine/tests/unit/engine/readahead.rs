//! Readahead Baseline Tests.
//!
//! Verifies sequential stream detection, window doubling with its ceiling,
//! reset on a jump, and that the baseline shares the cache accounting.

use clump_core::common::ConfigError;
use clump_core::config::ReadaheadConfig;
use clump_core::{AccessEngine, ReadaheadBaseline};
use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::common::{TestResult, readahead_config};

// ══════════════════════════════════════════════════════════
// 1. Construction
// ══════════════════════════════════════════════════════════

/// Each zero parameter is reported by name.
#[rstest]
#[case::cache(ReadaheadConfig { cache_capacity_blocks: 0, ..readahead_config() }, "cache_capacity_blocks")]
#[case::initial(ReadaheadConfig { initial_window_blocks: 0, ..readahead_config() }, "initial_window_blocks")]
#[case::max(ReadaheadConfig { max_window_blocks: 0, ..readahead_config() }, "max_window_blocks")]
#[case::threshold(ReadaheadConfig { sequential_threshold: 0, ..readahead_config() }, "sequential_threshold")]
fn zero_parameter_is_named(#[case] config: ReadaheadConfig, #[case] parameter: &'static str) {
    assert_eq!(
        ReadaheadBaseline::new(&config).err(),
        Some(ConfigError::ZeroParameter { parameter })
    );
}

/// An initial window above the ceiling is rejected.
#[test]
fn inverted_window_bounds_are_rejected() {
    let config = ReadaheadConfig {
        initial_window_blocks: 8,
        max_window_blocks: 4,
        ..readahead_config()
    };
    assert_eq!(
        ReadaheadBaseline::new(&config).err(),
        Some(ConfigError::WindowOrder { initial: 8, max: 4 })
    );
}

// ══════════════════════════════════════════════════════════
// 2. Stream detection
// ══════════════════════════════════════════════════════════

/// The very first access has no predecessor and prefetches nothing.
#[test]
fn first_access_does_not_prefetch() -> TestResult {
    let mut ra = ReadaheadBaseline::new(&readahead_config())?;
    assert!(!ra.process_access(0));
    assert_eq!(ra.metrics().prefetch_total, 0);
    assert_eq!(ra.window(), 4);
    Ok(())
}

/// A sequential sweep doubles the window before block 63 and ends up hitting.
#[test]
fn sequential_sweep_grows_window() -> TestResult {
    let mut ra = ReadaheadBaseline::new(&readahead_config())?;
    let mut largest = ra.window();
    for block in 0..63 {
        let _ = ra.process_access(block);
        largest = largest.max(ra.window());
    }
    assert!(largest >= 8, "window never doubled");
    assert!(ra.process_access(63));

    let m = ra.metrics();
    assert_eq!(m.total_accesses, 64);
    assert_eq!(m.cache_misses, 2, "only blocks 0 and 1 miss");
    assert!(m.prefetch_used > 0);
    Ok(())
}

/// The window doubles every `threshold` sequential accesses.
#[test]
fn window_doubles_on_threshold() -> TestResult {
    let mut ra = ReadaheadBaseline::new(&readahead_config())?;
    let windows: Vec<_> = (0..7)
        .map(|b| {
            let _ = ra.process_access(b);
            ra.window()
        })
        .collect();
    assert_eq!(windows, vec![4, 4, 8, 8, 16, 16, 32]);
    Ok(())
}

/// The window never grows past its ceiling.
#[test]
fn window_is_capped() -> TestResult {
    let config = ReadaheadConfig {
        max_window_blocks: 16,
        ..readahead_config()
    };
    let mut ra = ReadaheadBaseline::new(&config)?;
    for block in 0..200 {
        let _ = ra.process_access(block);
        assert!(ra.window() <= 16);
    }
    assert_eq!(ra.window(), 16);
    Ok(())
}

/// A jump resets the window and issues no prefetch.
#[test]
fn jump_resets_window() -> TestResult {
    let mut ra = ReadaheadBaseline::new(&readahead_config())?;
    for block in [0, 1, 2] {
        let _ = ra.process_access(block);
    }
    assert_eq!(ra.window(), 8);
    let issued = ra.metrics().prefetch_total;

    assert!(!ra.process_access(500));
    assert_eq!(ra.window(), 4);
    assert_eq!(ra.metrics().prefetch_total, issued);
    Ok(())
}

/// Backwards and repeated accesses are not sequential.
#[rstest]
#[case::backwards([10, 9])]
#[case::repeat([10, 10])]
#[case::skip([10, 12])]
fn non_sequential_pairs_do_not_prefetch(#[case] pair: [u64; 2]) -> TestResult {
    let mut ra = ReadaheadBaseline::new(&readahead_config())?;
    for block in pair {
        let _ = ra.process_access(block);
    }
    assert_eq!(ra.metrics().prefetch_total, 0);
    Ok(())
}

// ══════════════════════════════════════════════════════════
// 3. Bounds and metrics
// ══════════════════════════════════════════════════════════

/// Readahead stops at the end of the device, and out-of-range accesses are ignored.
#[test]
fn readahead_respects_address_space() -> TestResult {
    let config = ReadaheadConfig {
        total_address_space_blocks: Some(10),
        ..readahead_config()
    };
    let mut ra = ReadaheadBaseline::new(&config)?;
    let _ = ra.process_access(7);
    let _ = ra.process_access(8);
    assert_eq!(ra.metrics().prefetch_total, 1, "only block 9 is in range");

    assert!(!ra.process_access(10));
    assert_eq!(ra.metrics().total_accesses, 2);
    Ok(())
}

/// Prediction and table fields are zero for the baseline.
#[test]
fn baseline_reports_no_tables() -> TestResult {
    let mut ra = ReadaheadBaseline::new(&readahead_config())?;
    for block in (0..50).chain(0..50) {
        let _ = ra.process_access(block);
    }
    let m = AccessEngine::metrics(&ra);
    assert_eq!(m.allocated_transition_tables, 0);
    assert_eq!(m.allocated_clusters, 0);
    assert_eq!(m.memory_estimate_bytes, 0);
    assert_eq!(m.predictions_issued, 0);
    assert_eq!(m.prediction_accuracy, 0.0);
    assert_eq!(AccessEngine::name(&ra), "readahead");
    Ok(())
}
