//! CluMP Engine Tests.
//!
//! Verifies the per-access protocol on a small geometry (4-block chunks,
//! 2-chunk clusters, 100-block cache, 4-block window, 1000-block device):
//! construction checks, transition learning, prefetch issuance, address
//! bounds and the metrics record.

use clump_core::common::ConfigError;
use clump_core::config::ClumpConfig;
use clump_core::units::predict::{ConfidenceRow, ROW_BYTES, TransitionPredictor};
use clump_core::{AccessEngine, ClumpEngine, Metrics};
use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::common::{TestResult, clump_config};

fn run(engine: &mut ClumpEngine, trace: &[u64]) -> Vec<bool> {
    trace.iter().map(|&b| engine.process_access(b)).collect()
}

// ══════════════════════════════════════════════════════════
// 1. Construction
// ══════════════════════════════════════════════════════════

/// Each zero parameter is reported by name.
#[rstest]
#[case::chunk(ClumpConfig { chunk_size_blocks: 0, ..clump_config() }, "chunk_size_blocks")]
#[case::cluster(ClumpConfig { cluster_size_chunks: 0, ..clump_config() }, "cluster_size_chunks")]
#[case::cache(ClumpConfig { cache_capacity_blocks: 0, ..clump_config() }, "cache_capacity_blocks")]
#[case::window(ClumpConfig { prefetch_window_blocks: 0, ..clump_config() }, "prefetch_window_blocks")]
#[case::space(
    ClumpConfig { total_address_space_blocks: Some(0), ..clump_config() },
    "total_address_space_blocks"
)]
fn zero_parameter_is_named(#[case] config: ClumpConfig, #[case] parameter: &'static str) {
    assert_eq!(
        ClumpEngine::new(&config).err(),
        Some(ConfigError::ZeroParameter { parameter })
    );
}

/// With several bad parameters the first in signature order is reported.
#[test]
fn first_offending_parameter_wins() {
    let config = ClumpConfig {
        cluster_size_chunks: 0,
        prefetch_window_blocks: 0,
        ..clump_config()
    };
    assert_eq!(
        ClumpEngine::new(&config).err(),
        Some(ConfigError::ZeroParameter {
            parameter: "cluster_size_chunks"
        })
    );
}

/// A fresh engine reports all-zero metrics.
#[test]
fn empty_run_has_zero_metrics() -> TestResult {
    let engine = ClumpEngine::new(&clump_config())?;
    assert_eq!(engine.metrics(), Metrics::default());
    assert_eq!(engine.previous_chunk(), None);
    Ok(())
}

// ══════════════════════════════════════════════════════════
// 2. Single access and sequential chunks
// ══════════════════════════════════════════════════════════

/// The first access is a miss, records no transition and prefetches nothing.
#[test]
fn single_access_learns_nothing() -> TestResult {
    let mut engine = ClumpEngine::new(&clump_config())?;
    assert!(!engine.process_access(17));

    let m = engine.metrics();
    assert_eq!(m.total_accesses, 1);
    assert_eq!(m.cache_hits, 0);
    assert_eq!(m.prefetch_total, 0);
    assert_eq!(m.allocated_transition_tables, 0);
    assert_eq!(engine.previous_chunk(), Some(4));
    Ok(())
}

/// Without self-transitions, walking chunks 0 and 1 records only `0 -> 1`,
/// every access misses, and chunk 0 predicts chunk 1.
#[test]
fn two_chunk_walk_learns_forward_transition() -> TestResult {
    let config = ClumpConfig {
        record_self_transitions: false,
        ..clump_config()
    };
    let mut engine = ClumpEngine::new(&config)?;
    let hits = run(&mut engine, &[0, 1, 2, 3, 4, 5, 6, 7]);
    assert!(hits.iter().all(|hit| !hit));

    let row = engine.table(0).ok_or("chunk 0 has no row")?;
    assert_eq!(row.slots()[0].chunk, Some(1));
    assert_eq!(row.slots()[0].frequency, 1);
    assert!(row.slots()[1].is_empty());
    assert_eq!(row.predict(), Some(1));
    assert!(engine.table(1).is_none());

    let m = engine.metrics();
    assert_eq!(m.hit_rate, 0.0);
    assert_eq!(m.allocated_transition_tables, 1);
    Ok(())
}

/// With self-transitions every repeat access inside a chunk reinforces
/// `A -> A`, so the current chunk prefetches its own remaining blocks.
#[test]
fn two_chunk_walk_with_self_transitions() -> TestResult {
    let mut engine = ClumpEngine::new(&clump_config())?;
    let hits = run(&mut engine, &[0, 1, 2, 3, 4, 5, 6, 7]);
    assert_eq!(
        hits,
        vec![false, false, true, true, false, false, true, true]
    );

    let row = engine.table(0).ok_or("chunk 0 has no row")?;
    assert_eq!(row.slots().map(|s| (s.chunk, s.frequency)), [
        (Some(0), 3),
        (Some(1), 1),
        (None, 0)
    ]);

    assert_eq!(
        engine.metrics(),
        Metrics {
            total_accesses: 8,
            cache_hits: 4,
            cache_misses: 4,
            hit_rate: 0.5,
            prefetch_total: 4,
            prefetch_used: 4,
            prefetch_wasted: 0,
            prefetch_evicted_unused: 0,
            prefetch_efficiency: 1.0,
            allocated_transition_tables: 2,
            allocated_clusters: 1,
            memory_estimate_bytes: 2 * ROW_BYTES,
            predictions_issued: 6,
            predictions_correct: 4,
            prediction_accuracy: 4.0 / 6.0,
            evictions: 0,
            hit_rate_history: vec![],
        }
    );
    Ok(())
}

// ══════════════════════════════════════════════════════════
// 3. Prediction and prefetch
// ══════════════════════════════════════════════════════════

/// Returning to chunk 0 predicts chunk 1 and prefetches its uncached blocks.
#[test]
fn revisit_prefetches_predicted_chunk() -> TestResult {
    let mut engine = ClumpEngine::new(&clump_config())?;
    assert_eq!(run(&mut engine, &[0, 4, 0]), vec![false, false, true]);

    let m = engine.metrics();
    assert_eq!(m.prefetch_total, 3, "blocks 5, 6 and 7; block 4 is resident");
    assert_eq!(m.predictions_issued, 1);
    for block in 4..8 {
        assert!(engine.cache().contains(block));
    }

    assert!(engine.process_access(5));
    let m = engine.metrics();
    assert_eq!(m.prefetch_used, 1);
    assert_eq!(m.predictions_correct, 1);
    Ok(())
}

/// The prefetch window stops at the end of the address space.
#[test]
fn prefetch_is_clipped_at_address_space() -> TestResult {
    let config = ClumpConfig {
        total_address_space_blocks: Some(10),
        ..clump_config()
    };
    let mut engine = ClumpEngine::new(&config)?;
    let _ = run(&mut engine, &[0, 8, 0]);

    assert_eq!(engine.metrics().prefetch_total, 1, "only block 9 is in range");
    assert!(engine.cache().contains(9));
    assert!(!engine.cache().contains(10));
    Ok(())
}

/// A window wider than a chunk spills into the following chunk.
#[test]
fn wide_window_spans_chunks() -> TestResult {
    let config = ClumpConfig {
        prefetch_window_blocks: 8,
        ..clump_config()
    };
    let mut engine = ClumpEngine::new(&config)?;
    let _ = run(&mut engine, &[0, 4, 0]);
    assert_eq!(engine.metrics().prefetch_total, 7);
    assert!(engine.cache().contains(11));
    Ok(())
}

// ══════════════════════════════════════════════════════════
// 4. Address bounds
// ══════════════════════════════════════════════════════════

/// Demand accesses outside the device change nothing.
#[test]
fn out_of_range_access_is_skipped() -> TestResult {
    let mut engine = ClumpEngine::new(&clump_config())?;
    assert!(!engine.process_access(0));
    let before = engine.metrics();

    assert!(!engine.process_access(1000));
    assert!(!engine.process_access(u64::MAX));

    assert_eq!(engine.metrics(), before);
    assert_eq!(engine.previous_chunk(), Some(0));
    assert!(engine.table(0).is_none());
    Ok(())
}

/// Without a device bound even the largest block id is accepted.
#[test]
fn unbounded_space_accepts_any_block() -> TestResult {
    let config = ClumpConfig {
        total_address_space_blocks: None,
        ..clump_config()
    };
    let mut engine = ClumpEngine::new(&config)?;
    let _ = run(&mut engine, &[u64::MAX, u64::MAX - 1, u64::MAX]);
    assert_eq!(engine.metrics().total_accesses, 3);
    assert_eq!(engine.metrics().cache_hits, 1);
    Ok(())
}

// ══════════════════════════════════════════════════════════
// 5. Metrics
// ══════════════════════════════════════════════════════════

/// Taking metrics twice yields identical records.
#[test]
fn metrics_are_idempotent() -> TestResult {
    let mut engine = ClumpEngine::new(&clump_config())?;
    let _ = run(&mut engine, &[3, 9, 3, 9, 40, 3, 9]);
    assert_eq!(engine.metrics(), engine.metrics());
    Ok(())
}

/// Looking up unvisited chunks never allocates rows.
#[test]
fn lookups_do_not_allocate() -> TestResult {
    let mut engine = ClumpEngine::new(&clump_config())?;
    let _ = run(&mut engine, &[0, 4, 8]);
    let allocated = engine.metrics().allocated_transition_tables;
    for chunk in 0..100 {
        let _ = engine.table(chunk);
    }
    assert_eq!(engine.metrics().allocated_transition_tables, allocated);
    assert_eq!(allocated, 2);
    Ok(())
}

/// Rows are grouped into clusters of two chunks in the metrics.
#[test]
fn metrics_report_allocated_clusters() -> TestResult {
    let mut engine = ClumpEngine::new(&clump_config())?;
    let _ = run(&mut engine, &[0, 4, 8, 12, 16]);
    let m = engine.metrics();
    assert_eq!(m.allocated_transition_tables, 4, "chunks 0 to 3 each led somewhere");
    assert_eq!(m.allocated_clusters, 2);
    assert_eq!(engine.tables().rows_in_cluster(1), 2);
    Ok(())
}

/// Evicted unused prefetches are reported apart from the still-resident ones.
#[test]
fn metrics_split_evicted_from_pending_waste() -> TestResult {
    let config = ClumpConfig {
        cache_capacity_blocks: 5,
        ..clump_config()
    };
    let mut engine = ClumpEngine::new(&config)?;
    let _ = run(&mut engine, &[0, 4, 0]);
    assert_eq!(engine.metrics().prefetch_total, 3);

    // LRU order is now 7, 6, 5, 0, 4: three misses evict 4, 0 and then block 5.
    let _ = run(&mut engine, &[100, 200, 300]);
    let m = engine.metrics();
    assert_eq!(m.prefetch_evicted_unused, 1);
    assert_eq!(m.prefetch_wasted, 3);
    assert_eq!(m.evictions, 3);
    Ok(())
}

/// Two engines fed the same trace agree exactly.
#[test]
fn identical_runs_are_deterministic() -> TestResult {
    let trace: Vec<u64> = (0..500).map(|i| (i * 37 + i / 7) % 300).collect();
    let mut a = ClumpEngine::new(&clump_config())?;
    let mut b = ClumpEngine::new(&clump_config())?;
    let _ = run(&mut a, &trace);
    let _ = run(&mut b, &trace);
    assert_eq!(a.metrics(), b.metrics());
    Ok(())
}

/// The hit-rate history samples every `interval` accesses.
#[test]
fn history_follows_interval() -> TestResult {
    let mut engine = ClumpEngine::new(&clump_config())?.with_history_interval(2);
    let _ = run(&mut engine, &[0, 1, 2, 3, 4, 5, 6, 7]);
    assert_eq!(engine.metrics().hit_rate_history, vec![0.0, 0.5, 2.0 / 6.0, 0.5]);
    Ok(())
}

// ══════════════════════════════════════════════════════════
// 6. Predictor strategies
// ══════════════════════════════════════════════════════════

/// The confidence variant waits for three observations before prefetching.
#[test]
fn confidence_engine_gates_prefetch() -> TestResult {
    let mut engine = ClumpEngine::<ConfidenceRow>::with_predictor(&clump_config())?;
    for _ in 0..2 {
        let _ = engine.process_access(0);
        let _ = engine.process_access(4);
    }
    assert_eq!(engine.metrics().predictions_issued, 0);

    for _ in 0..4 {
        let _ = engine.process_access(0);
        let _ = engine.process_access(4);
    }
    assert!(engine.metrics().predictions_issued > 0);
    assert_eq!(AccessEngine::name(&engine), "clump-conf");
    Ok(())
}

/// A named successor with low confidence is neither issued nor prefetched.
#[test]
fn confidence_engine_withholds_low_confidence_prefetch() -> TestResult {
    let mut engine = ClumpEngine::<ConfidenceRow>::with_predictor(&clump_config())?;
    // Chunk 0 is left for 1, 1, 1, 2, 2, 10, 11, 12, 13.
    let trace = [0, 4, 0, 4, 0, 4, 0, 8, 0, 8, 0, 40, 0, 44, 0, 48, 0, 52];
    for &block in &trace {
        let _ = engine.process_access(block);
    }
    let row = engine.table(0).ok_or("chunk 0 has no row")?;
    assert_eq!(row.predict(), Some(1));
    assert!(row.confidence() <= 0.4);

    let before = engine.metrics();
    let _ = engine.process_access(0);
    let after = engine.metrics();
    assert_eq!(after.predictions_issued, before.predictions_issued);
    assert_eq!(after.prefetch_total, before.prefetch_total);
    Ok(())
}

/// The trait object reports the same results as the concrete engine.
#[test]
fn trait_object_matches_concrete_engine() -> TestResult {
    let trace = [0, 1, 5, 9, 0, 1, 5, 9];
    let mut concrete = ClumpEngine::new(&clump_config())?;
    let _ = run(&mut concrete, &trace);

    let mut boxed: Box<dyn AccessEngine> = Box::new(ClumpEngine::new(&clump_config())?);
    for &b in &trace {
        let _ = boxed.process_access(b);
    }
    assert_eq!(boxed.name(), "clump");
    assert_eq!(boxed.metrics(), concrete.metrics());
    Ok(())
}
