//! Simulation statistics collection and reporting.
//!
//! This module defines the records engines return and the report the driver prints:
//! 1. **Prefetch accounting:** Issued, used and wasted prefetches as seen by the cache.
//! 2. **Run counters:** Accesses, hits and prediction outcomes accumulated by an engine.
//! 3. **Metrics:** The read-only snapshot every engine produces, with derived rates.
//! 4. **Comparison:** Two snapshots side by side with the hit-rate ratio, printed gem5-style.
//! 5. **Sweep:** One comparison per chunk size and cluster size pair, printed as a table.

use std::fmt;

use serde::Serialize;

/// Prefetch accounting of one cache.
///
/// `wasted` already includes resident prefetched blocks that were never
/// referenced, so a snapshot taken at the end of a run is final.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct PrefetchStats {
    /// Blocks installed or re-tagged as prefetched.
    pub total: u64,
    /// Prefetched blocks referenced at least once afterwards.
    pub used: u64,
    /// Prefetched blocks evicted unreferenced, plus those still resident and unreferenced.
    pub wasted: u64,
    /// The evicted part of `wasted`.
    pub evicted_unused: u64,
}

/// Transition table footprint of one engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TableUsage {
    /// Rows allocated.
    pub rows: u64,
    /// Clusters holding at least one row.
    pub clusters: u64,
    /// Modeled bytes held by the rows.
    pub bytes: u64,
}

/// Cumulative per-run counters owned by an engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunCounters {
    /// In-range demand accesses processed.
    pub accesses: u64,
    /// Accesses served from the cache.
    pub hits: u64,
    /// Predictions that led to a prefetch attempt.
    pub predictions_issued: u64,
    /// Issued predictions whose chunk was the next chunk accessed.
    pub predictions_correct: u64,
}

impl RunCounters {
    /// Records one demand access.
    pub const fn record_access(&mut self, hit: bool) {
        self.accesses += 1;
        if hit {
            self.hits += 1;
        }
    }
}

/// Cumulative hit rate sampled at a fixed access interval.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HitRateHistory {
    interval: u64,
    samples: Vec<f64>,
}

impl HitRateHistory {
    /// Creates an empty history; an `interval` of zero disables sampling.
    pub const fn new(interval: u64) -> Self {
        Self {
            interval,
            samples: Vec::new(),
        }
    }

    /// Appends `hits / accesses` whenever `accesses` is a multiple of the interval.
    pub fn record(&mut self, counters: &RunCounters) {
        if self.interval > 0 && counters.accesses % self.interval == 0 {
            self.samples.push(ratio(counters.hits, counters.accesses));
        }
    }

    /// Sampling interval in accesses.
    pub const fn interval(&self) -> u64 {
        self.interval
    }

    /// Samples collected so far, oldest first.
    pub fn samples(&self) -> &[f64] {
        &self.samples
    }
}

/// Metrics snapshot of one engine.
///
/// Produced by `AccessEngine::metrics`; taking it never changes the engine.
/// All rates are in `[0, 1]` and are 0 when their denominator is 0.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Metrics {
    /// In-range demand accesses processed.
    pub total_accesses: u64,
    /// Accesses served from the cache.
    pub cache_hits: u64,
    /// Accesses that required a demand fetch.
    pub cache_misses: u64,
    /// `cache_hits / total_accesses`.
    pub hit_rate: f64,

    /// Blocks prefetched.
    pub prefetch_total: u64,
    /// Prefetched blocks later referenced.
    pub prefetch_used: u64,
    /// Prefetched blocks never referenced (evicted or still pending).
    pub prefetch_wasted: u64,
    /// The part of `prefetch_wasted` already evicted.
    pub prefetch_evicted_unused: u64,
    /// `prefetch_used / prefetch_total`.
    pub prefetch_efficiency: f64,

    /// Transition rows allocated (0 for the baseline).
    pub allocated_transition_tables: u64,
    /// Clusters holding at least one row (0 for the baseline).
    pub allocated_clusters: u64,
    /// `allocated_transition_tables * ROW_BYTES`.
    pub memory_estimate_bytes: u64,

    /// Predictions that led to a prefetch attempt.
    pub predictions_issued: u64,
    /// Issued predictions matching the next accessed chunk.
    pub predictions_correct: u64,
    /// `predictions_correct / predictions_issued`.
    pub prediction_accuracy: f64,

    /// Cache evictions.
    pub evictions: u64,
    /// Cumulative hit rate every `history_interval` accesses.
    pub hit_rate_history: Vec<f64>,
}

impl Metrics {
    /// Assembles a snapshot from an engine's live state.
    ///
    /// # Arguments
    ///
    /// * `counters` - Access and prediction counters.
    /// * `prefetch` - Reconciled cache accounting.
    /// * `evictions` - Cache evictions so far.
    /// * `tables` - Transition table footprint; default for engines without tables.
    /// * `history` - Hit-rate samples.
    pub fn collect(
        counters: &RunCounters,
        prefetch: PrefetchStats,
        evictions: u64,
        tables: TableUsage,
        history: &HitRateHistory,
    ) -> Self {
        Self {
            total_accesses: counters.accesses,
            cache_hits: counters.hits,
            cache_misses: counters.accesses - counters.hits,
            hit_rate: ratio(counters.hits, counters.accesses),
            prefetch_total: prefetch.total,
            prefetch_used: prefetch.used,
            prefetch_wasted: prefetch.wasted,
            prefetch_evicted_unused: prefetch.evicted_unused,
            prefetch_efficiency: ratio(prefetch.used, prefetch.total),
            allocated_transition_tables: tables.rows,
            allocated_clusters: tables.clusters,
            memory_estimate_bytes: tables.bytes,
            predictions_issued: counters.predictions_issued,
            predictions_correct: counters.predictions_correct,
            prediction_accuracy: ratio(counters.predictions_correct, counters.predictions_issued),
            evictions,
            hit_rate_history: history.samples().to_vec(),
        }
    }
}

/// Shape of a trace, reported next to the engine metrics.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TraceSummary {
    /// Accesses in the trace.
    pub accesses: u64,
    /// Distinct block ids.
    pub unique_blocks: u64,
    /// Distinct chunk ids under the CluMP chunk size.
    pub unique_chunks: u64,
}

/// Section names for selective report output.
///
/// Pass an empty slice to [`Comparison::write_sections`] to write all of them.
pub const REPORT_SECTIONS: &[&str] = &["summary", "cache", "prefetch", "prediction"];

/// Two engines run over the same trace.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Comparison {
    /// Name of the learned engine.
    pub clump_name: &'static str,
    /// Name of the baseline engine.
    pub baseline_name: &'static str,
    /// Learned engine metrics.
    pub clump: Metrics,
    /// Baseline metrics.
    pub baseline: Metrics,
    /// Trace shape.
    pub trace: TraceSummary,
}

impl Comparison {
    /// `clump.hit_rate / baseline.hit_rate`, or 0 when the baseline never hit.
    pub fn hit_rate_ratio(&self) -> f64 {
        if self.baseline.hit_rate > 0.0 {
            self.clump.hit_rate / self.baseline.hit_rate
        } else {
            0.0
        }
    }

    /// Writes only the requested report sections.
    ///
    /// Each element of `sections` should be one of [`REPORT_SECTIONS`]; an
    /// empty slice writes all of them (same as `Display`).
    ///
    /// # Errors
    ///
    /// Propagates formatter errors.
    pub fn write_sections(&self, f: &mut impl fmt::Write, sections: &[String]) -> fmt::Result {
        let want = |s: &str| sections.is_empty() || sections.iter().any(|x| x == s);
        let (c, b) = (&self.clump, &self.baseline);
        let pct = |r: f64| format!("{:.2}%", r * 100.0);

        writeln!(f, "==========================================================")?;
        writeln!(f, "CLUMP PREFETCH SIMULATION STATISTICS")?;
        writeln!(f, "==========================================================")?;
        if want("summary") {
            let ratio = self.hit_rate_ratio();
            writeln!(f, "trace_accesses           {}", self.trace.accesses)?;
            writeln!(f, "trace_unique_blocks      {}", self.trace.unique_blocks)?;
            writeln!(f, "trace_unique_chunks      {}", self.trace.unique_chunks)?;
            writeln!(
                f,
                "sim_hit_rate_ratio       {ratio:.2}x ({:+.1}%)",
                ratio.mul_add(100.0, -100.0)
            )?;
            writeln!(f, "----------------------------------------------------------")?;
        }
        writeln!(
            f,
            "  {:<24} {:>14} {:>14}",
            "", self.clump_name, self.baseline_name
        )?;
        if want("cache") {
            writeln!(f, "CACHE")?;
            row(f, "cache.accesses", c.total_accesses, b.total_accesses)?;
            row(f, "cache.hits", c.cache_hits, b.cache_hits)?;
            row(f, "cache.misses", c.cache_misses, b.cache_misses)?;
            row(f, "cache.hit_rate", pct(c.hit_rate), pct(b.hit_rate))?;
            row(f, "cache.evictions", c.evictions, b.evictions)?;
            writeln!(f, "----------------------------------------------------------")?;
        }
        if want("prefetch") {
            writeln!(f, "PREFETCH")?;
            row(f, "prefetch.total", c.prefetch_total, b.prefetch_total)?;
            row(f, "prefetch.used", c.prefetch_used, b.prefetch_used)?;
            row(f, "prefetch.wasted", c.prefetch_wasted, b.prefetch_wasted)?;
            row(
                f,
                "prefetch.evicted_unused",
                c.prefetch_evicted_unused,
                b.prefetch_evicted_unused,
            )?;
            row(
                f,
                "prefetch.efficiency",
                pct(c.prefetch_efficiency),
                pct(b.prefetch_efficiency),
            )?;
            writeln!(f, "----------------------------------------------------------")?;
        }
        if want("prediction") {
            writeln!(f, "PREDICTION")?;
            row(
                f,
                "mc.rows",
                c.allocated_transition_tables,
                b.allocated_transition_tables,
            )?;
            row(f, "mc.clusters", c.allocated_clusters, b.allocated_clusters)?;
            row(
                f,
                "mc.memory_bytes",
                c.memory_estimate_bytes,
                b.memory_estimate_bytes,
            )?;
            row(f, "mc.predictions", c.predictions_issued, b.predictions_issued)?;
            row(f, "mc.correct", c.predictions_correct, b.predictions_correct)?;
            row(
                f,
                "mc.accuracy",
                pct(c.prediction_accuracy),
                pct(b.prediction_accuracy),
            )?;
        }
        writeln!(f, "==========================================================")
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_sections(f, &[])
    }
}

/// One point of a chunk size by cluster size sweep.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SweepPoint {
    /// Blocks per chunk at this point.
    pub chunk_size_blocks: u64,
    /// Chunks per cluster at this point.
    pub cluster_size_chunks: u64,
    /// Both engines run with this geometry.
    pub comparison: Comparison,
}

/// Writes a sweep as one table row per point, in the order given.
///
/// # Errors
///
/// Propagates formatter errors.
pub fn write_sweep(f: &mut impl fmt::Write, points: &[SweepPoint]) -> fmt::Result {
    writeln!(
        f,
        "{:>6} {:>8} {:>10} {:>10} {:>7} {:>10} {:>8} {:>10}",
        "chunk", "cluster", "clump_hit", "base_hit", "ratio", "pf_eff", "mc_rows", "mc_bytes"
    )?;
    for point in points {
        let c = &point.comparison.clump;
        writeln!(
            f,
            "{:>6} {:>8} {:>9.2}% {:>9.2}% {:>6.2}x {:>9.2}% {:>8} {:>10}",
            point.chunk_size_blocks,
            point.cluster_size_chunks,
            c.hit_rate * 100.0,
            point.comparison.baseline.hit_rate * 100.0,
            point.comparison.hit_rate_ratio(),
            c.prefetch_efficiency * 100.0,
            c.allocated_transition_tables,
            c.memory_estimate_bytes,
        )?;
    }
    Ok(())
}

fn row(
    f: &mut impl fmt::Write,
    key: &str,
    clump: impl fmt::Display,
    baseline: impl fmt::Display,
) -> fmt::Result {
    writeln!(f, "  {key:<24} {clump:>14} {baseline:>14}")
}

/// `num / den`, or 0 when `den` is 0.
pub fn ratio(num: u64, den: u64) -> f64 {
    if den == 0 { 0.0 } else { num as f64 / den as f64 }
}
