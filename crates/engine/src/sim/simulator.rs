//! Run driver.
//!
//! Owns one trace and replays it through engines. Each engine run is an
//! isolated object graph, so `compare` runs the two engines on scoped
//! threads and only joins their final metrics. `sweep` does the same one
//! level up, with one scoped thread per geometry.

use std::collections::HashSet;
use std::path::Path;
use std::{panic, thread};

use tracing::info;

use super::{trace, workload};
use crate::common::{BlockId, ConfigError, TraceError};
use crate::config::Config;
use crate::engine::{self, AccessEngine};
use crate::stats::{Comparison, Metrics, SweepPoint, TraceSummary};

/// A trace ready to be replayed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Simulator {
    trace: Vec<BlockId>,
}

impl Simulator {
    /// Wraps an existing trace.
    pub const fn new(trace: Vec<BlockId>) -> Self {
        Self { trace }
    }

    /// Generates the workload described by `config.workload`, seeded by `config.general.seed`.
    ///
    /// # Errors
    ///
    /// The first invalid workload parameter.
    pub fn from_workload(config: &Config) -> Result<Self, ConfigError> {
        config.workload.validate()?;
        Ok(Self::new(workload::generate(
            &config.workload,
            config.general.seed,
        )))
    }

    /// Loads a trace file.
    ///
    /// # Errors
    ///
    /// `TraceError` if the file cannot be read or holds an invalid token.
    pub fn from_trace_file(path: impl AsRef<Path>) -> Result<Self, TraceError> {
        trace::read_path(path).map(Self::new)
    }

    /// The block ids in replay order.
    pub fn trace(&self) -> &[BlockId] {
        &self.trace
    }

    /// Access count and distinct blocks and chunks of the trace.
    ///
    /// # Arguments
    ///
    /// * `chunk_size` - Blocks per chunk; 0 is treated as 1.
    pub fn summary(&self, chunk_size: u64) -> TraceSummary {
        let chunk_size = chunk_size.max(1);
        let blocks: HashSet<BlockId> = self.trace.iter().copied().collect();
        let chunks: HashSet<u64> = blocks.iter().map(|b| b / chunk_size).collect();
        TraceSummary {
            accesses: self.trace.len() as u64,
            unique_blocks: blocks.len() as u64,
            unique_chunks: chunks.len() as u64,
        }
    }

    /// Replays the whole trace through `engine` and returns its final metrics.
    pub fn run(&self, engine: &mut dyn AccessEngine) -> Metrics {
        info!(
            engine = engine.name(),
            accesses = self.trace.len(),
            "run started"
        );
        for &block in &self.trace {
            let _ = engine.process_access(block);
        }
        let metrics = engine.metrics();
        info!(
            engine = engine.name(),
            hit_rate = metrics.hit_rate,
            prefetch_total = metrics.prefetch_total,
            "run finished"
        );
        metrics
    }

    /// Builds both engines from `config` and runs them side by side.
    ///
    /// # Errors
    ///
    /// The first invalid CluMP or readahead parameter. Nothing is run then.
    pub fn compare(&self, config: &Config) -> Result<Comparison, ConfigError> {
        let mut clump = engine::build(config)?;
        let mut baseline = engine::build_baseline(config)?;

        let (clump_metrics, baseline_metrics) = thread::scope(|s| {
            let handle = s.spawn(|| self.run(clump.as_mut()));
            let baseline_metrics = self.run(baseline.as_mut());
            let clump_metrics = handle
                .join()
                .unwrap_or_else(|payload| panic::resume_unwind(payload));
            (clump_metrics, baseline_metrics)
        });

        Ok(Comparison {
            clump_name: clump.name(),
            baseline_name: baseline.name(),
            clump: clump_metrics,
            baseline: baseline_metrics,
            trace: self.summary(config.clump.chunk_size_blocks),
        })
    }

    /// Compares the engines once per chunk size and cluster size pair.
    ///
    /// Every other parameter comes from `config`. Points are returned in
    /// `chunk_sizes` order, then `cluster_sizes` order, whatever order their
    /// threads finish in.
    ///
    /// # Errors
    ///
    /// The first point with an invalid configuration. Nothing is run then.
    pub fn sweep(
        &self,
        config: &Config,
        chunk_sizes: &[u64],
        cluster_sizes: &[u64],
    ) -> Result<Vec<SweepPoint>, ConfigError> {
        let points: Vec<Config> = chunk_sizes
            .iter()
            .flat_map(move |&chunk| {
                cluster_sizes.iter().map(move |&cluster| {
                    let mut point = config.clone();
                    point.clump.chunk_size_blocks = chunk;
                    point.clump.cluster_size_chunks = cluster;
                    point
                })
            })
            .collect();
        for point in &points {
            point.clump.validate()?;
            point.readahead.validate()?;
        }

        info!(
            points = points.len(),
            accesses = self.trace.len(),
            "sweep started"
        );
        thread::scope(|s| {
            let handles: Vec<_> = points
                .iter()
                .map(|point| s.spawn(move || self.compare(point)))
                .collect();
            handles
                .into_iter()
                .zip(&points)
                .map(|(handle, point)| -> Result<SweepPoint, ConfigError> {
                    let comparison = handle
                        .join()
                        .unwrap_or_else(|payload| panic::resume_unwind(payload))?;
                    Ok(SweepPoint {
                        chunk_size_blocks: point.clump.chunk_size_blocks,
                        cluster_size_chunks: point.clump.cluster_size_chunks,
                        comparison,
                    })
                })
                .collect()
        })
    }
}
