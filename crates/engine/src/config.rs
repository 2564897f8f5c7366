//! Configuration system for the prefetch simulator.
//!
//! This module defines all configuration structures and enums used to parameterize
//! a simulation run. It provides:
//! 1. **Defaults:** Baseline geometry, cache and window constants.
//! 2. **Structures:** Hierarchical config for general, CluMP, readahead and workload settings.
//! 3. **Presets:** The named parameter sets from the CluMP evaluation.
//! 4. **Validation:** The same checks the engines perform, without building one.
//!
//! Configuration is supplied as JSON (`Config::from_json`), by preset name, or via `Config::default()`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::common::ConfigError;

/// Default configuration constants for the simulator.
///
/// These values define the baseline experiment when not explicitly
/// overridden in a JSON configuration file or on the command line.
mod defaults {
    /// Blocks per chunk (16 blocks = 64 KiB with 4 KiB blocks).
    pub const CHUNK_SIZE: u64 = 16;

    /// Chunks per cluster.
    pub const CLUSTER_SIZE: u64 = 64;

    /// Page-cache capacity in blocks (16 MiB with 4 KiB blocks).
    pub const CACHE_CAPACITY: u64 = 4096;

    /// CluMP prefetch window in blocks.
    pub const PREFETCH_WINDOW: u64 = 16;

    /// Readahead window after a reset.
    pub const READAHEAD_INITIAL: u64 = 4;

    /// Readahead window ceiling (128 KiB with 4 KiB blocks).
    pub const READAHEAD_MAX: u64 = 32;

    /// Consecutive sequential accesses needed to double the readahead window.
    pub const SEQUENTIAL_THRESHOLD: u64 = 2;

    /// Accesses between hit-rate history samples.
    pub const HISTORY_INTERVAL: u64 = 100;

    /// Seed for workload generation.
    pub const SEED: u64 = 42;

    /// Accesses in a generated workload.
    pub const WORKLOAD_ACCESSES: u64 = 15_000;

    /// Block range a generated workload draws from.
    pub const WORKLOAD_RANGE: u64 = 30_000;

    /// Fraction of the range a `Mixed` phase stays within.
    pub const LOCALITY_FACTOR: f64 = 0.7;

    /// Probability that a `Mixed` access continues a sequential run.
    pub const SEQUENTIAL_RATIO: f64 = 0.3;

    /// Number of `Mixed` phases.
    pub const PHASE_COUNT: u64 = 3;

    /// Probability that a `Mixed` access lands in the phase hot spot.
    pub const HOT_SPOT_RATIO: f64 = 0.2;
}

/// Transition predictor strategy used by the CluMP engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub enum Predictor {
    /// Three-slot frequency-ranked Markov row; always predicts the top slot.
    #[default]
    #[serde(alias = "MCRow", alias = "mcrow")]
    McRow,
    /// Three-slot row with adaptive weighting, decay and an accuracy gate.
    #[serde(alias = "confidence")]
    Confidence,
}

/// Synthetic access pattern produced by the workload generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub enum WorkloadKind {
    /// Strictly ascending blocks, wrapping at the range.
    #[serde(alias = "sequential")]
    Sequential,
    /// Uniformly random blocks.
    #[serde(alias = "random")]
    Random,
    /// Phased locality with hot spots and short sequential runs.
    #[serde(alias = "mixed")]
    Mixed,
    /// Virtual machine boot: sequential loader, jumpy kernel load, scattered init.
    #[default]
    #[serde(alias = "KVM", alias = "kvm")]
    Kvm,
    /// Kernel build: sequential source reads, random header reads, object writes.
    #[serde(alias = "kernel")]
    Kernel,
}

impl fmt::Display for Predictor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::McRow => "McRow",
            Self::Confidence => "Confidence",
        })
    }
}

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(match self {
            Self::Sequential => "Sequential",
            Self::Random => "Random",
            Self::Mixed => "Mixed",
            Self::Kvm => "Kvm",
            Self::Kernel => "Kernel",
        })
    }
}

/// Root simulator configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Run-wide settings.
    #[serde(default)]
    pub general: GeneralConfig,
    /// CluMP engine parameters.
    #[serde(default)]
    pub clump: ClumpConfig,
    /// Readahead baseline parameters.
    #[serde(default)]
    pub readahead: ReadaheadConfig,
    /// Synthetic workload parameters.
    #[serde(default)]
    pub workload: WorkloadConfig,
}

/// Run-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct GeneralConfig {
    /// Accesses between cumulative hit-rate samples; 0 disables sampling.
    #[serde(default = "GeneralConfig::default_history_interval")]
    pub history_interval: u64,

    /// Seed for the workload generator. Engines never consume randomness.
    #[serde(default = "GeneralConfig::default_seed")]
    pub seed: u64,
}

impl GeneralConfig {
    const fn default_history_interval() -> u64 {
        defaults::HISTORY_INTERVAL
    }

    const fn default_seed() -> u64 {
        defaults::SEED
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            history_interval: defaults::HISTORY_INTERVAL,
            seed: defaults::SEED,
        }
    }
}

/// CluMP engine parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct ClumpConfig {
    /// Blocks per chunk.
    #[serde(default = "ClumpConfig::default_chunk_size")]
    pub chunk_size_blocks: u64,

    /// Chunks per cluster (memory accounting only).
    #[serde(default = "ClumpConfig::default_cluster_size")]
    pub cluster_size_chunks: u64,

    /// Cache capacity in blocks.
    #[serde(default = "ClumpConfig::default_cache_capacity")]
    pub cache_capacity_blocks: u64,

    /// Blocks prefetched from the base of a predicted chunk.
    #[serde(default = "ClumpConfig::default_prefetch_window")]
    pub prefetch_window_blocks: u64,

    /// Device size in blocks; `None` means unbounded.
    #[serde(default)]
    pub total_address_space_blocks: Option<u64>,

    /// Transition predictor strategy.
    #[serde(default)]
    pub predictor: Predictor,

    /// Record `A -> A` transitions when consecutive accesses stay in one chunk.
    #[serde(default = "ClumpConfig::default_record_self_transitions")]
    pub record_self_transitions: bool,
}

impl ClumpConfig {
    const fn default_chunk_size() -> u64 {
        defaults::CHUNK_SIZE
    }

    const fn default_cluster_size() -> u64 {
        defaults::CLUSTER_SIZE
    }

    const fn default_cache_capacity() -> u64 {
        defaults::CACHE_CAPACITY
    }

    const fn default_prefetch_window() -> u64 {
        defaults::PREFETCH_WINDOW
    }

    const fn default_record_self_transitions() -> bool {
        true
    }

    /// Checks every parameter in constructor order.
    ///
    /// # Returns
    ///
    /// The first offending parameter as a `ConfigError`, or `Ok(())`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::require_positive("chunk_size_blocks", self.chunk_size_blocks)?;
        ConfigError::require_positive("cluster_size_chunks", self.cluster_size_chunks)?;
        ConfigError::require_positive("cache_capacity_blocks", self.cache_capacity_blocks)?;
        ConfigError::require_positive("prefetch_window_blocks", self.prefetch_window_blocks)?;
        if let Some(space) = self.total_address_space_blocks {
            ConfigError::require_positive("total_address_space_blocks", space)?;
        }
        Ok(())
    }
}

impl Default for ClumpConfig {
    fn default() -> Self {
        Self {
            chunk_size_blocks: defaults::CHUNK_SIZE,
            cluster_size_chunks: defaults::CLUSTER_SIZE,
            cache_capacity_blocks: defaults::CACHE_CAPACITY,
            prefetch_window_blocks: defaults::PREFETCH_WINDOW,
            total_address_space_blocks: None,
            predictor: Predictor::default(),
            record_self_transitions: true,
        }
    }
}

/// Sequential readahead baseline parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct ReadaheadConfig {
    /// Cache capacity in blocks.
    #[serde(default = "ReadaheadConfig::default_cache_capacity")]
    pub cache_capacity_blocks: u64,

    /// Window after start-up and after every non-sequential access.
    #[serde(default = "ReadaheadConfig::default_initial_window")]
    pub initial_window_blocks: u64,

    /// Ceiling for window doubling.
    #[serde(default = "ReadaheadConfig::default_max_window")]
    pub max_window_blocks: u64,

    /// Consecutive sequential accesses needed for each doubling.
    #[serde(default = "ReadaheadConfig::default_threshold")]
    pub sequential_threshold: u64,

    /// Device size in blocks; `None` means unbounded.
    #[serde(default)]
    pub total_address_space_blocks: Option<u64>,
}

impl ReadaheadConfig {
    const fn default_cache_capacity() -> u64 {
        defaults::CACHE_CAPACITY
    }

    const fn default_initial_window() -> u64 {
        defaults::READAHEAD_INITIAL
    }

    const fn default_max_window() -> u64 {
        defaults::READAHEAD_MAX
    }

    const fn default_threshold() -> u64 {
        defaults::SEQUENTIAL_THRESHOLD
    }

    /// Checks every parameter in constructor order.
    ///
    /// # Returns
    ///
    /// The first offending parameter as a `ConfigError`, or `Ok(())`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::require_positive("cache_capacity_blocks", self.cache_capacity_blocks)?;
        ConfigError::require_positive("initial_window_blocks", self.initial_window_blocks)?;
        ConfigError::require_positive("max_window_blocks", self.max_window_blocks)?;
        ConfigError::require_positive("sequential_threshold", self.sequential_threshold)?;
        if let Some(space) = self.total_address_space_blocks {
            ConfigError::require_positive("total_address_space_blocks", space)?;
        }
        if self.initial_window_blocks > self.max_window_blocks {
            return Err(ConfigError::WindowOrder {
                initial: self.initial_window_blocks,
                max: self.max_window_blocks,
            });
        }
        Ok(())
    }
}

impl Default for ReadaheadConfig {
    fn default() -> Self {
        Self {
            cache_capacity_blocks: defaults::CACHE_CAPACITY,
            initial_window_blocks: defaults::READAHEAD_INITIAL,
            max_window_blocks: defaults::READAHEAD_MAX,
            sequential_threshold: defaults::SEQUENTIAL_THRESHOLD,
            total_address_space_blocks: None,
        }
    }
}

/// Synthetic workload parameters.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct WorkloadConfig {
    /// Access pattern.
    #[serde(default)]
    pub kind: WorkloadKind,

    /// Number of accesses to generate.
    #[serde(default = "WorkloadConfig::default_accesses")]
    pub accesses: u64,

    /// Generated blocks fall in `[0, address_space_blocks)`.
    #[serde(default = "WorkloadConfig::default_range")]
    pub address_space_blocks: u64,

    /// Fraction of the range a `Mixed` phase stays within.
    #[serde(default = "WorkloadConfig::default_locality")]
    pub locality_factor: f64,

    /// Probability that a `Mixed` access extends a sequential run.
    #[serde(default = "WorkloadConfig::default_sequential_ratio")]
    pub sequential_ratio: f64,

    /// Number of `Mixed` phases.
    #[serde(default = "WorkloadConfig::default_phase_count")]
    pub phase_count: u64,

    /// Probability that a `Mixed` access lands in the phase hot spot.
    #[serde(default = "WorkloadConfig::default_hot_spot_ratio")]
    pub hot_spot_ratio: f64,
}

impl WorkloadConfig {
    const fn default_accesses() -> u64 {
        defaults::WORKLOAD_ACCESSES
    }

    const fn default_range() -> u64 {
        defaults::WORKLOAD_RANGE
    }

    const fn default_locality() -> f64 {
        defaults::LOCALITY_FACTOR
    }

    const fn default_sequential_ratio() -> f64 {
        defaults::SEQUENTIAL_RATIO
    }

    const fn default_phase_count() -> u64 {
        defaults::PHASE_COUNT
    }

    const fn default_hot_spot_ratio() -> f64 {
        defaults::HOT_SPOT_RATIO
    }

    /// Checks sizes and counts; ratios are clamped by the generator instead.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ConfigError::require_positive("address_space_blocks", self.address_space_blocks)?;
        ConfigError::require_positive("phase_count", self.phase_count)
    }
}

impl Default for WorkloadConfig {
    fn default() -> Self {
        Self {
            kind: WorkloadKind::default(),
            accesses: defaults::WORKLOAD_ACCESSES,
            address_space_blocks: defaults::WORKLOAD_RANGE,
            locality_factor: defaults::LOCALITY_FACTOR,
            sequential_ratio: defaults::SEQUENTIAL_RATIO,
            phase_count: defaults::PHASE_COUNT,
            hot_spot_ratio: defaults::HOT_SPOT_RATIO,
        }
    }
}

impl Config {
    /// Names accepted by [`Config::preset`].
    pub const PRESETS: &'static [&'static str] = &[
        "paper_compliant",
        "high_performance",
        "memory_efficient",
        "small_scale",
        "large_scale",
    ];

    /// Parses a JSON configuration; absent sections and fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error for malformed input or wrongly typed fields.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Returns a named preset.
    ///
    /// # Arguments
    ///
    /// * `name` - One of [`Config::PRESETS`].
    ///
    /// # Errors
    ///
    /// `ConfigError::UnknownPreset` if no preset has that name.
    pub fn preset(name: &str) -> Result<Self, ConfigError> {
        let (chunk, cluster, cache, window, kind, accesses, range) = match name {
            "paper_compliant" => (16, 64, 4096, 16, WorkloadKind::Kvm, 15_000, 30_000),
            "high_performance" => (8, 128, 8192, 32, WorkloadKind::Kernel, 25_000, 50_000),
            "memory_efficient" => (32, 32, 2048, 8, WorkloadKind::Mixed, 10_000, 20_000),
            "small_scale" => (4, 16, 1024, 4, WorkloadKind::Kvm, 5_000, 10_000),
            "large_scale" => (64, 256, 16_384, 64, WorkloadKind::Kernel, 50_000, 100_000),
            other => return Err(ConfigError::UnknownPreset(other.to_owned())),
        };

        let mut config = Self::default();
        config.clump.chunk_size_blocks = chunk;
        config.clump.cluster_size_chunks = cluster;
        config.clump.prefetch_window_blocks = window;
        config.set_cache_capacity(cache);
        config.workload.kind = kind;
        config.workload.accesses = accesses;
        config.workload.address_space_blocks = range;
        Ok(config)
    }

    /// Sets the cache capacity of both engines so they compete on equal terms.
    pub const fn set_cache_capacity(&mut self, blocks: u64) {
        self.clump.cache_capacity_blocks = blocks;
        self.readahead.cache_capacity_blocks = blocks;
    }

    /// Bounds both engines to the same device size.
    pub const fn set_address_space(&mut self, blocks: Option<u64>) {
        self.clump.total_address_space_blocks = blocks;
        self.readahead.total_address_space_blocks = blocks;
    }

    /// Runs every section's validation without constructing anything.
    ///
    /// # Errors
    ///
    /// The first `ConfigError` found, checking CluMP, then readahead, then workload.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.clump.validate()?;
        self.readahead.validate()?;
        self.workload.validate()
    }
}
