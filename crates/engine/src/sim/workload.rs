//! Seeded Synthetic Workloads.
//!
//! Generates block traces for experiments when no recorded trace is given.
//! Every generator draws from an explicitly seeded `StdRng`, so equal seeds
//! and parameters always give equal traces:
//! 1. **Sequential:** `0, 1, 2, ...` wrapping at the range.
//! 2. **Random:** Uniform over the range.
//! 3. **Mixed:** Phases that each favour one region, with a hot spot and short sequential runs.
//! 4. **Kvm:** Virtual machine boot: a sequential loader, a jumpy kernel load, then scattered init.
//! 5. **Kernel:** Kernel build: source file runs, random header reads and object file writes.
//!
//! All generated blocks lie in `[0, address_space_blocks)`.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::common::BlockId;
use crate::config::{WorkloadConfig, WorkloadKind};

/// Number of source file locations a kernel build reads from.
const KERNEL_SOURCE_FILES: usize = 50;

/// Generates a trace.
///
/// # Arguments
///
/// * `config` - Pattern, length and range. A zero range yields an empty trace.
/// * `seed` - Seed of the generator.
pub fn generate(config: &WorkloadConfig, seed: u64) -> Vec<BlockId> {
    let range = config.address_space_blocks;
    if range == 0 {
        return Vec::new();
    }
    let len = usize::try_from(config.accesses).unwrap_or(usize::MAX);
    let mut rng = StdRng::seed_from_u64(seed);

    let mut trace: Vec<BlockId> = match config.kind {
        WorkloadKind::Sequential => (0..config.accesses).collect(),
        WorkloadKind::Random => (0..len).map(|_| rng.random_range(0..range)).collect(),
        WorkloadKind::Mixed => mixed(config, len, &mut rng),
        WorkloadKind::Kvm => kvm_boot(len, &mut rng),
        WorkloadKind::Kernel => kernel_build(len, &mut rng),
    };
    for block in &mut trace {
        *block %= range;
    }
    trace
}

fn mixed(config: &WorkloadConfig, len: usize, rng: &mut StdRng) -> Vec<BlockId> {
    let range = config.address_space_blocks;
    let phases = config.phase_count.max(1);
    let locality = config.locality_factor.clamp(0.0, 1.0);
    let hot_ratio = config.hot_spot_ratio.clamp(0.0, 1.0);
    let sequential_ratio = config.sequential_ratio.clamp(0.0, 1.0);

    let phase_len = len / phases as usize;
    let mut trace = Vec::with_capacity(len);

    for phase in 0..phases {
        let base = (range / phases) * phase;
        let span = ((range as f64 * locality / phases as f64) as u64).max(1);
        let hot_center = base + span / 2;
        let hot_span = (span as f64 * hot_ratio) as u64;

        // The last phase absorbs the remainder so the trace has `len` accesses.
        let count = if phase + 1 == phases {
            len - trace.len()
        } else {
            phase_len
        };

        let mut cursor = base;
        for _ in 0..count {
            let block = if rng.random::<f64>() < hot_ratio {
                hot_center.saturating_sub(hot_span) + rng.random_range(0..=2 * hot_span)
            } else if rng.random::<f64>() < sequential_ratio {
                cursor += 1;
                cursor
            } else {
                base + rng.random_range(0..=span)
            };
            trace.push(block.min(range - 1));
        }
    }
    trace
}

fn kvm_boot(len: usize, rng: &mut StdRng) -> Vec<BlockId> {
    let loader = len / 4;
    let kernel = len / 3;
    let mut trace = Vec::with_capacity(len);
    let mut cursor: BlockId = 0;

    for _ in 0..loader {
        trace.push(cursor);
        cursor += 1;
    }
    for _ in 0..kernel {
        if rng.random::<f64>() < 0.7 {
            trace.push(cursor);
            cursor += 1;
        } else {
            cursor += rng.random_range(10..=100);
            trace.push(cursor);
        }
    }
    while trace.len() < len {
        let pattern = rng.random::<f64>();
        if pattern < 0.4 {
            trace.push(cursor);
            cursor += 1;
        } else if pattern < 0.8 {
            cursor += rng.random_range(1..=20);
            trace.push(cursor);
        } else {
            cursor += rng.random_range(100..=1000);
            trace.push(cursor);
        }
    }
    trace
}

fn kernel_build(len: usize, rng: &mut StdRng) -> Vec<BlockId> {
    let sources: Vec<BlockId> = (0..KERNEL_SOURCE_FILES)
        .map(|_| rng.random_range(0..=100_000))
        .collect();
    let mut trace = Vec::with_capacity(len);

    while trace.len() < len {
        let pattern = rng.random::<f64>();
        if pattern < 0.25 {
            let base = sources[rng.random_range(0..sources.len())];
            let run = rng.random_range(5..=50);
            trace.extend((0..run).map(|i| base + i));
        } else if pattern < 0.65 {
            let reads = rng.random_range(1..=10);
            trace.extend((0..reads).map(|_| rng.random_range(0..=200_000)));
        } else {
            let base = rng.random_range(50_000..=150_000);
            let run = rng.random_range(10..=100);
            trace.extend((0..run).map(|i| base + i));
        }
    }
    trace.truncate(len);
    trace
}
