//! CluMP prefetch simulator CLI.
//!
//! This binary is the single entry point for experiments. It provides:
//! 1. **Run:** Replay a trace file or a generated workload through CluMP and the readahead baseline, then print the comparison.
//! 2. **Sweep:** Repeat the comparison over a grid of chunk and cluster sizes.
//! 3. **Presets:** List the named parameter sets.
//!
//! Configuration starts from the defaults, a preset or a JSON file, and
//! individual flags override single fields. Logging goes to stderr and is
//! controlled by `RUST_LOG` (default `warn`).

use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use clump_core::common::SimError;
use clump_core::config::{Predictor, WorkloadKind};
use clump_core::sim::Simulator;
use clump_core::stats::{write_sweep, REPORT_SECTIONS};
use clump_core::Config;

#[derive(Parser, Debug)]
#[command(
    name = "clump",
    author,
    version,
    about = "CluMP block-prefetching simulator",
    long_about = "Replay a block trace through the CluMP learned prefetcher and a sequential readahead baseline, and compare hit rate and prefetch utility.\n\nExamples:\n  clump run --preset paper_compliant\n  clump run --trace boot.trace --chunk 8 --cache 2048\n  clump run --workload mixed --accesses 20000 --seed 7 --json\n  clump sweep --workload kvm --chunks 4,8,16,32 --clusters 16,32,64,128\n  clump presets"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run both engines over one trace and print the comparison.
    Run(RunArgs),

    /// Compare both engines for every chunk size and cluster size pair.
    Sweep(SweepArgs),

    /// List the named presets and their parameters.
    Presets,
}

#[derive(Args, Debug)]
struct RunArgs {
    #[command(flatten)]
    setup: SetupArgs,

    /// Report sections to print, comma separated (default: all).
    #[arg(long, value_delimiter = ',')]
    sections: Vec<String>,

    /// Print the comparison as JSON instead of the text report.
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct SweepArgs {
    #[command(flatten)]
    setup: SetupArgs,

    /// Chunk sizes to try, comma separated.
    #[arg(long, value_delimiter = ',', default_values_t = [4_u64, 8, 16, 32])]
    chunks: Vec<u64>,

    /// Cluster sizes to try, comma separated.
    #[arg(long, value_delimiter = ',', default_values_t = [16_u64, 32, 64, 128])]
    clusters: Vec<u64>,

    /// Print the sweep as JSON instead of a table.
    #[arg(long)]
    json: bool,
}

/// Trace source and configuration flags shared by `run` and `sweep`.
#[derive(Args, Debug)]
struct SetupArgs {
    /// Trace file of block ids (whitespace or comma separated, `#` comments).
    #[arg(short, long)]
    trace: Option<PathBuf>,

    /// Synthetic workload used when no trace is given.
    #[arg(short, long, value_enum)]
    workload: Option<WorkloadArg>,

    /// Accesses in the generated workload.
    #[arg(long)]
    accesses: Option<u64>,

    /// Block range of the generated workload.
    #[arg(long)]
    range: Option<u64>,

    /// Seed of the workload generator.
    #[arg(long)]
    seed: Option<u64>,

    /// Start from a named preset (see `clump presets`).
    #[arg(short, long, conflicts_with = "config")]
    preset: Option<String>,

    /// Start from a JSON configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Blocks per chunk.
    #[arg(long)]
    chunk: Option<u64>,

    /// Chunks per cluster.
    #[arg(long)]
    cluster: Option<u64>,

    /// Cache capacity in blocks (both engines).
    #[arg(long)]
    cache: Option<u64>,

    /// CluMP prefetch window in blocks.
    #[arg(long)]
    window: Option<u64>,

    /// Device size in blocks (both engines).
    #[arg(long)]
    address_space: Option<u64>,

    /// Transition predictor.
    #[arg(long, value_enum)]
    predictor: Option<PredictorArg>,

    /// Do not record transitions between accesses in the same chunk.
    #[arg(long)]
    no_self_transitions: bool,

    /// Accesses between hit-rate history samples (0 disables).
    #[arg(long)]
    history_interval: Option<u64>,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum WorkloadArg {
    Sequential,
    Random,
    Mixed,
    Kvm,
    Kernel,
}

impl From<WorkloadArg> for WorkloadKind {
    fn from(arg: WorkloadArg) -> Self {
        match arg {
            WorkloadArg::Sequential => Self::Sequential,
            WorkloadArg::Random => Self::Random,
            WorkloadArg::Mixed => Self::Mixed,
            WorkloadArg::Kvm => Self::Kvm,
            WorkloadArg::Kernel => Self::Kernel,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PredictorArg {
    Mcrow,
    Confidence,
}

impl From<PredictorArg> for Predictor {
    fn from(arg: PredictorArg) -> Self {
        match arg {
            PredictorArg::Mcrow => Self::McRow,
            PredictorArg::Confidence => Self::Confidence,
        }
    }
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => cmd_run(&args),
        Commands::Sweep(args) => cmd_sweep(&args),
        Commands::Presets => cmd_presets(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Installs a stderr `fmt` subscriber filtered by `RUST_LOG`, defaulting to `warn`.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Builds the configuration, loads or generates the trace, runs both engines and prints the result.
fn cmd_run(args: &RunArgs) -> Result<(), SimError> {
    let (config, simulator) = prepare(&args.setup)?;
    let comparison = simulator.compare(&config)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&comparison)?);
        return Ok(());
    }

    for section in &args.sections {
        if !REPORT_SECTIONS.contains(&section.as_str()) {
            warn!(section = %section, valid = ?REPORT_SECTIONS, "unknown report section ignored");
        }
    }
    let mut report = String::new();
    // Writing into a String cannot fail.
    let _ = comparison.write_sections(&mut report, &args.sections);
    print!("{report}");
    Ok(())
}

/// Runs the comparison for every requested geometry and prints a table or JSON.
fn cmd_sweep(args: &SweepArgs) -> Result<(), SimError> {
    let (config, simulator) = prepare(&args.setup)?;
    let points = simulator.sweep(&config, &args.chunks, &args.clusters)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&points)?);
        return Ok(());
    }
    let mut table = String::new();
    // Writing into a String cannot fail.
    let _ = write_sweep(&mut table, &points);
    print!("{table}");
    Ok(())
}

/// Builds and validates the configuration, then loads or generates the trace.
fn prepare(args: &SetupArgs) -> Result<(Config, Simulator), SimError> {
    let config = build_config(args)?;
    config.validate()?;
    let simulator = match &args.trace {
        Some(path) => Simulator::from_trace_file(path)?,
        None => Simulator::from_workload(&config)?,
    };
    Ok((config, simulator))
}

/// Starts from a JSON file, a preset or the defaults, then applies flag overrides.
fn build_config(args: &SetupArgs) -> Result<Config, SimError> {
    let mut config = if let Some(path) = &args.config {
        let text = fs::read_to_string(path).map_err(|source| SimError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Config::from_json(&text)?
    } else if let Some(name) = &args.preset {
        Config::preset(name)?
    } else {
        Config::default()
    };

    if let Some(kind) = args.workload {
        config.workload.kind = kind.into();
    }
    if let Some(n) = args.accesses {
        config.workload.accesses = n;
    }
    if let Some(n) = args.range {
        config.workload.address_space_blocks = n;
    }
    if let Some(seed) = args.seed {
        config.general.seed = seed;
    }
    if let Some(n) = args.chunk {
        config.clump.chunk_size_blocks = n;
    }
    if let Some(n) = args.cluster {
        config.clump.cluster_size_chunks = n;
    }
    if let Some(n) = args.cache {
        config.set_cache_capacity(n);
    }
    if let Some(n) = args.window {
        config.clump.prefetch_window_blocks = n;
    }
    if args.address_space.is_some() {
        config.set_address_space(args.address_space);
    }
    if let Some(p) = args.predictor {
        config.clump.predictor = p.into();
    }
    if args.no_self_transitions {
        config.clump.record_self_transitions = false;
    }
    if let Some(n) = args.history_interval {
        config.general.history_interval = n;
    }
    Ok(config)
}

/// Prints every preset with its engine and workload parameters.
fn cmd_presets() -> Result<(), SimError> {
    println!(
        "{:<18} {:>6} {:>8} {:>7} {:>7} {:>10} {:>9} {:>8}",
        "preset", "chunk", "cluster", "cache", "window", "workload", "accesses", "range"
    );
    for name in Config::PRESETS {
        let c = Config::preset(name)?;
        println!(
            "{:<18} {:>6} {:>8} {:>7} {:>7} {:>10} {:>9} {:>8}",
            name,
            c.clump.chunk_size_blocks,
            c.clump.cluster_size_chunks,
            c.clump.cache_capacity_blocks,
            c.clump.prefetch_window_blocks,
            c.workload.kind,
            c.workload.accesses,
            c.workload.address_space_blocks,
        );
    }
    Ok(())
}
