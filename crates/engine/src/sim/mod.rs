//! Simulation driver and its inputs.
//!
//! Everything here sits outside the engines and only exchanges plain data
//! with them:
//! 1. **Trace:** Parsing block-id traces from text or files.
//! 2. **Workload:** Seeded synthetic trace generators.
//! 3. **Simulator:** Replays a trace through engines and collects their metrics.

/// Block trace parsing.
pub mod trace;

/// Seeded synthetic workloads.
pub mod workload;

/// Run driver.
pub mod simulator;

pub use self::simulator::Simulator;
