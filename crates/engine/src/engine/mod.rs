//! Access engines.
//!
//! This module contains the shared contract and the two engines that
//! implement it. An engine owns its cache and any prediction state
//! exclusively; two engines never share anything, so independent runs can
//! proceed on separate threads.

/// CluMP engine (learned chunk-transition prefetching).
pub mod clump;

/// Sequential readahead baseline (window-doubling stream detection).
pub mod readahead;

pub use self::clump::ClumpEngine;
pub use self::readahead::ReadaheadBaseline;

use crate::common::{BlockId, ConfigError};
use crate::config::{Config, Predictor};
use crate::stats::Metrics;
use crate::units::predict::ConfidenceRow;

/// Trait for simulated prefetching engines.
///
/// Engines replay one block access at a time and expose a metrics snapshot.
pub trait AccessEngine: Send {
    /// Short engine name used in reports.
    fn name(&self) -> &'static str;

    /// Processes one demand access.
    ///
    /// Must be called exactly once per simulated access, in trace order.
    ///
    /// # Arguments
    ///
    /// * `block` - The block being read.
    ///
    /// # Returns
    ///
    /// `true` if the block was already cached. Blocks outside the address
    /// space are ignored and report `false`.
    fn process_access(&mut self, block: BlockId) -> bool;

    /// Read-only snapshot of the engine's counters and derived rates.
    fn metrics(&self) -> Metrics;
}

/// Builds the CluMP engine selected by `config.clump.predictor`.
///
/// # Errors
///
/// The first invalid CluMP parameter.
pub fn build(config: &Config) -> Result<Box<dyn AccessEngine>, ConfigError> {
    let interval = config.general.history_interval;
    let engine: Box<dyn AccessEngine> = match config.clump.predictor {
        Predictor::McRow => {
            Box::new(ClumpEngine::new(&config.clump)?.with_history_interval(interval))
        }
        Predictor::Confidence => Box::new(
            ClumpEngine::<ConfidenceRow>::with_predictor(&config.clump)?
                .with_history_interval(interval),
        ),
    };
    Ok(engine)
}

/// Builds the readahead baseline.
///
/// # Errors
///
/// The first invalid readahead parameter.
pub fn build_baseline(config: &Config) -> Result<Box<dyn AccessEngine>, ConfigError> {
    Ok(Box::new(
        ReadaheadBaseline::new(&config.readahead)?
            .with_history_interval(config.general.history_interval),
    ))
}
