//! Error types for the simulator.
//!
//! The engines themselves have exactly one failure mode: a bad parameter at
//! construction. Everything else here belongs to the layers around them:
//! 1. **Configuration:** Zero sizes, inverted window bounds, unknown presets.
//! 2. **Traces:** Unparseable tokens and I/O failures while reading input.
//! 3. **Driver:** An umbrella type the CLI reports and exits on.
//!
//! Out-of-range block addresses are deliberately absent: they are skipped, not reported.

use thiserror::Error;

/// Invalid simulator parameters.
///
/// Raised synchronously by every constructor before any state exists, so a
/// failed construction never leaves a usable engine behind.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// A size, window, capacity or threshold was zero.
    #[error("parameter `{parameter}` must be a positive integer")]
    ZeroParameter {
        /// Name of the first offending parameter.
        parameter: &'static str,
    },

    /// The readahead window would start above its own ceiling.
    #[error("initial readahead window ({initial}) exceeds maximum window ({max})")]
    WindowOrder {
        /// Requested initial window in blocks.
        initial: u64,
        /// Requested maximum window in blocks.
        max: u64,
    },

    /// No preset carries the requested name.
    #[error("unknown preset `{0}`")]
    UnknownPreset(String),
}

impl ConfigError {
    /// Returns `Err(ZeroParameter)` when `value` is zero.
    ///
    /// # Arguments
    ///
    /// * `parameter` - Name reported in the error.
    /// * `value` - Value to check.
    pub(crate) fn require_positive(parameter: &'static str, value: u64) -> Result<(), Self> {
        if value == 0 {
            Err(Self::ZeroParameter { parameter })
        } else {
            Ok(())
        }
    }
}

/// Failure while reading a block trace.
#[derive(Error, Debug)]
pub enum TraceError {
    /// A token was not a non-negative integer.
    #[error("line {line}: `{token}` is not a block id")]
    InvalidToken {
        /// 1-based line number.
        line: usize,
        /// The offending text.
        token: String,
    },

    /// The trace could not be read.
    #[error("cannot read trace: {0}")]
    Io(#[from] std::io::Error),
}

/// Any error surfaced by the run driver.
#[derive(Error, Debug)]
pub enum SimError {
    /// Invalid configuration.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Invalid or unreadable trace.
    #[error(transparent)]
    Trace(#[from] TraceError),

    /// Malformed JSON configuration, or a report that failed to serialize.
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    /// Reading a configuration file failed.
    #[error("cannot read {path}: {source}")]
    Io {
        /// File that failed.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}
