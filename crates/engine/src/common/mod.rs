//! Common types shared by every unit of the simulator.
//!
//! 1. **Addresses:** Block, chunk and cluster id mapping plus the address-space bound.
//! 2. **Errors:** Configuration, trace and driver error types.

/// Block / chunk / cluster address mapping.
pub mod addr;

/// Error types.
pub mod error;

pub use addr::{AddressSpace, BlockId, ChunkId, ClusterId, Geometry};
pub use error::{ConfigError, SimError, TraceError};
