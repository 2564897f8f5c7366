//! Block, chunk and cluster addressing.
//!
//! The simulator addresses storage at three granularities:
//! 1. **Block:** The unit of external access; what a trace contains.
//! 2. **Chunk:** `block / chunk_size`; the unit of prediction and prefetch.
//! 3. **Cluster:** `chunk / cluster_size`; a memory-accounting group for transition tables.
//!
//! All mapping here is pure integer arithmetic with no state.

use super::error::ConfigError;

/// A storage block address.
pub type BlockId = u64;

/// A chunk number (`block / chunk_size`).
pub type ChunkId = u64;

/// A cluster number (`chunk / cluster_size`).
pub type ClusterId = u64;

/// Chunk and cluster sizes used to map block addresses.
///
/// Both sizes are always non-zero.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Geometry {
    chunk_size: u64,
    cluster_size: u64,
}

impl Geometry {
    /// Creates a geometry.
    ///
    /// # Arguments
    ///
    /// * `chunk_size` - Blocks per chunk.
    /// * `cluster_size` - Chunks per cluster.
    ///
    /// # Errors
    ///
    /// `ConfigError::ZeroParameter` naming the first size that is zero.
    pub fn new(chunk_size: u64, cluster_size: u64) -> Result<Self, ConfigError> {
        ConfigError::require_positive("chunk_size_blocks", chunk_size)?;
        ConfigError::require_positive("cluster_size_chunks", cluster_size)?;
        Ok(Self {
            chunk_size,
            cluster_size,
        })
    }

    /// Blocks per chunk.
    #[inline]
    pub const fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    /// Chunks per cluster.
    #[inline]
    pub const fn cluster_size(&self) -> u64 {
        self.cluster_size
    }

    /// Maps a block to the chunk that contains it.
    #[inline]
    pub const fn chunk_of(&self, block: BlockId) -> ChunkId {
        block / self.chunk_size
    }

    /// Maps a chunk to its cluster.
    #[inline]
    pub const fn cluster_of(&self, chunk: ChunkId) -> ClusterId {
        chunk / self.cluster_size
    }

    /// Position of a chunk inside its cluster.
    #[inline]
    pub const fn offset_in_cluster(&self, chunk: ChunkId) -> u64 {
        chunk % self.cluster_size
    }

    /// First block of a chunk, saturating at `u64::MAX`.
    #[inline]
    pub const fn chunk_base(&self, chunk: ChunkId) -> BlockId {
        chunk.saturating_mul(self.chunk_size)
    }
}

/// Upper bound of the simulated device.
///
/// Valid blocks are `[0, limit)`. `Unbounded` accepts every `u64`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum AddressSpace {
    /// No upper bound.
    #[default]
    Unbounded,
    /// Blocks at or above the limit do not exist.
    Bounded(u64),
}

impl AddressSpace {
    /// Builds an address space from an optional block count.
    pub const fn from_limit(limit: Option<u64>) -> Self {
        match limit {
            Some(n) => Self::Bounded(n),
            None => Self::Unbounded,
        }
    }

    /// Returns `true` if `block` lies inside the device.
    #[inline]
    pub const fn contains(&self, block: BlockId) -> bool {
        match *self {
            Self::Unbounded => true,
            Self::Bounded(limit) => block < limit,
        }
    }

    /// The block count, if bounded.
    pub const fn limit(&self) -> Option<u64> {
        match *self {
            Self::Unbounded => None,
            Self::Bounded(n) => Some(n),
        }
    }
}
