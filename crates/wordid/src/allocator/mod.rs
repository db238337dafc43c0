//! Dense ID allocation over sharded counters.
//!
//! [`Allocator::allocate`] snapshots every shard's fill level, picks a shard
//! with [`select_shard`], and atomically increments that shard's counter. The
//! pre-increment value is an offset into the shard's own sub-range, so two
//! successful allocations can never share an ID: same-shard increments are
//! serialized by the store, and shards own disjoint ranges.

#[cfg(test)]
mod tests;

use core::fmt;
use std::sync::Arc;

use crate::{
    Capacity, Error, RandSource, Result, ShardStore, ThreadRandom, remaining_blocks,
    remaining_by_shard, select_shard,
};

/// A dense ID issued by an [`Allocator`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AllocatedId {
    value: u64,
    shard: usize,
    offset: u64,
}

impl AllocatedId {
    /// The ID at `offset` within `shard`'s sub-range.
    pub const fn new(capacity: &Capacity, shard: usize, offset: u64) -> Self {
        Self {
            value: shard as u64 * capacity.ids_per_shard() + offset,
            shard,
            offset,
        }
    }

    /// Recovers shard and offset from a raw dense ID.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValueOutOfRange`] if `value` is outside the space.
    pub fn from_value(capacity: &Capacity, value: u64) -> Result<Self> {
        let (shard, offset) = capacity.locate(value)?;
        Ok(Self::new(capacity, shard, offset))
    }

    pub const fn value(&self) -> u64 {
        self.value
    }

    pub const fn shard(&self) -> usize {
        self.shard
    }

    pub const fn offset(&self) -> u64 {
        self.offset
    }
}

impl fmt::Display for AllocatedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// Fill level of one shard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ShardFill {
    pub shard: usize,
    pub used: u64,
    /// Block budget left for weighting; zero means the shard is no longer
    /// selected.
    pub remaining_blocks: u64,
    /// IDs that can still be issued before the reserved block is reached.
    pub allocatable_ids: u64,
}

impl ShardFill {
    pub const fn is_exhausted(&self) -> bool {
        self.remaining_blocks == 0
    }
}

/// Per-shard snapshot for operators.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ShardReport {
    pub shards: Vec<ShardFill>,
}

impl ShardReport {
    fn new(counts: &[u64], capacity: &Capacity) -> Self {
        // Selection stops once `used` enters the reserved last block.
        let usable = (capacity.blocks_per_shard() - 1) * capacity.block_size();
        let shards = counts
            .iter()
            .enumerate()
            .map(|(shard, &used)| ShardFill {
                shard,
                used,
                remaining_blocks: remaining_blocks(used, capacity),
                allocatable_ids: usable.saturating_sub(used),
            })
            .collect();
        Self { shards }
    }

    pub fn used_ids(&self) -> u64 {
        self.shards.iter().map(|s| s.used).sum()
    }

    pub fn allocatable_ids(&self) -> u64 {
        self.shards.iter().map(|s| s.allocatable_ids).sum()
    }

    /// `true` when no shard can be selected any more.
    pub fn is_exhausted(&self) -> bool {
        self.shards.iter().all(ShardFill::is_exhausted)
    }
}

/// Allocates dense integer IDs from a [`ShardStore`].
///
/// The allocator holds no counter state of its own; every decision is made
/// from a fresh snapshot and committed through the store's atomic increment.
#[derive(Debug)]
pub struct Allocator<S, R = ThreadRandom> {
    store: Arc<S>,
    capacity: Capacity,
    rand: R,
}

impl<S> Allocator<S, ThreadRandom>
where
    S: ShardStore,
{
    pub fn new(store: Arc<S>, capacity: Capacity) -> Self {
        Self::with_rand(store, capacity, ThreadRandom)
    }
}

impl<S, R> Allocator<S, R>
where
    S: ShardStore,
    R: RandSource + Send + Sync,
{
    pub fn with_rand(store: Arc<S>, capacity: Capacity, rand: R) -> Self {
        Self {
            store,
            capacity,
            rand,
        }
    }

    pub const fn capacity(&self) -> &Capacity {
        &self.capacity
    }

    /// Creates every shard counter with `used = 0`.
    ///
    /// ⚠️ Resets existing counts. Run exactly once, before any traffic.
    pub async fn initialize(&self) -> Result<()> {
        self.store
            .initialize_shards(self.capacity.shard_count())
            .await
    }

    /// Allocates one dense ID.
    ///
    /// A shard that fills up between the snapshot and the increment fails the
    /// call with [`Error::ShardFull`]; no other shard is tried.
    ///
    /// # Errors
    ///
    /// - [`Error::SnapshotRead`] if the counts cannot be read
    /// - [`Error::CapacityExhausted`] if no shard has budget left
    /// - [`Error::ShardFull`] if the selected shard lost the race
    /// - [`Error::TransientStore`] if the increment could not commit
    #[cfg_attr(feature = "tracing", tracing::instrument(level = "debug", skip(self), err))]
    pub async fn allocate(&self) -> Result<AllocatedId> {
        let counts = self.snapshot().await?;
        let remaining = remaining_by_shard(&counts, &self.capacity);
        let shard = select_shard(&remaining, &self.rand)?;

        let previous = self
            .store
            .try_increment(shard, self.capacity.shard_capacity())
            .await?;
        let id = AllocatedId::new(&self.capacity, shard, previous);

        #[cfg(feature = "tracing")]
        tracing::debug!(
            shard,
            offset = previous,
            remaining_blocks = remaining[shard],
            "allocated id"
        );
        Ok(id)
    }

    /// Current fill level of every shard.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SnapshotRead`] if the counts cannot be read.
    pub async fn shard_report(&self) -> Result<ShardReport> {
        let counts = self.snapshot().await?;
        Ok(ShardReport::new(&counts, &self.capacity))
    }

    async fn snapshot(&self) -> Result<Vec<u64>> {
        let counts = self.store.read_all_counts().await?;
        if counts.len() != self.capacity.shard_count() {
            return Err(Error::SnapshotRead {
                reason: format!(
                    "expected {} shards, found {}",
                    self.capacity.shard_count(),
                    counts.len()
                ),
            });
        }
        Ok(counts)
    }
}
