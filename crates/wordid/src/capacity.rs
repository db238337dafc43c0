use core::ops::Range;

use crate::{Error, Result};

/// Number of bits encoded by a single dictionary word.
pub const BITS_PER_WORD: u32 = 12;

/// Widest cipher block supported. Kept a multiple of [`BITS_PER_WORD`] and
/// small enough that every intermediate fits in a `u64`.
pub const MAX_WIDTH: u32 = 60;

/// The fixed shape of the dense ID space.
///
/// `total_ids` is split evenly across `shard_count` counters, and each shard's
/// fill level is sampled in blocks of `block_size` IDs when weighting shard
/// selection.
///
/// ⚠️ These values are a one-time, pre-launch decision. Changing
/// `shard_count` or `total_ids` after shards were initialized breaks the
/// sub-range guarantees of every ID issued so far.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "serde",
    serde(try_from = "CapacityParts", into = "CapacityParts")
)]
pub struct Capacity {
    total_ids: u64,
    shard_count: usize,
    block_size: u64,
}

/// Unvalidated capacity fields, as read from configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CapacityParts {
    pub total_ids: u64,
    pub shard_count: usize,
    pub block_size: u64,
}

impl Capacity {
    /// The production layout: 2^36 IDs over 256 shards sampled in 65536-ID
    /// blocks, giving 4096 blocks per shard and three-word aliases.
    pub const DEFAULT: Self = Self {
        total_ids: 1 << 36,
        shard_count: 256,
        block_size: 1 << 16,
    };

    /// Creates a validated capacity model.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCapacity`] if any parameter is zero, if
    /// `total_ids` is not divisible by `block_size * shard_count`, or if the
    /// space is wider than [`MAX_WIDTH`] bits.
    pub fn new(total_ids: u64, shard_count: usize, block_size: u64) -> Result<Self> {
        let invalid = |reason: String| Error::InvalidCapacity { reason };

        if total_ids == 0 || shard_count == 0 || block_size == 0 {
            return Err(invalid(format!(
                "total_ids ({total_ids}), shard_count ({shard_count}) and block_size ({block_size}) must be positive"
            )));
        }
        if total_ids > 1 << MAX_WIDTH {
            return Err(invalid(format!(
                "total_ids ({total_ids}) exceeds 2^{MAX_WIDTH}"
            )));
        }
        let stride = block_size
            .checked_mul(shard_count as u64)
            .ok_or_else(|| invalid("block_size * shard_count overflows".to_string()))?;
        if total_ids % stride != 0 {
            return Err(invalid(format!(
                "total_ids ({total_ids}) is not divisible by block_size * shard_count ({stride})"
            )));
        }

        Ok(Self {
            total_ids,
            shard_count,
            block_size,
        })
    }

    pub const fn total_ids(&self) -> u64 {
        self.total_ids
    }

    pub const fn shard_count(&self) -> usize {
        self.shard_count
    }

    pub const fn block_size(&self) -> u64 {
        self.block_size
    }

    pub const fn ids_per_shard(&self) -> u64 {
        self.total_ids / self.shard_count as u64
    }

    /// Maximum `used` value a shard counter may reach.
    pub const fn shard_capacity(&self) -> u64 {
        self.ids_per_shard()
    }

    pub const fn blocks_per_shard(&self) -> u64 {
        self.ids_per_shard() / self.block_size
    }

    /// The global sub-range of IDs owned by `shard`.
    pub const fn shard_range(&self, shard: usize) -> Range<u64> {
        let start = shard as u64 * self.ids_per_shard();
        start..start + self.ids_per_shard()
    }

    /// Splits a dense ID into `(shard, offset)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValueOutOfRange`] if `id` is outside `[0, total_ids)`.
    pub fn locate(&self, id: u64) -> Result<(usize, u64)> {
        if id >= self.total_ids {
            return Err(Error::ValueOutOfRange {
                value: id,
                width: self.cipher_width(),
            });
        }
        let ids_per_shard = self.ids_per_shard();
        Ok(((id / ids_per_shard) as usize, id % ids_per_shard))
    }

    /// Smallest multiple of [`BITS_PER_WORD`] whose range covers `total_ids`.
    pub const fn cipher_width(&self) -> u32 {
        // ceil(log2(total_ids)), with total_ids == 1 needing zero bits.
        let bits = u64::BITS - (self.total_ids - 1).leading_zeros();
        let words = bits.div_ceil(BITS_PER_WORD);
        if words == 0 {
            BITS_PER_WORD
        } else {
            words * BITS_PER_WORD
        }
    }

    /// Number of words in every alias drawn from this space.
    pub const fn words_per_alias(&self) -> usize {
        (self.cipher_width() / BITS_PER_WORD) as usize
    }
}

impl Default for Capacity {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<CapacityParts> for Capacity {
    type Error = Error;

    fn try_from(parts: CapacityParts) -> Result<Self> {
        Self::new(parts.total_ids, parts.shard_count, parts.block_size)
    }
}

impl From<Capacity> for CapacityParts {
    fn from(capacity: Capacity) -> Self {
        Self {
            total_ids: capacity.total_ids,
            shard_count: capacity.shard_count,
            block_size: capacity.block_size,
        }
    }
}
