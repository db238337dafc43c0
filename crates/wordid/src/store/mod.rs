//! Interfaces to the external document store.
//!
//! The store owns the only shared mutable state in the system: one counter
//! document per shard and one record per issued alias. Nothing in this crate
//! keeps counter state in process memory; correctness rests entirely on the
//! store's single-document transactions.
//!
//! ## Structure
//!
//! - [`ShardStore`] - per-shard `used` counters.
//! - [`AliasStore`] - alias -> target records.
//! - [`MemoryStore`] - in-process reference backend implementing both.

mod memory;

pub use memory::*;

use core::future::Future;

use crate::Result;

/// Access to the per-shard counter documents.
pub trait ShardStore: Send + Sync {
    /// Creates `shard_count` counters, all with `used = 0`.
    ///
    /// ⚠️ Not idempotent: running it again resets every count. Call it exactly
    /// once, before any traffic.
    fn initialize_shards(&self, shard_count: usize) -> impl Future<Output = Result<()>> + Send;

    /// Returns the `used` value of every shard, ordered by shard index.
    ///
    /// This is a best-effort, non-transactional snapshot that may race with
    /// concurrent increments. It only informs weighting.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::SnapshotRead`] if enumeration fails part way.
    fn read_all_counts(&self) -> impl Future<Output = Result<Vec<u64>>> + Send;

    /// Atomically increments one shard's counter and returns the value it held
    /// before the increment.
    ///
    /// Runs as a transaction on the shard's document: if `used >= capacity`
    /// the transaction aborts with [`crate::Error::ShardFull`]. Write conflicts
    /// are retried by the store up to its own bound, after which
    /// [`crate::Error::TransientStore`] is returned. A failed call never
    /// persists a partial change.
    fn try_increment(
        &self,
        shard: usize,
        capacity: u64,
    ) -> impl Future<Output = Result<u64>> + Send;
}

/// Access to persisted alias records.
pub trait AliasStore: Send + Sync {
    /// Creates the record `key -> target`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::AliasTaken`] if a record for `key` already
    /// exists; the existing record is never overwritten.
    fn put_alias(&self, key: &str, target: &str) -> impl Future<Output = Result<()>> + Send;

    /// Looks up the target stored for `key`.
    fn get_target(&self, key: &str) -> impl Future<Output = Result<Option<String>>> + Send;
}
