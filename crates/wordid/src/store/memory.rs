use core::time::Duration;
use std::collections::{HashMap, hash_map::Entry};

use parking_lot::Mutex;
use portable_atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};

use crate::{AliasStore, Error, Result, ShardStore};

/// How the store retries a shard transaction after a write conflict.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total transaction attempts, including the first.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(64),
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct ShardDoc {
    used: u64,
    version: u64,
}

/// An in-process document store implementing [`ShardStore`] and
/// [`AliasStore`].
///
/// Each shard counter is a versioned document. [`ShardStore::try_increment`]
/// runs an optimistic read-modify-write: it reads the document, decides, and
/// commits only if the version is unchanged. On a conflict the whole
/// transaction is retried with exponential backoff, up to
/// [`RetryPolicy::max_attempts`]. The backoff is a [`tokio::time::sleep`], so
/// a conflicting increment panics outside a Tokio runtime with the time
/// driver enabled.
///
/// Useful for tests, benchmarks and simulations. Production deployments plug
/// a real document store in behind the same traits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    shards: Mutex<Vec<ShardDoc>>,
    aliases: Mutex<HashMap<String, String>>,
    retry: RetryPolicy,
    conflicts: AtomicU64,
    pending_conflicts: AtomicU32,
    fail_reads: AtomicBool,
}

enum Commit {
    Done(u64),
    Conflict,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store whose shards already hold the given `used` counts.
    pub fn with_counts(counts: impl IntoIterator<Item = u64>) -> Self {
        let shards = counts
            .into_iter()
            .map(|used| ShardDoc { used, version: 0 })
            .collect();
        Self {
            shards: Mutex::new(shards),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Number of write conflicts observed since creation.
    pub fn conflicts(&self) -> u64 {
        self.conflicts.load(Ordering::Relaxed)
    }

    /// Makes the next `n` shard commits observe a conflicting write.
    pub fn inject_conflicts(&self, n: u32) {
        self.pending_conflicts.store(n, Ordering::Relaxed);
    }

    /// Makes [`ShardStore::read_all_counts`] fail while `fail` is set.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::Relaxed);
    }

    /// Number of alias records held.
    pub fn alias_count(&self) -> usize {
        self.aliases.lock().len()
    }

    fn read_shard(&self, shard: usize) -> Result<ShardDoc> {
        self.shards
            .lock()
            .get(shard)
            .copied()
            .ok_or_else(|| Error::Store {
                reason: format!("shard {shard} not found"),
            })
    }

    fn commit(&self, shard: usize, read: ShardDoc) -> Result<Commit> {
        let injected = self
            .pending_conflicts
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1))
            .is_ok();

        let mut shards = self.shards.lock();
        let doc = shards.get_mut(shard).ok_or_else(|| Error::Store {
            reason: format!("shard {shard} not found"),
        })?;
        if injected || doc.version != read.version {
            return Ok(Commit::Conflict);
        }
        doc.used = read.used + 1;
        doc.version += 1;
        Ok(Commit::Done(read.used))
    }
}

impl ShardStore for MemoryStore {
    async fn initialize_shards(&self, shard_count: usize) -> Result<()> {
        let mut shards = self.shards.lock();
        let next_version = shards.iter().map(|d| d.version + 1).max().unwrap_or(0);
        *shards = vec![
            ShardDoc {
                used: 0,
                version: next_version,
            };
            shard_count
        ];
        Ok(())
    }

    async fn read_all_counts(&self) -> Result<Vec<u64>> {
        if self.fail_reads.load(Ordering::Relaxed) {
            return Err(Error::SnapshotRead {
                reason: "shard enumeration interrupted".to_string(),
            });
        }
        Ok(self.shards.lock().iter().map(|d| d.used).collect())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(level = "trace", skip(self)))]
    async fn try_increment(&self, shard: usize, capacity: u64) -> Result<u64> {
        let mut backoff = self.retry.initial_backoff;
        let mut attempt = 0;

        loop {
            attempt += 1;
            let read = self.read_shard(shard)?;
            if read.used >= capacity {
                return Err(Error::ShardFull { shard });
            }

            match self.commit(shard, read)? {
                Commit::Done(previous) => return Ok(previous),
                Commit::Conflict => {
                    self.conflicts.fetch_add(1, Ordering::Relaxed);
                    #[cfg(feature = "tracing")]
                    tracing::debug!(shard, attempt, "write conflict on shard counter");

                    if attempt >= self.retry.max_attempts {
                        return Err(Error::TransientStore {
                            shard,
                            attempts: attempt,
                        });
                    }
                    tokio::time::sleep(backoff).await;
                    backoff = (backoff * 2).min(self.retry.max_backoff);
                }
            }
        }
    }
}

impl AliasStore for MemoryStore {
    async fn put_alias(&self, key: &str, target: &str) -> Result<()> {
        match self.aliases.lock().entry(key.to_string()) {
            Entry::Occupied(_) => Err(Error::AliasTaken {
                alias: key.to_string(),
            }),
            Entry::Vacant(slot) => {
                slot.insert(target.to_string());
                Ok(())
            }
        }
    }

    async fn get_target(&self, key: &str) -> Result<Option<String>> {
        Ok(self.aliases.lock().get(key).cloned())
    }
}
