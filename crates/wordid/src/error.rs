//! Error types for alias allocation and resolution.
//!
//! Every failure is returned to the immediate caller. Nothing here retries on
//! its own beyond what the document store performs internally for write
//! conflicts, so callers use [`Error::is_retryable`] to decide whether a whole
//! `create_alias` call is worth repeating.

use core::time::Duration;

pub type Result<T, E = Error> = core::result::Result<T, E>;

/// All errors that `wordid` can produce.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Every shard reports zero remaining block budget.
    ///
    /// Not retryable without operator intervention.
    #[error("capacity exhausted: no shard has remaining block budget")]
    CapacityExhausted,

    /// The selected shard filled up between the snapshot and the increment.
    #[error("shard {shard} is full")]
    ShardFull { shard: usize },

    /// The atomic increment did not commit within the store's retry bound.
    #[error("shard {shard} increment did not commit after {attempts} attempts")]
    TransientStore { shard: usize, attempts: u32 },

    /// Reading the per-shard counts failed.
    #[error("failed to read shard counts: {reason}")]
    SnapshotRead { reason: String },

    /// The caller-supplied deadline elapsed before the operation completed.
    #[error("deadline of {deadline:?} exceeded")]
    DeadlineExceeded { deadline: Duration },

    /// No record exists for the alias.
    #[error("alias not found: {alias}")]
    AliasNotFound { alias: String },

    /// A record already exists for the alias and was left untouched.
    #[error("alias already taken: {alias}")]
    AliasTaken { alias: String },

    #[error("invalid capacity: {reason}")]
    InvalidCapacity { reason: String },

    #[error("invalid cipher parameters: {reason}")]
    InvalidCipher { reason: String },

    #[error("invalid dictionary: {reason}")]
    InvalidDictionary { reason: String },

    /// A word that is not part of the dictionary.
    #[error("unknown word: {word}")]
    UnknownWord { word: String },

    #[error("invalid alias: {reason}")]
    InvalidAlias { reason: String },

    /// An integer does not fit the configured bit width.
    #[error("value {value} does not fit in {width} bits")]
    ValueOutOfRange { value: u64, width: u32 },

    /// Any other document store failure.
    #[error("store error: {reason}")]
    Store { reason: String },
}

impl Error {
    /// Returns `true` when repeating the whole call may succeed without
    /// operator intervention.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ShardFull { .. }
                | Self::TransientStore { .. }
                | Self::SnapshotRead { .. }
                | Self::DeadlineExceeded { .. }
        )
    }
}
