use core::time::Duration;

use crate::{Capacity, DEFAULT_ROUND_KEYS, Error, Result};

/// Default bound on a single alias operation.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(5);

/// Default separator between alias words.
pub const DEFAULT_DELIMITER: char = '-';

/// Deployment parameters for an [`AliasService`](crate::AliasService).
///
/// All values are fixed for the lifetime of a shard set. Round keys are not a
/// secret; they only have to stay the same for issued aliases to decode to
/// the same IDs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub capacity: Capacity,
    pub round_keys: Vec<u64>,
    pub delimiter: char,
    pub deadline: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            capacity: Capacity::DEFAULT,
            round_keys: DEFAULT_ROUND_KEYS.to_vec(),
            delimiter: DEFAULT_DELIMITER,
            deadline: DEFAULT_DEADLINE,
        }
    }
}

impl Config {
    /// A default configuration over a different capacity.
    pub fn with_capacity(capacity: Capacity) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    /// Width in bits of the permuted integer behind every alias.
    pub const fn cipher_width(&self) -> u32 {
        self.capacity.cipher_width()
    }

    /// # Errors
    ///
    /// Returns [`Error::InvalidCipher`] without round keys, or
    /// [`Error::InvalidAlias`] for a whitespace or alphanumeric delimiter or a
    /// zero deadline.
    pub fn validate(&self) -> Result<()> {
        if self.round_keys.is_empty() {
            return Err(Error::InvalidCipher {
                reason: "at least one round key is required".to_string(),
            });
        }
        if self.delimiter.is_whitespace() || self.delimiter.is_alphanumeric() {
            return Err(Error::InvalidAlias {
                reason: format!("delimiter {:?} must be punctuation", self.delimiter),
            });
        }
        if self.deadline.is_zero() {
            return Err(Error::InvalidAlias {
                reason: "deadline must be positive".to_string(),
            });
        }
        Ok(())
    }
}
