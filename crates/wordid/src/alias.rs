//! Public word aliases for internal targets.
//!
//! [`AliasService::create_alias`] runs allocate -> permute -> encode and stores
//! the joined words as the key of a record pointing at the caller's target.
//! Resolution is a direct lookup of that record; the cipher is never run
//! backwards in production.

use core::{fmt, future::Future, time::Duration};
use std::sync::Arc;

use crate::{
    AliasStore, AllocatedId, Allocator, Config, Dictionary, Error, FeistelCipher, RandSource,
    Result, ShardReport, ShardStore, ThreadRandom, WordEncoder,
};

/// An ordered, fixed-length word sequence identifying one target.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Alias {
    words: Vec<String>,
    delimiter: char,
}

impl Alias {
    pub fn new(words: Vec<String>, delimiter: char) -> Self {
        Self { words, delimiter }
    }

    /// Splits `s` on `delimiter`, expecting exactly `len` non-empty words.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAlias`] on a word count mismatch or an empty
    /// word.
    pub fn parse(s: &str, delimiter: char, len: usize) -> Result<Self> {
        let words: Vec<String> = s.split(delimiter).map(str::to_string).collect();
        if words.len() != len {
            return Err(Error::InvalidAlias {
                reason: format!("expected {len} words in {s:?}, got {}", words.len()),
            });
        }
        if words.iter().any(String::is_empty) {
            return Err(Error::InvalidAlias {
                reason: format!("empty word in {s:?}"),
            });
        }
        Ok(Self { words, delimiter })
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub const fn delimiter(&self) -> char {
        self.delimiter
    }
}

impl fmt::Display for Alias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, word) in self.words.iter().enumerate() {
            if i > 0 {
                write!(f, "{}", self.delimiter)?;
            }
            f.write_str(word)?;
        }
        Ok(())
    }
}

/// Creates and resolves aliases against a document store.
///
/// Every async operation except [`initialize`](Self::initialize) is bounded
/// by a deadline and must run inside a Tokio runtime with the time driver
/// enabled.
///
/// # Example
/// ```
/// use std::sync::Arc;
/// use wordid::{AliasService, Capacity, Config, MemoryStore};
///
/// # tokio_test();
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn tokio_test() {
/// let config = Config::with_capacity(Capacity::new(1 << 24, 16, 256).unwrap());
/// let service = AliasService::new(Arc::new(MemoryStore::new()), config).unwrap();
/// service.initialize().await.unwrap();
///
/// let alias = service.create_alias("class-7").await.unwrap();
/// assert_eq!(alias.words().len(), 2);
/// assert_eq!(service.resolve_alias(&alias.to_string()).await.unwrap(), "class-7");
/// # }
/// ```
#[derive(Debug)]
pub struct AliasService<S, R = ThreadRandom> {
    store: Arc<S>,
    allocator: Allocator<S, R>,
    cipher: FeistelCipher,
    encoder: WordEncoder,
    delimiter: char,
    deadline: Duration,
}

impl<S> AliasService<S, ThreadRandom>
where
    S: ShardStore + AliasStore,
{
    /// # Errors
    ///
    /// Returns an error if `config` fails [`Config::validate`].
    pub fn new(store: Arc<S>, config: Config) -> Result<Self> {
        Self::with_rand(store, config, ThreadRandom)
    }
}

impl<S, R> AliasService<S, R>
where
    S: ShardStore + AliasStore,
    R: RandSource + Send + Sync,
{
    /// Creates a service drawing shard choices from `rand`.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` fails [`Config::validate`].
    pub fn with_rand(store: Arc<S>, config: Config, rand: R) -> Result<Self> {
        config.validate()?;
        let width = config.cipher_width();
        let cipher = FeistelCipher::new(width, config.round_keys)?;
        let encoder = WordEncoder::new(width, Dictionary::builtin())?;

        Ok(Self {
            allocator: Allocator::with_rand(Arc::clone(&store), config.capacity, rand),
            store,
            cipher,
            encoder,
            delimiter: config.delimiter,
            deadline: config.deadline,
        })
    }

    /// Replaces the built-in dictionary.
    ///
    /// ⚠️ Aliases issued with a different dictionary no longer decode.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDictionary`] if a word contains the delimiter.
    pub fn with_dictionary(mut self, dictionary: Dictionary) -> Result<Self> {
        if dictionary.contains_char(self.delimiter) {
            return Err(Error::InvalidDictionary {
                reason: format!("words must not contain the delimiter {:?}", self.delimiter),
            });
        }
        self.encoder = WordEncoder::new(self.encoder.width(), dictionary)?;
        Ok(self)
    }

    pub const fn allocator(&self) -> &Allocator<S, R> {
        &self.allocator
    }

    /// Creates every shard counter. Run exactly once, before any traffic.
    pub async fn initialize(&self) -> Result<()> {
        self.allocator.initialize().await
    }

    /// Issues a new alias for `target`, bounded by the configured deadline.
    ///
    /// # Errors
    ///
    /// Any allocation error (see [`Allocator::allocate`]),
    /// [`Error::DeadlineExceeded`], or a store error while writing the record.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime with the time driver enabled;
    /// the deadline is a [`tokio::time::timeout`].
    pub async fn create_alias(&self, target: &str) -> Result<Alias> {
        self.create_alias_within(target, self.deadline).await
    }

    /// Issues a new alias for `target`, failing with
    /// [`Error::DeadlineExceeded`] if `deadline` elapses first.
    ///
    /// # Errors
    ///
    /// See [`AliasService::create_alias`].
    ///
    /// # Panics
    ///
    /// Outside a Tokio runtime, as [`AliasService::create_alias`].
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    pub async fn create_alias_within(&self, target: &str, deadline: Duration) -> Result<Alias> {
        within(deadline, async {
            let id = self.allocator.allocate().await?;
            let alias = self.alias_for(id)?;
            self.store.put_alias(&alias.to_string(), target).await?;

            #[cfg(feature = "tracing")]
            tracing::info!(%alias, shard = id.shard(), "issued alias");
            Ok(alias)
        })
        .await
    }

    /// Looks up the target recorded for `alias`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AliasNotFound`] when no record exists.
    ///
    /// # Panics
    ///
    /// Outside a Tokio runtime, as [`AliasService::create_alias`].
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    pub async fn resolve_alias(&self, alias: &str) -> Result<String> {
        within(self.deadline, async {
            self.store
                .get_target(alias)
                .await?
                .ok_or_else(|| Error::AliasNotFound {
                    alias: alias.to_string(),
                })
        })
        .await
    }

    /// The alias that encodes `id`. Pure; nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValueOutOfRange`] if `id` lies outside the space.
    pub fn alias_for(&self, id: AllocatedId) -> Result<Alias> {
        let capacity = self.allocator.capacity();
        if id.value() >= capacity.total_ids() {
            return Err(Error::ValueOutOfRange {
                value: id.value(),
                width: self.cipher.width(),
            });
        }
        let permuted = self.cipher.encrypt(id.value())?;
        let words = self
            .encoder
            .encode(permuted)?
            .into_iter()
            .map(str::to_string)
            .collect();
        Ok(Alias::new(words, self.delimiter))
    }

    /// Recovers the dense ID behind an alias string by decoding and
    /// decrypting it. For diagnostics only.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAlias`] or [`Error::UnknownWord`] for
    /// malformed input, and [`Error::ValueOutOfRange`] for an alias that no
    /// allocation could have produced.
    pub fn inspect(&self, alias: &str) -> Result<AllocatedId> {
        let alias = Alias::parse(alias, self.delimiter, self.encoder.words_per_value())?;
        let permuted = self.encoder.decode(alias.words())?;
        let value = self.cipher.decrypt(permuted)?;
        AllocatedId::from_value(self.allocator.capacity(), value)
    }

    /// Current fill level of every shard.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SnapshotRead`] if the counts cannot be read.
    ///
    /// # Panics
    ///
    /// Outside a Tokio runtime, as [`AliasService::create_alias`].
    pub async fn shard_report(&self) -> Result<ShardReport> {
        within(self.deadline, self.allocator.shard_report()).await
    }
}

async fn within<T>(deadline: Duration, fut: impl Future<Output = Result<T>>) -> Result<T> {
    tokio::time::timeout(deadline, fut)
        .await
        .unwrap_or_else(|_| Err(Error::DeadlineExceeded { deadline }))
}
