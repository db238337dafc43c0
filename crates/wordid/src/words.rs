//! Mapping between permuted integers and dictionary words.
//!
//! An integer is split into 12-bit groups, least-significant first, and each
//! group indexes a dense, order-stable dictionary directly. Distinct integers
//! always produce distinct word sequences because every group value owns
//! exactly one word.

use std::collections::HashMap;

use crate::{BITS_PER_WORD, Error, MAX_WIDTH, Result};

/// Number of addressable dictionary entries.
pub const DICTIONARY_SIZE: usize = 1 << BITS_PER_WORD;

const GROUP_MASK: u64 = (1 << BITS_PER_WORD) - 1;

const CONSONANTS: &[u8; 16] = b"bdfghjklmnprstvz";
const VOWELS: &[u8; 4] = b"aiou";

/// A dense, zero-indexed word list.
///
/// ⚠️ Index stability is part of the alias contract: reordering or replacing
/// entries makes previously issued aliases decode to different integers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Dictionary {
    words: Vec<String>,
    index: HashMap<String, u16>,
}

impl Dictionary {
    /// The built-in list of 4096 pronounceable four-letter words.
    ///
    /// Word `i` is two consonant-vowel syllables taken from a fixed 64-entry
    /// table: `syllable(i >> 6) + syllable(i & 63)`.
    pub fn builtin() -> Self {
        let syllable = |i: usize| [CONSONANTS[i >> 2], VOWELS[i & 3]];
        let words = (0..DICTIONARY_SIZE).map(|i| {
            let [a, b] = syllable(i >> 6);
            let [c, d] = syllable(i & 63);
            String::from_utf8_lossy(&[a, b, c, d]).into_owned()
        });
        Self::build(words.collect())
    }

    /// Builds a dictionary from an ordered word list.
    ///
    /// Only the first [`DICTIONARY_SIZE`] entries are addressable; any beyond
    /// that are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidDictionary`] if fewer than
    /// [`DICTIONARY_SIZE`] words are supplied, or if an addressable word is
    /// empty, contains whitespace, or appears twice.
    pub fn from_words<I, S>(words: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let words: Vec<String> = words
            .into_iter()
            .take(DICTIONARY_SIZE)
            .map(Into::into)
            .collect();

        if words.len() < DICTIONARY_SIZE {
            return Err(Error::InvalidDictionary {
                reason: format!(
                    "{} words supplied, at least {DICTIONARY_SIZE} required",
                    words.len()
                ),
            });
        }
        if let Some((i, w)) = words
            .iter()
            .enumerate()
            .find(|(_, w)| w.is_empty() || w.chars().any(char::is_whitespace))
        {
            return Err(Error::InvalidDictionary {
                reason: format!("word {i} ({w:?}) is empty or contains whitespace"),
            });
        }

        let dictionary = Self::build(words);
        if dictionary.index.len() != DICTIONARY_SIZE {
            return Err(Error::InvalidDictionary {
                reason: "words must be distinct".to_string(),
            });
        }
        Ok(dictionary)
    }

    /// Parses a newline-separated word list, ignoring blank lines.
    ///
    /// # Errors
    ///
    /// See [`Dictionary::from_words`].
    pub fn parse(text: &str) -> Result<Self> {
        Self::from_words(text.lines().map(str::trim).filter(|l| !l.is_empty()))
    }

    fn build(words: Vec<String>) -> Self {
        let index = words
            .iter()
            .enumerate()
            .map(|(i, w)| (w.clone(), i as u16))
            .collect();
        Self { words, index }
    }

    /// The word at `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index >= DICTIONARY_SIZE`. Use [`Dictionary::get`] when the
    /// index may be out of range.
    pub fn word(&self, index: u16) -> &str {
        &self.words[usize::from(index)]
    }

    pub fn get(&self, index: u16) -> Option<&str> {
        self.words.get(usize::from(index)).map(String::as_str)
    }

    pub fn index_of(&self, word: &str) -> Option<u16> {
        self.index.get(word).copied()
    }

    /// Returns `true` if any word contains `c`.
    pub fn contains_char(&self, c: char) -> bool {
        self.words.iter().any(|w| w.contains(c))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(String::as_str)
    }
}

impl Default for Dictionary {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Encodes `width`-bit integers as `width / 12` dictionary words.
#[derive(Clone, Debug)]
pub struct WordEncoder {
    width: u32,
    dictionary: Dictionary,
}

impl WordEncoder {
    /// # Errors
    ///
    /// Returns [`Error::InvalidDictionary`] unless `width` is a positive
    /// multiple of 12 no wider than [`MAX_WIDTH`].
    pub fn new(width: u32, dictionary: Dictionary) -> Result<Self> {
        if width == 0 || width > MAX_WIDTH || width % BITS_PER_WORD != 0 {
            return Err(Error::InvalidDictionary {
                reason: format!(
                    "width must be a positive multiple of {BITS_PER_WORD} up to {MAX_WIDTH}, got {width}"
                ),
            });
        }
        Ok(Self { width, dictionary })
    }

    pub const fn width(&self) -> u32 {
        self.width
    }

    pub const fn words_per_value(&self) -> usize {
        (self.width / BITS_PER_WORD) as usize
    }

    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    /// Splits `value` into 12-bit groups, least-significant first, and looks
    /// each one up.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValueOutOfRange`] if `value >= 2^width`.
    pub fn encode(&self, value: u64) -> Result<Vec<&str>> {
        if value >> self.width != 0 {
            return Err(Error::ValueOutOfRange {
                value,
                width: self.width,
            });
        }
        let mut rest = value;
        let mut words = Vec::with_capacity(self.words_per_value());
        for _ in 0..self.words_per_value() {
            words.push(self.dictionary.word((rest & GROUP_MASK) as u16));
            rest >>= BITS_PER_WORD;
        }
        Ok(words)
    }

    /// Inverts [`encode`](Self::encode).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAlias`] if the word count is wrong, or
    /// [`Error::UnknownWord`] for a word outside the dictionary.
    pub fn decode<S: AsRef<str>>(&self, words: &[S]) -> Result<u64> {
        if words.len() != self.words_per_value() {
            return Err(Error::InvalidAlias {
                reason: format!(
                    "expected {} words, got {}",
                    self.words_per_value(),
                    words.len()
                ),
            });
        }
        words.iter().enumerate().try_fold(0, |acc, (i, word)| {
            let word = word.as_ref();
            let index = self
                .dictionary
                .index_of(word)
                .ok_or_else(|| Error::UnknownWord {
                    word: word.to_string(),
                })?;
            Ok(acc | u64::from(index) << (i as u32 * BITS_PER_WORD))
        })
    }
}
