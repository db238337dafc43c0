//! A keyed bit permutation built as a balanced Feistel network.
//!
//! The cipher maps `[0, 2^W)` bijectively onto itself so that consecutively
//! allocated IDs do not produce visually consecutive aliases. It is an
//! obfuscation, not a secrecy mechanism: round keys may live in source or
//! configuration.

use crate::{Error, Result};

/// Round keys used when none are configured.
pub const DEFAULT_ROUND_KEYS: [u64; 8] = [
    0x2F1C_8A4D, 0x6B03_E95A, 0x1D7A_C042, 0x5E94_B7F1, 0x0C3B_6D28, 0x7A51_2E9C, 0x3896_F0B3,
    0x4CE2_1A67,
];

/// Left shifts applied to the half block inside the round function.
const ROUND_SHIFTS: [u32; 3] = [1, 4, 9];

/// A Feistel permutation over `width`-bit integers.
///
/// Each round splits the value into an upper half `l` and a lower half `r`,
/// replaces `l` with `l ^ F(r, key)` and swaps the halves. A final swap after
/// the last round restores canonical ordering, which makes decryption the
/// same walk over the keys in reverse.
///
/// # Example
/// ```
/// use wordid::FeistelCipher;
///
/// let cipher = FeistelCipher::new(24, vec![7, 11, 13]).unwrap();
/// let scrambled = cipher.encrypt(42).unwrap();
/// assert!(scrambled < 1 << 24);
/// assert_eq!(cipher.decrypt(scrambled).unwrap(), 42);
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeistelCipher {
    width: u32,
    keys: Vec<u64>,
}

impl FeistelCipher {
    /// Creates a cipher over `[0, 2^width)`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCipher`] if `width` is odd, zero or above 64,
    /// or if `keys` is empty.
    pub fn new(width: u32, keys: Vec<u64>) -> Result<Self> {
        if width == 0 || width > u64::BITS || width % 2 != 0 {
            return Err(Error::InvalidCipher {
                reason: format!("width must be even and within 2..=64, got {width}"),
            });
        }
        if keys.is_empty() {
            return Err(Error::InvalidCipher {
                reason: "at least one round key is required".to_string(),
            });
        }
        Ok(Self { width, keys })
    }

    pub const fn width(&self) -> u32 {
        self.width
    }

    pub fn keys(&self) -> &[u64] {
        &self.keys
    }

    /// A cipher running the same keys in reverse order. Its
    /// [`encrypt`](Self::encrypt) is this cipher's [`decrypt`](Self::decrypt).
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            width: self.width,
            keys: self.keys.iter().rev().copied().collect(),
        }
    }

    /// Scrambles `value`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValueOutOfRange`] if `value >= 2^width`.
    pub fn encrypt(&self, value: u64) -> Result<u64> {
        self.check(value)?;
        Ok(self.permute(value, self.keys.iter()))
    }

    /// Inverts [`encrypt`](Self::encrypt).
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValueOutOfRange`] if `value >= 2^width`.
    pub fn decrypt(&self, value: u64) -> Result<u64> {
        self.check(value)?;
        Ok(self.permute(value, self.keys.iter().rev()))
    }

    /// Exchanges the upper and lower halves of a `width`-bit value. Applying
    /// it twice restores the input.
    pub const fn rotate(&self, value: u64) -> u64 {
        let half = self.width / 2;
        ((value & self.half_mask()) << half) | (value >> half)
    }

    /// The round function. It need not be invertible; the Feistel structure
    /// makes the whole transform invertible regardless.
    const fn round(&self, half: u64, key: u64) -> u64 {
        let mut acc = half;
        let mut i = 0;
        while i < ROUND_SHIFTS.len() {
            acc = acc.wrapping_add(key ^ (half << ROUND_SHIFTS[i]));
            i += 1;
        }
        acc & self.half_mask()
    }

    fn permute<'a>(&self, value: u64, keys: impl Iterator<Item = &'a u64>) -> u64 {
        let half = self.width / 2;
        let mut v = value;
        for &key in keys {
            let r = v & self.half_mask();
            let l = v >> half;
            v = self.rotate((((l ^ self.round(r, key)) << half) | r) & self.mask());
        }
        self.rotate(v)
    }

    const fn half_mask(&self) -> u64 {
        (1 << (self.width / 2)) - 1
    }

    const fn mask(&self) -> u64 {
        u64::MAX >> (u64::BITS - self.width)
    }

    fn check(&self, value: u64) -> Result<()> {
        if value > self.mask() {
            return Err(Error::ValueOutOfRange {
                value,
                width: self.width,
            });
        }
        Ok(())
    }
}
