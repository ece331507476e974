//! Fixed-width bit-string backing a classifier's condition and consequent.
//!
//! The engine treats the bit layout as opaque: only a [`Representation`]
//! interprets it. The operations here are the bit-level primitives the
//! genetic operators need (get/set/flip, splice at a cut point).
//!
//! [`Representation`]: crate::Representation

use serde::{Deserialize, Serialize};

const WORD_BITS: usize = u64::BITS as usize;

/// Growable bit-string packed into `u64` words.
///
/// Bits beyond `len` are kept zeroed so that derived equality and hashing
/// stay structural.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Chromosome {
    len: usize,
    words: Vec<u64>,
}

impl Chromosome {
    /// Creates an all-zero bit-string of `len` bits.
    #[must_use]
    pub fn zeroed(len: usize) -> Self {
        Self {
            len,
            words: vec![0; len.div_ceil(WORD_BITS)],
        }
    }

    /// Parses a string of `'0'` / `'1'` characters, index 0 first.
    ///
    /// # Panics
    ///
    /// Panics on any other character. Intended for tests and fixtures.
    #[must_use]
    pub fn from_bits_str(s: &str) -> Self {
        let mut c = Self::zeroed(s.len());
        for (i, ch) in s.chars().enumerate() {
            match ch {
                '0' => {}
                '1' => c.set(i, true),
                _ => panic!("invalid bit character: {ch:?}"),
            }
        }
        c
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn get(&self, index: usize) -> bool {
        assert!(index < self.len);
        self.words[index / WORD_BITS] & (1 << (index % WORD_BITS)) != 0
    }

    pub fn set(&mut self, index: usize, value: bool) {
        assert!(index < self.len);
        let mask = 1 << (index % WORD_BITS);
        if value {
            self.words[index / WORD_BITS] |= mask;
        } else {
            self.words[index / WORD_BITS] &= !mask;
        }
    }

    pub fn flip(&mut self, index: usize) {
        assert!(index < self.len);
        self.words[index / WORD_BITS] ^= 1 << (index % WORD_BITS);
    }

    /// Number of set bits.
    #[must_use]
    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Builds a new bit-string taking bits `[0, cut)` from `prefix` and
    /// bits `[cut, len)` from `suffix`.
    ///
    /// # Panics
    ///
    /// Panics if the two parents differ in length or `cut > len`.
    #[must_use]
    pub fn spliced(prefix: &Self, suffix: &Self, cut: usize) -> Self {
        assert_eq!(prefix.len, suffix.len);
        assert!(cut <= prefix.len);
        let mut child = Self::zeroed(prefix.len);
        for i in 0..cut {
            child.set(i, prefix.get(i));
        }
        for i in cut..suffix.len {
            child.set(i, suffix.get(i));
        }
        child
    }
}

impl std::fmt::Display for Chromosome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for i in 0..self.len {
            write!(f, "{}", u8::from(self.get(i)))?;
        }
        Ok(())
    }
}
