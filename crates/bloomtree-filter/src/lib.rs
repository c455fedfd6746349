// crates/bloomtree-filter/src/lib.rs

//! Seeded Bloom filter that satisfies the [`bloomtree_core::BloomFilter`]
//! contract.
//!
//! - Candidate positions use double hashing over one BLAKE3 digest of
//!   `seed || element`: `pos_i = (h1 + i * h2) mod m`.
//! - Storage is `ceil(m / 64)` little-endian-indexed words.
//! - Snapshots serialize with the seed hex-encoded and are validated on
//!   decode.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(clippy::module_name_repetitions)]

use std::borrow::Cow;

use blake3::Hasher;
use bloomtree_core::{BloomFilter, PRESENCE_PROOF_TYPE, WORD_BITS};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Filter profiles loaded from TOML.
pub mod profile;

pub use profile::FilterProfile;

/// Domain prefix for candidate derivation.
const POSITION_PREFIX: &[u8] = b"bloomtree.filter.v1";

/// Errors from filter construction or snapshot decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FilterError {
    /// Zero-sized bit array.
    #[error("filter must have at least one bit")]
    NoBits,
    /// `k` outside `1..255`.
    #[error("hash function count must be in 1..{max}, got {got}", max = PRESENCE_PROOF_TYPE)]
    BadHashCount {
        /// Requested `k`.
        got: usize,
    },
    /// Snapshot words do not match the declared bit length.
    #[error("snapshot has {got} words, expected {expected}")]
    WordCount {
        /// Words implied by `bit_len`.
        expected: usize,
        /// Words present.
        got: usize,
    },
    /// Seed is not valid hex.
    #[error("invalid seed hex: {0}")]
    Seed(String),
}

/// Bloom filter over `bit_len` bits with `hashes` seeded hash functions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Snapshot", into = "Snapshot")]
pub struct SeededBloomFilter {
    bit_len: u64,
    hashes: usize,
    seed: Vec<u8>,
    words: Vec<u64>,
}

/// Serialized form.
#[derive(Serialize, Deserialize)]
struct Snapshot {
    bit_len: u64,
    hashes: usize,
    seed: String,
    words: Vec<u64>,
}

impl From<SeededBloomFilter> for Snapshot {
    fn from(f: SeededBloomFilter) -> Self {
        Self {
            bit_len: f.bit_len,
            hashes: f.hashes,
            seed: hex::encode(&f.seed),
            words: f.words,
        }
    }
}

impl TryFrom<Snapshot> for SeededBloomFilter {
    type Error = FilterError;

    fn try_from(s: Snapshot) -> Result<Self, Self::Error> {
        let seed = hex::decode(&s.seed).map_err(|e| FilterError::Seed(e.to_string()))?;
        let mut f = Self::new(s.bit_len, s.hashes, seed)?;
        if s.words.len() != f.words.len() {
            return Err(FilterError::WordCount {
                expected: f.words.len(),
                got: s.words.len(),
            });
        }
        f.words = s.words;
        Ok(f)
    }
}

impl SeededBloomFilter {
    /// Empty filter.
    pub fn new(bit_len: u64, hashes: usize, seed: impl Into<Vec<u8>>) -> Result<Self, FilterError> {
        if bit_len == 0 {
            return Err(FilterError::NoBits);
        }
        if hashes == 0 || hashes >= usize::from(PRESENCE_PROOF_TYPE) {
            return Err(FilterError::BadHashCount { got: hashes });
        }
        let n_words = usize::try_from(bit_len.div_ceil(WORD_BITS as u64))
            .map_err(|_| FilterError::NoBits)?;
        Ok(Self {
            bit_len,
            hashes,
            seed: seed.into(),
            words: vec![0u64; n_words],
        })
    }

    /// Size `(m, k)` for `expected_items` at false-positive rate `fp_rate`.
    ///
    /// Uses the textbook optimum `m = -n ln p / ln2^2`, `k = m/n ln2`, with
    /// `k` clamped to `1..=254`.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn optimal_params(expected_items: u64, fp_rate: f64) -> (u64, usize) {
        let n = expected_items.max(1) as f64;
        let p = fp_rate.clamp(1e-12, 0.5);
        let ln2 = std::f64::consts::LN_2;
        let m = (-(n * p.ln()) / (ln2 * ln2)).ceil().max(1.0);
        let k = ((m / n) * ln2).round().clamp(1.0, 254.0);
        (m as u64, k as usize)
    }

    /// Filter with `elements` inserted.
    pub fn from_elements<I, E>(
        bit_len: u64,
        hashes: usize,
        seed: impl Into<Vec<u8>>,
        elements: I,
    ) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = E>,
        E: AsRef<[u8]>,
    {
        let mut f = Self::new(bit_len, hashes, seed)?;
        for e in elements {
            f.insert(e.as_ref());
        }
        Ok(f)
    }

    /// Set every candidate bit of `element`.
    pub fn insert(&mut self, element: &[u8]) {
        for pos in self.positions(element) {
            self.set_bit(pos);
        }
    }

    /// Standard membership query (false positives possible).
    #[must_use]
    pub fn contains(&self, element: &[u8]) -> bool {
        self.first_unset(element).is_none()
    }

    /// Bits in the filter.
    #[inline]
    #[must_use]
    pub const fn bit_len(&self) -> u64 {
        self.bit_len
    }

    /// Seed bytes.
    #[inline]
    #[must_use]
    pub fn seed(&self) -> &[u8] {
        &self.seed
    }

    /// Number of set bits.
    #[must_use]
    pub fn popcount(&self) -> u64 {
        self.words.iter().map(|w| u64::from(w.count_ones())).sum()
    }

    /// Read bit `pos` (false past the end).
    #[inline]
    #[must_use]
    pub fn bit(&self, pos: u64) -> bool {
        bloomtree_core::filter::bit_at(&self.words, pos).unwrap_or(false)
    }

    fn set_bit(&mut self, pos: u64) {
        let w = (pos / WORD_BITS as u64) as usize;
        if let Some(word) = self.words.get_mut(w) {
            *word |= 1 << (pos % WORD_BITS as u64);
        }
    }

    fn first_unset(&self, element: &[u8]) -> Option<u64> {
        self.positions(element).into_iter().find(|&p| !self.bit(p))
    }

    fn positions(&self, element: &[u8]) -> Vec<u64> {
        let mut h = Hasher::new();
        h.update(POSITION_PREFIX);
        h.update(&(self.seed.len() as u64).to_le_bytes());
        h.update(&self.seed);
        h.update(element);
        let digest = h.finalize();
        let bytes = digest.as_bytes();

        let mut lo = [0u8; 8];
        let mut hi = [0u8; 8];
        lo.copy_from_slice(&bytes[0..8]);
        hi.copy_from_slice(&bytes[8..16]);
        let h1 = u64::from_le_bytes(lo);
        // Odd step so consecutive candidates differ whenever m > 1.
        let h2 = u64::from_le_bytes(hi) | 1;

        (0..self.hashes as u64)
            .map(|i| h1.wrapping_add(i.wrapping_mul(h2)) % self.bit_len)
            .collect()
    }
}

impl BloomFilter for SeededBloomFilter {
    fn bit_storage(&self) -> Cow<'_, [u64]> {
        Cow::Borrowed(&self.words)
    }

    fn test(&self, element: &[u8]) -> (Vec<u64>, bool) {
        match self.first_unset(element) {
            Some(pos) => (vec![pos], false),
            None => (self.positions(element), true),
        }
    }

    fn hash_function_count(&self) -> usize {
        self.hashes
    }

    fn candidate_positions(&self, element: &[u8]) -> Vec<u64> {
        self.positions(element)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inserted_elements_are_members() {
        let items: Vec<Vec<u8>> = (0u8..32).map(|i| vec![i]).collect();
        let f = SeededBloomFilter::from_elements(1024, 5, b"secret seed".to_vec(), &items).unwrap();
        for it in &items {
            assert!(f.contains(it));
            let (pos, present) = f.test(it);
            assert!(present);
            assert_eq!(pos, f.candidate_positions(it));
        }
        assert!(f.popcount() > 0);
    }

    #[test]
    fn absent_answer_is_one_unset_candidate() {
        let f = SeededBloomFilter::from_elements(4096, 4, b"s".to_vec(), [b"a", b"b"]).unwrap();
        let (pos, present) = f.test(b"zzz");
        assert!(!present);
        assert_eq!(pos.len(), 1);
        assert!(!f.bit(pos[0]));
        assert!(f.candidate_positions(b"zzz").contains(&pos[0]));
    }

    #[test]
    fn seed_changes_positions() {
        let a = SeededBloomFilter::new(1 << 20, 6, b"one".to_vec()).unwrap();
        let b = SeededBloomFilter::new(1 << 20, 6, b"two".to_vec()).unwrap();
        assert_ne!(a.candidate_positions(b"x"), b.candidate_positions(b"x"));
        assert_eq!(a.candidate_positions(b"x"), a.candidate_positions(b"x"));
        assert!(a.candidate_positions(b"x").iter().all(|&p| p < 1 << 20));
    }

    #[test]
    fn constructor_validation() {
        assert_eq!(
            SeededBloomFilter::new(0, 3, vec![]),
            Err(FilterError::NoBits)
        );
        assert_eq!(
            SeededBloomFilter::new(64, 0, vec![]),
            Err(FilterError::BadHashCount { got: 0 })
        );
        assert_eq!(
            SeededBloomFilter::new(64, 255, vec![]),
            Err(FilterError::BadHashCount { got: 255 })
        );
        assert_eq!(SeededBloomFilter::new(65, 3, vec![]).unwrap().words.len(), 2);
    }

    #[test]
    fn optimal_params_are_sane() {
        let (m, k) = SeededBloomFilter::optimal_params(1000, 0.01);
        assert!((9_000..10_000).contains(&m), "m={m}");
        assert_eq!(k, 7);
    }
}
