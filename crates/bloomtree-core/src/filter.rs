//! Bloom filter collaborator seam.
//!
//! The tree never looks inside a concrete filter; it only consumes the four
//! operations of [`BloomFilter`]. Any filter honoring the contract below can
//! back a [`BloomTree`](crate::BloomTree).
//!
//! ## Contracts implementors should uphold
//! - `bit_storage` returns the dense bit array as 64-bit words, bit `i` at
//!   word `i / 64`, bit `i % 64`. The snapshot must not change while a tree
//!   built from it is in use; a mutated filter means the tree must be rebuilt.
//! - `test` returns **all** `k` candidate positions and `true` when the
//!   element is present, or **exactly one** unset candidate and `false`.
//! - `candidate_positions` returns the element's `k` positions in hash
//!   function order (the order that absence ordinals refer to).
//! - `hash_function_count` is `k`.

use std::borrow::Cow;
use std::sync::Arc;

use crate::params::WORD_BITS;

/// Minimal filter API the tree depends on.
pub trait BloomFilter {
    /// Dense bit array snapshot as little-endian-indexed 64-bit words.
    fn bit_storage(&self) -> Cow<'_, [u64]>;

    /// Membership test with witness positions (see module contract).
    fn test(&self, element: &[u8]) -> (Vec<u64>, bool);

    /// Number of hash functions `k`.
    fn hash_function_count(&self) -> usize;

    /// All `k` positions of `element`, in hash function order.
    fn candidate_positions(&self, element: &[u8]) -> Vec<u64>;
}

impl<F: BloomFilter + ?Sized> BloomFilter for &F {
    fn bit_storage(&self) -> Cow<'_, [u64]> {
        (**self).bit_storage()
    }
    fn test(&self, element: &[u8]) -> (Vec<u64>, bool) {
        (**self).test(element)
    }
    fn hash_function_count(&self) -> usize {
        (**self).hash_function_count()
    }
    fn candidate_positions(&self, element: &[u8]) -> Vec<u64> {
        (**self).candidate_positions(element)
    }
}

impl<F: BloomFilter + ?Sized> BloomFilter for Arc<F> {
    fn bit_storage(&self) -> Cow<'_, [u64]> {
        (**self).bit_storage()
    }
    fn test(&self, element: &[u8]) -> (Vec<u64>, bool) {
        (**self).test(element)
    }
    fn hash_function_count(&self) -> usize {
        (**self).hash_function_count()
    }
    fn candidate_positions(&self, element: &[u8]) -> Vec<u64> {
        (**self).candidate_positions(element)
    }
}

/// Read bit `pos` from word storage; `None` past the end.
#[inline]
#[must_use]
pub fn bit_at(words: &[u64], pos: u64) -> Option<bool> {
    let word = usize::try_from(pos / WORD_BITS as u64).ok()?;
    let w = words.get(word)?;
    Some((w >> (pos % WORD_BITS as u64)) & 1 == 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_at_indexes_low_bit_first() {
        let words = [0b1010u64, 1 << 63];
        assert_eq!(bit_at(&words, 0), Some(false));
        assert_eq!(bit_at(&words, 1), Some(true));
        assert_eq!(bit_at(&words, 3), Some(true));
        assert_eq!(bit_at(&words, 127), Some(true));
        assert_eq!(bit_at(&words, 64), Some(false));
        assert_eq!(bit_at(&words, 128), None);
    }
}
