//! Test utilities: a filter whose answers are scripted per element.

#![allow(dead_code)]

use std::borrow::Cow;
use std::collections::HashMap;

use bloomtree_core::BloomFilter;

/// Filter over explicit words; each element's candidates are listed by hand.
#[derive(Clone, Debug, Default)]
pub struct ScriptedFilter {
    pub words: Vec<u64>,
    pub k: usize,
    pub candidates: HashMap<Vec<u8>, Vec<u64>>,
    /// Raw `test` answers that bypass the candidate logic.
    pub overrides: HashMap<Vec<u8>, (Vec<u64>, bool)>,
}

impl ScriptedFilter {
    /// `bit_len` bits (rounded up to words) with `set` bits on.
    pub fn new(bit_len: u64, set: &[u64], k: usize) -> Self {
        let mut words = vec![0u64; bit_len.div_ceil(64) as usize];
        for &b in set {
            words[(b / 64) as usize] |= 1 << (b % 64);
        }
        Self {
            words,
            k,
            ..Self::default()
        }
    }

    pub fn with_element(mut self, element: &[u8], candidates: &[u64]) -> Self {
        assert_eq!(candidates.len(), self.k, "candidate count must equal k");
        self.candidates.insert(element.to_vec(), candidates.to_vec());
        self
    }

    pub fn with_override(mut self, element: &[u8], positions: &[u64], present: bool) -> Self {
        self.overrides
            .insert(element.to_vec(), (positions.to_vec(), present));
        self
    }

    pub fn is_set(&self, pos: u64) -> bool {
        (self.words[(pos / 64) as usize] >> (pos % 64)) & 1 == 1
    }
}

impl BloomFilter for ScriptedFilter {
    fn bit_storage(&self) -> Cow<'_, [u64]> {
        Cow::Borrowed(&self.words)
    }

    fn test(&self, element: &[u8]) -> (Vec<u64>, bool) {
        if let Some((p, present)) = self.overrides.get(element) {
            return (p.clone(), *present);
        }
        let cands = self.candidate_positions(element);
        match cands.iter().find(|&&c| !self.is_set(c)) {
            Some(&unset) => (vec![unset], false),
            None => (cands, true),
        }
    }

    fn hash_function_count(&self) -> usize {
        self.k
    }

    fn candidate_positions(&self, element: &[u8]) -> Vec<u64> {
        self.candidates.get(element).cloned().unwrap_or_default()
    }
}

/// Flip one bit of a digest.
pub fn flip(d: &mut [u8; 32], bit: usize) {
    d[bit / 8] ^= 1 << (bit % 8);
}
