//! Shape of a Bloom tree and the flat node-array index arithmetic.
//!
//! The node array holds `2L - 1` digests for `L` padded leaves. Layer `h`
//! (leaves are `h = 0`) has `L >> h` nodes and starts at
//! `2L - 2 * (L >> h)`; the root is the last slot. Within a layer, node `v`
//! has sibling `v ^ 1` and parent `v / 2` in the layer above.

use serde::{Deserialize, Serialize};

use crate::config::TreeConfig;
use crate::params::WORD_BITS;
use crate::{BloomTreeError, Result};

/// Public shape of a tree; all a verifier needs besides the root.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TreeLayout {
    /// Bits per chunk (leaf).
    pub chunk_bits: usize,
    /// Words in the filter's bit storage at build time.
    pub word_count: usize,
    /// Real chunks, `ceil(word_count / words_per_chunk)`.
    pub chunk_count: usize,
    /// Padded leaf count, next power of two `>= chunk_count`.
    pub leaf_count: usize,
}

impl TreeLayout {
    /// Layout for `word_count` storage words under `config`.
    pub fn new(word_count: usize, config: TreeConfig) -> Result<Self> {
        config.validate()?;
        if word_count == 0 {
            return Err(BloomTreeError::EmptyStructure);
        }
        let chunk_count = word_count.div_ceil(config.words_per_chunk());
        let leaf_count = chunk_count.checked_next_power_of_two().ok_or_else(|| {
            BloomTreeError::Config(format!("chunk count {chunk_count} too large"))
        })?;
        Ok(Self {
            chunk_bits: config.chunk_bits,
            word_count,
            chunk_count,
            leaf_count,
        })
    }

    /// Layout for a filter of `bit_len` bits (rounded up to whole words).
    pub fn for_bit_len(bit_len: u64, config: TreeConfig) -> Result<Self> {
        let words = usize::try_from(bit_len.div_ceil(WORD_BITS as u64))
            .map_err(|_| BloomTreeError::Config(format!("bit length {bit_len} too large")))?;
        Self::new(words, config)
    }

    /// Storage words per chunk.
    #[inline]
    #[must_use]
    pub const fn words_per_chunk(&self) -> usize {
        self.chunk_bits / WORD_BITS
    }

    /// Total slots in the node array.
    #[inline]
    #[must_use]
    pub const fn node_count(&self) -> usize {
        2 * self.leaf_count - 1
    }

    /// Number of layers below the root.
    #[inline]
    #[must_use]
    pub const fn height(&self) -> usize {
        self.leaf_count.trailing_zeros() as usize
    }

    /// Nodes in layer `h`.
    #[inline]
    #[must_use]
    pub const fn layer_len(&self, h: usize) -> usize {
        self.leaf_count >> h
    }

    /// First node-array slot of layer `h`.
    #[inline]
    #[must_use]
    pub const fn layer_offset(&self, h: usize) -> usize {
        2 * self.leaf_count - 2 * self.layer_len(h)
    }

    /// Storage bits covered at build time.
    #[inline]
    #[must_use]
    pub const fn bit_len(&self) -> u64 {
        (self.word_count * WORD_BITS) as u64
    }

    /// Chunk holding bit `pos`, if inside the committed storage.
    #[must_use]
    pub fn chunk_of(&self, pos: u64) -> Option<usize> {
        if pos >= self.bit_len() {
            return None;
        }
        usize::try_from(pos / self.chunk_bits as u64).ok()
    }
}
