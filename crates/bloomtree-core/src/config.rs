//! Tree configuration.

use serde::{Deserialize, Serialize};

use crate::params::{DEFAULT_CHUNK_BITS, WORD_BITS};
use crate::{BloomTreeError, Result};

/// Tunables for building a [`BloomTree`](crate::BloomTree).
///
/// `chunk_bits` trades proof size against leaf-hash granularity: larger
/// chunks give a shallower tree but each leaf binds more of the filter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// Bits of filter storage per leaf. Power of two, multiple of 64.
    pub chunk_bits: usize,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            chunk_bits: DEFAULT_CHUNK_BITS,
        }
    }
}

impl TreeConfig {
    /// Config with an explicit chunk size.
    #[inline]
    #[must_use]
    pub const fn with_chunk_bits(chunk_bits: usize) -> Self {
        Self { chunk_bits }
    }

    /// Reject chunk sizes that are not a power-of-two multiple of the word width.
    pub fn validate(&self) -> Result<()> {
        if !self.chunk_bits.is_power_of_two() || self.chunk_bits < WORD_BITS {
            return Err(BloomTreeError::Config(format!(
                "chunk_bits must be a power of two and at least {WORD_BITS}, got {}",
                self.chunk_bits
            )));
        }
        Ok(())
    }

    /// Storage words per chunk.
    #[inline]
    #[must_use]
    pub const fn words_per_chunk(&self) -> usize {
        self.chunk_bits / WORD_BITS
    }
}
