//! Declarative filter description, typically loaded from TOML:
//!
//! ```toml
//! seed = "secret seed"
//! bits = 4096          # optional; sized from false_positive_rate if absent
//! hashes = 5           # optional
//! false_positive_rate = 0.01
//! elements = ["alice", "bob"]
//!
//! [tree]
//! chunk_bits = 256
//! ```

use bloomtree_core::TreeConfig;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{FilterError, SeededBloomFilter};

const fn default_fp_rate() -> f64 {
    0.01
}

/// Filter parameters plus the elements to insert.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilterProfile {
    /// Hash seed (UTF-8).
    pub seed: String,
    /// Bit length; derived from the element count when absent.
    #[serde(default)]
    pub bits: Option<u64>,
    /// Hash function count; derived when absent.
    #[serde(default)]
    pub hashes: Option<usize>,
    /// Target false-positive rate used for derived parameters.
    #[serde(default = "default_fp_rate")]
    pub false_positive_rate: f64,
    /// Elements to insert (UTF-8).
    #[serde(default)]
    pub elements: Vec<String>,
    /// Tree chunking for this filter.
    #[serde(default)]
    pub tree: TreeConfig,
}

impl FilterProfile {
    /// Resolved `(bits, hashes)`.
    #[must_use]
    pub fn params(&self) -> (u64, usize) {
        let (m, k) = SeededBloomFilter::optimal_params(
            self.elements.len() as u64,
            self.false_positive_rate,
        );
        (self.bits.unwrap_or(m), self.hashes.unwrap_or(k))
    }

    /// Build the filter with every element inserted.
    pub fn build(&self) -> Result<SeededBloomFilter, FilterError> {
        let (bits, hashes) = self.params();
        debug!(bits, hashes, elements = self.elements.len(), "building filter from profile");
        SeededBloomFilter::from_elements(
            bits,
            hashes,
            self.seed.as_bytes().to_vec(),
            self.elements.iter().map(String::as_bytes),
        )
    }
}
