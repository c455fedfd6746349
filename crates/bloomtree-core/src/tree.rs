//! Tree builder and root accessor.
//!
//! Chunks of the filter's bit storage become leaves, the leaf layer is padded
//! to a power of two with filler leaves, and internal layers are folded
//! bottom-up into one flat node array. The array is never written again
//! after construction, so a `BloomTree` can be shared freely between readers.

use bloomtree_crypto::{filler_leaf, leaf_hash, node_hash, Digest};
use tracing::debug;

use crate::config::TreeConfig;
use crate::filter::BloomFilter;
use crate::layout::TreeLayout;
use crate::multiproof::sibling_positions;
use crate::params::PRESENCE_PROOF_TYPE;
use crate::{BloomTreeError, Result};

/// Merkle commitment over a Bloom filter's bit array.
#[derive(Clone, Debug)]
pub struct BloomTree<F> {
    filter: F,
    layout: TreeLayout,
    nodes: Vec<Digest>, // leaves, then layers bottom-up, nodes.last() = root
}

impl<F: BloomFilter> BloomTree<F> {
    /// Build with [`TreeConfig::default`].
    pub fn new(filter: F) -> Result<Self> {
        Self::with_config(filter, TreeConfig::default())
    }

    /// Build over a snapshot of `filter`'s bit storage.
    ///
    /// # Errors
    /// - [`BloomTreeError::Config`] if `k >= 255` or the chunk size is invalid.
    /// - [`BloomTreeError::EmptyStructure`] if the bit storage has no words.
    pub fn with_config(filter: F, config: TreeConfig) -> Result<Self> {
        let k = filter.hash_function_count();
        if k >= usize::from(PRESENCE_PROOF_TYPE) {
            return Err(BloomTreeError::Config(format!(
                "parameter k of the bloom filter must be smaller than {PRESENCE_PROOF_TYPE}, got {k}"
            )));
        }

        let (layout, nodes) = {
            let words = filter.bit_storage();
            let layout = TreeLayout::new(words.len(), config)?;
            (layout, build_nodes(&words, &layout))
        };

        debug!(
            k,
            words = layout.word_count,
            chunks = layout.chunk_count,
            leaves = layout.leaf_count,
            height = layout.height(),
            "built bloom tree"
        );

        Ok(Self {
            filter,
            layout,
            nodes,
        })
    }
}

impl<F> BloomTree<F> {
    /// The committed root digest.
    #[inline]
    #[must_use]
    pub fn root(&self) -> Digest {
        // Non-empty by construction: at least one leaf.
        self.nodes[self.nodes.len() - 1]
    }

    /// Digests of the supplementary siblings needed to prove `targets`.
    ///
    /// See [`crate::multiproof`] for ordering and deduplication rules.
    pub fn compact_proof(&self, targets: &[usize]) -> Result<Vec<Digest>> {
        let positions = sibling_positions(&self.layout, targets)?;
        Ok(positions.into_iter().map(|p| self.nodes[p]).collect())
    }

    /// The filter this tree commits to.
    #[inline]
    #[must_use]
    pub const fn filter(&self) -> &F {
        &self.filter
    }

    /// Tree shape, for handing to verifiers.
    #[inline]
    #[must_use]
    pub const fn layout(&self) -> &TreeLayout {
        &self.layout
    }

    /// Full node array (leaves first, root last).
    #[inline]
    #[must_use]
    pub fn nodes(&self) -> &[Digest] {
        &self.nodes
    }

    /// Leaf digest at `index` (fillers included).
    #[inline]
    #[must_use]
    pub fn leaf(&self, index: usize) -> Option<&Digest> {
        self.nodes[..self.layout.leaf_count].get(index)
    }

    /// Give the filter back, discarding the tree.
    #[must_use]
    pub fn into_filter(self) -> F {
        self.filter
    }
}

/// Leaf digest of chunk `ordinal` over `words`; a short final chunk hashes
/// only the words it has.
pub(crate) fn chunk_leaf(words: &[u64], ordinal: usize, words_per_chunk: usize) -> Option<Digest> {
    let start = ordinal.checked_mul(words_per_chunk)?;
    if start >= words.len() {
        return None;
    }
    let end = (start + words_per_chunk).min(words.len());
    Some(leaf_hash(ordinal as u64, &words[start..end]))
}

fn build_nodes(words: &[u64], layout: &TreeLayout) -> Vec<Digest> {
    let n = layout.leaf_count;
    let mut nodes = Vec::with_capacity(layout.node_count());

    nodes.extend(
        words
            .chunks(layout.words_per_chunk())
            .enumerate()
            .map(|(i, c)| leaf_hash(i as u64, c)),
    );
    nodes.extend((layout.chunk_count..n).map(|i| filler_leaf(i as u64)));

    // Slot i >= n is the parent of slots 2(i-n) and 2(i-n)+1.
    for i in n..layout.node_count() {
        let j = 2 * (i - n);
        let parent = node_hash(&nodes[j], &nodes[j + 1]);
        nodes.push(parent);
    }
    nodes
}
