//! Presence / absence proof assembly.
//!
//! A [`CompactMultiProof`] carries the leaf digests of the chunks holding the
//! witness bits (one per bit position, ascending, repeats kept), the
//! deduplicated sibling digests, and a one-byte [`ProofType`].
//!
//! Serialization is via `serde`; `proof_type` travels as its raw byte.

use std::collections::BTreeMap;

use bloomtree_crypto::Digest;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::filter::{bit_at, BloomFilter};
use crate::params::PRESENCE_PROOF_TYPE;
use crate::tree::{chunk_leaf, BloomTree};
use crate::{BloomTreeError, Result};

/// What a proof claims about its element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum ProofType {
    /// Every candidate bit is set.
    Presence,
    /// The candidate bit at this ordinal (hash function index) is unset.
    Absence(u8),
}

impl From<u8> for ProofType {
    fn from(b: u8) -> Self {
        if b == PRESENCE_PROOF_TYPE {
            Self::Presence
        } else {
            Self::Absence(b)
        }
    }
}

impl From<ProofType> for u8 {
    fn from(t: ProofType) -> Self {
        match t {
            ProofType::Presence => PRESENCE_PROOF_TYPE,
            ProofType::Absence(i) => i,
        }
    }
}

/// Compact multiproof of presence or absence.
///
/// **Invariants**
/// - `leaves[i]` is the digest of the chunk holding the i-th smallest
///   witness position.
/// - `siblings` are ordered layer by layer from the leaves up, ascending
///   within a layer; the root is never included.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactMultiProof {
    /// Chunk leaf digests, one per witness position.
    pub leaves: Vec<Digest>,
    /// Deduplicated supplementary digests.
    pub siblings: Vec<Digest>,
    /// Presence sentinel or absence ordinal.
    pub proof_type: ProofType,
}

impl CompactMultiProof {
    /// `true` for a presence proof.
    #[inline]
    #[must_use]
    pub const fn is_presence(&self) -> bool {
        matches!(self.proof_type, ProofType::Presence)
    }

    /// Digests carried in total.
    #[inline]
    #[must_use]
    pub fn digest_count(&self) -> usize {
        self.leaves.len() + self.siblings.len()
    }
}

impl<F: BloomFilter> BloomTree<F> {
    /// Assemble a compact multiproof for `element`.
    ///
    /// Leaf digests are rehashed from the filter's current bit storage, so a
    /// filter mutated after construction yields a proof that no longer
    /// matches [`root`](Self::root).
    ///
    /// # Errors
    /// [`BloomTreeError::Proof`] if the filter answers outside its contract:
    /// no positions, an absence answer with other than one position, a
    /// position past the committed storage, a witness bit with the wrong
    /// value, or an absence position missing from `candidate_positions`.
    pub fn prove(&self, element: &[u8]) -> Result<CompactMultiProof> {
        let (mut positions, present) = self.filter().test(element);
        positions.sort_unstable();

        if positions.is_empty() {
            return Err(BloomTreeError::Proof("filter returned no bit positions".into()));
        }
        if !present && positions.len() != 1 {
            return Err(BloomTreeError::Proof(format!(
                "absence answer must carry exactly one position, got {}",
                positions.len()
            )));
        }

        let layout = *self.layout();
        let words = self.filter().bit_storage();
        let mut chunks = Vec::with_capacity(positions.len());
        let mut leaves = Vec::with_capacity(positions.len());
        let mut rehashed: BTreeMap<usize, Digest> = BTreeMap::new();

        for &pos in &positions {
            let chunk = layout.chunk_of(pos).ok_or_else(|| {
                BloomTreeError::Proof(format!(
                    "bit position {pos} outside committed storage ({} bits)",
                    layout.bit_len()
                ))
            })?;
            match bit_at(&words, pos) {
                Some(set) if set == present => {}
                Some(set) => {
                    return Err(BloomTreeError::Proof(format!(
                        "bit {pos} is {} but filter reported element {}",
                        if set { "set" } else { "unset" },
                        if present { "present" } else { "absent" }
                    )))
                }
                None => {
                    return Err(BloomTreeError::Proof(format!(
                        "bit position {pos} outside current filter storage"
                    )))
                }
            }

            let leaf = match rehashed.get(&chunk) {
                Some(d) => *d,
                None => {
                    let d = chunk_leaf(&words, chunk, layout.words_per_chunk()).ok_or_else(
                        || BloomTreeError::Proof(format!("chunk {chunk} missing from storage")),
                    )?;
                    rehashed.insert(chunk, d);
                    d
                }
            };
            chunks.push(chunk);
            leaves.push(leaf);
        }

        let siblings = self.compact_proof(&chunks)?;

        let proof_type = if present {
            ProofType::Presence
        } else {
            ProofType::Absence(self.absence_ordinal(element, positions[0])?)
        };

        debug!(
            positions = positions.len(),
            chunks = rehashed.len(),
            siblings = siblings.len(),
            proof_type = u8::from(proof_type),
            "assembled compact multiproof"
        );

        Ok(CompactMultiProof {
            leaves,
            siblings,
            proof_type,
        })
    }

    /// Index of `pos` within the element's ordered candidate list; the last
    /// match wins when a position repeats.
    fn absence_ordinal(&self, element: &[u8], pos: u64) -> Result<u8> {
        let candidates = self.filter().candidate_positions(element);
        let ordinal = candidates.iter().rposition(|&c| c == pos).ok_or_else(|| {
            BloomTreeError::Proof(format!("unset position {pos} is not a candidate of the element"))
        })?;
        u8::try_from(ordinal)
            .ok()
            .filter(|&o| o < PRESENCE_PROOF_TYPE)
            .ok_or_else(|| BloomTreeError::Proof(format!("candidate ordinal {ordinal} out of range")))
    }
}
