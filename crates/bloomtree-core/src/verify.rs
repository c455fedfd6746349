//! Root reconstruction from a compact multiproof.
//!
//! Replays the layer walk of [`crate::multiproof`]: known digests are paired
//! with their siblings, and whenever a sibling is unknown the next digest is
//! taken from `proof.siblings`. Because the generator emits siblings in pair
//! order, a single forward cursor suffices.

use std::collections::BTreeMap;

use bloomtree_crypto::{node_hash, to_hex, Digest};
use tracing::trace;

use crate::filter::BloomFilter;
use crate::layout::TreeLayout;
use crate::proof::{CompactMultiProof, ProofType};
use crate::tree::BloomTree;
use crate::{BloomTreeError, Result};

/// Outcome of a successful verification.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Membership {
    /// All candidate chunks authenticated.
    Present,
    /// The candidate chunk at `ordinal` authenticated.
    Absent {
        /// Hash function index of the witness bit.
        ordinal: u8,
    },
}

fn malformed(msg: impl Into<String>) -> BloomTreeError {
    BloomTreeError::Verify(msg.into())
}

/// Recompute the root implied by `proof` for the witness bit `positions`.
///
/// `positions` need not be sorted; they are matched to `proof.leaves` in
/// ascending order.
pub fn reconstruct_root(
    layout: &TreeLayout,
    positions: &[u64],
    proof: &CompactMultiProof,
) -> Result<Digest> {
    if positions.is_empty() {
        return Err(malformed("no witness positions"));
    }
    if positions.len() != proof.leaves.len() {
        return Err(malformed(format!(
            "{} positions but {} leaf digests",
            positions.len(),
            proof.leaves.len()
        )));
    }

    let mut sorted = positions.to_vec();
    sorted.sort_unstable();

    // In-layer index -> digest for the current layer.
    let mut known: BTreeMap<usize, Digest> = BTreeMap::new();
    for (&pos, leaf) in sorted.iter().zip(&proof.leaves) {
        let chunk = layout
            .chunk_of(pos)
            .filter(|&c| c < layout.chunk_count)
            .ok_or_else(|| malformed(format!("position {pos} outside the tree")))?;
        if let Some(prev) = known.insert(chunk, *leaf) {
            if prev != *leaf {
                return Err(malformed(format!("conflicting digests for chunk {chunk}")));
            }
        }
    }

    let mut siblings = proof.siblings.iter();
    let mut next_sibling = || {
        siblings
            .next()
            .copied()
            .ok_or_else(|| malformed("ran out of sibling digests"))
    };

    for _ in 0..layout.height() {
        let mut parents = BTreeMap::new();
        let mut it = known.into_iter().peekable();
        while let Some((v, d)) = it.next() {
            let (left, right) = if v % 2 == 0 {
                match it.next_if(|(w, _)| *w == v + 1) {
                    Some((_, r)) => (d, r),
                    None => (d, next_sibling()?),
                }
            } else {
                (next_sibling()?, d)
            };
            parents.insert(v / 2, node_hash(&left, &right));
        }
        known = parents;
    }

    if siblings.next().is_some() {
        return Err(malformed("unused sibling digests"));
    }
    match (known.len(), known.get(&0)) {
        (1, Some(root)) => Ok(*root),
        _ => Err(malformed("walk did not converge to a single root")),
    }
}

/// Check `proof` for an element with the given ordered `candidates` against
/// a trusted `root`.
///
/// Presence proofs cover every candidate; absence proofs cover the candidate
/// at the proof-type ordinal.
pub fn verify_compact_multiproof(
    layout: &TreeLayout,
    candidates: &[u64],
    proof: &CompactMultiProof,
    root: &Digest,
) -> Result<Membership> {
    let (positions, membership) = match proof.proof_type {
        ProofType::Presence => (candidates.to_vec(), Membership::Present),
        ProofType::Absence(ordinal) => {
            let pos = candidates
                .get(usize::from(ordinal))
                .ok_or_else(|| malformed(format!("absence ordinal {ordinal} has no candidate")))?;
            (vec![*pos], Membership::Absent { ordinal })
        }
    };

    let got = reconstruct_root(layout, &positions, proof)?;
    if got != *root {
        trace!(expected = %to_hex(root), got = %to_hex(&got), "root mismatch");
        return Err(malformed(format!(
            "root mismatch: expected={}, recomputed={}",
            to_hex(root),
            to_hex(&got)
        )));
    }
    Ok(membership)
}

impl<F: BloomFilter> BloomTree<F> {
    /// Verify `proof` for `element` using this tree's filter for candidate
    /// positions and layout. `root` is the trusted commitment.
    pub fn verify(
        &self,
        element: &[u8],
        proof: &CompactMultiProof,
        root: &Digest,
    ) -> Result<Membership> {
        let candidates = self.filter().candidate_positions(element);
        verify_compact_multiproof(self.layout(), &candidates, proof, root)
    }
}
