//! Compact multiproof: which sibling digests a verifier is missing.
//!
//! Walks the tree one layer at a time from the leaves towards the root,
//! keeping a *frontier* of node indices whose digest the verifier can already
//! derive. Frontier nodes are grouped by sibling pair `(2m, 2m + 1)`:
//!
//! - both members known: the parent is derivable, nothing is shipped;
//! - one member known: the other one's digest is shipped.
//!
//! Every pair then contributes its parent to the next frontier. The root is
//! never shipped. Shipped positions come out layer by layer, ascending within
//! a layer, which is also the order [`crate::verify`] consumes them in.

use std::collections::{BTreeMap, BTreeSet};

use crate::layout::TreeLayout;
use crate::{BloomTreeError, Result};

/// Resolution state of one sibling pair within a layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum PairState {
    /// Only one member known; carries the missing sibling's in-layer index.
    Needs(usize),
    /// Both members known.
    Resolved,
}

/// Node-array positions of the supplementary digests for `targets`.
///
/// `targets` are leaf indices; repeats collapse. Fails with
/// [`BloomTreeError::Proof`] for an index outside the padded leaf layer.
pub fn sibling_positions(layout: &TreeLayout, targets: &[usize]) -> Result<Vec<usize>> {
    if let Some(&bad) = targets.iter().find(|&&t| t >= layout.leaf_count) {
        return Err(BloomTreeError::Proof(format!(
            "leaf index {bad} out of range (leaf_count={})",
            layout.leaf_count
        )));
    }

    let mut frontier: BTreeSet<usize> = targets.iter().copied().collect();
    let mut out = Vec::new();

    for h in 0..layout.height() {
        let offset = layout.layer_offset(h);

        // Fresh per layer; dropped at the end of the iteration.
        let mut pairs: BTreeMap<(usize, usize), PairState> = BTreeMap::new();
        for &v in &frontier {
            let s = v ^ 1;
            pairs
                .entry((v.min(s), v.max(s)))
                .and_modify(|st| *st = PairState::Resolved)
                .or_insert(PairState::Needs(s));
        }

        // BTreeMap order = ascending position within the layer.
        out.extend(pairs.values().filter_map(|st| match st {
            PairState::Needs(s) => Some(offset + s),
            PairState::Resolved => None,
        }));

        frontier = pairs.keys().map(|&(lo, _)| lo / 2).collect();
    }

    Ok(out)
}
