//! Structural properties: determinism, read-only stability, minimality.

mod common;

use std::sync::Arc;

use bloomtree_core::{
    multiproof::sibling_positions, reconstruct_root, BloomTree, CompactMultiProof, ProofType,
    TreeConfig, TreeLayout,
};
use bloomtree_crypto::leaf_hash;
use common::ScriptedFilter;
use proptest::prelude::*;

fn filter(words: Vec<u64>) -> ScriptedFilter {
    ScriptedFilter {
        words,
        k: 2,
        ..ScriptedFilter::default()
    }
    .with_element(b"a", &[1, 70])
}

#[test]
fn construction_is_deterministic() {
    let words: Vec<u64> = (0..37).map(|i| i * 0x9E37_79B9).collect();
    let cfg = TreeConfig::with_chunk_bits(128);
    let a = BloomTree::with_config(filter(words.clone()), cfg).unwrap();
    let b = BloomTree::with_config(filter(words.clone()), cfg).unwrap();
    assert_eq!(a.nodes(), b.nodes());
    assert_eq!(a.root(), b.root());

    // Rebuild after handing the filter back.
    let c = BloomTree::with_config(a.into_filter(), cfg).unwrap();
    assert_eq!(c.root(), b.root());
}

#[test]
fn root_changes_with_content_and_chunking() {
    let words: Vec<u64> = vec![3; 16];
    let base = BloomTree::with_config(filter(words.clone()), TreeConfig::with_chunk_bits(64))
        .unwrap()
        .root();

    let mut changed = words.clone();
    changed[9] ^= 1 << 40;
    let other = BloomTree::with_config(filter(changed), TreeConfig::with_chunk_bits(64))
        .unwrap()
        .root();
    assert_ne!(base, other);

    let rechunked = BloomTree::with_config(filter(words), TreeConfig::with_chunk_bits(256))
        .unwrap()
        .root();
    assert_ne!(base, rechunked);
}

#[test]
fn proving_never_moves_the_root() {
    let mut words = vec![0u64; 4];
    words[0] = 1 << 1;
    words[1] = 1 << 6;
    let tree = BloomTree::with_config(filter(words), TreeConfig::with_chunk_bits(64)).unwrap();
    let root = tree.root();
    for _ in 0..32 {
        let proof = tree.prove(b"a").unwrap();
        assert_eq!(proof.proof_type, ProofType::Presence);
        assert_eq!(tree.root(), root);
    }
}

#[test]
fn concurrent_readers_agree() {
    let mut words = vec![0u64; 64];
    words[0] = 1 << 1;
    words[1] = 1 << 6;
    let tree = Arc::new(
        BloomTree::with_config(filter(words), TreeConfig::with_chunk_bits(128)).unwrap(),
    );
    let expected = tree.prove(b"a").unwrap();
    let root = tree.root();

    std::thread::scope(|s| {
        for _ in 0..8 {
            let tree = Arc::clone(&tree);
            let expected = &expected;
            s.spawn(move || {
                for _ in 0..16 {
                    let p = tree.prove(b"a").unwrap();
                    assert_eq!(&p, expected);
                    tree.verify(b"a", &p, &root).unwrap();
                }
            });
        }
    });
    assert_eq!(tree.root(), root);
}

#[test]
fn all_leaves_need_no_siblings() {
    let tree = BloomTree::with_config(filter(vec![7; 12]), TreeConfig::with_chunk_bits(64)).unwrap();
    let all: Vec<usize> = (0..tree.layout().leaf_count).collect();
    assert!(tree.compact_proof(&all).unwrap().is_empty());
}

/// Reconstruct a root from raw leaf targets (one position per chunk start).
fn roundtrip(tree: &BloomTree<ScriptedFilter>, targets: &[usize]) -> [u8; 32] {
    let layout = *tree.layout();
    let mut sorted = targets.to_vec();
    sorted.sort_unstable();
    let positions: Vec<u64> = sorted
        .iter()
        .map(|&t| (t * layout.chunk_bits) as u64)
        .collect();
    let proof = CompactMultiProof {
        leaves: sorted.iter().map(|&t| *tree.leaf(t).unwrap()).collect(),
        siblings: tree.compact_proof(targets).unwrap(),
        proof_type: ProofType::Presence,
    };
    reconstruct_root(&layout, &positions, &proof).unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 64,
        .. ProptestConfig::default()
    })]

    // Never worse than independent authentication paths; zero when complete.
    #[test]
    fn multiproof_is_no_larger_than_separate_paths(
        leaves in 1usize..=64,
        picks in prop::collection::vec(any::<prop::sample::Index>(), 1..24),
    ) {
        let layout = TreeLayout::new(leaves, TreeConfig::with_chunk_bits(64)).unwrap();
        let targets: Vec<usize> = picks.iter().map(|i| i.index(layout.leaf_count)).collect();
        let sibs = sibling_positions(&layout, &targets).unwrap();

        prop_assert!(sibs.len() <= targets.len() * layout.height());
        // No slot twice, never the root.
        let mut dedup = sibs.clone();
        dedup.dedup();
        prop_assert_eq!(dedup.len(), sibs.len());
        prop_assert!(sibs.iter().all(|&p| p < layout.node_count() - 1));

        let all: Vec<usize> = (0..layout.leaf_count).collect();
        prop_assert!(sibling_positions(&layout, &all).unwrap().is_empty());
    }

    // Shipped digests plus chunk leaves rebuild the committed root.
    #[test]
    fn multiproof_reconstructs_root(
        words in prop::collection::vec(any::<u64>(), 1..40),
        picks in prop::collection::vec(any::<prop::sample::Index>(), 1..12),
    ) {
        let tree = BloomTree::with_config(filter(words), TreeConfig::with_chunk_bits(64)).unwrap();
        let chunks = tree.layout().chunk_count;
        let targets: Vec<usize> = picks.iter().map(|i| i.index(chunks)).collect();
        prop_assert_eq!(roundtrip(&tree, &targets), tree.root());
    }
}

#[test]
fn filler_leaves_bind_their_slot() {
    let tree = BloomTree::with_config(filter(vec![1, 2, 3]), TreeConfig::with_chunk_bits(64)).unwrap();
    assert_eq!(tree.layout().leaf_count, 4);
    assert_eq!(*tree.leaf(3).unwrap(), leaf_hash(0, &[3]));
    assert_ne!(tree.leaf(3), tree.leaf(0));
}
