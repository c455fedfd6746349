//! Seeded filter + Bloom tree: prove and verify real elements.

use bloomtree_core::{
    verify_compact_multiproof, BloomFilter, BloomTree, Membership, ProofType, TreeConfig,
    TreeLayout,
};
use bloomtree_filter::{FilterError, FilterProfile, SeededBloomFilter};
use proptest::prelude::*;

const SEED: &[u8] = b"secret seed";
static SMALL: [u8; 17] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16];

fn filter(elements: &[&[u8]]) -> SeededBloomFilter {
    SeededBloomFilter::from_elements(2048, 6, SEED.to_vec(), elements.iter().copied()).unwrap()
}

#[test]
fn present_elements_prove_presence() {
    let cases: Vec<Vec<&[u8]>> = vec![
        SMALL[1..=8].chunks(1).collect(),
        SMALL.chunks(1).collect(),
        SMALL[..=1].chunks(1).collect(),
    ];

    for elements in cases {
        let tree =
            BloomTree::with_config(filter(&elements), TreeConfig::with_chunk_bits(128)).unwrap();
        let proof = tree.prove(&[1u8]).unwrap();
        assert_eq!(proof.proof_type, ProofType::Presence);
        assert_eq!(proof.leaves.len(), 6);
        assert_eq!(
            tree.verify(&[1u8], &proof, &tree.root()).unwrap(),
            Membership::Present
        );
    }
}

#[test]
fn absent_elements_prove_absence() {
    let elements = [&b"alice"[..], b"bob", b"carol"];
    let tree =
        BloomTree::with_config(filter(&elements), TreeConfig::with_chunk_bits(128)).unwrap();
    let root = tree.root();

    let mut absent_seen = 0;
    for i in 0u32..64 {
        let stranger = format!("stranger-{i}");
        let proof = tree.prove(stranger.as_bytes()).unwrap();
        match proof.proof_type {
            ProofType::Presence => continue, // false positive
            ProofType::Absence(ordinal) => {
                absent_seen += 1;
                let candidates = tree.filter().candidate_positions(stranger.as_bytes());
                assert!(!tree.filter().bit(candidates[usize::from(ordinal)]));
                assert_eq!(
                    tree.verify(stranger.as_bytes(), &proof, &root).unwrap(),
                    Membership::Absent { ordinal }
                );
            }
        }
    }
    assert!(absent_seen > 0);
}

#[test]
fn light_verifier_needs_only_root_layout_and_seed() {
    let elements = [&b"tx-1"[..], b"tx-2", b"tx-3", b"tx-4"];
    let full = filter(&elements);
    let cfg = TreeConfig::with_chunk_bits(64);
    let tree = BloomTree::with_config(full.clone(), cfg).unwrap();
    let root = tree.root();
    let proof = tree.prove(b"tx-3").unwrap();

    // The verifier rebuilds layout from public parameters and derives
    // candidates from an empty filter sharing the seed.
    let layout = TreeLayout::for_bit_len(full.bit_len(), cfg).unwrap();
    assert_eq!(&layout, tree.layout());
    let empty = SeededBloomFilter::new(full.bit_len(), 6, SEED.to_vec()).unwrap();
    let candidates = empty.candidate_positions(b"tx-3");

    assert_eq!(
        verify_compact_multiproof(&layout, &candidates, &proof, &root).unwrap(),
        Membership::Present
    );

    // A different element's candidates do not match this proof.
    let wrong = empty.candidate_positions(b"tx-4");
    assert!(verify_compact_multiproof(&layout, &wrong, &proof, &root).is_err());
}

#[test]
fn mutated_filter_needs_a_rebuild() {
    let before = filter(&[&b"a"[..], b"b"]);
    let mut after = before.clone();
    after.insert(b"c");

    let old = BloomTree::new(before).unwrap();
    let new = BloomTree::new(after).unwrap();
    assert_ne!(old.root(), new.root());

    // Proof from the rebuilt tree does not verify against the stale root.
    let proof = new.prove(b"c").unwrap();
    assert!(new.verify(b"c", &proof, &old.root()).is_err());
    new.verify(b"c", &proof, &new.root()).unwrap();
}

#[test]
fn snapshot_json_roundtrip_and_validation() {
    let f = filter(&[&b"x"[..], b"y"]);
    let json = serde_json::to_string(&f).unwrap();
    assert!(json.contains(&hex::encode(SEED)));
    let back: SeededBloomFilter = serde_json::from_str(&json).unwrap();
    assert_eq!(back, f);

    let mut v: serde_json::Value = serde_json::from_str(&json).unwrap();
    v["words"].as_array_mut().unwrap().pop();
    assert!(serde_json::from_value::<SeededBloomFilter>(v).is_err());
}

#[test]
fn profile_from_toml() {
    let src = r#"
        seed = "secret seed"
        hashes = 4
        elements = ["alice", "bob"]

        [tree]
        chunk_bits = 256
    "#;
    let profile: FilterProfile = toml::from_str(src).unwrap();
    assert_eq!(profile.tree.chunk_bits, 256);
    let (bits, hashes) = profile.params();
    assert_eq!(hashes, 4);
    assert!(bits > 0);

    let f = profile.build().unwrap();
    assert!(f.contains(b"alice") && f.contains(b"bob"));
    let tree = BloomTree::with_config(f, profile.tree).unwrap();
    let proof = tree.prove(b"alice").unwrap();
    tree.verify(b"alice", &proof, &tree.root()).unwrap();

    let bad: FilterProfile = toml::from_str("seed = \"s\"\nbits = 0\nhashes = 2").unwrap();
    assert_eq!(bad.build(), Err(FilterError::NoBits));
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 32,
        .. ProptestConfig::default()
    })]

    #[test]
    fn every_answer_verifies(
        inserted in prop::collection::vec(prop::collection::vec(any::<u8>(), 1..8), 1..20),
        others in prop::collection::vec(prop::collection::vec(any::<u8>(), 1..8), 1..10),
        chunk_log in 6usize..10,
    ) {
        let f = SeededBloomFilter::from_elements(1500, 3, SEED.to_vec(), &inserted).unwrap();
        let tree = BloomTree::with_config(f, TreeConfig::with_chunk_bits(1 << chunk_log)).unwrap();
        let root = tree.root();

        for e in &inserted {
            let proof = tree.prove(e).unwrap();
            prop_assert!(proof.is_presence());
            prop_assert_eq!(tree.verify(e, &proof, &root).unwrap(), Membership::Present);
        }
        for e in &others {
            let proof = tree.prove(e).unwrap();
            let m = tree.verify(e, &proof, &root).unwrap();
            prop_assert_eq!(matches!(m, Membership::Present), tree.filter().contains(e));
        }
    }
}
