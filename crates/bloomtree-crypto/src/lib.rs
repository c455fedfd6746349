// crates/bloomtree-crypto/src/lib.rs

//! Hashing substrate for the Bloom tree: two domain-separated BLAKE3 hashes.
//!
//! - [`leaf_hash`] binds a chunk's ordinal and its raw 64-bit words.
//! - [`node_hash`] binds two child digests.
//!
//! Both hashes absorb a fixed prefix and a [`Label`] before any payload, so a
//! leaf digest can never be confused with an internal digest.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used
)]

use blake3::Hasher;

/// 32-byte digest used for every node of the tree.
pub type Digest = [u8; 32];

/// Fixed prefix absorbed before every label.
const HASH_PREFIX: &[u8] = b"bloomtree.v1";

/// Canonical hash labels.
/// Avoids stringly-typed mistakes in domain separation.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Label {
    /// Leaf digest over (ordinal, words).
    Leaf,
    /// Internal digest over (left, right).
    Node,
}

impl Label {
    /// Borrow the canonical string.
    #[inline]
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Leaf => "bloomtree/leaf",
            Self::Node => "bloomtree/node",
        }
    }
}

#[inline]
fn labeled(label: Label) -> Hasher {
    let mut h = Hasher::new();
    h.update(HASH_PREFIX);
    let tag = label.as_str();
    h.update(&(tag.len() as u32).to_le_bytes());
    h.update(tag.as_bytes());
    h
}

/// Leaf digest: `H(prefix || "leaf" || ordinal || len(words) || words…)`.
///
/// Words are absorbed little-endian.
#[must_use]
pub fn leaf_hash(ordinal: u64, words: &[u64]) -> Digest {
    let mut h = labeled(Label::Leaf);
    h.update(&ordinal.to_le_bytes());
    h.update(&(words.len() as u64).to_le_bytes());
    for w in words {
        h.update(&w.to_le_bytes());
    }
    *h.finalize().as_bytes()
}

/// Padding leaf for slot `index` of a non power-of-two leaf layer.
///
/// Zero ordinal, the slot index as the only word.
#[inline]
#[must_use]
pub fn filler_leaf(index: u64) -> Digest {
    leaf_hash(0, &[index])
}

/// Internal digest: `H(prefix || "node" || left || right)`.
#[inline]
#[must_use]
pub fn node_hash(left: &Digest, right: &Digest) -> Digest {
    let mut h = labeled(Label::Node);
    h.update(left);
    h.update(right);
    *h.finalize().as_bytes()
}

/// Lowercase hex rendering of a digest.
#[inline]
#[must_use]
pub fn to_hex(d: &Digest) -> String {
    hex::encode(d)
}

/// Parse a 64-char hex string into a digest.
#[must_use]
pub fn from_hex(s: &str) -> Option<Digest> {
    let bytes = hex::decode(s.trim()).ok()?;
    bytes.try_into().ok()
}
