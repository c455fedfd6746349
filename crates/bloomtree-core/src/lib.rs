//! bloomtree-core: authenticated Bloom filter membership.
//!
//! A [`BloomTree`] is a binary Merkle tree over fixed-size chunks of a Bloom
//! filter's bit array. Given an element, it produces a [`CompactMultiProof`]
//! of either presence (every candidate bit set) or absence (one candidate bit
//! unset) that a verifier checks against the 32-byte [`BloomTree::root`]
//! without holding the filter.
//!
//! - [`filter`]: the narrow collaborator trait a filter must implement.
//! - [`tree`]: builder and root accessor over a flat node array.
//! - [`multiproof`]: deduplicated sibling selection across many leaves.
//! - [`proof`]: presence/absence assembly.
//! - [`verify`]: root reconstruction.
//!
//! ```ignore
//! use bloomtree_core::prelude::*;
//! # fn demo<F: BloomFilter>(filter: F) -> bloomtree_core::Result<()> {
//! let tree = BloomTree::new(filter)?;
//! let root = tree.root();
//! let proof = tree.prove(b"element")?;
//! let membership = tree.verify(b"element", &proof, &root)?;
//! # Ok(()) }
//! ```

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::doc_markdown
)]

/// Tree configuration (chunk size).
pub mod config;
/// Typed errors.
pub mod error;
/// Bloom filter collaborator trait.
pub mod filter;
/// JSON/CBOR helpers and auto-detecting read/write APIs.
pub mod io;
/// Tree shape and node-array index arithmetic.
pub mod layout;
/// Compact multiproof sibling selection.
pub mod multiproof;
/// Protocol constants.
pub mod params;
/// Proof types and presence/absence assembly.
pub mod proof;
/// Tree builder and root accessor.
pub mod tree;
/// Root reconstruction and membership verification.
pub mod verify;

pub use bloomtree_crypto::Digest;
pub use config::TreeConfig;
pub use error::{BloomTreeError, Result};
pub use filter::BloomFilter;
pub use layout::TreeLayout;
pub use params::{DEFAULT_CHUNK_BITS, PRESENCE_PROOF_TYPE, WORD_BITS};
pub use proof::{CompactMultiProof, ProofType};
pub use tree::BloomTree;
pub use verify::{reconstruct_root, verify_compact_multiproof, Membership};

/// Commonly-used items for quick imports.
///
/// ```rust
/// use bloomtree_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        BloomFilter, BloomTree, BloomTreeError, CompactMultiProof, Digest, Membership, ProofType,
        TreeConfig, TreeLayout,
    };
}
