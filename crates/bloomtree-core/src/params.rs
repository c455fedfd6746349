//! Protocol constants shared by the builder, the assembler and the verifier.
//!
//! These are the only knobs the prover & verifier should read directly.

/// Width of one storage word in bits.
pub const WORD_BITS: usize = 64;

/// Proof-type byte reserved for presence proofs.
///
/// Absence proofs carry the candidate ordinal instead, so a filter's hash
/// function count must stay strictly below this value.
pub const PRESENCE_PROOF_TYPE: u8 = u8::MAX;

/// Default chunk size (bits per leaf); 8 words.
pub const DEFAULT_CHUNK_BITS: usize = 512;
