use thiserror::Error;

/// Errors from Bloom tree construction, proof assembly and verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BloomTreeError {
    /// Filter or tree parameters cannot be used (e.g. `k` too large).
    #[error("config error: {0}")]
    Config(String),
    /// The filter's bit storage yielded no words.
    #[error("tree must have at least 1 leaf")]
    EmptyStructure,
    /// The filter answered outside its contract while assembling a proof.
    #[error("proof error: {0}")]
    Proof(String),
    /// A proof does not reconstruct the expected root.
    #[error("verification failed: {0}")]
    Verify(String),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, BloomTreeError>;
