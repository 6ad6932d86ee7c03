//! Error types for proof construction and verification

use thiserror::Error;

/// Errors that can occur when building or verifying log proofs.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// The leaf index does not fall inside the tree.
    #[error("index {index} out of range for tree size {size}")]
    OutOfRange { index: u64, size: u64 },

    /// The two tree sizes are not ordered.
    #[error("tree size {size1} > {size2}")]
    InvalidRange { size1: u64, size2: u64 },

    /// The proof length disagrees with the one implied by the tree shape.
    #[error("incorrect proof size: got {got}, want {want}")]
    IncorrectProofSize { got: usize, want: usize },

    /// A hash list length disagrees with the node ID list it annotates.
    #[error("got {got} hashes, want {want}")]
    SizeMismatch { got: usize, want: usize },

    /// The recomputed root hash does not match the supplied one.
    ///
    /// This is the security-visible outcome: callers alerting on tampered
    /// trees should key on this variant, not on the malformed-input ones.
    #[error("root hash at size {size} mismatched: computed {computed_hex}, expected {expected_hex}",
        computed_hex = hex::encode(.computed), expected_hex = hex::encode(.expected))]
    RootMismatch {
        size: u64,
        computed: Vec<u8>,
        expected: Vec<u8>,
    },

    /// A tlog-proof envelope could not be parsed.
    #[error("malformed tlog proof: {0}")]
    MalformedEnvelope(String),

    /// A checkpoint note could not be parsed or did not match expectations.
    #[error("invalid checkpoint: {0}")]
    Checkpoint(String),
}

/// Result type for proof operations.
pub type Result<T> = std::result::Result<T, Error>;
