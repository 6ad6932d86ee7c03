//! Error types for compact range fetching

use thiserror::Error;
use tlog_compact::NodeId;

/// Errors that can occur while assembling a compact range from fetches.
#[derive(Error, Debug)]
pub enum Error {
    /// The requested leaf range does not fit in the tree.
    #[error("[{begin}, {end}) out of range in tree of size {size}")]
    OutOfRange { begin: u64, end: u64, size: u64 },

    /// A node hash needed for the range was not exposed by any fetch.
    #[error("hash not known for node {0:?}")]
    HashMissing(NodeId),

    /// A fetch returned a different number of hashes than expected.
    #[error("unexpected number of hashes: got {got}, want {want}")]
    ResponseSize { got: usize, want: usize },

    /// The hash getter failed.
    #[error("hash getter: {0}")]
    Getter(String),

    #[error(transparent)]
    Range(#[from] tlog_compact::Error),

    #[error(transparent)]
    Proof(#[from] tlog_proof::Error),
}

/// Result type for compact range fetching.
pub type Result<T> = std::result::Result<T, Error>;
