//! Error types for compact range operations

use thiserror::Error;

/// Errors that can occur when constructing or merging compact ranges.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// The requested leaf range is inverted.
    #[error("invalid range: begin {begin} > end {end}")]
    InvalidRange { begin: u64, end: u64 },

    /// The supplied hash list does not match the canonical decomposition.
    #[error("invalid hashes: got {got} values, want {want}")]
    SizeMismatch { got: usize, want: usize },

    /// The two ranges were produced by different factories.
    #[error("incompatible ranges: mismatched factories")]
    IncompatibleRanges,

    /// The two ranges do not share an endpoint.
    #[error("ranges are disjoint: other begins at {got}, want {want}")]
    DisjointRanges { got: u64, want: u64 },

    /// The left-hand range does not hold enough hashes for the merge.
    #[error("corrupted lhs range: got {got} hashes, want at least {want}")]
    CorruptedLhs { got: usize, want: usize },

    /// The right-hand range does not hold enough hashes for the merge.
    #[error("corrupted rhs range: got {got} hashes, want at least {want}")]
    CorruptedRhs { got: usize, want: usize },

    /// A root hash was requested for a range not anchored at leaf 0.
    #[error("range must start at the first leaf: begin is {begin}")]
    NonZeroBegin { begin: u64 },
}

/// Result type for compact range operations.
pub type Result<T> = std::result::Result<T, Error>;
