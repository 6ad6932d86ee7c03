//! Hashing contracts for append-only Merkle logs
//!
//! The proof-shape and compact-range layers never hash data themselves; they
//! are parameterized over the capability traits defined here. The only
//! instantiation shipped in-tree is the RFC 6962 domain-separated SHA-256
//! hasher in [`rfc6962`].

pub mod rfc6962;

pub use rfc6962::{Rfc6962Hasher, HASH_SIZE, LEAF_HASH_PREFIX, NODE_HASH_PREFIX};

/// Computes hashes of internal nodes of a Merkle tree.
pub trait NodeHasher {
    /// Returns the hash of a tree node based on the hashes of its children.
    fn hash_children(&self, left: &[u8], right: &[u8]) -> Vec<u8>;
}

/// Computes all the hashes needed to maintain an append-only Merkle log.
pub trait LogHasher: NodeHasher {
    /// Returns the domain-separated hash of a leaf entry.
    fn hash_leaf(&self, data: &[u8]) -> Vec<u8>;

    /// Returns the root hash of the empty tree.
    fn empty_root(&self) -> Vec<u8>;
}
