//! RFC 6962 Merkle tree hashing
//!
//! Implements the Certificate Transparency hashing scheme:
//! - Domain separation via prefixes (0x00 for leaf, 0x01 for node)
//! - SHA-256 hash function

use sha2::{Digest, Sha256};

use crate::{LogHasher, NodeHasher};

/// Prefix for leaf nodes in an RFC 6962 Merkle tree.
pub const LEAF_HASH_PREFIX: u8 = 0x00;

/// Prefix for internal nodes in an RFC 6962 Merkle tree.
pub const NODE_HASH_PREFIX: u8 = 0x01;

/// Hash size in bytes (SHA-256).
pub const HASH_SIZE: usize = 32;

/// The RFC 6962 SHA-256 log hasher.
#[derive(Debug, Clone, Copy, Default)]
pub struct Rfc6962Hasher;

impl NodeHasher for Rfc6962Hasher {
    /// Returns SHA256(0x01 || left || right).
    fn hash_children(&self, left: &[u8], right: &[u8]) -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update([NODE_HASH_PREFIX]);
        hasher.update(left);
        hasher.update(right);
        hasher.finalize().to_vec()
    }
}

impl LogHasher for Rfc6962Hasher {
    /// Returns SHA256(0x00 || data).
    fn hash_leaf(&self, data: &[u8]) -> Vec<u8> {
        let mut hasher = Sha256::new();
        hasher.update([LEAF_HASH_PREFIX]);
        hasher.update(data);
        hasher.finalize().to_vec()
    }

    /// Returns SHA256 of the empty string.
    fn empty_root(&self) -> Vec<u8> {
        Sha256::digest([]).to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_root() {
        assert_eq!(
            hex::encode(Rfc6962Hasher.empty_root()),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_hash_empty_leaf() {
        // Known vector: the root of the one-entry tree over the empty string.
        let hash = Rfc6962Hasher.hash_leaf(b"");
        assert_eq!(
            hex::encode(hash),
            "6e340b9cffb37a989ca544e6bb780a2c78901d3fb33738768511a30617afa01d"
        );
    }

    #[test]
    fn test_hash_leaf_uses_prefix() {
        let data = b"test data";
        let hash = Rfc6962Hasher.hash_leaf(data);
        assert_eq!(hash.len(), HASH_SIZE);

        // Must differ from the raw digest of the same bytes.
        let raw = Sha256::digest(data).to_vec();
        assert_ne!(hash, raw);
    }

    #[test]
    fn test_hash_children_order_matters() {
        let left = Rfc6962Hasher.hash_leaf(b"left");
        let right = Rfc6962Hasher.hash_leaf(b"right");
        let hash = Rfc6962Hasher.hash_children(&left, &right);
        assert_eq!(hash.len(), HASH_SIZE);
        assert_ne!(hash, Rfc6962Hasher.hash_children(&right, &left));
    }

    #[test]
    fn test_hash_children_format() {
        let left = [0u8; HASH_SIZE];
        let right = [1u8; HASH_SIZE];

        let mut hasher = Sha256::new();
        hasher.update([NODE_HASH_PREFIX]);
        hasher.update(left);
        hasher.update(right);
        let expected = hasher.finalize().to_vec();

        assert_eq!(Rfc6962Hasher.hash_children(&left, &right), expected);
    }
}
