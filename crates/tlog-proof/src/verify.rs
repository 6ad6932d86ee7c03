//! Verification of Merkle log inclusion and consistency proofs.

use tlog_compact::{bit_length, range_size, NodeId};
use tlog_hasher::NodeHasher;

use crate::error::{Error, Result};

/// Verifies the inclusion proof for the leaf with the given hash and index,
/// against the tree of the given size and root hash. Requires
/// `index < size`. Returns [`Error::RootMismatch`] if the recomputed root
/// does not match the provided one.
pub fn verify_inclusion<H: NodeHasher + ?Sized>(
    hasher: &H,
    index: u64,
    size: u64,
    leaf_hash: &[u8],
    proof: &[Vec<u8>],
    root: &[u8],
) -> Result<()> {
    let computed = root_from_inclusion_proof(hasher, index, size, leaf_hash, proof)?;
    verify_match(size, &computed, root)
}

/// Computes the root hash implied by an inclusion proof for the leaf with
/// the given hash and index, in a tree of the given size. Requires
/// `index < size`.
pub fn root_from_inclusion_proof<H: NodeHasher + ?Sized>(
    hasher: &H,
    index: u64,
    size: u64,
    leaf_hash: &[u8],
    proof: &[Vec<u8>],
) -> Result<Vec<u8>> {
    if index >= size {
        return Err(Error::OutOfRange { index, size });
    }
    root_at(hasher, index, 0, size, leaf_hash, proof)
}

/// Verifies that the consistency proof is valid between the two given tree
/// sizes, with the corresponding root hashes. Requires `size1 <= size2`.
/// Returns [`Error::RootMismatch`] if either recomputed root does not match
/// the provided one.
///
/// A proof from an empty tree must itself be empty; non-empty proofs for
/// `size1 == 0` are rejected.
pub fn verify_consistency<H: NodeHasher + ?Sized>(
    hasher: &H,
    size1: u64,
    size2: u64,
    proof: &[Vec<u8>],
    root1: &[u8],
    root2: &[u8],
) -> Result<()> {
    if size1 > size2 {
        return Err(Error::InvalidRange { size1, size2 });
    }
    if (size1 == size2 || size1 == 0) && !proof.is_empty() {
        return Err(Error::IncorrectProofSize {
            got: proof.len(),
            want: 0,
        });
    }
    if size1 == size2 {
        return verify_match(size1, root1, root2);
    }
    if size1 == 0 {
        return Ok(());
    }

    // The root of the biggest perfect subtree that ends at size1.
    let level = size1.trailing_zeros();
    let index = (size1 - 1) >> level;

    if index == 0 {
        // size1 is a power of two: root1 is the hash of that subtree, and
        // the proof is exactly its inclusion proof in the tree of size2.
        let computed = root_at(hasher, index, level, size2, root1, proof)?;
        return verify_match(size2, &computed, root2);
    }

    // Otherwise the proof leads with the subtree hash, and the rest is its
    // inclusion proof in the tree of size2. The length of the remainder is
    // validated by the fold below.
    if proof.is_empty() {
        return Err(Error::IncorrectProofSize { got: 0, want: 1 });
    }
    let computed = root_at(hasher, index, level, size2, &proof[0], &proof[1..])?;
    verify_match(size2, &computed, root2)?;

    // Recompute root1 by refolding the same proof along the right border of
    // the tree of size1. Inner-path siblings contribute only where the path
    // goes right; the ephemeral hash, if present, covers leaves past size1
    // and is skipped; the remaining border hashes fold in from the left.
    let inner = bit_length(index ^ (size2 >> level)).saturating_sub(1) as usize;
    let fork = NodeId::new(level + inner as u32, index >> inner);
    let (_, fork_end) = fork.coverage();
    let right = usize::from(fork_end < size2);

    let mut hash = proof[0].clone();
    for (i, h) in proof[1..1 + inner].iter().enumerate() {
        if (index >> i) & 1 == 1 {
            hash = hasher.hash_children(h, &hash);
        }
    }
    for h in &proof[1 + inner + right..] {
        hash = hasher.hash_children(h, &hash);
    }
    verify_match(size1, &hash, root1)
}

/// Folds an inclusion proof for the `(level, index)` node up to the root of
/// the tree of the given size, starting from the node's hash.
fn root_at<H: NodeHasher + ?Sized>(
    hasher: &H,
    index: u64,
    level: u32,
    size: u64,
    hash: &[u8],
    proof: &[Vec<u8>],
) -> Result<Vec<u8>> {
    // The fork node is where the path from the root to (level, index)
    // diverges from the path to (0, size). Its sibling is the one ephemeral
    // node that can appear in the proof; `inner` is how many levels up the
    // fork sits.
    let inner = bit_length(index ^ (size >> level)).saturating_sub(1) as usize;
    let fork = NodeId::new(level + inner as u32, index >> inner);

    let (begin, end) = fork.coverage();
    let left = range_size(0, begin);
    let right = usize::from(end < size);

    if proof.len() != inner + right + left {
        return Err(Error::IncorrectProofSize {
            got: proof.len(),
            want: inner + right + left,
        });
    }

    let mut hash = hash.to_vec();
    let mut node = NodeId::new(level, index);
    for h in &proof[..inner] {
        if node.index & 1 == 0 {
            hash = hasher.hash_children(&hash, h);
        } else {
            hash = hasher.hash_children(h, &hash);
        }
        node = node.parent();
    }
    if right == 1 {
        hash = hasher.hash_children(&hash, &proof[inner]);
    }
    for h in &proof[inner + right..] {
        hash = hasher.hash_children(h, &hash);
    }
    Ok(hash)
}

fn verify_match(size: u64, computed: &[u8], expected: &[u8]) -> Result<()> {
    if computed != expected {
        return Err(Error::RootMismatch {
            size,
            computed: computed.to_vec(),
            expected: expected.to_vec(),
        });
    }
    Ok(())
}
