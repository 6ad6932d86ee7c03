//! In-memory Merkle tree fixture for exercising proofs end to end.
//!
//! [`MemoryTree`] keeps every perfect node of an RFC 6962 log in a map,
//! filled in by the compact range append visitor, and serves roots, node
//! hashes and proofs at any past tree size. It is deliberately small and
//! transparent so that the production code under test is the proof shape
//! builder and the range engine, not the fixture.

use std::collections::HashMap;

use tlog_compact::{range_nodes, NodeId, Range, RangeFactory};
use tlog_hasher::{LogHasher, NodeHasher, Rfc6962Hasher};
use tlog_proof::{consistency, inclusion};

/// An append-only RFC 6962 tree holding all of its perfect node hashes.
pub struct MemoryTree {
    factory: RangeFactory,
    range: Range,
    nodes: HashMap<NodeId, Vec<u8>>,
}

impl MemoryTree {
    pub fn new() -> Self {
        let factory = RangeFactory::new(|left, right| Rfc6962Hasher.hash_children(left, right));
        let range = factory.new_empty_range(0);
        MemoryTree {
            factory,
            range,
            nodes: HashMap::new(),
        }
    }

    /// Builds a tree over the given leaf entries.
    pub fn from_leaves<T: AsRef<[u8]>>(leaves: impl IntoIterator<Item = T>) -> Self {
        let mut tree = Self::new();
        for leaf in leaves {
            tree.append(leaf.as_ref());
        }
        tree
    }

    /// Builds a tree of `size` distinct synthetic entries.
    pub fn with_size(size: u64) -> Self {
        let mut tree = Self::new();
        for i in 0..size {
            tree.append(format!("leaf data {i}").as_bytes());
        }
        tree
    }

    /// The factory whose hashes the tree nodes are built with.
    pub fn factory(&self) -> &RangeFactory {
        &self.factory
    }

    pub fn size(&self) -> u64 {
        self.range.end()
    }

    /// Appends one leaf entry.
    pub fn append(&mut self, data: &[u8]) {
        self.append_leaf_hash(Rfc6962Hasher.hash_leaf(data));
    }

    /// Appends one precomputed leaf hash.
    pub fn append_leaf_hash(&mut self, hash: Vec<u8>) {
        let nodes = &mut self.nodes;
        self.range
            .append(
                hash,
                Some(&mut |id, h: &[u8]| {
                    nodes.insert(id, h.to_vec());
                }),
            )
            .expect("append to in-memory tree");
    }

    pub fn leaf_hash(&self, index: u64) -> Vec<u8> {
        self.node_hash(NodeId::new(0, index))
    }

    pub fn node_hash(&self, id: NodeId) -> Vec<u8> {
        self.nodes
            .get(&id)
            .unwrap_or_else(|| panic!("node {id:?} not in tree of size {}", self.size()))
            .clone()
    }

    pub fn node_hashes(&self, ids: &[NodeId]) -> Vec<Vec<u8>> {
        ids.iter().map(|&id| self.node_hash(id)).collect()
    }

    /// The root hash at any past size of the tree.
    pub fn hash_at(&self, size: u64) -> Vec<u8> {
        match self
            .compact_range(0, size)
            .root_hash()
            .expect("range starts at leaf 0")
        {
            Some(root) => root,
            None => Rfc6962Hasher.empty_root(),
        }
    }

    /// The root hash at the current size.
    pub fn root(&self) -> Vec<u8> {
        self.hash_at(self.size())
    }

    /// The compact range for `[begin, end)`, assembled from stored nodes.
    pub fn compact_range(&self, begin: u64, end: u64) -> Range {
        let hashes = self.node_hashes(&range_nodes(begin, end));
        self.factory
            .new_range(begin, end, hashes)
            .expect("stored hashes match the range decomposition")
    }

    /// The inclusion proof for `index` in the tree of the given past size.
    pub fn inclusion_proof(&self, index: u64, size: u64) -> tlog_proof::Result<Vec<Vec<u8>>> {
        let nodes = inclusion(index, size)?;
        let hashes = self.node_hashes(&nodes.ids);
        nodes.rehash(hashes, |left, right| Rfc6962Hasher.hash_children(left, right))
    }

    /// The consistency proof between two past sizes of the tree.
    pub fn consistency_proof(&self, size1: u64, size2: u64) -> tlog_proof::Result<Vec<Vec<u8>>> {
        let nodes = consistency(size1, size2)?;
        let hashes = self.node_hashes(&nodes.ids);
        nodes.rehash(hashes, |left, right| Rfc6962Hasher.hash_children(left, right))
    }
}

impl Default for MemoryTree {
    fn default() -> Self {
        Self::new()
    }
}
