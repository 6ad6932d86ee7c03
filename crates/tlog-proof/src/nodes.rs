//! Shapes of log Merkle tree proofs.
//!
//! [`Nodes`] describes how to construct any proof that has at most one
//! ephemeral node, which covers the inclusion and consistency proofs of
//! RFC 6962. It lists the perfect nodes whose hashes must be fetched, and
//! marks the sub-slice of them that stands in for the ephemeral node at the
//! right edge of the tree.

use tlog_compact::{bit_length, range_nodes, NodeId};

use crate::error::{Error, Result};

/// Information on how to construct a log Merkle tree proof.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Nodes {
    /// IDs of the perfect nodes sufficient to build the proof. If an
    /// ephemeral node is needed, it can be recomputed from a sub-slice of
    /// this list.
    pub ids: Vec<NodeId>,
    // The [begin, end) window into `ids` holding the nodes which re-create
    // the ephemeral node. Empty when begin == end; never a single node.
    begin: usize,
    end: usize,
    // The ephemeral node of the proof: the common ancestor of the nodes in
    // the window, i.e. the node that would have been used had the tree been
    // perfect.
    ephem: NodeId,
}

/// Returns how to fetch and construct an inclusion proof for the given leaf
/// index in a log of the given size. Requires `index < size`.
pub fn inclusion(index: u64, size: u64) -> Result<Nodes> {
    if index >= size {
        return Err(Error::OutOfRange { index, size });
    }
    Ok(nodes(index, 0, size))
}

/// Returns how to fetch and construct a consistency proof between the two
/// given sizes of a log. Requires `size1 <= size2`.
///
/// The proof from an empty tree is trivial: it has no nodes, and only the
/// empty proof verifies for that pair of sizes.
pub fn consistency(size1: u64, size2: u64) -> Result<Nodes> {
    if size1 > size2 {
        return Err(Error::InvalidRange { size1, size2 });
    }
    if size1 == size2 || size1 == 0 {
        return Ok(Nodes::default());
    }

    // The root of the biggest perfect subtree that ends at size1.
    let level = size1.trailing_zeros();
    let index = (size1 - 1) >> level;
    // The consistency proof is the inclusion proof of this node in the tree
    // of size2, preceded by the node itself. When size1 is a power of two
    // the node is omitted: the client already knows it, since it is the root
    // of the tree of size1.
    let mut p = nodes(index, level, size2);
    if index != 0 {
        p.ids.insert(0, NodeId::new(level, index));
        if p.begin < p.end {
            p.begin += 1;
            p.end += 1;
        }
    }
    Ok(p)
}

/// Returns the node IDs necessary to prove that the `(level, index)` node is
/// included in the Merkle tree of the given size. The node must be perfect
/// in that tree.
fn nodes(index: u64, level: u32, size: u64) -> Nodes {
    let mut node = NodeId::new(level, index);
    let (begin, _) = node.coverage();
    debug_assert!(begin < size);

    // The level at which the path from the root to `node` diverges from the
    // path to leaf `size`. The ephemeral node lives there; the subtree it
    // roots is incomplete, so the proof carries the minimal list of perfect
    // nodes covering the same leaves instead.
    let ephem_level = bit_length(begin ^ size) - 1;

    // Siblings of the path nodes up to the ephemeral level.
    let mut ids = Vec::new();
    while node.level < ephem_level {
        ids.push(node.sibling());
        node = node.parent();
    }
    let (begin, end) = node.coverage();

    // Nodes standing in for the ephemeral node, covering the range to the
    // right of the reached node. Reversed so that rehashing can fold them
    // from lower to upper levels.
    let len1 = ids.len();
    let mut right = range_nodes(end, size);
    right.reverse();
    ids.extend(right);
    let len2 = ids.len();

    // Nodes covering the range to the left, ordered increasingly by level.
    let mut left = range_nodes(0, begin);
    left.reverse();
    ids.extend(left);

    // A window of zero or one nodes needs no rehashing; collapse it.
    let (begin, end) = if len1 + 1 >= len2 { (0, 0) } else { (len1, len2) };

    Nodes {
        ids,
        begin,
        end,
        ephem: node.sibling(),
    }
}

impl Nodes {
    /// Returns the ephemeral node, and the `[begin, end)` window such that
    /// `ids[begin..end]` holds the nodes it is recomputed from.
    ///
    /// The window is empty iff the proof has no ephemeral node, e.g. in a
    /// perfect tree, or when the subtree right of the fork holds at most one
    /// perfect node.
    pub fn ephem(&self) -> (NodeId, usize, usize) {
        (self.ephem, self.begin, self.end)
    }

    /// Computes the final proof from the hashes corresponding to `ids`,
    /// folding each rehash window bottom-up into the single ephemeral hash.
    /// The hash list must have the same length as `ids`; it is consumed and
    /// reused for the output.
    ///
    /// The result is the classic bottom-up audit path expected by the
    /// verifier.
    pub fn rehash<F>(&self, mut hashes: Vec<Vec<u8>>, hash_children: F) -> Result<Vec<Vec<u8>>>
    where
        F: Fn(&[u8], &[u8]) -> Vec<u8>,
    {
        if hashes.len() != self.ids.len() {
            return Err(Error::SizeMismatch {
                got: hashes.len(),
                want: self.ids.len(),
            });
        }
        let mut cursor = 0;
        let mut i = 0;
        while i < hashes.len() {
            if i >= self.begin && i < self.end {
                let mut hash = std::mem::take(&mut hashes[i]);
                for j in i + 1..self.end {
                    hash = hash_children(&hashes[j], &hash);
                }
                hashes[cursor] = hash;
                i = self.end;
            } else {
                hashes.swap(cursor, i);
                i += 1;
            }
            cursor += 1;
        }
        hashes.truncate(cursor);
        Ok(hashes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tlog_hasher::{LogHasher, NodeHasher, Rfc6962Hasher};

    fn id(level: u32, index: u64) -> NodeId {
        NodeId::new(level, index)
    }

    fn plain(ids: Vec<NodeId>) -> Nodes {
        Nodes {
            ids,
            ..Nodes::default()
        }
    }

    fn windowed(begin: usize, end: usize, ids: Vec<NodeId>) -> Nodes {
        Nodes {
            ids,
            begin,
            end,
            ..Nodes::default()
        }
    }

    fn shape(mut nodes: Nodes) -> Nodes {
        // The ephemeral node is exercised separately.
        nodes.ephem = NodeId::default();
        nodes
    }

    // For reference, the tree of size 7 from RFC 6962:
    //
    //            hash              <== level 3
    //           /    \
    //          k      l            <== level 2
    //         / \    / \
    //        g   h  i  [ ]         <== level 1
    //       / \ / \ / \ /
    //       a b c d e f j          <== level 0
    #[test]
    fn test_inclusion_shapes() {
        let cases: Vec<(u64, u64, Nodes)> = vec![
            // Small trees.
            (1, 0, plain(vec![])),
            (2, 0, plain(vec![id(0, 1)])),
            (2, 1, plain(vec![id(0, 0)])),
            (3, 1, plain(vec![id(0, 0), id(0, 2)])),
            // Tree of size 7; the ephemeral l = hash(i, j).
            (
                7,
                0,
                windowed(2, 4, vec![id(0, 1), id(1, 1), id(0, 6), id(1, 2)]),
            ),
            (
                7,
                1,
                windowed(2, 4, vec![id(0, 0), id(1, 1), id(0, 6), id(1, 2)]),
            ),
            (
                7,
                2,
                windowed(2, 4, vec![id(0, 3), id(1, 0), id(0, 6), id(1, 2)]),
            ),
            (
                7,
                3,
                windowed(2, 4, vec![id(0, 2), id(1, 0), id(0, 6), id(1, 2)]),
            ),
            (7, 4, plain(vec![id(0, 5), id(0, 6), id(2, 0)])),
            (7, 5, plain(vec![id(0, 4), id(0, 6), id(2, 0)])),
            (7, 6, plain(vec![id(1, 2), id(2, 0)])),
            // Smaller trees within a bigger stored tree.
            (4, 2, plain(vec![id(0, 3), id(1, 0)])),
            (5, 3, plain(vec![id(0, 2), id(1, 0), id(0, 4)])),
            (6, 3, plain(vec![id(0, 2), id(1, 0), id(1, 2)])),
            (6, 4, plain(vec![id(0, 5), id(2, 0)])),
            // Rehash windows in the middle of the returned list.
            (
                15,
                10,
                windowed(
                    2,
                    4,
                    vec![id(0, 11), id(1, 4), id(0, 14), id(1, 6), id(3, 0)],
                ),
            ),
            (
                31,
                24,
                windowed(
                    2,
                    4,
                    vec![id(0, 25), id(1, 13), id(0, 30), id(1, 14), id(3, 2), id(4, 0)],
                ),
            ),
            (
                95,
                81,
                windowed(
                    3,
                    6,
                    vec![
                        id(0, 80),
                        id(1, 41),
                        id(2, 21),
                        id(0, 94),
                        id(1, 46),
                        id(2, 22),
                        id(4, 4),
                        id(6, 0),
                    ],
                ),
            ),
        ];
        for (size, index, want) in cases {
            let got = inclusion(index, size).unwrap_or_else(|e| panic!("inclusion({index}, {size}): {e}"));
            assert_eq!(shape(got), want, "inclusion({index}, {size})");
        }
    }

    #[test]
    fn test_inclusion_errors() {
        for (index, size) in [(0, 0), (1, 0), (2, 1), (3, 0), (8, 7)] {
            assert_eq!(
                inclusion(index, size),
                Err(Error::OutOfRange { index, size }),
                "inclusion({index}, {size})"
            );
        }
    }

    // The consistency proof between sizes 5 and 7 consists of nodes e, f, j
    // and k of the size-7 tree drawn above: j is taken instead of its
    // missing parent.
    #[test]
    fn test_consistency_shapes() {
        let cases: Vec<(u64, u64, Nodes)> = vec![
            (1, 2, plain(vec![id(0, 1)])),
            (1, 4, plain(vec![id(0, 1), id(1, 1)])),
            (1, 6, plain(vec![id(0, 1), id(1, 1), id(1, 2)])),
            (2, 3, plain(vec![id(0, 2)])),
            (2, 8, plain(vec![id(1, 1), id(2, 1)])),
            (
                3,
                7,
                windowed(
                    3,
                    5,
                    vec![id(0, 2), id(0, 3), id(1, 0), id(0, 6), id(1, 2)],
                ),
            ),
            (4, 7, windowed(0, 2, vec![id(0, 6), id(1, 2)])),
            (
                5,
                7,
                plain(vec![id(0, 4), id(0, 5), id(0, 6), id(2, 0)]),
            ),
            (6, 7, plain(vec![id(1, 2), id(0, 6), id(2, 0)])),
            (
                7,
                8,
                plain(vec![id(0, 6), id(0, 7), id(1, 2), id(2, 0)]),
            ),
            // Same tree size: trivial proofs.
            (1, 1, plain(vec![])),
            (4, 4, plain(vec![])),
            (7, 7, plain(vec![])),
            // Smaller trees within a bigger stored tree.
            (2, 4, plain(vec![id(1, 1)])),
            (
                3,
                5,
                plain(vec![id(0, 2), id(0, 3), id(1, 0), id(0, 4)]),
            ),
            (
                3,
                6,
                plain(vec![id(0, 2), id(0, 3), id(1, 0), id(1, 2)]),
            ),
            (4, 6, plain(vec![id(1, 2)])),
            (
                1,
                7,
                windowed(2, 4, vec![id(0, 1), id(1, 1), id(0, 6), id(1, 2)]),
            ),
            // Rehash windows in the middle of the returned list.
            (
                10,
                15,
                windowed(
                    2,
                    4,
                    vec![id(1, 4), id(1, 5), id(0, 14), id(1, 6), id(3, 0)],
                ),
            ),
            (
                24,
                31,
                windowed(
                    1,
                    4,
                    vec![id(3, 2), id(0, 30), id(1, 14), id(2, 6), id(4, 0)],
                ),
            ),
            (
                81,
                95,
                windowed(
                    4,
                    7,
                    vec![
                        id(0, 80),
                        id(0, 81),
                        id(1, 41),
                        id(2, 21),
                        id(0, 94),
                        id(1, 46),
                        id(2, 22),
                        id(4, 4),
                        id(6, 0),
                    ],
                ),
            ),
        ];
        for (size1, size2, want) in cases {
            let got = consistency(size1, size2)
                .unwrap_or_else(|e| panic!("consistency({size1}, {size2}): {e}"));
            assert_eq!(shape(got), want, "consistency({size1}, {size2})");
        }
    }

    #[test]
    fn test_consistency_errors() {
        for (size1, size2) in [(5, 0), (9, 8)] {
            assert_eq!(
                consistency(size1, size2),
                Err(Error::InvalidRange { size1, size2 }),
                "consistency({size1}, {size2})"
            );
        }
    }

    #[test]
    fn test_consistency_from_empty_tree_is_trivial() {
        for size2 in [0, 1, 2, 7, 1 << 20] {
            assert_eq!(consistency(0, size2).unwrap(), Nodes::default());
        }
    }

    #[test]
    fn test_window_is_never_a_single_node() {
        for size in 1..200u64 {
            for index in 0..size {
                let (_, begin, end) = inclusion(index, size).unwrap().ephem();
                assert!(
                    end == begin || end - begin >= 2,
                    "inclusion({index}, {size}) window [{begin}, {end})"
                );
            }
        }
        for size1 in 1..100u64 {
            for size2 in size1..100u64 {
                let (_, begin, end) = consistency(size1, size2).unwrap().ephem();
                assert!(
                    end == begin || end - begin >= 2,
                    "consistency({size1}, {size2}) window [{begin}, {end})"
                );
            }
        }
    }

    #[test]
    fn test_ephem_node() {
        let cases: Vec<(u64, u64, NodeId)> = vec![
            // For perfect trees the ephemeral node is the sibling of the
            // root; it is not used in the proof since its subtree is empty.
            (3, 32, id(5, 1)),
            (0, 9, id(3, 1)),
            (0, 13, id(3, 1)),
            (7, 13, id(3, 1)),
            (8, 13, id(2, 3)),
            (11, 13, id(2, 3)),
            // The computed ephemeral node can be fully outside the border.
            (12, 13, id(0, 13)),
            (13, 14, id(1, 7)),
            // Only one node (level 0, index 1024) exists in the right
            // subtree, but for the purposes of the proof it is effectively
            // at level 10.
            (123, 1025, id(10, 1)),
            (0, 0xFFFF, id(15, 1)),
            (0xF000, 0xFFFF, id(11, 0x1F)),
            (0xFF00, 0xFFFF, id(7, 0x1FF)),
            (0xFFF0, 0xFFFF, id(3, 0x1FFF)),
            (0xFFFF - 1, 0xFFFF, id(0, 0xFFFF)),
        ];
        for (index, size, want) in cases {
            let nodes = inclusion(index, size).unwrap();
            let (got, _, _) = nodes.ephem();
            assert_eq!(got, want, "inclusion({index}, {size})");
        }
    }

    #[test]
    fn test_rehash() {
        let th = Rfc6962Hasher;
        let h: Vec<Vec<u8>> = (1..=5)
            .map(|i| th.hash_leaf(format!("Hash {i}").as_bytes()))
            .collect();
        let hc = |l: &[u8], r: &[u8]| th.hash_children(l, r);

        // No rehash window: the list is returned unchanged.
        let nodes = inclusion(3, 8).unwrap();
        let got = nodes.rehash(h[..3].to_vec(), hc).unwrap();
        assert_eq!(got, h[..3].to_vec());

        // Window in the middle.
        let nodes = inclusion(9, 15).unwrap();
        let got = nodes.rehash(h[..5].to_vec(), hc).unwrap();
        assert_eq!(
            got,
            vec![
                h[0].clone(),
                h[1].clone(),
                th.hash_children(&h[3], &h[2]),
                h[4].clone(),
            ]
        );

        // Window at the end of the list.
        let nodes = inclusion(2, 7).unwrap();
        let got = nodes.rehash(h[..4].to_vec(), hc).unwrap();
        assert_eq!(
            got,
            vec![h[0].clone(), h[1].clone(), th.hash_children(&h[3], &h[2])]
        );
    }

    #[test]
    fn test_rehash_length_mismatch() {
        let nodes = inclusion(3, 8).unwrap();
        let err = nodes
            .rehash(vec![vec![0; 32]; 5], |l, r| Rfc6962Hasher.hash_children(l, r))
            .unwrap_err();
        assert_eq!(err, Error::SizeMismatch { got: 5, want: 3 });
    }
}
