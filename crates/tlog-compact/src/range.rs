//! Compact ranges: succinct, mergeable commitments to contiguous leaf ranges.
//!
//! A compact range for `[begin, end)` holds the hashes of the minimal set of
//! perfect subtrees covering those leaves. Ranges sharing an endpoint can be
//! merged in `O(log n)` hashing operations, which makes them usable both as a
//! proof primitive and as a way to build a tree from independently produced
//! pieces.

use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::node::{bit_length, range_size, NodeId};

/// Callback invoked with every newly formed perfect node and its hash.
pub type VisitFn<'a> = &'a mut dyn FnMut(NodeId, &[u8]);

type HashFn = dyn Fn(&[u8], &[u8]) -> Vec<u8> + Send + Sync;

/// Creates compact ranges bound to one node hash function.
///
/// Ranges may only be compared or merged when they come from the same
/// factory; clones of a factory count as the same one.
#[derive(Clone)]
pub struct RangeFactory {
    hash: Arc<HashFn>,
}

impl RangeFactory {
    /// Returns a factory producing ranges hashed with `hash_children`.
    pub fn new<F>(hash_children: F) -> Self
    where
        F: Fn(&[u8], &[u8]) -> Vec<u8> + Send + Sync + 'static,
    {
        RangeFactory {
            hash: Arc::new(hash_children),
        }
    }

    /// Hashes two child nodes into their parent.
    pub fn hash_children(&self, left: &[u8], right: &[u8]) -> Vec<u8> {
        (self.hash)(left, right)
    }

    /// Returns a new empty range anchored at the given leaf index.
    pub fn new_empty_range(&self, begin: u64) -> Range {
        Range {
            factory: self.clone(),
            begin,
            end: begin,
            hashes: Vec::new(),
        }
    }

    /// Returns a new range for `[begin, end)` with the given perfect subtree
    /// hashes, ordered left to right.
    pub fn new_range(&self, begin: u64, end: u64, hashes: Vec<Vec<u8>>) -> Result<Range> {
        if begin > end {
            return Err(Error::InvalidRange { begin, end });
        }
        let want = range_size(begin, end);
        if hashes.len() != want {
            return Err(Error::SizeMismatch {
                got: hashes.len(),
                want,
            });
        }
        Ok(Range {
            factory: self.clone(),
            begin,
            end,
            hashes,
        })
    }

    fn same_factory(&self, other: &RangeFactory) -> bool {
        Arc::ptr_eq(&self.hash, &other.hash)
    }
}

impl fmt::Debug for RangeFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RangeFactory")
    }
}

/// A compact Merkle tree range for the leaf indices `[begin, end)`.
#[derive(Debug, Clone)]
pub struct Range {
    factory: RangeFactory,
    begin: u64,
    end: u64,
    hashes: Vec<Vec<u8>>,
}

impl Range {
    /// The first covered leaf index.
    pub fn begin(&self) -> u64 {
        self.begin
    }

    /// The leaf index just past the covered range.
    pub fn end(&self) -> u64 {
        self.end
    }

    /// The perfect subtree hashes covering the range, ordered left to right.
    pub fn hashes(&self) -> &[Vec<u8>] {
        &self.hashes
    }

    /// Extends the range by one leaf hash on the right.
    ///
    /// Every perfect node formed by the append, the leaf included, is
    /// reported to `visitor` in ascending level order.
    pub fn append(&mut self, hash: Vec<u8>, mut visitor: Option<VisitFn<'_>>) -> Result<()> {
        if let Some(v) = visitor.as_deref_mut() {
            v(NodeId::new(0, self.end), &hash);
        }
        self.append_impl(self.end + 1, hash, &[], visitor)
    }

    /// Extends the range by merging in an adjacent range on the right.
    ///
    /// Corruption checks are limited to cross-checking hash counts against
    /// the merge path; a range forged around [`RangeFactory::new_range`] with
    /// a consistent count goes undetected.
    pub fn append_range(&mut self, other: &Range, visitor: Option<VisitFn<'_>>) -> Result<()> {
        if !self.factory.same_factory(&other.factory) {
            return Err(Error::IncompatibleRanges);
        }
        if other.begin != self.end {
            return Err(Error::DisjointRanges {
                got: other.begin,
                want: self.end,
            });
        }
        if other.hashes.is_empty() {
            self.end = other.end;
            return Ok(());
        }
        self.append_impl(other.end, other.hashes[0].clone(), &other.hashes[1..], visitor)
    }

    /// Returns the root hash of the tree represented by this range, which
    /// must begin at leaf 0. The empty range has no root.
    pub fn root_hash(&self) -> Result<Option<Vec<u8>>> {
        if self.begin != 0 {
            return Err(Error::NonZeroBegin { begin: self.begin });
        }
        let mut iter = self.hashes.iter().rev();
        let Some(last) = iter.next() else {
            return Ok(None);
        };
        let mut hash = last.clone();
        for h in iter {
            hash = self.factory.hash_children(h, &hash);
        }
        Ok(Some(hash))
    }

    /// Extends the range to the new `end`, merging in the `seed` hash
    /// followed by the `right` hashes.
    fn append_impl(
        &mut self,
        end: u64,
        seed: Vec<u8>,
        right: &[Vec<u8>],
        mut visitor: Option<VisitFn<'_>>,
    ) -> Result<()> {
        // Bits [low, high) of self.end encode the merge path: the sequence
        // of node merges turning the two adjacent ranges into one.
        let (low, high) = get_merge_path(self.begin, self.end, end);
        let high = high.max(low);
        let width = high - low;
        let mut index = self.end.checked_shr(low).unwrap_or(0);

        // The number of 1 bits within the path is the number of nodes merged
        // from the left range; 0 bits count nodes from the right range. Both
        // ranges must hold at least that many hashes.
        let window = (1u64 << width) - 1;
        let from_left = (index & window).count_ones() as usize;
        let from_right = width as usize - from_left;
        if self.hashes.len() < from_left {
            return Err(Error::CorruptedLhs {
                got: self.hashes.len(),
                want: from_left,
            });
        }
        if right.len() < from_right {
            return Err(Error::CorruptedRhs {
                got: right.len(),
                want: from_right,
            });
        }

        let mut seed = seed;
        let mut idx1 = self.hashes.len();
        let mut idx2 = 0;
        for level in low..high {
            if index & 1 == 0 {
                seed = self.factory.hash_children(&seed, &right[idx2]);
                idx2 += 1;
            } else {
                idx1 -= 1;
                seed = self.factory.hash_children(&self.hashes[idx1], &seed);
            }
            index >>= 1;
            if let Some(v) = visitor.as_deref_mut() {
                v(NodeId::new(level + 1, index), &seed);
            }
        }

        // Nodes not consumed by the merge are carried over unchanged.
        self.hashes.truncate(idx1);
        self.hashes.push(seed);
        self.hashes.extend_from_slice(&right[idx2..]);
        self.end = end;
        Ok(())
    }
}

impl PartialEq for Range {
    /// Ranges are equal iff they were produced by the same factory and carry
    /// the same endpoints and hashes.
    fn eq(&self, other: &Range) -> bool {
        self.factory.same_factory(&other.factory)
            && self.begin == other.begin
            && self.end == other.end
            && self.hashes == other.hashes
    }
}

impl Eq for Range {}

/// Returns the `[low, high)` range of levels at which nodes of the adjacent
/// ranges `[begin, mid)` and `[mid, end)` are merged into common parents.
/// The range is empty iff `low >= high`.
fn get_merge_path(begin: u64, mid: u64, end: u64) -> (u32, u32) {
    if mid == 0 || mid == end {
        return (0, 0);
    }
    let low = mid.trailing_zeros();
    let mut high = bit_length(mid ^ end) - 1;
    if begin != 0 {
        let high1 = bit_length((begin - 1) ^ mid) - 1;
        if high1 < high {
            high = high1;
        }
    }
    (low, high)
}
