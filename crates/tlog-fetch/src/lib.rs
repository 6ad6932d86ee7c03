//! Building compact ranges of a bigger Merkle log
//!
//! [`get_compact_range`] assembles the compact range for an arbitrary
//! `[begin, end)` slice of a log of size `size >= end`, given only the
//! ability to fetch consistency proofs and leaf hashes through a
//! [`HashGetter`]. Consistency proofs are mined for the perfect node hashes
//! they expose, using the proof shape descriptors to map proof positions
//! back to node IDs.

use std::collections::HashMap;

use tlog_compact::{decompose, range_nodes, NodeId, Range, RangeFactory};
use tlog_proof::{consistency, Nodes};
use tracing::debug;

pub mod error;

pub use error::{Error, Result};

/// Serves raw proof material out of a log of a fixed size.
///
/// Both methods may be backed by blocking I/O; this layer only requires that
/// each call observes the effects of the previous ones.
pub trait HashGetter {
    /// Returns the consistency proof between the two given tree sizes.
    fn get_consistency_proof(&self, first: u64, second: u64) -> Result<Vec<Vec<u8>>>;

    /// Returns the hashes of the leaves in `[begin, end)`, in order.
    fn get_leaf_hashes(&self, begin: u64, end: u64) -> Result<Vec<Vec<u8>>>;
}

/// Builds the compact range for `[begin, end)` within a tree of the given
/// size, fetching proof material through `getter`.
pub fn get_compact_range(
    factory: &RangeFactory,
    begin: u64,
    end: u64,
    size: u64,
    getter: &dyn HashGetter,
) -> Result<Range> {
    if begin > size || end > size {
        return Err(Error::OutOfRange { begin, end, size });
    }
    if begin >= end {
        return Ok(factory.new_empty_range(begin));
    }

    // Tiny trees expose too few consistency proofs to mine; fetch the leaf
    // hashes directly.
    if size <= 3 || end == 1 {
        let hashes = getter.get_leaf_hashes(begin, end)?;
        debug!(begin, end, count = hashes.len(), "fetched leaf hashes");
        if hashes.len() as u64 != end - begin {
            return Err(Error::ResponseSize {
                got: hashes.len(),
                want: (end - begin) as usize,
            });
        }
        let mut range = factory.new_empty_range(begin);
        for hash in hashes {
            range.append(hash, None)?;
        }
        return Ok(range);
    }
    // From here on size >= 4 and end >= 2.

    let mut miner = ProofMiner {
        getter,
        known: HashMap::new(),
    };

    // A consistency proof between `begin` and the merge point of the range
    // decomposition exposes the left border nodes of [begin, end).
    let (left_sizes, _) = decompose(begin, end);
    let mid = begin + left_sizes;
    miner.fetch(begin, mid)?;

    if (begin == 0 && end == 2) || end == 3 {
        miner.fetch(3, 4)?;
    }
    if end <= 3 {
        return miner.assemble(factory, begin, end);
    }
    // From here on end >= 4.

    if (end - 1) & (end - 2) != 0 {
        // end-1 is not a power of two: a proof from it exposes its own leaf
        // hash, so peel that one leaf off the range.
        miner.fetch(end - 1, end)?;
        let mut range = miner.assemble(factory, begin, end - 1)?;
        range.append(miner.take(NodeId::new(0, end - 1))?, None)?;
        return Ok(range);
    }

    // end-1 is a power of two, hence end-2 is not: peel off two leaves.
    miner.fetch(end - 2, end)?;
    let mut range = if end - 2 > begin {
        miner.assemble(factory, begin, end - 2)?
    } else {
        factory.new_empty_range(begin)
    };
    for index in range.end()..end {
        range.append(miner.take(NodeId::new(0, index))?, None)?;
    }
    Ok(range)
}

/// Collects perfect node hashes exposed by consistency proofs.
struct ProofMiner<'a> {
    getter: &'a dyn HashGetter,
    known: HashMap<NodeId, Vec<u8>>,
}

impl ProofMiner<'_> {
    /// Fetches the consistency proof between the given sizes and stores the
    /// node hashes it exposes.
    fn fetch(&mut self, first: u64, second: u64) -> Result<()> {
        let nodes = consistency(first, second)?;
        let hashes = self.getter.get_consistency_proof(first, second)?;
        debug!(first, second, count = hashes.len(), "fetched consistency proof");
        self.store(&nodes, hashes)
    }

    /// Maps proof positions back to node IDs and records their hashes. The
    /// single recomputed ephemeral hash, if the proof has one, corresponds
    /// to no perfect node and is skipped; positions after it map to the IDs
    /// following the rehash window.
    fn store(&mut self, nodes: &Nodes, hashes: Vec<Vec<u8>>) -> Result<()> {
        let (_, begin, end) = nodes.ephem();
        let mut want = nodes.ids.len() - (end - begin);
        if begin != end {
            want += 1;
        }
        if hashes.len() != want {
            return Err(Error::ResponseSize {
                got: hashes.len(),
                want,
            });
        }

        let mut idx = 0;
        for hash in hashes {
            if idx == begin && begin < end {
                idx = end;
                continue;
            }
            self.known.insert(nodes.ids[idx], hash);
            idx += 1;
        }
        Ok(())
    }

    fn take(&self, id: NodeId) -> Result<Vec<u8>> {
        self.known.get(&id).cloned().ok_or(Error::HashMissing(id))
    }

    /// Assembles the compact range for `[begin, end)` from recorded hashes.
    fn assemble(&self, factory: &RangeFactory, begin: u64, end: u64) -> Result<Range> {
        let ids = range_nodes(begin, end);
        let mut hashes = Vec::with_capacity(ids.len());
        for id in ids {
            hashes.push(self.take(id)?);
        }
        Ok(factory.new_range(begin, end, hashes)?)
    }
}
