//! Node addressing and compact ranges for append-only Merkle logs
//!
//! This crate provides the integer algebra of tree node addresses
//! ([`NodeId`], [`range_nodes`], [`decompose`]) and the compact range engine
//! ([`RangeFactory`], [`Range`]) used to construct and merge commitments to
//! contiguous leaf ranges. Everything here is pure: hashing is injected
//! through the factory and no I/O happens at this layer.

pub mod error;
pub mod node;
pub mod range;

pub use error::{Error, Result};
pub use node::{bit_length, decompose, range_nodes, range_size, NodeId};
pub use range::{Range, RangeFactory, VisitFn};
