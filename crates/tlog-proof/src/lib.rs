//! Merkle log proof construction and verification
//!
//! This crate builds and checks the single-leaf inclusion proofs and
//! tree-to-tree consistency proofs of RFC 6962 over an append-only log.
//! Proof construction is split in two: the shape builder ([`inclusion`],
//! [`consistency`]) derives which tree nodes a proof needs without touching
//! any data, and [`Nodes::rehash`] turns the fetched node hashes into the
//! final audit path. The verifiers ([`verify_inclusion`],
//! [`verify_consistency`]) recompute root hashes from a proof and compare
//! them against the expected roots.
//!
//! The [`envelope`] module implements the c2sp.org/tlog-proof@v1 interchange
//! format bundling an inclusion proof with a signed checkpoint.

pub mod checkpoint;
mod encoding;
pub mod envelope;
pub mod error;
pub mod nodes;
pub mod verify;

pub use checkpoint::{Checkpoint, CheckpointSignature, CheckpointVerifier};
pub use envelope::{verify_tlog_proof, TlogProof, TLOG_PROOF_HEADER};
pub use error::{Error, Result};
pub use nodes::{consistency, inclusion, Nodes};
pub use verify::{root_from_inclusion_proof, verify_consistency, verify_inclusion};
