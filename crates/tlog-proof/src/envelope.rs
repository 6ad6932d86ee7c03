//! The c2sp.org/tlog-proof@v1 interchange format.
//!
//! A tlog proof bundles a leaf index, its inclusion proof, and the signed
//! checkpoint the proof leads to:
//!
//! ```text
//! c2sp.org/tlog-proof@v1\n
//! [extra <base64>\n]
//! index <u64>\n
//! <base64 hash>\n        (one per proof hash, 32 bytes decoded)
//! \n
//! <signed checkpoint bytes...>
//! ```

use base64::{engine::general_purpose::STANDARD, Engine};
use tlog_hasher::{Rfc6962Hasher, HASH_SIZE};

use crate::checkpoint::CheckpointVerifier;
use crate::error::{Error, Result};
use crate::verify::verify_inclusion;

/// The first line of every tlog proof.
pub const TLOG_PROOF_HEADER: &str = "c2sp.org/tlog-proof@v1";

/// A parsed c2sp.org/tlog-proof@v1 proof.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlogProof {
    /// Index of the proven leaf.
    pub index: u64,
    /// The inclusion proof hashes, leaf to root.
    pub hashes: Vec<[u8; HASH_SIZE]>,
    /// Opaque extra data carried alongside the proof.
    pub extra: Option<Vec<u8>>,
    /// The signed checkpoint, kept verbatim for signature verification.
    pub checkpoint: Vec<u8>,
}

impl TlogProof {
    /// Bundles an inclusion proof and a signed checkpoint.
    pub fn new(index: u64, hashes: Vec<[u8; HASH_SIZE]>, checkpoint: Vec<u8>) -> Self {
        TlogProof {
            index,
            hashes,
            extra: None,
            checkpoint,
        }
    }

    /// Like [`TlogProof::new`], with opaque extra data attached.
    pub fn with_extra(
        index: u64,
        hashes: Vec<[u8; HASH_SIZE]>,
        checkpoint: Vec<u8>,
        extra: Vec<u8>,
    ) -> Self {
        TlogProof {
            index,
            hashes,
            extra: Some(extra),
            checkpoint,
        }
    }

    /// Encodes the proof in the interchange format.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(TLOG_PROOF_HEADER.as_bytes());
        out.push(b'\n');
        if let Some(extra) = &self.extra {
            out.extend_from_slice(b"extra ");
            out.extend_from_slice(STANDARD.encode(extra).as_bytes());
            out.push(b'\n');
        }
        out.extend_from_slice(format!("index {}\n", self.index).as_bytes());
        for hash in &self.hashes {
            out.extend_from_slice(STANDARD.encode(hash).as_bytes());
            out.push(b'\n');
        }
        out.push(b'\n');
        out.extend_from_slice(&self.checkpoint);
        out
    }

    /// Parses a proof from its interchange encoding.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let mut rest = bytes;
        if next_line(&mut rest) != Some(TLOG_PROOF_HEADER.as_bytes()) {
            return Err(Error::MalformedEnvelope(
                "missing expected header".to_string(),
            ));
        }

        let mut line = next_line(&mut rest).unwrap_or_default();
        let extra = match strip_field(line, "extra ") {
            Some(encoded) => {
                let extra = STANDARD.decode(encoded).map_err(|_| {
                    Error::MalformedEnvelope("extra data not base64 encoded".to_string())
                })?;
                line = next_line(&mut rest).unwrap_or_default();
                Some(extra)
            }
            None => None,
        };

        let index = match strip_field(line, "index ") {
            Some(value) => value.parse::<u64>().map_err(|_| {
                Error::MalformedEnvelope("index not a valid u64".to_string())
            })?,
            None => {
                return Err(Error::MalformedEnvelope(
                    "missing required index".to_string(),
                ))
            }
        };

        let mut hashes = Vec::new();
        while let Some(line) = next_line(&mut rest) {
            if line.is_empty() {
                break;
            }
            let hash = STANDARD.decode(line).map_err(|_| {
                Error::MalformedEnvelope("hash not base64 encoded".to_string())
            })?;
            let hash: [u8; HASH_SIZE] = hash.try_into().map_err(|bad: Vec<u8>| {
                Error::MalformedEnvelope(format!(
                    "hash length was {}, expected {}",
                    bad.len(),
                    HASH_SIZE
                ))
            })?;
            hashes.push(hash);
        }

        // Everything after the blank line is the checkpoint, normalized to
        // end with a newline.
        let mut checkpoint = rest.to_vec();
        if !checkpoint.is_empty() && checkpoint.last() != Some(&b'\n') {
            checkpoint.push(b'\n');
        }

        Ok(TlogProof {
            index,
            hashes,
            extra,
            checkpoint,
        })
    }
}

/// Verifies a tlog proof for the given leaf hash: the checkpoint must carry
/// the expected origin and verify through `verifier`, and the inclusion
/// proof must lead from the leaf hash to the checkpoint's root.
///
/// Returns the leaf index and the extra data, if any.
pub fn verify_tlog_proof(
    proof: &[u8],
    leaf_hash: &[u8],
    origin: &str,
    verifier: &dyn CheckpointVerifier,
) -> Result<(u64, Option<Vec<u8>>)> {
    let proof = TlogProof::parse(proof)?;
    let checkpoint = verifier.verify_checkpoint(&proof.checkpoint)?;
    if checkpoint.origin != origin {
        return Err(Error::Checkpoint(format!(
            "unexpected origin {:?}, want {:?}",
            checkpoint.origin, origin
        )));
    }
    let hashes: Vec<Vec<u8>> = proof.hashes.iter().map(|h| h.to_vec()).collect();
    verify_inclusion(
        &Rfc6962Hasher,
        proof.index,
        checkpoint.tree_size,
        leaf_hash,
        &hashes,
        &checkpoint.root_hash,
    )?;
    Ok((proof.index, proof.extra))
}

/// Pops the next `\n`-terminated line off the front of `rest`.
fn next_line<'a>(rest: &mut &'a [u8]) -> Option<&'a [u8]> {
    if rest.is_empty() {
        return None;
    }
    match rest.iter().position(|&b| b == b'\n') {
        Some(at) => {
            let line = &rest[..at];
            *rest = &rest[at + 1..];
            Some(line)
        }
        None => {
            let line = *rest;
            *rest = &[];
            Some(line)
        }
    }
}

fn strip_field<'a>(line: &'a [u8], prefix: &str) -> Option<&'a str> {
    let stripped = line.strip_prefix(prefix.as_bytes())?;
    std::str::from_utf8(stripped).ok()
}
