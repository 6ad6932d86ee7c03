//! Checkpoint (signed tree head) parsing.
//!
//! A checkpoint commits to the state of a log as a signed note: a text body
//! followed by a blank line and one or more signature lines.
//!
//! # Format
//!
//! ```text
//! <origin>
//! <tree_size>
//! <root_hash_base64>
//! [other_content...]
//!
//! — <signer_name> <signature_base64>
//! ```
//!
//! Signature lines begin with the Unicode em dash (U+2014), not an ASCII
//! hyphen. Each decoded signature consists of a 4-byte key ID followed by
//! the signature bytes. Verifying the signatures is out of scope here; it
//! happens behind the [`CheckpointVerifier`] capability.

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A checkpoint parsed from a signed note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    /// The origin string identifying the log.
    pub origin: String,
    /// Tree size (number of leaves).
    pub tree_size: u64,
    /// Root hash of the Merkle tree.
    #[serde(with = "crate::encoding::base64_bytes")]
    pub root_hash: Vec<u8>,
    /// Optional extension lines following the root hash.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub other_content: Vec<String>,
    /// Signatures over the note body.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub signatures: Vec<CheckpointSignature>,
}

/// A single signature line of a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckpointSignature {
    /// The name of the signer.
    pub name: String,
    /// The 4-byte key ID from the start of the decoded signature.
    pub key_id: [u8; 4],
    /// The signature bytes following the key ID.
    #[serde(with = "crate::encoding::base64_bytes")]
    pub signature: Vec<u8>,
}

/// Verifies the signatures on a checkpoint note.
///
/// The proof core never checks signatures itself; implementations typically
/// wrap a note verifier for the log's public key, plus any witness policy.
pub trait CheckpointVerifier {
    /// Verifies the signed note and returns the parsed checkpoint.
    fn verify_checkpoint(&self, note: &[u8]) -> Result<Checkpoint>;
}

impl Checkpoint {
    /// Parses a signed note, taking the body apart and collecting the
    /// signature lines. Signatures are not verified.
    pub fn from_text(text: &str) -> Result<Self> {
        let (body, signatures_text) = text
            .split_once("\n\n")
            .ok_or_else(|| Error::Checkpoint("missing blank line separator".to_string()))?;

        let mut lines = body.lines();
        let origin = lines
            .next()
            .filter(|origin| !origin.is_empty())
            .ok_or_else(|| Error::Checkpoint("missing origin".to_string()))?
            .to_string();

        let tree_size = lines
            .next()
            .ok_or_else(|| Error::Checkpoint("missing tree size".to_string()))?
            .parse::<u64>()
            .map_err(|_| Error::Checkpoint("invalid tree size".to_string()))?;

        let root_hash_b64 = lines
            .next()
            .ok_or_else(|| Error::Checkpoint("missing root hash".to_string()))?;
        let root_hash = STANDARD
            .decode(root_hash_b64)
            .map_err(|_| Error::Checkpoint("invalid root hash base64".to_string()))?;

        let other_content = lines.map(str::to_string).collect();

        let mut signatures = Vec::new();
        for line in signatures_text.lines().filter(|line| !line.is_empty()) {
            signatures.push(CheckpointSignature::from_line(line)?);
        }
        if signatures.is_empty() {
            return Err(Error::Checkpoint("no signatures found".to_string()));
        }

        Ok(Checkpoint {
            origin,
            tree_size,
            root_hash,
            other_content,
            signatures,
        })
    }

    /// Encodes the note body that signatures cover, trailing newline
    /// included.
    pub fn to_signed_note_body(&self) -> String {
        let mut body = format!(
            "{}\n{}\n{}\n",
            self.origin,
            self.tree_size,
            STANDARD.encode(&self.root_hash)
        );
        for line in &self.other_content {
            body.push_str(line);
            body.push('\n');
        }
        body
    }
}

impl CheckpointSignature {
    /// Parses a `— <name> <base64_signature>` line.
    pub fn from_line(line: &str) -> Result<Self> {
        let rest = line.strip_prefix("\u{2014} ").ok_or_else(|| {
            Error::Checkpoint("signature line must start with em dash (U+2014)".to_string())
        })?;
        let (name, signature_b64) = rest
            .split_once(' ')
            .ok_or_else(|| Error::Checkpoint("malformed signature line".to_string()))?;

        let decoded = STANDARD
            .decode(signature_b64)
            .map_err(|_| Error::Checkpoint("invalid signature base64".to_string()))?;
        if decoded.len() < 5 {
            return Err(Error::Checkpoint(
                "signature too short for 4-byte key ID".to_string(),
            ));
        }

        let mut key_id = [0u8; 4];
        key_id.copy_from_slice(&decoded[..4]);
        Ok(CheckpointSignature {
            name: name.to_string(),
            key_id,
            signature: decoded[4..].to_vec(),
        })
    }
}
