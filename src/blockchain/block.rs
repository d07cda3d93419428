use std::fmt;

use super::GENESIS_PREVIOUS_DIGEST;
use super::hasher;
use super::record::ChainRecord;

/// A candidate block. Its digest is derived from the current field values,
/// so it has no fixed identity until mining settles the nonce.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block<P> {
    pub sequence_number: u64,
    pub payload: P,
    pub previous_digest: String,
    pub nonce: u64, // Proof-of-Work search variable
}

impl<P: fmt::Display> Block<P> {
    /// Create an unmined block linked to the implicit genesis predecessor.
    pub fn new(payload: P, sequence_number: u64) -> Self {
        Self {
            sequence_number,
            payload,
            previous_digest: GENESIS_PREVIOUS_DIGEST.to_string(),
            nonce: 0,
        }
    }

    /// Digest over `(previous_digest, sequence_number, payload, nonce)`.
    pub fn digest(&self) -> String {
        hasher::digest(&[
            &self.previous_digest,
            &self.sequence_number,
            &self.payload,
            &self.nonce,
        ])
    }

    /// Freeze the block into a chain record, computing its digest once.
    pub fn into_record(self) -> ChainRecord<P> {
        ChainRecord {
            digest: self.digest(),
            previous: self.previous_digest,
            sequence_number: self.sequence_number,
            payload: self.payload,
            nonce: self.nonce,
        }
    }
}

impl<P: fmt::Display> fmt::Display for Block<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Block: {}\nHash: {}\nData: {}\nNonce: {}",
            self.sequence_number,
            self.digest(),
            self.payload,
            self.nonce
        )
    }
}
