use std::fmt;

use serde::{Deserialize, Serialize};

use super::hasher;

/// Immutable snapshot of a mined block as stored in the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainRecord<P> {
    pub digest: String,
    pub previous: String,
    pub sequence_number: u64,
    pub payload: P,
    pub nonce: u64,
}

impl<P: fmt::Display> ChainRecord<P> {
    /// Recompute the digest from the stored fields (ignores `self.digest`).
    pub fn compute_digest(&self) -> String {
        hasher::digest(&[
            &self.previous,
            &self.sequence_number,
            &self.payload,
            &self.nonce,
        ])
    }
}

impl<P: fmt::Display> fmt::Display for ChainRecord<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Block: {}\nHash: {}\nPrevious: {}\nData: {}\nNonce: {}",
            self.sequence_number, self.digest, self.previous, self.payload, self.nonce
        )
    }
}
