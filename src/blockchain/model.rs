use std::fmt::Display;

use log::debug;

use super::hasher::meets_difficulty;
use super::miner::{self, MiningOptions};
use super::{Block, ChainRecord, DEFAULT_DIFFICULTY, GENESIS_PREVIOUS_DIGEST, MAX_DIFFICULTY};
use crate::error::{ChainError, Result};

/// Simple in-memory append-only chain with Proof-of-Work.
#[derive(Debug, Clone)]
pub struct Chain<P> {
    records: Vec<ChainRecord<P>>,
    difficulty: u32,
}

impl<P> Default for Chain<P> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            difficulty: DEFAULT_DIFFICULTY,
        }
    }
}

impl<P: Display> Chain<P> {
    /// Create an empty chain. `difficulty` is fixed for the chain's lifetime.
    pub fn new(difficulty: u32) -> Result<Self> {
        if difficulty == 0 || difficulty > MAX_DIFFICULTY {
            return Err(ChainError::InvalidDifficulty(difficulty));
        }
        Ok(Self {
            records: Vec::new(),
            difficulty,
        })
    }

    pub fn records(&self) -> &[ChainRecord<P>] {
        &self.records
    }

    /// The most recently appended record.
    pub fn tip(&self) -> Option<&ChainRecord<P>> {
        self.records.last()
    }

    /// Digest the next block must link to.
    pub fn tip_digest(&self) -> &str {
        self.tip()
            .map_or(GENESIS_PREVIOUS_DIGEST, |rec| rec.digest.as_str())
    }

    /// Sequence number the driver assigns to the next block.
    pub fn next_sequence_number(&self) -> u64 {
        self.tip().map_or(1, |rec| rec.sequence_number + 1)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    /// Push `block` as a record without any validation. Callers must have
    /// mined it against the current tip.
    pub fn append(&mut self, block: Block<P>) -> &ChainRecord<P> {
        self.records.push(block.into_record());
        &self.records[self.records.len() - 1]
    }

    /// Like `append`, but re-checks the tip linkage and the difficulty first.
    pub fn append_checked(&mut self, block: Block<P>) -> Result<&ChainRecord<P>> {
        if block.previous_digest != self.tip_digest() {
            return Err(ChainError::InvalidLinkage {
                sequence_number: block.sequence_number,
                expected: self.tip_digest().to_string(),
                found: block.previous_digest,
            });
        }
        let digest = block.digest();
        if !meets_difficulty(&digest, self.difficulty) {
            return Err(ChainError::DifficultyNotMet {
                sequence_number: block.sequence_number,
                digest,
                difficulty: self.difficulty,
            });
        }
        Ok(self.append(block))
    }

    /// Link `block` to the tip, then increment its nonce until the digest
    /// meets the difficulty and append it. Unbounded: expect about
    /// `16^difficulty` attempts.
    pub fn mine(&mut self, mut block: Block<P>) -> &ChainRecord<P> {
        block.previous_digest = self.tip_digest().to_string();
        while !meets_difficulty(&block.digest(), self.difficulty) {
            block.nonce = block.nonce.wrapping_add(1);
        }
        self.append(block)
    }

    /// Mine under the bounds in `options`. On failure nothing is appended.
    pub fn mine_with(
        &mut self,
        mut block: Block<P>,
        options: &MiningOptions,
    ) -> Result<&ChainRecord<P>>
    where
        P: Sync,
    {
        block.previous_digest = self.tip_digest().to_string();
        let solution = miner::search(&block, self.difficulty, options)?;
        block.nonce = solution.nonce;
        debug!(
            "block #{} solved with nonce {} after {} attempts",
            block.sequence_number, solution.nonce, solution.attempts
        );
        Ok(self.append(block))
    }

    /// Re-walk every record: stored digest matches the fields, the digest
    /// meets the difficulty, and `previous` links to the prior record (or to
    /// the genesis default for the first one).
    pub fn verify(&self) -> Result<()> {
        let mut expected_previous = GENESIS_PREVIOUS_DIGEST;
        for rec in &self.records {
            let computed = rec.compute_digest();
            if computed != rec.digest {
                return Err(ChainError::DigestMismatch {
                    sequence_number: rec.sequence_number,
                    stored: rec.digest.clone(),
                    computed,
                });
            }
            if !meets_difficulty(&rec.digest, self.difficulty) {
                return Err(ChainError::DifficultyNotMet {
                    sequence_number: rec.sequence_number,
                    digest: rec.digest.clone(),
                    difficulty: self.difficulty,
                });
            }
            if rec.previous != expected_previous {
                return Err(ChainError::InvalidLinkage {
                    sequence_number: rec.sequence_number,
                    expected: expected_previous.to_string(),
                    found: rec.previous.clone(),
                });
            }
            expected_previous = rec.digest.as_str();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::Chain;
    use crate::blockchain::miner::{CancelToken, MiningOptions};
    use crate::blockchain::{Block, GENESIS_PREVIOUS_DIGEST, hasher};
    use crate::error::ChainError;

    const PAYLOADS: [&str; 4] = ["hello world", "what's up", "hello", "bye"];

    fn mined_chain(difficulty: u32) -> Chain<String> {
        let mut chain = Chain::new(difficulty).unwrap();
        for (i, data) in PAYLOADS.iter().enumerate() {
            chain.mine(Block::new(data.to_string(), i as u64 + 1));
        }
        chain
    }

    #[test]
    fn rejects_out_of_range_difficulty() {
        assert_eq!(
            Chain::<String>::new(0).unwrap_err(),
            ChainError::InvalidDifficulty(0)
        );
        assert_eq!(
            Chain::<String>::new(65).unwrap_err(),
            ChainError::InvalidDifficulty(65)
        );
        assert_eq!(Chain::<String>::default().difficulty(), 3);
    }

    #[test]
    fn first_block_links_to_genesis_default() {
        let mut chain: Chain<&str> = Chain::default();
        assert!(chain.is_empty());
        assert_eq!(chain.tip_digest(), GENESIS_PREVIOUS_DIGEST);
        let rec = chain.mine(Block::new("hello world", 1));
        assert_eq!(rec.previous, "0".repeat(64));
    }

    #[test]
    fn mined_digest_meets_difficulty() {
        let mut chain: Chain<&str> = Chain::new(3).unwrap();
        let rec = chain.mine(Block::new("hello world", 1)).clone();
        assert!(rec.digest.starts_with("000"));
        assert_eq!(rec.digest, rec.compute_digest());
        assert_eq!(
            rec.digest,
            hasher::digest(&[&rec.previous, &rec.sequence_number, &rec.payload, &rec.nonce])
        );
    }

    #[test]
    fn demo_payloads_build_linked_chain() {
        let chain = mined_chain(3);
        let records = chain.records();
        assert_eq!(records.len(), 4);
        assert_eq!(records[0].previous, GENESIS_PREVIOUS_DIGEST);
        for (i, rec) in records.iter().enumerate() {
            assert_eq!(rec.sequence_number, i as u64 + 1);
            assert_eq!(rec.payload, PAYLOADS[i]);
            assert!(rec.digest.starts_with("000"));
            if i > 0 {
                assert_eq!(rec.previous, records[i - 1].digest);
            }
        }
        assert_eq!(chain.next_sequence_number(), 5);
        assert!(chain.verify().is_ok());
    }

    #[test]
    fn chains_do_not_share_storage() {
        let mut a: Chain<&str> = Chain::default();
        let b: Chain<&str> = Chain::default();
        a.mine(Block::new("hello", 1));
        assert_eq!(a.len(), 1);
        assert!(b.is_empty());
    }

    #[test]
    fn append_trusts_caller() {
        let mut chain: Chain<&str> = Chain::default();
        let rec = chain.append(Block::new("unmined", 1));
        assert_eq!(rec.nonce, 0);
        assert_eq!(chain.len(), 1);
    }

    #[test]
    fn append_checked_rejects_bad_linkage() {
        let mut chain = mined_chain(2);
        let mut block = Block::new("late".to_string(), 5);
        // still pointing at genesis instead of the tip
        let err = chain.append_checked(block.clone()).unwrap_err();
        assert!(matches!(err, ChainError::InvalidLinkage { sequence_number: 5, .. }));

        block.previous_digest = chain.tip_digest().to_string();
        while !hasher::meets_difficulty(&block.digest(), 2) {
            block.nonce += 1;
        }
        assert!(chain.append_checked(block).is_ok());
        assert_eq!(chain.len(), 5);
        assert!(chain.verify().is_ok());
    }

    #[test]
    fn append_checked_rejects_unmined_block() {
        let mut chain: Chain<&str> = Chain::new(3).unwrap();
        let mut block = Block::new("hello", 1);
        while hasher::meets_difficulty(&block.digest(), 1) {
            block.nonce += 1;
        }
        let err = chain.append_checked(block).unwrap_err();
        assert!(matches!(err, ChainError::DifficultyNotMet { difficulty: 3, .. }));
        assert!(chain.is_empty());
    }

    #[test]
    fn verify_detects_tampered_payload() {
        let mut chain = mined_chain(2);
        chain.records[1].payload = "tampered".to_string();
        assert!(matches!(
            chain.verify(),
            Err(ChainError::DigestMismatch { sequence_number: 2, .. })
        ));
    }

    #[test]
    fn verify_detects_broken_linkage() {
        let mut chain = mined_chain(2);
        // A valid block mined on genesis, spliced in at position 2.
        let mut other: Chain<String> = Chain::new(2).unwrap();
        let forged = other.mine(Block::new("forged".to_string(), 2)).clone();
        chain.records[1] = forged;
        assert!(matches!(
            chain.verify(),
            Err(ChainError::InvalidLinkage { sequence_number: 2, .. })
        ));
    }

    #[test]
    fn verify_detects_weak_digest() {
        let mut chain: Chain<&str> = Chain::new(1).unwrap();
        let mut block = Block::new("hello", 1);
        while hasher::meets_difficulty(&block.digest(), 1) {
            block.nonce += 1;
        }
        chain.append(block);
        assert!(matches!(
            chain.verify(),
            Err(ChainError::DifficultyNotMet { sequence_number: 1, .. })
        ));
    }

    #[test]
    fn mine_with_defaults_matches_mine() {
        let mut a: Chain<&str> = Chain::new(2).unwrap();
        let mut b: Chain<&str> = Chain::new(2).unwrap();
        let ra = a.mine(Block::new("hello", 1)).clone();
        let rb = b
            .mine_with(Block::new("hello", 1), &MiningOptions::default())
            .unwrap()
            .clone();
        assert_eq!(ra, rb);
    }

    #[test]
    fn parallel_mining_keeps_chain_valid() {
        let mut chain: Chain<String> = Chain::new(3).unwrap();
        let options = MiningOptions::default().with_workers(4);
        for (i, data) in PAYLOADS.iter().enumerate() {
            chain
                .mine_with(Block::new(data.to_string(), i as u64 + 1), &options)
                .unwrap();
        }
        assert_eq!(chain.len(), 4);
        assert!(chain.verify().is_ok());
    }

    #[test]
    fn failed_mining_appends_nothing() {
        let mut chain: Chain<&str> = Chain::new(64).unwrap();
        let token = CancelToken::new();
        token.cancel();
        let options = MiningOptions::default().with_cancel(token);
        assert_eq!(
            chain.mine_with(Block::new("hello", 1), &options).unwrap_err(),
            ChainError::MiningCancelled
        );

        let deadline = Duration::from_millis(10);
        let options = MiningOptions::default().with_deadline(deadline);
        assert_eq!(
            chain.mine_with(Block::new("hello", 1), &options).unwrap_err(),
            ChainError::MiningTimeout(deadline)
        );
        assert!(chain.is_empty());
    }
}
