pub mod block;
pub mod hasher;
pub mod miner;
pub mod model;
pub mod record;

pub use block::Block;
pub use miner::{CancelToken, MiningOptions};
pub use model::Chain;
pub use record::ChainRecord;

/// Default Proof-of-Work difficulty (number of leading hex zeros).
pub const DEFAULT_DIFFICULTY: u32 = 3;

/// A SHA-256 hex digest has 64 characters; more zeros can never match.
pub const MAX_DIFFICULTY: u32 = 64;

/// `previous_digest` of the first block: the implicit genesis predecessor.
pub const GENESIS_PREVIOUS_DIGEST: &str =
    "0000000000000000000000000000000000000000000000000000000000000000";
