use std::time::Duration;

use thiserror::Error;

/// Errors raised by the hardened chain operations and bounded mining.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    #[error("invalid difficulty {0} (expected 1..=64)")]
    InvalidDifficulty(u32),

    #[error("block #{sequence_number} links to {found}, expected {expected}")]
    InvalidLinkage {
        sequence_number: u64,
        expected: String,
        found: String,
    },

    #[error("block #{sequence_number} digest {digest} does not meet difficulty {difficulty}")]
    DifficultyNotMet {
        sequence_number: u64,
        digest: String,
        difficulty: u32,
    },

    #[error("block #{sequence_number} stores digest {stored} but its fields hash to {computed}")]
    DigestMismatch {
        sequence_number: u64,
        stored: String,
        computed: String,
    },

    #[error("mining cancelled")]
    MiningCancelled,

    #[error("mining timed out after {0:?}")]
    MiningTimeout(Duration),

    #[error("no valid nonce found within {0} attempts")]
    AttemptsExhausted(u64),
}

/// Errors raised while reading configuration from the environment.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },

    #[error(transparent)]
    Chain(#[from] ChainError),
}

pub type Result<T> = std::result::Result<T, ChainError>;
