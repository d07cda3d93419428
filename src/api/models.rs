use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::blockchain::{Chain, ChainRecord, MiningOptions};

/// Shared application state. The chain lock is only held for short reads and
/// appends; the nonce search itself runs under `miner`, so one `/mine/` runs
/// at a time without blocking readers.
pub struct AppState {
    pub chain: Mutex<Chain<String>>,
    pub miner: Mutex<()>,
    pub mining: MiningOptions,
    /// Digests tried by this node's own `/mine/` searches.
    pub total_attempts: AtomicU64,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(chain: Chain<String>, mining: MiningOptions) -> Self {
        Self {
            chain: Mutex::new(chain),
            miner: Mutex::new(()),
            mining,
            total_attempts: AtomicU64::new(0),
            started_at: Utc::now(),
        }
    }

    /// Add to `total_attempts`, saturating at `u64::MAX`.
    pub fn record_attempts(&self, attempts: u64) {
        // The update closure always returns Some, so this cannot fail.
        let _ = self
            .total_attempts
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |total| {
                Some(total.saturating_add(attempts))
            });
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(Chain::default(), MiningOptions::default())
    }
}

/* ---------- Chain API Models ---------- */

#[derive(Serialize)]
pub struct ChainResponse<'a> {
    pub length: usize,
    pub difficulty: u32,
    pub chain: &'a [ChainRecord<String>],
}

#[derive(Serialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub length: usize,
    pub difficulty: u32,
    pub error: Option<String>,
}

#[derive(Deserialize)]
pub struct MineRequest {
    pub payload: String,
}

#[derive(Serialize)]
pub struct MineResponse {
    pub sequence_number: u64,
    pub digest: String,
    pub nonce: u64,
    pub difficulty: u32,
    pub elapsed_ms: u64,
}

#[derive(Serialize)]
pub struct DifficultyResponse {
    pub difficulty: u32,
}

/* ---------- Mining API Models ---------- */

/// Everything an external miner needs to work on the next position.
#[derive(Serialize)]
pub struct TemplateResponse {
    pub sequence_number: u64,
    pub previous_digest: String,
    pub difficulty: u32,
}

#[derive(Deserialize)]
pub struct SubmitRequest {
    pub sequence_number: u64,
    pub previous_digest: String,
    pub payload: String,
    pub nonce: u64,
}

#[derive(Serialize)]
pub struct SubmitResponse {
    pub accepted: bool,
    pub sequence_number: Option<u64>,
    pub digest: Option<String>,
    pub error: Option<String>,
}

/* ---------- Stats ---------- */

#[derive(Serialize)]
pub struct StatsResponse {
    pub height: usize,
    pub difficulty: u32,
    pub total_attempts: u64,
    pub mining_workers: usize,
    pub started_at: String,
}
