use std::fmt::Display;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use log::debug;

use super::block::Block;
use super::hasher;
use crate::error::{ChainError, Result};

/// How many attempts a worker makes between cancellation/deadline polls.
pub const CHECK_INTERVAL: u64 = 1024;

/// Shared flag used to abort a running search from another thread.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Bounds and parallelism for a nonce search. The default is a single
/// worker with no bounds, which behaves exactly like `Chain::mine`.
#[derive(Debug, Clone)]
pub struct MiningOptions {
    pub cancel: Option<CancelToken>,
    /// Wall-clock budget measured from the start of the search.
    pub deadline: Option<Duration>,
    /// Total number of digests tried across all workers.
    pub max_attempts: Option<u64>,
    pub workers: usize,
}

impl Default for MiningOptions {
    fn default() -> Self {
        Self {
            cancel: None,
            deadline: None,
            max_attempts: None,
            workers: 1,
        }
    }
}

impl MiningOptions {
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u64) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Single worker, no cancellation, no deadline, no attempt cap.
    pub fn is_unbounded(&self) -> bool {
        self.cancel.is_none()
            && self.deadline.is_none()
            && self.max_attempts.is_none()
            && self.workers <= 1
    }
}

/// A nonce satisfying the difficulty, plus the work spent finding it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Solution {
    pub nonce: u64,
    pub attempts: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WorkerExit {
    Found(u64),
    Preempted,
    Cancelled,
    TimedOut,
    Exhausted,
}

struct Worker<'a, P> {
    block: &'a Block<P>,
    difficulty: u32,
    options: &'a MiningOptions,
    started: Instant,
    found: &'a AtomicBool,
}

impl<P: Display> Worker<'_, P> {
    /// Walk `start, start + stride, ...` until a nonce satisfies the
    /// difficulty or the search is stopped.
    fn run(&self, start: u64, stride: u64, budget: Option<u64>) -> (WorkerExit, u64) {
        let mut nonce = start;
        let mut attempts = 0u64;
        loop {
            if self.found.load(Ordering::Acquire) {
                return (WorkerExit::Preempted, attempts);
            }
            if budget.is_some_and(|b| attempts >= b) {
                return (WorkerExit::Exhausted, attempts);
            }
            if attempts % CHECK_INTERVAL == 0 {
                if let Some(exit) = self.poll() {
                    return (exit, attempts);
                }
            }

            let digest = hasher::digest(&[
                &self.block.previous_digest,
                &self.block.sequence_number,
                &self.block.payload,
                &nonce,
            ]);
            attempts += 1;

            if hasher::meets_difficulty(&digest, self.difficulty) {
                // Only the first finder publishes; a late finder yields.
                return match self.found.compare_exchange(
                    false,
                    true,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                ) {
                    Ok(_) => (WorkerExit::Found(nonce), attempts),
                    Err(_) => (WorkerExit::Preempted, attempts),
                };
            }
            nonce = nonce.wrapping_add(stride);
        }
    }

    fn poll(&self) -> Option<WorkerExit> {
        if self.options.cancel.as_ref().is_some_and(|c| c.is_cancelled()) {
            return Some(WorkerExit::Cancelled);
        }
        if self
            .options
            .deadline
            .is_some_and(|d| self.started.elapsed() >= d)
        {
            return Some(WorkerExit::TimedOut);
        }
        None
    }
}

/// Search for a nonce, starting from `block.nonce`, whose digest meets
/// `difficulty`. The block itself is not modified.
///
/// With more than one worker the nonce space is split by stride: worker `i`
/// tries `start + i`, `start + i + workers`, ... The winning nonce is then
/// not necessarily the smallest valid one.
pub fn search<P: Display + Sync>(
    block: &Block<P>,
    difficulty: u32,
    options: &MiningOptions,
) -> Result<Solution> {
    let workers = options.workers.max(1) as u64;
    let found = AtomicBool::new(false);
    let worker = Worker {
        block,
        difficulty,
        options,
        started: Instant::now(),
        found: &found,
    };

    let exits: Vec<(WorkerExit, u64)> = if workers == 1 {
        vec![worker.run(block.nonce, 1, options.max_attempts)]
    } else {
        let worker = &worker;
        thread::scope(|s| {
            let handles: Vec<_> = (0..workers)
                .map(|i| {
                    let budget = options
                        .max_attempts
                        .map(|max| max / workers + u64::from(i < max % workers));
                    s.spawn(move || worker.run(block.nonce.wrapping_add(i), workers, budget))
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap_or((WorkerExit::Preempted, 0)))
                .collect()
        })
    };

    let attempts: u64 = exits.iter().map(|(_, n)| n).sum();
    debug!(
        "search #{} with {} worker(s) stopped after {} attempts",
        block.sequence_number, workers, attempts
    );

    if let Some(nonce) = exits.iter().find_map(|(exit, _)| match exit {
        WorkerExit::Found(nonce) => Some(*nonce),
        _ => None,
    }) {
        return Ok(Solution { nonce, attempts });
    }

    let has = |wanted: WorkerExit| exits.iter().any(|(exit, _)| *exit == wanted);
    if has(WorkerExit::Cancelled) {
        Err(ChainError::MiningCancelled)
    } else if has(WorkerExit::TimedOut) {
        Err(ChainError::MiningTimeout(options.deadline.unwrap_or_default()))
    } else {
        Err(ChainError::AttemptsExhausted(options.max_attempts.unwrap_or(attempts)))
    }
}
