use std::time::Instant;

use actix_web::{HttpResponse, Responder, get, post, web};
use log::{info, warn};

use super::models::{
    AppState, ChainResponse, DifficultyResponse, MineRequest, MineResponse, ValidateResponse,
};
use crate::blockchain::{Block, miner};
use crate::error::ChainError;

/// Get the full chain.
#[get("/chain/")]
pub async fn get_chain(state: web::Data<AppState>) -> impl Responder {
    let chain = state.chain.lock().expect("mutex poisoned");
    HttpResponse::Ok().json(ChainResponse {
        length: chain.len(),
        difficulty: chain.difficulty(),
        chain: chain.records(),
    })
}

/// Re-walk the whole chain.
#[get("/validate/")]
pub async fn validate_chain(state: web::Data<AppState>) -> impl Responder {
    let chain = state.chain.lock().expect("mutex poisoned");
    let result = chain.verify();
    HttpResponse::Ok().json(ValidateResponse {
        valid: result.is_ok(),
        length: chain.len(),
        difficulty: chain.difficulty(),
        error: result.err().map(|e| e.to_string()),
    })
}

/// Mine `payload` as the next block. The search runs on the blocking pool
/// under the miner lock; the chain lock is only taken to read the tip and to
/// append, so readers are never parked behind a search.
#[post("/mine/")]
pub async fn mine_block(state: web::Data<AppState>, req: web::Json<MineRequest>) -> impl Responder {
    let payload = req.into_inner().payload;
    let started = Instant::now();
    let worker_state = state.clone();
    let mined = web::block(move || {
        let _miner = worker_state.miner.lock().expect("mutex poisoned");
        let (mut block, difficulty) = {
            let chain = worker_state.chain.lock().expect("mutex poisoned");
            let mut block = Block::new(payload, chain.next_sequence_number());
            block.previous_digest = chain.tip_digest().to_string();
            (block, chain.difficulty())
        };

        let solution = miner::search(&block, difficulty, &worker_state.mining)?;
        worker_state.record_attempts(solution.attempts);
        block.nonce = solution.nonce;

        // A submitted block may have moved the tip while we searched.
        let mut chain = worker_state.chain.lock().expect("mutex poisoned");
        chain
            .append_checked(block)
            .map(|rec| (rec.clone(), difficulty))
    })
    .await;

    match mined {
        Ok(Ok((rec, difficulty))) => {
            let resp = MineResponse {
                sequence_number: rec.sequence_number,
                digest: rec.digest,
                nonce: rec.nonce,
                difficulty,
                elapsed_ms: started.elapsed().as_millis() as u64,
            };
            info!(
                "MINER - sealed block #{} (hash={}, nonce={})",
                resp.sequence_number, resp.digest, resp.nonce
            );
            HttpResponse::Ok().json(resp)
        }
        Ok(Err(
            e @ (ChainError::MiningTimeout(_)
            | ChainError::MiningCancelled
            | ChainError::AttemptsExhausted(_)),
        )) => {
            warn!("MINER - gave up: {e}");
            HttpResponse::ServiceUnavailable().body(e.to_string())
        }
        Ok(Err(e @ ChainError::InvalidLinkage { .. })) => {
            warn!("MINER - tip moved during search: {e}");
            HttpResponse::Conflict().body(e.to_string())
        }
        Ok(Err(e)) => HttpResponse::BadRequest().body(e.to_string()),
        Err(e) => HttpResponse::InternalServerError().body(e.to_string()),
    }
}

/// Get the chain's PoW difficulty (fixed at startup).
#[get("/difficulty/")]
pub async fn get_difficulty(state: web::Data<AppState>) -> impl Responder {
    let chain = state.chain.lock().expect("mutex poisoned");
    HttpResponse::Ok().json(DifficultyResponse {
        difficulty: chain.difficulty(),
    })
}
