use actix_web::{HttpResponse, Responder, get, post, web};
use log::{debug, info, warn};

use super::models::{AppState, SubmitRequest, SubmitResponse, TemplateResponse};
use crate::blockchain::Block;

/// Describe the next position so a miner can search for a nonce offline.
#[get("/mining/template/")]
pub async fn get_template(state: web::Data<AppState>) -> impl Responder {
    let chain = state.chain.lock().expect("mutex poisoned");
    let resp = TemplateResponse {
        sequence_number: chain.next_sequence_number(),
        previous_digest: chain.tip_digest().to_string(),
        difficulty: chain.difficulty(),
    };
    debug!(
        "TEMPLATE height={} prev={} diff={}",
        resp.sequence_number, resp.previous_digest, resp.difficulty
    );
    HttpResponse::Ok().json(resp)
}

/// Accept an externally mined block. Linkage to the current tip and the
/// difficulty are re-checked before it is appended.
#[post("/mining/submit/")]
pub async fn submit_solution(
    state: web::Data<AppState>,
    req: web::Json<SubmitRequest>,
) -> impl Responder {
    let req = req.into_inner();
    let mut block = Block::new(req.payload, req.sequence_number);
    block.previous_digest = req.previous_digest;
    block.nonce = req.nonce;

    let mut chain = state.chain.lock().expect("mutex poisoned");
    if block.sequence_number != chain.next_sequence_number() {
        warn!(
            "rejected submission: sequence {} but next is {}",
            block.sequence_number,
            chain.next_sequence_number()
        );
        return HttpResponse::BadRequest().json(SubmitResponse {
            accepted: false,
            sequence_number: None,
            digest: None,
            error: Some(format!(
                "expected sequence number {}",
                chain.next_sequence_number()
            )),
        });
    }

    match chain.append_checked(block) {
        Ok(rec) => {
            info!(
                "ACCEPTED block #{} hash={} nonce={}",
                rec.sequence_number, rec.digest, rec.nonce
            );
            HttpResponse::Ok().json(SubmitResponse {
                accepted: true,
                sequence_number: Some(rec.sequence_number),
                digest: Some(rec.digest.clone()),
                error: None,
            })
        }
        Err(e) => {
            warn!("rejected submission: {e}");
            HttpResponse::BadRequest().json(SubmitResponse {
                accepted: false,
                sequence_number: None,
                digest: None,
                error: Some(e.to_string()),
            })
        }
    }
}
