use std::sync::atomic::Ordering;

use actix_web::{HttpResponse, Responder, get, web};

use super::models::{AppState, StatsResponse};

#[get("/stats/")]
pub async fn get_stats(state: web::Data<AppState>) -> impl Responder {
    let (height, difficulty) = {
        let chain = state.chain.lock().expect("mutex poisoned");
        (chain.len(), chain.difficulty())
    };

    HttpResponse::Ok().json(StatsResponse {
        height,
        difficulty,
        total_attempts: state.total_attempts.load(Ordering::Relaxed),
        mining_workers: state.mining.workers,
        started_at: state.started_at.to_rfc3339(),
    })
}
