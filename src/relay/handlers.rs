use std::future::Future;
use std::time::Duration;
use actix_web::{web, HttpResponse, Responder};
use serde_json::json;

use crate::error::RelayError;
use crate::notation::complete;
use crate::relay::explain::explain;
use crate::relay::upstream::Upstream;
use crate::wire::{ExplainRequest, Explanation, PositionRequest};

pub struct RelayState {
    pub upstream: Box<dyn Upstream>,
    pub depth: u8,
    pub timeout: Duration,
}

impl RelayState {
    pub fn new(upstream: Box<dyn Upstream>, depth: u8, timeout: Duration) -> Self {
        Self { upstream, depth, timeout }
    }

    async fn bounded<T, F>(&self, call: F) -> Result<T, RelayError>
    where
        F: Future<Output = Result<T, RelayError>>,
    {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| RelayError::Timeout(self.timeout.as_secs()))?
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(index)))
        .service(web::resource("/health").route(web::get().to(health)))
        .service(web::resource("/bestmove").route(web::post().to(best_move)))
        .service(web::resource("/analyze").route(web::post().to(analyze)))
        .service(web::resource("/explain").route(web::post().to(explain_move)));
}

/// Completed position for a request body, rejecting blank input.
fn position_for(fen_string: &str) -> Result<String, RelayError> {
    if fen_string.trim().is_empty() {
        return Err(RelayError::InvalidRequest("fenString is empty".into()));
    }
    let fen = complete(fen_string);
    if fen != fen_string.trim() {
        log::debug!("Completed '{}' to '{}'", fen_string, fen);
    }
    Ok(fen)
}

async fn index() -> impl Responder {
    HttpResponse::Ok().body("Chess assistant relay is running")
}

async fn health(state: web::Data<RelayState>) -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "backend": state.upstream.name(),
    }))
}

async fn best_move(
    state: web::Data<RelayState>,
    req: web::Json<PositionRequest>,
) -> Result<HttpResponse, RelayError> {
    let fen = position_for(&req.fen_string)?;
    let depth = req.depth.unwrap_or(state.depth);

    let mv = state
        .bounded(state.upstream.best_move(&fen, depth))
        .await
        .map_err(|e| {
            log::error!("Best move for {} failed: {}", fen, e);
            e
        })?;

    log::info!("{} -> {}", fen, mv);
    Ok(HttpResponse::Ok().content_type("text/plain; charset=utf-8").body(mv))
}

async fn analyze(
    state: web::Data<RelayState>,
    req: web::Json<PositionRequest>,
) -> Result<HttpResponse, RelayError> {
    let fen = position_for(&req.fen_string)?;
    let depth = req.depth.unwrap_or(state.depth);

    let analysis = state
        .bounded(state.upstream.analyze(&fen, depth))
        .await
        .map_err(|e| {
            log::error!("Analysis of {} failed: {}", fen, e);
            e
        })?;

    Ok(HttpResponse::Ok().json(analysis))
}

async fn explain_move(req: web::Json<ExplainRequest>) -> Result<HttpResponse, RelayError> {
    let fen = position_for(&req.fen_string)?;
    if req.move_str.trim().is_empty() {
        return Err(RelayError::InvalidRequest("move is empty".into()));
    }

    Ok(HttpResponse::Ok().json(Explanation {
        move_str: req.move_str.clone(),
        explanation: explain(&fen, &req.move_str),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_for() {
        assert!(matches!(position_for("  "), Err(RelayError::InvalidRequest(_))));
        assert_eq!(
            position_for("8/8/8/8/8/8/8/K6k b").unwrap(),
            "8/8/8/8/8/8/8/K6k b KQkq - 0 1"
        );
    }
}
