use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum NotationError {
    #[error("empty position string")]
    Empty,
    #[error("expected 8 ranks, found {0}")]
    RankCount(usize),
    #[error("rank {rank} covers {squares} squares instead of 8")]
    RankLength { rank: u8, squares: usize },
    #[error("invalid piece letter '{0}'")]
    BadPiece(char),
    #[error("missing side to move")]
    MissingSide,
    #[error("invalid side to move '{0}'")]
    BadSide(String),
    #[error("invalid coordinate move '{0}'")]
    BadMove(String),
}

/// Failures surfaced by the relay; every upstream problem maps to a 5xx.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("upstream rejected the position: {0}")]
    Upstream(String),
    #[error("unparseable upstream payload: {0}")]
    BadPayload(String),
    #[error("engine process error: {0}")]
    Engine(#[from] std::io::Error),
    #[error("upstream request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("upstream did not answer within {0}s")]
    Timeout(u64),
}

impl ResponseError for RelayError {
    fn status_code(&self) -> StatusCode {
        match self {
            RelayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            RelayError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            RelayError::Upstream(_)
            | RelayError::BadPayload(_)
            | RelayError::Engine(_)
            | RelayError::Http(_) => StatusCode::BAD_GATEWAY,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "error": self.to_string(),
        }))
    }
}

/// Client-side failures. None of them stop the observation loop.
#[derive(Debug, Error)]
pub enum AssistError {
    #[error("relay request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("relay answered {status}: {body}")]
    Status { status: u16, body: String },
    #[error("page snapshot unavailable: {0}")]
    Snapshot(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
