use std::time::Duration;
use async_trait::async_trait;
use serde::Deserialize;

use crate::error::RelayError;
use crate::relay::upstream::{checked_move, Upstream};
use crate::wire::Analysis;

#[derive(Deserialize, Debug)]
struct BookPayload {
    #[serde(default)]
    moves: Vec<BookMove>,
}

#[derive(Deserialize, Debug)]
struct BookMove {
    uci: String,
    #[serde(default)]
    san: Option<String>,
}

/// Default cap on one book lookup; it must leave room for the fallback.
pub const BOOK_TIMEOUT: Duration = Duration::from_secs(2);

/// Opening-database lookup in front of another backend.
///
/// Book moves are answered straight from the database; positions the book
/// does not know, and any book failure, fall through to the wrapped backend.
pub struct OpeningBook {
    http: reqwest::Client,
    url: String,
    timeout: Duration,
    inner: Box<dyn Upstream>,
}

impl OpeningBook {
    pub fn new(http: reqwest::Client, url: &str, inner: Box<dyn Upstream>) -> Self {
        Self {
            http,
            url: url.to_string(),
            timeout: BOOK_TIMEOUT,
            inner,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn lookup(&self, fen: &str) -> Result<Option<String>, RelayError> {
        let body = self
            .http
            .get(&self.url)
            .query(&[("fen", fen), ("moves", "1")])
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        parse_book(&body)
    }
}

fn parse_book(body: &str) -> Result<Option<String>, RelayError> {
    let payload: BookPayload =
        serde_json::from_str(body).map_err(|e| RelayError::BadPayload(e.to_string()))?;
    match payload.moves.first() {
        Some(entry) => {
            let uci = normalize_castling(&entry.uci, entry.san.as_deref());
            checked_move(&uci).map(Some)
        }
        None => Ok(None),
    }
}

/// Some databases write castling as king-takes-rook (`e1h1`); engines and the
/// board overlay expect the king's destination (`e1g1`).
fn normalize_castling(uci: &str, san: Option<&str>) -> String {
    let castles = san.map_or(false, |s| s.starts_with("O-O"));
    match (castles, uci) {
        (true, "e1h1") => "e1g1".to_string(),
        (true, "e1a1") => "e1c1".to_string(),
        (true, "e8h8") => "e8g8".to_string(),
        (true, "e8a8") => "e8c8".to_string(),
        _ => uci.to_string(),
    }
}

#[async_trait]
impl Upstream for OpeningBook {
    fn name(&self) -> String {
        format!("book+{}", self.inner.name())
    }

    async fn best_move(&self, fen: &str, depth: u8) -> Result<String, RelayError> {
        match self.lookup(fen).await {
            Ok(Some(book_move)) => {
                log::info!("Book move {} for {}", book_move, fen);
                return Ok(book_move);
            }
            Ok(None) => log::debug!("Position not in book: {}", fen),
            Err(e) => log::warn!("Opening book unavailable, using {}: {}", self.inner.name(), e),
        }
        self.inner.best_move(fen, depth).await
    }

    async fn analyze(&self, fen: &str, depth: u8) -> Result<Analysis, RelayError> {
        self.inner.analyze(fen, depth).await
    }
}
