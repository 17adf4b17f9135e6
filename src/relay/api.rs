use async_trait::async_trait;
use serde::Deserialize;

use crate::error::RelayError;
use crate::relay::uci::parse_bestmove;
use crate::relay::upstream::{checked_move, Upstream};
use crate::wire::Analysis;

/// The public API refuses deeper searches.
pub const MAX_API_DEPTH: u8 = 15;

#[derive(Deserialize, Debug, Default)]
struct ApiPayload {
    success: bool,
    #[serde(default)]
    evaluation: Option<f64>,
    #[serde(default)]
    mate: Option<i32>,
    /// Shaped like `bestmove e2e4 ponder e7e5`.
    #[serde(default)]
    bestmove: Option<String>,
    #[serde(default)]
    continuation: Option<String>,
    /// Error text when `success` is false.
    #[serde(default)]
    data: Option<String>,
}

/// Public HTTP analysis API queried with `fen` and `depth` parameters.
pub struct AnalysisApi {
    http: reqwest::Client,
    url: String,
}

impl AnalysisApi {
    pub fn new(http: reqwest::Client, url: &str) -> Self {
        Self { http, url: url.to_string() }
    }

    async fn fetch(&self, fen: &str, depth: u8) -> Result<Analysis, RelayError> {
        let depth = depth.min(MAX_API_DEPTH).to_string();
        let body = self
            .http
            .get(&self.url)
            .query(&[("fen", fen), ("depth", depth.as_str())])
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        parse_payload(&body)
    }
}

fn parse_payload(body: &str) -> Result<Analysis, RelayError> {
    let payload: ApiPayload =
        serde_json::from_str(body).map_err(|e| RelayError::BadPayload(e.to_string()))?;

    if !payload.success {
        return Err(RelayError::Upstream(
            payload.data.unwrap_or_else(|| "analysis API reported failure".to_string()),
        ));
    }

    let best_move = payload.bestmove.as_deref().and_then(|raw| {
        let candidate = parse_bestmove(raw).unwrap_or(raw);
        checked_move(candidate).ok()
    });

    Ok(Analysis {
        evaluation: payload.evaluation,
        best_move,
        continuation: payload.continuation.filter(|c| !c.trim().is_empty()),
        mate: payload.mate,
    })
}

#[async_trait]
impl Upstream for AnalysisApi {
    fn name(&self) -> String {
        format!("api({})", self.url)
    }

    async fn best_move(&self, fen: &str, depth: u8) -> Result<String, RelayError> {
        self.fetch(fen, depth)
            .await?
            .best_move
            .ok_or_else(|| RelayError::BadPayload("response carried no best move".into()))
    }

    async fn analyze(&self, fen: &str, depth: u8) -> Result<Analysis, RelayError> {
        self.fetch(fen, depth).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_payload_success() {
        let body = r#"{"success":true,"evaluation":0.31,"mate":null,
            "bestmove":"bestmove e2e4 ponder e7e5","continuation":"e2e4 e7e5 g1f3"}"#;
        assert_eq!(
            parse_payload(body).unwrap(),
            Analysis {
                evaluation: Some(0.31),
                best_move: Some("e2e4".into()),
                continuation: Some("e2e4 e7e5 g1f3".into()),
                mate: None,
            }
        );
    }

    #[test]
    fn test_payload_bare_move() {
        let analysis = parse_payload(r#"{"success":true,"bestmove":"g1f3","mate":3}"#).unwrap();
        assert_eq!(analysis.best_move.as_deref(), Some("g1f3"));
        assert_eq!(analysis.mate, Some(3));
    }

    #[test]
    fn test_payload_failure() {
        let err = parse_payload(r#"{"success":false,"data":"Invalid FEN"}"#).unwrap_err();
        assert!(matches!(err, RelayError::Upstream(ref msg) if msg == "Invalid FEN"));
    }

    #[test]
    fn test_payload_garbage() {
        assert!(matches!(parse_payload("<html>"), Err(RelayError::BadPayload(_))));
        assert!(matches!(parse_payload(r#"{"evaluation":1.0}"#), Err(RelayError::BadPayload(_))));
    }
}
