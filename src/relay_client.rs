use async_trait::async_trait;
use reqwest::{Client, Response};

use crate::error::AssistError;
use crate::wire::{Analysis, ExplainRequest, Explanation, PositionRequest};

/// The relay endpoints the assistant calls.
#[async_trait]
pub trait RelayApi: Send + Sync {
    /// Raw engine reply for `position`.
    async fn best_move(&self, position: &str) -> Result<String, AssistError>;
    async fn analyze(&self, position: &str) -> Result<Analysis, AssistError>;
    async fn explain(&self, position: &str, move_str: &str) -> Result<String, AssistError>;
}

pub struct RelayClient {
    http: Client,
    base_url: String,
}

impl RelayClient {
    pub fn new(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post<T: serde::Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<Response, AssistError> {
        let response = self.http.post(self.url(path)).json(body).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(AssistError::Status { status: status.as_u16(), body })
    }
}

#[async_trait]
impl RelayApi for RelayClient {
    async fn best_move(&self, position: &str) -> Result<String, AssistError> {
        let request = PositionRequest { fen_string: position.to_string(), depth: None };
        let response = self.post("/bestmove", &request).await?;
        Ok(response.text().await?)
    }

    async fn analyze(&self, position: &str) -> Result<Analysis, AssistError> {
        let request = PositionRequest { fen_string: position.to_string(), depth: None };
        let response = self.post("/analyze", &request).await?;
        Ok(response.json::<Analysis>().await?)
    }

    async fn explain(&self, position: &str, move_str: &str) -> Result<String, AssistError> {
        let request = ExplainRequest {
            fen_string: position.to_string(),
            move_str: move_str.to_string(),
        };
        let response = self.post("/explain", &request).await?;
        Ok(response.json::<Explanation>().await?.explanation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining() {
        let client = RelayClient::new(Client::new(), "http://localhost:3000/");
        assert_eq!(client.url("/bestmove"), "http://localhost:3000/bestmove");
    }

    #[tokio::test]
    async fn test_unreachable_relay() {
        let client = RelayClient::new(Client::new(), "http://127.0.0.1:9");
        let result = client.best_move("8/8/8/8/8/8/8/K6k w").await;
        assert!(matches!(result, Err(AssistError::Http(_))));
    }
}
