use std::path::PathBuf;
use std::time::Duration;
use clap::{Parser, ValueEnum};

use crate::relay::{AnalysisApi, EngineProcess, OpeningBook, Upstream};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    /// Local UCI engine process
    Engine,
    /// Public HTTP analysis API
    Api,
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Relays board positions to a chess analysis backend", long_about = None)]
pub struct RelayArgs {
    /// Server host
    #[arg(long, env = "RELAY_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Server port
    #[arg(short, long, env = "RELAY_PORT", default_value = "3000")]
    pub port: u16,

    /// Which backend answers positions
    #[arg(short, long, env = "RELAY_BACKEND", value_enum, default_value = "engine")]
    pub backend: Backend,

    /// UCI engine executable for the engine backend
    #[arg(long, env = "ENGINE_PATH", default_value = "stockfish")]
    pub engine_path: PathBuf,

    /// Search depth when a request does not name one
    #[arg(short, long, env = "SEARCH_DEPTH", default_value = "19")]
    pub depth: u8,

    /// Analysis API endpoint for the api backend
    #[arg(long, env = "ANALYSIS_API_URL", default_value = "https://stockfish.online/api/s/v2.php")]
    pub api_url: String,

    /// Consult the opening database before the backend
    #[arg(long, env = "OPENING_BOOK")]
    pub opening_book: bool,

    /// Opening database endpoint
    #[arg(long, env = "OPENING_BOOK_URL", default_value = "https://explorer.lichess.ovh/masters")]
    pub book_url: String,

    /// Milliseconds one opening database lookup may take before falling back
    #[arg(long, env = "OPENING_BOOK_TIMEOUT_MS", default_value = "2000")]
    pub book_timeout_ms: u64,

    /// Seconds to wait for the backend before answering 504
    #[arg(long, env = "UPSTREAM_TIMEOUT", default_value = "30")]
    pub timeout_secs: u64,
}

impl RelayArgs {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Book lookups are capped below the request timeout so the fallback still runs.
    pub fn book_timeout(&self) -> Duration {
        Duration::from_millis(self.book_timeout_ms).min(self.timeout() / 2)
    }

    pub fn upstream(&self, http: reqwest::Client) -> Box<dyn Upstream> {
        let backend: Box<dyn Upstream> = match self.backend {
            Backend::Engine => Box::new(EngineProcess::new(&self.engine_path)),
            Backend::Api => Box::new(AnalysisApi::new(http.clone(), &self.api_url)),
        };
        if self.opening_book {
            Box::new(OpeningBook::new(http, &self.book_url, backend).with_timeout(self.book_timeout()))
        } else {
            backend
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Watches a chess board snapshot and suggests moves", long_about = None)]
pub struct AssistantArgs {
    /// Relay server base URL
    #[arg(long, env = "RELAY_URL", default_value = "http://localhost:3000")]
    pub relay_url: String,

    /// Page snapshot written by the page script
    #[arg(long, env = "BOARD_SNAPSHOT", default_value = "board.json")]
    pub snapshot: PathBuf,

    /// Overlay document read back by the page script
    #[arg(long, env = "BOARD_OVERLAY", default_value = "overlay.json")]
    pub overlay: PathBuf,

    /// Milliseconds between snapshot polls
    #[arg(long, env = "POLL_MS", default_value = "1000")]
    pub poll_ms: u64,

    /// Milliseconds to let the board settle after a turn change
    #[arg(long, env = "SETTLE_MS", default_value = "750")]
    pub settle_ms: u64,
}

impl AssistantArgs {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_ms.max(50))
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }
}
