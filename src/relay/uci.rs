//! Local engine backend speaking the line-oriented UCI protocol.
//!
//! Every request spawns its own engine process, so concurrent requests never
//! share engine state. The process is killed when the session is dropped,
//! which also covers requests abandoned on timeout.

use std::mem;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use crate::board::Side;
use crate::error::RelayError;
use crate::notation::side_to_move;
use crate::relay::upstream::{checked_move, Upstream};
use crate::wire::Analysis;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Score {
    Centipawns(i32),
    Mate(i32),
}

impl Score {
    /// The engine reports from the side to move; flip to White's view.
    pub fn for_white(self, side: Side) -> Self {
        match (self, side) {
            (score, Side::White) => score,
            (Score::Centipawns(cp), Side::Black) => Score::Centipawns(-cp),
            (Score::Mate(n), Side::Black) => Score::Mate(-n),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SearchOutcome {
    pub best_move: String,
    pub score: Option<Score>,
    pub pv: Vec<String>,
}

impl SearchOutcome {
    pub fn to_analysis(&self, side: Side) -> Analysis {
        let score = self.score.map(|s| s.for_white(side));
        Analysis {
            evaluation: match score {
                Some(Score::Centipawns(cp)) => Some(cp as f64 / 100.0),
                _ => None,
            },
            best_move: checked_move(&self.best_move).ok(),
            continuation: (!self.pv.is_empty()).then(|| self.pv.join(" ")),
            mate: match score {
                Some(Score::Mate(n)) => Some(n),
                _ => None,
            },
        }
    }
}

/// Move from a `bestmove <move> [ponder <move>]` line.
pub fn parse_bestmove(line: &str) -> Option<&str> {
    let mut parts = line.split_whitespace();
    if parts.next()? != "bestmove" {
        return None;
    }
    parts.next()
}

/// Accumulates `info` lines until the terminating `bestmove`.
#[derive(Debug, Default)]
pub struct SearchCollector {
    score: Option<Score>,
    pv: Vec<String>,
}

impl SearchCollector {
    pub fn feed(&mut self, line: &str) -> Option<SearchOutcome> {
        let line = line.trim();

        if let Some(best_move) = parse_bestmove(line) {
            return Some(SearchOutcome {
                best_move: best_move.to_string(),
                score: self.score,
                pv: mem::take(&mut self.pv),
            });
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.first() != Some(&"info") || parts.get(1) == Some(&"string") {
            return None;
        }

        let mut i = 1;
        while i < parts.len() {
            match parts[i] {
                "multipv" => {
                    // Only the principal line is reported
                    if parts.get(i + 1).map_or(false, |n| *n != "1") {
                        return None;
                    }
                    i += 2;
                }
                "score" => {
                    let value = parts.get(i + 2).and_then(|v| v.parse::<i32>().ok());
                    match (parts.get(i + 1), value) {
                        (Some(&"cp"), Some(cp)) => self.score = Some(Score::Centipawns(cp)),
                        (Some(&"mate"), Some(n)) => self.score = Some(Score::Mate(n)),
                        _ => {}
                    }
                    i += 3;
                }
                "pv" => {
                    self.pv = parts[i + 1..].iter().map(|m| m.to_string()).collect();
                    break;
                }
                _ => i += 1,
            }
        }

        None
    }
}

#[derive(Clone, Debug)]
pub struct EngineProcess {
    path: PathBuf,
}

impl EngineProcess {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    async fn start(&self) -> Result<UciSession, RelayError> {
        let mut child = Command::new(&self.path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| RelayError::Upstream("engine stdin unavailable".into()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| RelayError::Upstream("engine stdout unavailable".into()))?;

        let mut session = UciSession {
            _child: child,
            stdin,
            lines: BufReader::new(stdout).lines(),
        };
        session.send("uci").await?;
        session.wait_for("uciok").await?;
        session.send("isready").await?;
        session.wait_for("readyok").await?;
        Ok(session)
    }

    async fn search(&self, fen: &str, depth: u8) -> Result<SearchOutcome, RelayError> {
        let mut session = self.start().await?;
        let outcome = session.search(fen, depth).await?;
        session.send("quit").await.ok();
        log::debug!("Engine answered {} for {}", outcome.best_move, fen);
        Ok(outcome)
    }
}

struct UciSession {
    _child: Child,
    stdin: ChildStdin,
    lines: Lines<BufReader<ChildStdout>>,
}

impl UciSession {
    async fn send(&mut self, command: &str) -> Result<(), RelayError> {
        self.stdin.write_all(command.as_bytes()).await?;
        self.stdin.write_all(b"\n").await?;
        self.stdin.flush().await?;
        Ok(())
    }

    async fn next_line(&mut self) -> Result<String, RelayError> {
        self.lines
            .next_line()
            .await?
            .ok_or_else(|| RelayError::Upstream("engine closed its output".into()))
    }

    async fn wait_for(&mut self, prefix: &str) -> Result<(), RelayError> {
        loop {
            if self.next_line().await?.trim().starts_with(prefix) {
                return Ok(());
            }
        }
    }

    async fn search(&mut self, fen: &str, depth: u8) -> Result<SearchOutcome, RelayError> {
        self.send(&format!("position fen {}", fen)).await?;
        self.send(&format!("go depth {}", depth)).await?;

        let mut collector = SearchCollector::default();
        loop {
            let line = self.next_line().await?;
            if let Some(outcome) = collector.feed(&line) {
                return Ok(outcome);
            }
        }
    }
}

#[async_trait]
impl Upstream for EngineProcess {
    fn name(&self) -> String {
        format!("engine({})", self.path.display())
    }

    async fn best_move(&self, fen: &str, depth: u8) -> Result<String, RelayError> {
        let outcome = self.search(fen, depth).await?;
        checked_move(&outcome.best_move)
    }

    async fn analyze(&self, fen: &str, depth: u8) -> Result<Analysis, RelayError> {
        let outcome = self.search(fen, depth).await?;
        Ok(outcome.to_analysis(side_to_move(fen)))
    }
}
