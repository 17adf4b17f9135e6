use chrono::{DateTime, Utc};

use crate::moves::Move;
use crate::page::Element;
use crate::reader::find_board;

#[derive(Clone, Debug, PartialEq)]
pub struct Suggestion {
    /// Engine reply as received.
    pub raw: String,
    pub parsed: Option<Move>,
    /// Position string the suggestion was requested for.
    pub position: String,
    pub suggested_at: DateTime<Utc>,
}

impl Suggestion {
    pub fn new(raw: &str, position: &str) -> Self {
        Self {
            raw: raw.trim().to_string(),
            parsed: Move::parse(raw),
            position: position.to_string(),
            suggested_at: Utc::now(),
        }
    }
}

/// State that survives between cycles of one assistant.
#[derive(Clone, Debug)]
pub struct Session {
    pub last_suggestion: Option<Suggestion>,
    pub learning_mode: bool,
    pub explanation: Option<String>,
    /// Board container seen at the last (re)initialization.
    pub cached_board: Option<Element>,
    /// True until the first turn change has been handled.
    pub opening: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            last_suggestion: None,
            learning_mode: false,
            explanation: None,
            cached_board: None,
            opening: true,
        }
    }

    /// Refreshes cached page references after a layout change (resize, flip).
    ///
    /// The suggestion and learning mode are kept so the caller can redraw;
    /// the returned move is the one to redraw, if any.
    pub fn reinitialize(&mut self, page: Option<&Element>) -> Option<Move> {
        self.cached_board = find_board(page, None).cloned();
        self.last_suggestion.as_ref().and_then(|s| s.parsed)
    }

    pub fn record(&mut self, suggestion: Suggestion) {
        if let Some(previous) = &self.last_suggestion {
            let age = suggestion.suggested_at - previous.suggested_at;
            log::debug!("Replacing suggestion {} made {}ms earlier", previous.raw, age.num_milliseconds());
        }
        self.last_suggestion = Some(suggestion);
    }

    /// Whether a suggestion for `position` was already made.
    pub fn already_suggested(&self, position: &str) -> bool {
        self.last_suggestion
            .as_ref()
            .map_or(false, |s| s.position == position)
    }

    pub fn toggle_learning_mode(&mut self) -> bool {
        self.learning_mode = !self.learning_mode;
        self.learning_mode
    }

    /// Returns whether this was still the opening, and ends it.
    pub fn end_opening(&mut self) -> bool {
        std::mem::replace(&mut self.opening, false)
    }
}
