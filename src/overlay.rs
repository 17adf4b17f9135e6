use std::fs;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};

use crate::board::Square;
use crate::error::AssistError;
use crate::moves::Move;

pub const FROM_COLOR: &str = "rgb(255, 255, 51)";
pub const TO_COLOR: &str = "rgb(0, 255, 0)";
pub const HIGHLIGHT_OPACITY: f32 = 0.5;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Highlight {
    /// Board markup square code, e.g. `52` for e2.
    pub square: String,
    pub color: String,
    pub opacity: f32,
}

impl Highlight {
    fn new(square: Square, color: &str) -> Self {
        Self {
            square: square.square_code(),
            color: color.to_string(),
            opacity: HIGHLIGHT_OPACITY,
        }
    }
}

/// What the page script should currently show.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct OverlayDocument {
    pub highlights: Vec<Highlight>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    /// Last utterance; the page script hands it to speech synthesis.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spoken: Option<String>,
}

/// Highlight renderer and speech output.
pub trait Overlay: Send {
    /// Replaces any previous highlight with the move's two squares.
    fn highlight(&mut self, mv: &Move) -> Result<(), AssistError>;
    fn clear(&mut self) -> Result<(), AssistError>;
    fn show_explanation(&mut self, text: &str) -> Result<(), AssistError>;
    fn hide_explanation(&mut self) -> Result<(), AssistError>;
    fn speak(&mut self, text: &str) -> Result<(), AssistError>;
}

impl OverlayDocument {
    pub fn highlight(&mut self, mv: &Move) {
        self.highlights = vec![
            Highlight::new(mv.from, FROM_COLOR),
            Highlight::new(mv.to, TO_COLOR),
        ];
    }
}

/// Keeps the overlay document on disk for the page script to pick up.
pub struct OverlayFile {
    path: PathBuf,
    document: OverlayDocument,
}

impl OverlayFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            document: OverlayDocument::default(),
        }
    }

    pub fn document(&self) -> &OverlayDocument {
        &self.document
    }

    fn flush(&self) -> Result<(), AssistError> {
        let json = serde_json::to_string_pretty(&self.document)?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

impl Overlay for OverlayFile {
    fn highlight(&mut self, mv: &Move) -> Result<(), AssistError> {
        self.document.highlight(mv);
        log::info!("Highlighting square-{} and square-{}", mv.from.square_code(), mv.to.square_code());
        self.flush()
    }

    fn clear(&mut self) -> Result<(), AssistError> {
        self.document.highlights.clear();
        self.flush()
    }

    fn show_explanation(&mut self, text: &str) -> Result<(), AssistError> {
        self.document.explanation = Some(text.to_string());
        self.flush()
    }

    fn hide_explanation(&mut self) -> Result<(), AssistError> {
        self.document.explanation = None;
        self.flush()
    }

    fn speak(&mut self, text: &str) -> Result<(), AssistError> {
        log::info!("Speaking: {}", text);
        self.document.spoken = Some(text.to_string());
        self.flush()
    }
}
