//! JSON bodies exchanged between the assistant and the relay.

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PositionRequest {
    pub fen_string: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth: Option<u8>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExplainRequest {
    pub fen_string: String,
    #[serde(rename = "move")]
    pub move_str: String,
}

/// Engine analysis; every field is absent when the backend does not supply it.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    /// Pawns, from White's point of view.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub best_move: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continuation: Option<String>,
    /// Moves to mate; negative when Black mates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mate: Option<i32>,
}

impl Analysis {
    /// Multi-line text shown in the explanation box.
    pub fn summary(&self) -> String {
        let mut text = String::from("Position Analysis:\n");

        if let Some(evaluation) = self.evaluation {
            let leaning = if evaluation > 0.0 {
                "favoring White"
            } else if evaluation < 0.0 {
                "favoring Black"
            } else {
                "equal"
            };
            text.push_str(&format!("Evaluation: {:.2} ({})\n", evaluation, leaning));
        }
        if let Some(best_move) = &self.best_move {
            text.push_str(&format!("Best move: {}\n", best_move));
        }
        if let Some(continuation) = &self.continuation {
            text.push_str(&format!("Best continuation: {}\n", continuation));
        }
        if let Some(mate) = self.mate {
            text.push_str(&format!("Checkmate in: {} moves\n", mate));
        }

        text
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Explanation {
    #[serde(rename = "move")]
    pub move_str: String,
    pub explanation: String,
}
