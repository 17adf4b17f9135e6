use std::fmt;
use std::str::FromStr;
use chess::ChessMove;

use crate::board::{PieceKind, Square};
use crate::error::NotationError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceKind>,
}

impl Move {
    /// Parses a coordinate move such as `e2e4` or `e7e8q`.
    ///
    /// Whitespace anywhere in the input is dropped first. Returns `None` on
    /// anything shorter than four characters or with a file outside a..h or a
    /// rank outside 1..8. A fifth character other than `q`, `r`, `b` or `n` is
    /// ignored rather than rejected.
    pub fn parse(move_str: &str) -> Option<Move> {
        let chars: Vec<char> = move_str.chars().filter(|c| !c.is_whitespace()).collect();
        if chars.len() < 4 {
            return None;
        }

        let from = Square::from_chars(chars[0], chars[1])?;
        let to = Square::from_chars(chars[2], chars[3])?;

        let promotion = chars
            .get(4)
            .and_then(|&c| match c.to_ascii_lowercase() {
                'q' | 'r' | 'b' | 'n' => PieceKind::from_char(c),
                _ => None,
            });

        Some(Move { from, to, promotion })
    }

    /// `"e2 to e4"`, always in absolute algebraic terms.
    pub fn speech_form(&self) -> String {
        format!("{} to {}", self.from, self.to)
    }

    pub fn to_chess_move(&self) -> ChessMove {
        ChessMove::new(
            self.from.to_chess_square(),
            self.to.to_chess_square(),
            self.promotion.map(PieceKind::to_chess_piece),
        )
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(kind) = self.promotion {
            write!(f, "{}", kind.to_char())?;
        }
        Ok(())
    }
}

impl FromStr for Move {
    type Err = NotationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Move::parse(s).ok_or_else(|| NotationError::BadMove(s.to_string()))
    }
}

/// What gets spoken for a raw engine reply: the speech form when it parses,
/// the trimmed raw text otherwise.
pub fn speech_text(raw: &str) -> String {
    match Move::parse(raw) {
        Some(mv) => mv.speech_form(),
        None => raw.trim().to_string(),
    }
}
