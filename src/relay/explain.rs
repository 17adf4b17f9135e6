//! Templated move explanations.
//!
//! The text is built from what the board shows about the move (piece, capture,
//! castling, promotion, check, centre). It says nothing about why an engine
//! preferred the move.

use std::str::FromStr;
use chess::{Board as ChessBoard, Piece};

use crate::board::PieceKind;
use crate::moves::Move;

pub const GENERIC: &str = "This move helps improve your position.";

pub fn explain(fen: &str, move_str: &str) -> String {
    let Some(mv) = Move::parse(move_str) else {
        return GENERIC.to_string();
    };

    match load_board(fen) {
        Some(board) => describe(&board, &mv),
        None => format!("{} is the suggested move. {}", mv.speech_form(), GENERIC),
    }
}

/// Blanket castling rights from position completion can make an otherwise
/// valid position unloadable, so retry once without them.
fn load_board(fen: &str) -> Option<ChessBoard> {
    ChessBoard::from_str(fen).ok().or_else(|| {
        let mut fields: Vec<&str> = fen.split_whitespace().collect();
        if fields.len() < 3 {
            return None;
        }
        fields[2] = "-";
        ChessBoard::from_str(&fields.join(" ")).ok()
    })
}

fn piece_name(piece: Piece) -> &'static str {
    match piece {
        Piece::Pawn => "pawn",
        Piece::Knight => "knight",
        Piece::Bishop => "bishop",
        Piece::Rook => "rook",
        Piece::Queen => "queen",
        Piece::King => "king",
    }
}

fn describe(board: &ChessBoard, mv: &Move) -> String {
    let from = mv.from.to_chess_square();
    let to = mv.to.to_chess_square();

    let Some(piece) = board.piece_on(from) else {
        return format!("{} is the suggested move. {}", mv.speech_form(), GENERIC);
    };

    if piece == Piece::King && (mv.from.file() as i8 - mv.to.file() as i8).abs() == 2 {
        let wing = if mv.to.file() > mv.from.file() { "kingside" } else { "queenside" };
        return format!(
            "Castling {} ({}) tucks the king away and brings a rook toward the centre.",
            wing,
            mv.speech_form()
        );
    }

    let mut clauses = Vec::new();

    if let Some(captured) = board.piece_on(to) {
        clauses.push(format!("capturing the {}", piece_name(captured)));
    } else if piece == Piece::Pawn && mv.from.file() != mv.to.file() {
        clauses.push("capturing en passant".to_string());
    }

    if let Some(kind) = mv.promotion {
        clauses.push(format!("promoting to a {}", kind.name()));
    } else if piece == Piece::Pawn && (mv.to.rank() == 0 || mv.to.rank() == 7) {
        clauses.push(format!("promoting to a {}", PieceKind::Queen.name()));
    }

    let chess_move = mv.to_chess_move();
    if board.legal(chess_move) && board.make_move_new(chess_move).checkers().popcnt() > 0 {
        clauses.push("giving check".to_string());
    }

    let home_rank = if board.side_to_move() == chess::Color::White { 0 } else { 7 };
    if matches!(piece, Piece::Knight | Piece::Bishop) && mv.from.rank() == home_rank {
        clauses.push("developing a minor piece".to_string());
    }

    if (3..=4).contains(&mv.to.file()) && (3..=4).contains(&mv.to.rank()) {
        clauses.push("fighting for the centre".to_string());
    }

    if clauses.is_empty() {
        clauses.push("improving its placement".to_string());
    }

    format!(
        "The {} on {} moves to {}, {}.",
        piece_name(piece),
        mv.from,
        mv.to,
        clauses.join(" and ")
    )
}
