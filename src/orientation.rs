//! Which colour the local viewer plays.
//!
//! The page never states the orientation directly. It either carries an
//! explicit `flipped` marker on the board container, or it has to be inferred
//! from which colour occupies the two rows nearest the viewer. Neither signal
//! is reliable alone: the marker can be missing before the first flip, and the
//! piece distribution is ambiguous in some endgames and puzzles. The decision
//! is therefore an ordered rule list where the first rule with an opinion wins.

use crate::board::Side;
use crate::page::Element;
use crate::reader::{square_digits, PIECE};

pub const FLIPPED_CLASS: &str = "flipped";

const WHITE_CODES: [&str; 6] = ["wp", "wr", "wn", "wb", "wq", "wk"];
const BLACK_CODES: [&str; 6] = ["bp", "br", "bn", "bb", "bq", "bk"];

/// Everything the rules look at, gathered from one board container.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Evidence {
    pub flipped: bool,
    pub white_markers: usize,
    pub black_markers: usize,
    /// Markers on ranks 1-2, the rows nearest the viewer when unflipped.
    pub white_near: usize,
    pub black_near: usize,
}

impl Evidence {
    pub fn gather(container: &Element) -> Self {
        let mut evidence = Evidence {
            flipped: container.has_class(FLIPPED_CLASS),
            ..Evidence::default()
        };

        for marker in container.find_all(&PIECE) {
            let Some(class) = marker.class.as_deref() else {
                continue;
            };
            let near = is_near_rank(class);
            if WHITE_CODES.iter().any(|code| class.contains(code)) {
                evidence.white_markers += 1;
                if near {
                    evidence.white_near += 1;
                }
            }
            if BLACK_CODES.iter().any(|code| class.contains(code)) {
                evidence.black_markers += 1;
                if near {
                    evidence.black_near += 1;
                }
            }
        }

        evidence
    }
}

fn is_near_rank(class: &str) -> bool {
    square_digits(class).any(|(file, rank)| ('1'..='8').contains(&file) && (rank == '1' || rank == '2'))
}

pub type Rule = fn(&Evidence) -> Option<Side>;

/// Decision order; the first rule returning `Some` decides.
pub const RULES: [(&str, Rule); 3] = [
    ("flipped-marker", flipped_marker),
    ("empty-board", empty_board),
    ("near-rank-majority", near_rank_majority),
];

pub fn flipped_marker(evidence: &Evidence) -> Option<Side> {
    evidence.flipped.then_some(Side::Black)
}

pub fn empty_board(evidence: &Evidence) -> Option<Side> {
    (evidence.white_markers == 0 && evidence.black_markers == 0).then_some(Side::White)
}

/// Ties go to White.
pub fn near_rank_majority(evidence: &Evidence) -> Option<Side> {
    if evidence.black_near > evidence.white_near {
        Some(Side::Black)
    } else {
        Some(Side::White)
    }
}

pub fn decide(evidence: &Evidence) -> Side {
    for (name, rule) in RULES.iter() {
        if let Some(side) = rule(evidence) {
            log::debug!("Side {} decided by {} ({:?})", side.name(), name, evidence);
            return side;
        }
    }
    Side::White
}

/// Side of the local viewer; White when there is no board at all.
pub fn detect_side(container: Option<&Element>) -> Side {
    container.map_or(Side::White, |board| decide(&Evidence::gather(board)))
}

pub fn is_board_flipped(container: Option<&Element>) -> bool {
    detect_side(container) == Side::Black
}
