use crate::board::{Grid, Piece, Side, Square};
use crate::error::NotationError;

/// Fields appended, in order, after the board field of an incomplete FEN.
const DEFAULT_FIELDS: [&str; 5] = ["w", "KQkq", "-", "0", "1"];

/// Serializes a grid and side to move as `<ranks> <side>`.
pub fn encode(grid: &Grid, side: Side) -> String {
    let mut ranks = Vec::with_capacity(8);

    for rank in (0..8).rev() {
        let mut segment = String::new();
        let mut empty = 0;
        for cell in grid.rank(rank) {
            match cell {
                Some(piece) => {
                    if empty > 0 {
                        segment.push_str(&empty.to_string());
                        empty = 0;
                    }
                    segment.push(piece.letter());
                }
                None => empty += 1,
            }
        }
        if empty > 0 {
            segment.push_str(&empty.to_string());
        }
        ranks.push(segment);
    }

    format!("{} {}", ranks.join("/"), side.letter())
}

/// Inverse of [`encode`]. Fields after the side to move are ignored.
pub fn decode(position: &str) -> Result<(Grid, Side), NotationError> {
    let mut fields = position.split_whitespace();
    let board = fields.next().ok_or(NotationError::Empty)?;

    let segments: Vec<&str> = board.split('/').collect();
    if segments.len() != 8 {
        return Err(NotationError::RankCount(segments.len()));
    }

    let mut grid = Grid::empty();
    for (index, segment) in segments.iter().enumerate() {
        let rank = 7 - index as u8;
        let mut file = 0usize;
        for c in segment.chars() {
            if let Some(run) = c.to_digit(10) {
                if run == 0 || run > 8 {
                    return Err(NotationError::BadPiece(c));
                }
                file += run as usize;
            } else {
                let piece = Piece::from_letter(c).ok_or(NotationError::BadPiece(c))?;
                if let Some(square) = Square::new(file as u8, rank) {
                    grid.set(square, Some(piece));
                }
                file += 1;
            }
        }
        if file != 8 {
            return Err(NotationError::RankLength { rank: rank + 1, squares: file });
        }
    }

    let side_field = fields.next().ok_or(NotationError::MissingSide)?;
    let side = match side_field {
        "w" => Side::White,
        "b" => Side::Black,
        other => return Err(NotationError::BadSide(other.to_string())),
    };

    Ok((grid, side))
}

/// Pads a position string with default castling, en-passant and move counters.
///
/// This is a best-effort normalization for engines that insist on six fields;
/// it performs no legality check.
pub fn complete(position: &str) -> String {
    let mut fields: Vec<&str> = position.split_whitespace().collect();
    if fields.is_empty() || fields.len() >= 6 {
        return fields.join(" ");
    }
    fields.extend_from_slice(&DEFAULT_FIELDS[fields.len() - 1..]);
    fields.join(" ")
}

/// Side to move of a (possibly incomplete) position string, White when absent.
pub fn side_to_move(position: &str) -> Side {
    position
        .split_whitespace()
        .nth(1)
        .and_then(|field| field.chars().next())
        .and_then(Side::from_letter)
        .unwrap_or(Side::White)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::PieceKind;
    use pretty_assertions::assert_eq;

    const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w";

    #[test]
    fn test_encode_initial_position() {
        assert_eq!(encode(&Grid::initial(), Side::White), START);
    }

    #[test]
    fn test_encode_empty_board() {
        assert_eq!(encode(&Grid::empty(), Side::Black), "8/8/8/8/8/8/8/8 b");
    }

    #[test]
    fn test_encode_runs_between_pieces() {
        let mut grid = Grid::empty();
        grid.set(Square::new(4, 3).unwrap(), Some(Piece::new(Side::White, PieceKind::Pawn)));
        grid.set(Square::new(0, 7).unwrap(), Some(Piece::new(Side::Black, PieceKind::King)));
        grid.set(Square::new(7, 7).unwrap(), Some(Piece::new(Side::Black, PieceKind::Rook)));
        assert_eq!(encode(&grid, Side::Black), "k6r/8/8/8/4P3/8/8/8 b");
    }

    #[test]
    fn test_decode_round_trip() {
        let positions = [
            START,
            "r1bqkb1r/pppp1ppp/2n2n2/4p3/2B1P3/5N2/PPPP1PPP/RNBQK2R b",
            "8/8/8/8/8/8/8/8 w",
            "4k3/8/8/8/8/8/8/R3K2R w",
        ];
        for position in positions {
            let (grid, side) = decode(position).unwrap();
            assert_eq!(encode(&grid, side), position);
            assert_eq!(decode(&encode(&grid, side)).unwrap(), (grid, side));
        }
    }

    const KINDS: [PieceKind; 6] = [
        PieceKind::King,
        PieceKind::Queen,
        PieceKind::Rook,
        PieceKind::Bishop,
        PieceKind::Knight,
        PieceKind::Pawn,
    ];

    fn all_pieces() -> Vec<Piece> {
        [Side::White, Side::Black]
            .iter()
            .flat_map(|&side| KINDS.iter().map(move |&kind| Piece::new(side, kind)))
            .collect()
    }

    fn assert_round_trip(grid: &Grid) {
        for side in [Side::White, Side::Black] {
            assert_eq!(decode(&encode(grid, side)).unwrap(), (*grid, side));
        }
    }

    #[test]
    fn test_round_trip_every_single_piece() {
        for piece in all_pieces() {
            for rank in 0..8 {
                for file in 0..8 {
                    let mut grid = Grid::empty();
                    grid.set(Square::new(file, rank).unwrap(), Some(piece));
                    assert_round_trip(&grid);
                }
            }
        }
    }

    #[test]
    fn test_round_trip_dense_grids() {
        let pieces = all_pieces();
        // Fixed linear congruential sequence so failures reproduce
        let mut state: u32 = 0x2545_f491;
        for density in [2u32, 3, 4, 8] {
            for _ in 0..25 {
                let mut grid = Grid::empty();
                for rank in 0..8 {
                    for file in 0..8 {
                        state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                        let roll = state >> 8;
                        if roll % density != 0 {
                            let piece = pieces[(roll / density) as usize % pieces.len()];
                            grid.set(Square::new(file, rank).unwrap(), Some(piece));
                        }
                    }
                }
                assert_round_trip(&grid);
            }
        }

        let mut full = Grid::empty();
        for (index, square) in (0..64u8).filter_map(|i| Square::new(i % 8, i / 8)).enumerate() {
            full.set(square, Some(pieces[index % pieces.len()]));
        }
        assert!(!encode(&full, Side::White).chars().any(|c| c.is_ascii_digit()));
        assert_round_trip(&full);
    }

    #[test]
    fn test_decode_ignores_trailing_fields() {
        let (grid, side) = decode(&format!("{} KQkq - 0 1", START)).unwrap();
        assert_eq!(grid, Grid::initial());
        assert_eq!(side, Side::White);
    }

    #[test]
    fn test_decode_errors() {
        assert_eq!(decode(""), Err(NotationError::Empty));
        assert_eq!(decode("8/8/8 w"), Err(NotationError::RankCount(3)));
        assert_eq!(
            decode("7/8/8/8/8/8/8/8 w"),
            Err(NotationError::RankLength { rank: 8, squares: 7 })
        );
        assert_eq!(decode("x7/8/8/8/8/8/8/8 w"), Err(NotationError::BadPiece('x')));
        assert_eq!(decode("8/8/8/8/8/8/8/8"), Err(NotationError::MissingSide));
        assert_eq!(
            decode("8/8/8/8/8/8/8/8 white"),
            Err(NotationError::BadSide("white".into()))
        );
    }

    #[test]
    fn test_complete_two_fields() {
        assert_eq!(complete(START), format!("{} KQkq - 0 1", START));
    }

    #[test]
    fn test_complete_other_lengths() {
        let board = "8/8/8/8/8/8/8/8";
        assert_eq!(complete(board), format!("{} w KQkq - 0 1", board));
        assert_eq!(complete(&format!("{} b -", board)), format!("{} b - - 0 1", board));
        let full = format!("{} b - - 3 40", board);
        assert_eq!(complete(&full), full);
        assert_eq!(complete("   "), "");
    }

    #[test]
    fn test_side_to_move() {
        assert_eq!(side_to_move(START), Side::White);
        assert_eq!(side_to_move("8/8/8/8/8/8/8/8 b KQkq - 0 1"), Side::Black);
        assert_eq!(side_to_move("8/8/8/8/8/8/8/8"), Side::White);
    }
}
