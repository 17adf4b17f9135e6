use std::fmt;
use serde::{Deserialize, Serialize};

pub const FILES: &str = "abcdefgh";

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    White,
    Black,
}

impl Side {
    pub fn letter(self) -> char {
        match self {
            Side::White => 'w',
            Side::Black => 'b',
        }
    }

    pub fn from_letter(letter: char) -> Option<Self> {
        match letter.to_ascii_lowercase() {
            'w' => Some(Side::White),
            'b' => Some(Side::Black),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Side::White => "White",
            Side::Black => "Black",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PieceKind {
    King,
    Queen,
    Rook,
    Bishop,
    Knight,
    Pawn,
}

impl PieceKind {
    pub fn from_char(c: char) -> Option<Self> {
        match c.to_ascii_lowercase() {
            'k' => Some(PieceKind::King),
            'q' => Some(PieceKind::Queen),
            'r' => Some(PieceKind::Rook),
            'b' => Some(PieceKind::Bishop),
            'n' => Some(PieceKind::Knight),
            'p' => Some(PieceKind::Pawn),
            _ => None,
        }
    }

    /// Lowercase letter, as used in coordinate moves and black's notation.
    pub fn to_char(self) -> char {
        match self {
            PieceKind::King => 'k',
            PieceKind::Queen => 'q',
            PieceKind::Rook => 'r',
            PieceKind::Bishop => 'b',
            PieceKind::Knight => 'n',
            PieceKind::Pawn => 'p',
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PieceKind::King => "king",
            PieceKind::Queen => "queen",
            PieceKind::Rook => "rook",
            PieceKind::Bishop => "bishop",
            PieceKind::Knight => "knight",
            PieceKind::Pawn => "pawn",
        }
    }

    pub fn to_chess_piece(self) -> chess::Piece {
        match self {
            PieceKind::King => chess::Piece::King,
            PieceKind::Queen => chess::Piece::Queen,
            PieceKind::Rook => chess::Piece::Rook,
            PieceKind::Bishop => chess::Piece::Bishop,
            PieceKind::Knight => chess::Piece::Knight,
            PieceKind::Pawn => chess::Piece::Pawn,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Piece {
    pub side: Side,
    pub kind: PieceKind,
}

impl Piece {
    pub fn new(side: Side, kind: PieceKind) -> Self {
        Self { side, kind }
    }

    /// Uppercase letters are white, lowercase black.
    pub fn from_letter(letter: char) -> Option<Self> {
        let kind = PieceKind::from_char(letter)?;
        let side = if letter.is_ascii_uppercase() { Side::White } else { Side::Black };
        Some(Self { side, kind })
    }

    /// Builds a piece from a colour code (`w`/`b`) and a type code (`kqrbnp`).
    pub fn from_code(color: char, kind: char) -> Option<Self> {
        Some(Self {
            side: Side::from_letter(color)?,
            kind: PieceKind::from_char(kind)?,
        })
    }

    pub fn letter(self) -> char {
        match self.side {
            Side::White => self.kind.to_char().to_ascii_uppercase(),
            Side::Black => self.kind.to_char(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Square {
    file: u8,
    rank: u8,
}

impl Square {
    /// Zero-based file and rank; `None` outside the 8x8 board.
    pub fn new(file: u8, rank: u8) -> Option<Self> {
        if file < 8 && rank < 8 {
            Some(Self { file, rank })
        } else {
            None
        }
    }

    /// `file_char` in a..h (any case), `rank_char` in 1..8.
    pub fn from_chars(file_char: char, rank_char: char) -> Option<Self> {
        let file = FILES.find(file_char.to_ascii_lowercase())?;
        let rank = rank_char.to_digit(10)?;
        if !(1..=8).contains(&rank) {
            return None;
        }
        Self::new(file as u8, (rank - 1) as u8)
    }

    pub fn file(self) -> u8 {
        self.file
    }

    pub fn rank(self) -> u8 {
        self.rank
    }

    pub fn file_char(self) -> char {
        (b'a' + self.file) as char
    }

    /// The two-digit `square-FR` code the board markup uses, e.g. `52` for e2.
    pub fn square_code(self) -> String {
        format!("{}{}", self.file + 1, self.rank + 1)
    }

    pub fn to_chess_square(self) -> chess::Square {
        chess::Square::make_square(
            chess::Rank::from_index(self.rank as usize),
            chess::File::from_index(self.file as usize),
        )
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file_char(), self.rank + 1)
    }
}

/// 8x8 piece layout indexed `[rank][file]`, rank 0 being White's first rank.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Grid {
    cells: [[Option<Piece>; 8]; 8],
}

impl Grid {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn initial() -> Self {
        let mut grid = Self::empty();
        let back_rank = "rnbqkbnr";
        for (file, letter) in back_rank.chars().enumerate() {
            grid.cells[0][file] = Piece::from_letter(letter.to_ascii_uppercase());
            grid.cells[1][file] = Some(Piece::new(Side::White, PieceKind::Pawn));
            grid.cells[6][file] = Some(Piece::new(Side::Black, PieceKind::Pawn));
            grid.cells[7][file] = Piece::from_letter(letter);
        }
        grid
    }

    pub fn get(&self, square: Square) -> Option<Piece> {
        self.cells[square.rank() as usize][square.file() as usize]
    }

    /// Overwrites whatever occupied the square.
    pub fn set(&mut self, square: Square, piece: Option<Piece>) {
        self.cells[square.rank() as usize][square.file() as usize] = piece;
    }

    pub fn rank(&self, rank: u8) -> &[Option<Piece>; 8] {
        &self.cells[rank as usize]
    }

    pub fn is_empty(&self) -> bool {
        self.cells.iter().flatten().all(Option::is_none)
    }

    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        self.cells.iter().enumerate().flat_map(|(rank, row)| {
            row.iter().enumerate().filter_map(move |(file, cell)| {
                let square = Square::new(file as u8, rank as u8)?;
                cell.map(|piece| (square, piece))
            })
        })
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for rank in (0..8).rev() {
            let row: String = self.cells[rank]
                .iter()
                .map(|cell| cell.map_or('.', Piece::letter))
                .collect();
            writeln!(f, "{} {}", rank + 1, row)?;
        }
        write!(f, "  {}", FILES)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_square_bounds() {
        assert!(Square::new(7, 7).is_some());
        assert!(Square::new(8, 0).is_none());
        assert!(Square::new(0, 8).is_none());
    }

    #[test]
    fn test_square_from_chars() {
        let e2 = Square::from_chars('E', '2').unwrap();
        assert_eq!((e2.file(), e2.rank()), (4, 1));
        assert_eq!(e2.to_string(), "e2");
        assert_eq!(e2.square_code(), "52");
        assert!(Square::from_chars('i', '2').is_none());
        assert!(Square::from_chars('a', '9').is_none());
        assert!(Square::from_chars('a', '0').is_none());
    }

    #[test]
    fn test_piece_letters() {
        let white_knight = Piece::from_letter('N').unwrap();
        assert_eq!(white_knight, Piece::new(Side::White, PieceKind::Knight));
        assert_eq!(white_knight.letter(), 'N');
        assert_eq!(Piece::from_code('b', 'q').unwrap().letter(), 'q');
        assert!(Piece::from_code('x', 'q').is_none());
        assert!(Piece::from_letter('z').is_none());
    }

    #[test]
    fn test_initial_grid() {
        let grid = Grid::initial();
        assert_eq!(grid.pieces().count(), 32);
        let e1 = Square::new(4, 0).unwrap();
        assert_eq!(grid.get(e1).map(Piece::letter), Some('K'));
        let d8 = Square::new(3, 7).unwrap();
        assert_eq!(grid.get(d8).map(Piece::letter), Some('q'));
    }

    #[test]
    fn test_set_overwrites() {
        let mut grid = Grid::empty();
        let a1 = Square::new(0, 0).unwrap();
        grid.set(a1, Piece::from_letter('R'));
        grid.set(a1, Piece::from_letter('q'));
        assert_eq!(grid.get(a1).map(Piece::letter), Some('q'));
        assert_eq!(grid.pieces().count(), 1);
    }
}
