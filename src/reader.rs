use crate::board::{Grid, Piece, Square};
use crate::page::{Element, Selector};

/// Board container selectors, tried in priority order.
pub const BOARD_SELECTORS: [Selector; 3] = [
    Selector::Tag("wc-chess-board"),
    Selector::Class("board-layout-chessboard"),
    Selector::Class("board"),
];

pub const PIECE: Selector = Selector::Class("piece");
pub const CLOCK: Selector = Selector::Class("clock-bottom");
pub const PLAYER_TURN_CLASS: &str = "clock-player-turn";

const SQUARE_PREFIX: &str = "square-";

/// Locates the board container, falling back to a previously cached one.
pub fn find_board<'a>(page: Option<&'a Element>, cached: Option<&'a Element>) -> Option<&'a Element> {
    let found = page.and_then(|page| {
        BOARD_SELECTORS.iter().find_map(|selector| {
            let board = page.find(selector)?;
            log::trace!("Board container matched {}", selector);
            Some(board)
        })
    });
    found.or(cached)
}

/// Reads the piece layout. A missing container gives an empty grid.
pub fn read_board(page: Option<&Element>, cached: Option<&Element>) -> Grid {
    match find_board(page, cached) {
        Some(container) => read_container(container),
        None => {
            log::debug!("Board container not found; reading an empty grid");
            Grid::empty()
        }
    }
}

/// Builds a fresh grid from the piece markers inside `container`.
///
/// Markers with no class attribute, no piece code or no valid square code are
/// skipped. Duplicate markers for one square: the last one wins.
pub fn read_container(container: &Element) -> Grid {
    let mut grid = Grid::empty();
    let mut skipped = 0;

    for marker in container.find_all(&PIECE) {
        let Some(class) = marker.class.as_deref() else {
            skipped += 1;
            continue;
        };
        match (piece_code(class), square_code(class)) {
            (Some(piece), Some(square)) => grid.set(square, Some(piece)),
            _ => skipped += 1,
        }
    }

    if skipped > 0 {
        log::debug!("Skipped {} unreadable piece markers", skipped);
    }
    grid
}

/// Colour and type from a class attribute such as `piece wp square-52`.
///
/// A whole class token like `wp` is preferred; otherwise the first colour
/// letter directly followed by a type letter anywhere in the attribute is used,
/// which copes with decorated tokens like `wp-dragging`.
pub fn piece_code(class: &str) -> Option<Piece> {
    let exact = class.split_whitespace().find_map(|token| {
        let mut chars = token.chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some(color), Some(kind), None) => Piece::from_code(color, kind),
            _ => None,
        }
    });
    exact.or_else(|| {
        class
            .as_bytes()
            .windows(2)
            .find_map(|pair| Piece::from_code(pair[0] as char, pair[1] as char))
    })
}

/// First `square-FR` code in the class attribute, converted to zero-based.
pub fn square_code(class: &str) -> Option<Square> {
    square_digits(class).find_map(|(file, rank)| {
        let file = file.to_digit(10)?.checked_sub(1)?;
        let rank = rank.to_digit(10)?.checked_sub(1)?;
        Square::new(file as u8, rank as u8)
    })
}

/// Every `(file, rank)` digit pair that follows a `square-` prefix.
pub(crate) fn square_digits(class: &str) -> impl Iterator<Item = (char, char)> + '_ {
    class.match_indices(SQUARE_PREFIX).filter_map(move |(index, _)| {
        let mut rest = class[index + SQUARE_PREFIX.len()..].chars();
        let file = rest.next().filter(char::is_ascii_digit)?;
        let rank = rest.next().filter(char::is_ascii_digit)?;
        Some((file, rank))
    })
}

/// True while the bottom clock shows it is the local player's turn.
pub fn is_my_turn(page: Option<&Element>) -> bool {
    page.and_then(|page| page.find(&CLOCK))
        .map_or(false, |clock| clock.has_class(PLAYER_TURN_CLASS))
}

/// Class attribute of the turn indicator; its changes mark a new turn.
pub fn turn_marker(page: Option<&Element>) -> Option<String> {
    page.and_then(|page| page.find(&CLOCK))
        .map(|clock| clock.class.clone().unwrap_or_default())
}
