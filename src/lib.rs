pub mod assistant;
pub mod board;
pub mod config;
pub mod error;
pub mod moves;
pub mod notation;
pub mod observer;
pub mod orientation;
pub mod overlay;
pub mod page;
pub mod reader;
pub mod relay;
pub mod relay_client;
pub mod session;
pub mod wire;

pub use assistant::Assistant;
pub use board::{Grid, Piece, PieceKind, Side, Square};
pub use error::{AssistError, NotationError, RelayError};
pub use moves::Move;
pub use notation::{complete, decode, encode};
pub use observer::{Command, Observer, Trigger};
pub use orientation::detect_side;
pub use overlay::{Overlay, OverlayFile};
pub use page::{Element, PageSource, SnapshotFile};
pub use reader::read_board;
pub use relay_client::{RelayApi, RelayClient};
pub use session::Session;
pub use wire::{Analysis, ExplainRequest, Explanation, PositionRequest};
