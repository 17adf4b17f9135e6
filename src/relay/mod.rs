//! Server side: forwards positions from the page to an analysis backend.

pub mod api;
pub mod book;
pub mod explain;
pub mod handlers;
pub mod uci;
pub mod upstream;

pub use api::AnalysisApi;
pub use book::OpeningBook;
pub use handlers::{configure, RelayState};
pub use uci::EngineProcess;
pub use upstream::Upstream;
