use async_trait::async_trait;

use crate::error::RelayError;
use crate::moves::Move;
use crate::wire::Analysis;

/// An analysis backend the relay forwards positions to.
///
/// Positions arrive already completed to six fields. Implementations make
/// exactly one attempt per call; retrying is left to the page.
#[async_trait]
pub trait Upstream: Send + Sync {
    fn name(&self) -> String;

    /// Best move in coordinate form, e.g. `e2e4` or `e7e8q`.
    async fn best_move(&self, fen: &str, depth: u8) -> Result<String, RelayError>;

    async fn analyze(&self, fen: &str, depth: u8) -> Result<Analysis, RelayError>;
}

/// Normalizes an upstream move, rejecting anything that is not a coordinate move.
pub fn checked_move(raw: &str) -> Result<String, RelayError> {
    Move::parse(raw)
        .map(|mv| mv.to_string())
        .ok_or_else(|| RelayError::BadPayload(format!("not a coordinate move: {:?}", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_move() {
        assert_eq!(checked_move("E7E8Q").unwrap(), "e7e8q");
        assert!(matches!(checked_move("(none)"), Err(RelayError::BadPayload(_))));
        assert!(matches!(checked_move("0000"), Err(RelayError::BadPayload(_))));
    }
}
