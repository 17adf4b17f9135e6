use parking_lot::Mutex;

use crate::board::Side;
use crate::error::AssistError;
use crate::moves::speech_text;
use crate::notation::encode;
use crate::orientation::detect_side;
use crate::overlay::Overlay;
use crate::page::{Element, PageSource};
use crate::reader::{find_board, is_my_turn, read_board};
use crate::relay::explain::GENERIC;
use crate::relay_client::RelayApi;
use crate::session::{Session, Suggestion};

pub const ANALYSIS_FAILED: &str = "Failed to analyze position";

/// Board read at one instant.
#[derive(Clone, Debug, PartialEq)]
pub struct Snapshot {
    pub position: String,
    pub side: Side,
    pub my_turn: bool,
}

/// Reads the board, asks the relay and renders the answer.
///
/// Every operation re-reads the page; nothing about the board is kept
/// between calls except the cached container in the session.
pub struct Assistant<P, R, O> {
    page: P,
    relay: R,
    overlay: Mutex<O>,
    session: Mutex<Session>,
}

impl<P: PageSource, R: RelayApi, O: Overlay> Assistant<P, R, O> {
    pub fn new(page: P, relay: R, overlay: O) -> Self {
        Self {
            page,
            relay,
            overlay: Mutex::new(overlay),
            session: Mutex::new(Session::new()),
        }
    }

    pub fn session(&self) -> Session {
        self.session.lock().clone()
    }

    pub fn overlay(&self) -> parking_lot::MutexGuard<'_, O> {
        self.overlay.lock()
    }

    /// Reads the live page into a position string.
    pub fn snapshot(&self) -> Snapshot {
        let page = self.page.load();
        self.read(page.as_ref())
    }

    fn read(&self, page: Option<&Element>) -> Snapshot {
        let session = self.session.lock();
        let cached = session.cached_board.as_ref();
        let container = find_board(page, cached);
        let side = detect_side(container);
        let grid = read_board(page, cached);

        Snapshot {
            position: encode(&grid, side),
            side,
            my_turn: is_my_turn(page),
        }
    }

    /// Requests a move for the current position regardless of turn.
    pub async fn suggest(&self) -> Result<(), AssistError> {
        let snapshot = self.snapshot();
        self.request_best_move(&snapshot.position).await
    }

    /// Requests a move when it is the viewer's turn.
    ///
    /// With `dedupe`, a position that already got a suggestion is skipped.
    /// Returns whether a request was made.
    pub async fn suggest_on_turn(&self, dedupe: bool) -> Result<bool, AssistError> {
        let snapshot = self.snapshot();
        if !snapshot.my_turn {
            return Ok(false);
        }
        if dedupe && self.session.lock().already_suggested(&snapshot.position) {
            return Ok(false);
        }
        self.request_best_move(&snapshot.position).await?;
        Ok(true)
    }

    async fn request_best_move(&self, position: &str) -> Result<(), AssistError> {
        log::debug!("Requesting best move for {}", position);
        let raw = self.relay.best_move(position).await?;
        self.process_best_move(&raw, position).await
    }

    /// Renders and speaks an engine reply.
    ///
    /// An unparseable reply is still recorded and spoken as-is.
    pub async fn process_best_move(&self, raw: &str, position: &str) -> Result<(), AssistError> {
        log::info!("Best move: {}", raw.trim());
        let suggestion = Suggestion::new(raw, position);
        let parsed = suggestion.parsed;

        let page = self.page.load();
        let learning_mode = {
            let mut session = self.session.lock();
            session.record(suggestion);
            if let Some(board) = find_board(page.as_ref(), None) {
                session.cached_board = Some(board.clone());
            }
            session.learning_mode
        };

        match parsed {
            Some(mv) => self.overlay.lock().highlight(&mv)?,
            None => log::warn!("Could not parse move coordinates from '{}'", raw.trim()),
        }

        let spoken = speech_text(raw);
        if !learning_mode {
            return self.overlay.lock().speak(&spoken);
        }

        let explanation = match self.relay.explain(position, raw.trim()).await {
            Ok(text) => text,
            Err(e) => {
                log::error!("Failed to get explanation: {}", e);
                GENERIC.to_string()
            }
        };
        self.session.lock().explanation = Some(explanation.clone());

        let mut overlay = self.overlay.lock();
        overlay.show_explanation(&explanation)?;
        overlay.speak(&format!("{}. {}", spoken, explanation))
    }

    /// Shows a summary of the engine's analysis of the current position.
    pub async fn request_analysis(&self) -> Result<(), AssistError> {
        let snapshot = self.snapshot();
        match self.relay.analyze(&snapshot.position).await {
            Ok(analysis) => {
                let mut overlay = self.overlay.lock();
                overlay.show_explanation(&analysis.summary())?;
                overlay.speak("Analysis complete")
            }
            Err(e) => {
                log::error!("Failed to analyze {}: {}", snapshot.position, e);
                self.overlay.lock().show_explanation(ANALYSIS_FAILED)
            }
        }
    }

    pub fn toggle_learning_mode(&self) -> Result<bool, AssistError> {
        let (enabled, shown) = {
            let mut session = self.session.lock();
            let enabled = session.toggle_learning_mode();
            let shown = session
                .last_suggestion
                .as_ref()
                .and(session.explanation.clone());
            (enabled, shown)
        };

        let status = if enabled { "enabled" } else { "disabled" };
        log::info!("Learning mode {}", status);

        let mut overlay = self.overlay.lock();
        overlay.speak(&format!("Learning mode {}", status))?;
        if !enabled {
            overlay.hide_explanation()?;
        } else if let Some(text) = shown {
            overlay.show_explanation(&text)?;
        }
        Ok(enabled)
    }

    /// Removes highlights and the explanation box.
    pub fn clear(&self) -> Result<(), AssistError> {
        let mut overlay = self.overlay.lock();
        overlay.clear()?;
        overlay.hide_explanation()
    }

    /// Refreshes page references and redraws the last suggestion.
    pub fn reinitialize(&self) -> Result<(), AssistError> {
        let page = self.page.load();
        let redraw = self.session.lock().reinitialize(page.as_ref());
        log::info!("Chess assistant reinitialized");
        match redraw {
            Some(mv) => self.overlay.lock().highlight(&mv),
            None => Ok(()),
        }
    }

    /// True exactly once: on the first turn change while playing white.
    pub fn opening_as_white(&self) -> bool {
        let side = self.snapshot().side;
        let opening = self.session.lock().end_opening();
        opening && side == Side::White
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::moves::Move;
    use crate::overlay::OverlayDocument;
    use crate::wire::Analysis;
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::time::Instant;

    pub const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w";

    /// Page whose contents tests can swap.
    #[derive(Clone, Default)]
    pub struct FakePage(pub Arc<Mutex<Option<Element>>>);

    impl FakePage {
        pub fn with(page: Element) -> Self {
            Self(Arc::new(Mutex::new(Some(page))))
        }

        pub fn set(&self, page: Element) {
            *self.0.lock() = Some(page);
        }
    }

    impl PageSource for FakePage {
        fn load(&self) -> Option<Element> {
            self.0.lock().clone()
        }
    }

    #[derive(Clone, Default)]
    pub struct FakeRelay {
        pub reply: Option<String>,
        pub analysis: Option<Analysis>,
        pub explanation: Option<String>,
        pub requests: Arc<Mutex<Vec<String>>>,
        pub requested_at: Arc<Mutex<Vec<Instant>>>,
    }

    impl FakeRelay {
        pub fn replying(mv: &str) -> Self {
            Self { reply: Some(mv.to_string()), ..Self::default() }
        }

        fn unavailable() -> AssistError {
            AssistError::Status { status: 502, body: "upstream down".into() }
        }
    }

    #[async_trait]
    impl RelayApi for FakeRelay {
        async fn best_move(&self, position: &str) -> Result<String, AssistError> {
            self.requests.lock().push(position.to_string());
            self.requested_at.lock().push(Instant::now());
            self.reply.clone().ok_or_else(Self::unavailable)
        }

        async fn analyze(&self, _position: &str) -> Result<Analysis, AssistError> {
            self.analysis.clone().ok_or_else(Self::unavailable)
        }

        async fn explain(&self, _position: &str, _move_str: &str) -> Result<String, AssistError> {
            self.explanation.clone().ok_or_else(Self::unavailable)
        }
    }

    #[derive(Default)]
    pub struct MemoryOverlay {
        pub document: OverlayDocument,
        pub spoken: Vec<String>,
    }

    impl Overlay for MemoryOverlay {
        fn highlight(&mut self, mv: &Move) -> Result<(), AssistError> {
            self.document.highlight(mv);
            Ok(())
        }

        fn clear(&mut self) -> Result<(), AssistError> {
            self.document.highlights.clear();
            Ok(())
        }

        fn show_explanation(&mut self, text: &str) -> Result<(), AssistError> {
            self.document.explanation = Some(text.to_string());
            Ok(())
        }

        fn hide_explanation(&mut self) -> Result<(), AssistError> {
            self.document.explanation = None;
            Ok(())
        }

        fn speak(&mut self, text: &str) -> Result<(), AssistError> {
            self.spoken.push(text.to_string());
            Ok(())
        }
    }

    /// Starting position as the page shows it, white at the bottom.
    pub fn start_page(my_turn: bool) -> Element {
        let mut pieces = Vec::new();
        let back = ['r', 'n', 'b', 'q', 'k', 'b', 'n', 'r'];
        for (file, kind) in back.iter().enumerate() {
            let f = file + 1;
            pieces.push(Element::new("div").with_class(&format!("piece w{} square-{}1", kind, f)));
            pieces.push(Element::new("div").with_class(&format!("piece wp square-{}2", f)));
            pieces.push(Element::new("div").with_class(&format!("piece bp square-{}7", f)));
            pieces.push(Element::new("div").with_class(&format!("piece b{} square-{}8", kind, f)));
        }
        let clock = if my_turn { "clock-bottom clock-player-turn" } else { "clock-bottom" };
        Element::new("body").with_children([
            Element::new("div").with_class(clock),
            Element::new("wc-chess-board").with_class("board").with_children(pieces),
        ])
    }

    type TestAssistant = Assistant<FakePage, FakeRelay, MemoryOverlay>;

    fn assistant(page: Element, relay: FakeRelay) -> TestAssistant {
        Assistant::new(FakePage::with(page), relay, MemoryOverlay::default())
    }

    #[test]
    fn test_snapshot_reads_position() {
        let assistant = assistant(start_page(true), FakeRelay::default());
        let snapshot = assistant.snapshot();
        assert_eq!(snapshot.position, START);
        assert_eq!(snapshot.side, Side::White);
        assert!(snapshot.my_turn);
    }

    #[test]
    fn test_missing_page_reads_empty_board() {
        let assistant = Assistant::new(FakePage::default(), FakeRelay::default(), MemoryOverlay::default());
        let snapshot = assistant.snapshot();
        assert_eq!(snapshot.position, "8/8/8/8/8/8/8/8 w");
        assert!(!snapshot.my_turn);
    }

    #[tokio::test]
    async fn test_suggest_highlights_and_speaks() {
        let relay = FakeRelay::replying("e2e4");
        let requests = relay.requests.clone();
        let assistant = assistant(start_page(true), relay);

        assistant.suggest().await.unwrap();

        assert_eq!(*requests.lock(), vec![START.to_string()]);
        let overlay = assistant.overlay();
        assert_eq!(overlay.document.highlights.len(), 2);
        assert_eq!(overlay.document.highlights[0].square, "52");
        assert_eq!(overlay.document.highlights[1].square, "54");
        assert_eq!(overlay.spoken, vec!["e2 to e4".to_string()]);
        drop(overlay);

        let session = assistant.session();
        assert_eq!(session.last_suggestion.unwrap().position, START);
        assert!(session.cached_board.is_some());
    }

    #[tokio::test]
    async fn test_suggest_on_turn_waits_for_turn_and_dedupes() {
        let relay = FakeRelay::replying("e2e4");
        let requests = relay.requests.clone();
        let page = FakePage::with(start_page(false));
        let assistant = Assistant::new(page.clone(), relay, MemoryOverlay::default());

        assert!(!assistant.suggest_on_turn(true).await.unwrap());
        page.set(start_page(true));
        assert!(assistant.suggest_on_turn(true).await.unwrap());
        assert!(!assistant.suggest_on_turn(true).await.unwrap());
        assert!(assistant.suggest_on_turn(false).await.unwrap());
        assert_eq!(requests.lock().len(), 2);
    }

    #[tokio::test]
    async fn test_unparseable_reply_is_spoken_without_highlight() {
        let assistant = assistant(start_page(true), FakeRelay::replying("(none)"));
        assistant.suggest().await.unwrap();
        let overlay = assistant.overlay();
        assert!(overlay.document.highlights.is_empty());
        assert_eq!(overlay.spoken, vec!["(none)".to_string()]);
    }

    #[tokio::test]
    async fn test_relay_failure_renders_nothing() {
        let assistant = assistant(start_page(true), FakeRelay::default());
        assert!(matches!(assistant.suggest().await, Err(AssistError::Status { status: 502, .. })));
        assert!(assistant.overlay().document.highlights.is_empty());
        assert!(assistant.session().last_suggestion.is_none());
    }

    #[tokio::test]
    async fn test_learning_mode_explains() {
        let relay = FakeRelay {
            explanation: Some("Controls the centre.".into()),
            ..FakeRelay::replying("e2e4")
        };
        let assistant = assistant(start_page(true), relay);
        assert!(assistant.toggle_learning_mode().unwrap());
        assistant.suggest().await.unwrap();

        let overlay = assistant.overlay();
        assert_eq!(overlay.document.explanation.as_deref(), Some("Controls the centre."));
        assert_eq!(
            overlay.spoken,
            vec![
                "Learning mode enabled".to_string(),
                "e2 to e4. Controls the centre.".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_learning_mode_falls_back_to_generic_explanation() {
        let assistant = assistant(start_page(true), FakeRelay::replying("g1f3"));
        assistant.toggle_learning_mode().unwrap();
        assistant.suggest().await.unwrap();
        assert_eq!(assistant.overlay().document.explanation.as_deref(), Some(GENERIC));
        assert_eq!(assistant.session().explanation.as_deref(), Some(GENERIC));
    }

    #[tokio::test]
    async fn test_toggle_hides_and_restores_explanation() {
        let relay = FakeRelay {
            explanation: Some("Develops a piece.".into()),
            ..FakeRelay::replying("g1f3")
        };
        let assistant = assistant(start_page(true), relay);
        assistant.toggle_learning_mode().unwrap();
        assistant.suggest().await.unwrap();

        assert!(!assistant.toggle_learning_mode().unwrap());
        assert_eq!(assistant.overlay().document.explanation, None);
        assert!(assistant.toggle_learning_mode().unwrap());
        assert_eq!(assistant.overlay().document.explanation.as_deref(), Some("Develops a piece."));
    }

    #[tokio::test]
    async fn test_request_analysis() {
        let relay = FakeRelay {
            analysis: Some(Analysis {
                evaluation: Some(0.3),
                best_move: Some("e2e4".into()),
                ..Analysis::default()
            }),
            ..FakeRelay::default()
        };
        let assistant = assistant(start_page(true), relay);
        assistant.request_analysis().await.unwrap();

        let overlay = assistant.overlay();
        assert_eq!(
            overlay.document.explanation.as_deref(),
            Some("Position Analysis:\nEvaluation: 0.30 (favoring White)\nBest move: e2e4\n")
        );
        assert_eq!(overlay.spoken, vec!["Analysis complete".to_string()]);
    }

    #[tokio::test]
    async fn test_request_analysis_failure() {
        let assistant = assistant(start_page(true), FakeRelay::default());
        assistant.request_analysis().await.unwrap();
        let overlay = assistant.overlay();
        assert_eq!(overlay.document.explanation.as_deref(), Some(ANALYSIS_FAILED));
        assert!(overlay.spoken.is_empty());
    }

    #[tokio::test]
    async fn test_clear_and_reinitialize_redraws() {
        let assistant = assistant(start_page(true), FakeRelay::replying("d2d4"));
        assistant.suggest().await.unwrap();
        assistant.clear().unwrap();
        assert!(assistant.overlay().document.highlights.is_empty());

        assistant.reinitialize().unwrap();
        assert_eq!(assistant.overlay().document.highlights[1].square, "44");
    }

    #[test]
    fn test_opening_as_white_fires_once() {
        let assistant = assistant(start_page(true), FakeRelay::default());
        assert!(assistant.opening_as_white());
        assert!(!assistant.opening_as_white());
    }
}
