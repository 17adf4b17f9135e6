//! Observation loop: turns page changes, timer ticks and key presses into
//! assistant operations, one at a time.

use std::io::{self, BufRead};
use std::thread;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;

use crate::assistant::Assistant;
use crate::orientation::FLIPPED_CLASS;
use crate::overlay::Overlay;
use crate::page::{Element, PageSource};
use crate::reader::{find_board, turn_marker};
use crate::relay_client::RelayApi;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    Suggest,
    ToggleLearning,
    Analyze,
    Clear,
    Quit,
}

impl Command {
    pub fn from_key(line: &str) -> Option<Command> {
        match line.trim().to_ascii_lowercase().as_str() {
            "" | "enter" => Some(Command::Suggest),
            "l" => Some(Command::ToggleLearning),
            "a" => Some(Command::Analyze),
            "c" => Some(Command::Clear),
            "q" => Some(Command::Quit),
            _ => None,
        }
    }
}

pub const KEY_HELP: [&str; 5] = [
    "Enter - Get move suggestion",
    "L - Toggle learning mode",
    "A - Request detailed position analysis",
    "C - Clear drawings and explanations",
    "Q - Quit",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trigger {
    /// Timer tick.
    Poll,
    /// The turn indicator's class attribute changed.
    TurnChanged,
    /// The board was flipped or re-rendered.
    LayoutChanged,
    Key(Command),
}

/// Drops repeated poll, turn and layout triggers from a queued batch.
///
/// First occurrences keep their place; key commands are all kept in order.
/// A turn change supersedes polls in the same batch, so nothing is requested
/// before its settle delay has passed.
pub fn coalesce(triggers: Vec<Trigger>) -> Vec<Trigger> {
    let turn_changed = triggers.contains(&Trigger::TurnChanged);
    let mut kept: Vec<Trigger> = Vec::with_capacity(triggers.len());
    for trigger in triggers {
        let superseded = turn_changed && trigger == Trigger::Poll;
        let repeated = !matches!(trigger, Trigger::Key(_)) && kept.contains(&trigger);
        if !superseded && !repeated {
            kept.push(trigger);
        }
    }
    kept
}

/// Last observed turn indicator and flip state.
#[derive(Debug, Default)]
pub struct Watch {
    turn: Option<Option<String>>,
    flipped: Option<bool>,
}

impl Watch {
    /// Triggers for one poll. The first observation only sets the baseline.
    ///
    /// A tick that sees the turn indicator change reports `TurnChanged`
    /// instead of `Poll`.
    pub fn observe(&mut self, page: Option<&Element>) -> Vec<Trigger> {
        let turn = turn_marker(page);
        let mut triggers = if self.turn.as_ref().map_or(false, |previous| *previous != turn) {
            log::debug!("Turn indicator changed to {:?}", turn);
            vec![Trigger::TurnChanged]
        } else {
            vec![Trigger::Poll]
        };
        self.turn = Some(turn);

        let flipped = find_board(page, None).map_or(false, |board| board.has_class(FLIPPED_CLASS));
        if self.flipped.map_or(false, |previous| previous != flipped) {
            triggers.push(Trigger::LayoutChanged);
        }
        self.flipped = Some(flipped);

        triggers
    }
}

/// Polls `source` every `every`, sending triggers until the receiver is gone.
pub async fn watch_page<S: PageSource>(source: S, every: Duration, tx: mpsc::Sender<Trigger>) {
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    let mut watch = Watch::default();

    loop {
        interval.tick().await;
        let page = source.load();
        for trigger in watch.observe(page.as_ref()) {
            if tx.send(trigger).await.is_err() {
                return;
            }
        }
    }
}

/// Forwards stdin lines as key commands from a dedicated thread.
///
/// The thread is detached; it stops at end of input or once the receiver is gone.
pub fn read_keys(tx: mpsc::Sender<Trigger>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    log::warn!("Failed to read keyboard input: {}", e);
                    return;
                }
            };
            match Command::from_key(&line) {
                Some(command) => {
                    if tx.blocking_send(Trigger::Key(command)).is_err() {
                        return;
                    }
                }
                None => log::debug!("Ignoring key '{}'", line.trim()),
            }
        }
        log::debug!("Keyboard input closed");
    })
}

/// Runs the assistant for each trigger; never runs two cycles at once.
pub struct Observer<P, R, O> {
    assistant: Assistant<P, R, O>,
    settle: Duration,
}

impl<P: PageSource, R: RelayApi, O: Overlay> Observer<P, R, O> {
    pub fn new(assistant: Assistant<P, R, O>, settle: Duration) -> Self {
        Self { assistant, settle }
    }

    pub fn assistant(&self) -> &Assistant<P, R, O> {
        &self.assistant
    }

    /// Consumes triggers until `Quit` or until every sender is dropped.
    pub async fn run(&self, mut rx: mpsc::Receiver<Trigger>) {
        while let Some(first) = rx.recv().await {
            let mut batch = vec![first];
            while let Ok(next) = rx.try_recv() {
                batch.push(next);
            }

            for trigger in coalesce(batch) {
                if !self.handle(trigger).await {
                    log::info!("Chess assistant stopped");
                    return;
                }
            }
        }
    }

    /// Returns false when the loop should stop.
    pub async fn handle(&self, trigger: Trigger) -> bool {
        let result = match trigger {
            Trigger::Poll => self.assistant.suggest_on_turn(true).await.map(|_| ()),
            Trigger::TurnChanged => self.turn_changed().await,
            Trigger::LayoutChanged => self.assistant.reinitialize(),
            Trigger::Key(Command::Suggest) => {
                sleep(self.settle).await;
                self.assistant.suggest().await
            }
            Trigger::Key(Command::ToggleLearning) => self.assistant.toggle_learning_mode().map(|_| ()),
            Trigger::Key(Command::Analyze) => self.assistant.request_analysis().await,
            Trigger::Key(Command::Clear) => self.assistant.clear(),
            Trigger::Key(Command::Quit) => return false,
        };

        if let Err(e) = result {
            log::warn!("{:?} failed: {}", trigger, e);
        }
        true
    }

    async fn turn_changed(&self) -> Result<(), crate::error::AssistError> {
        if self.assistant.opening_as_white() {
            self.assistant.suggest_on_turn(false).await?;
        }
        sleep(self.settle).await;
        self.assistant.suggest_on_turn(true).await.map(|_| ())
    }
}
