//! State management module for match scoring.
//!
//! This module provides the core state types and managers:
//!
//! - `score` - Match snapshot data model (score, service, sides, history)
//! - `config` - Match setup
//! - `rules` - Pure table-tennis scoring rules
//! - `controller` - Command handling for the single active match
//! - `observer` - Viewer outboxes for the broadcast contract
//! - `snapshot` - Loading persisted snapshots, with backfill of newer fields
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                            Scoreboard                            │
//! │                                                                  │
//! │  ┌──────────────────────┐  MatchEvent   ┌─────────────────────┐  │
//! │  │   MatchController    │──────────────▶│   ObserverManager   │  │
//! │  │                      │               │                     │  │
//! │  │  Option<MatchState>  │               │  observer_id →      │  │
//! │  │                      │               │    Observer outbox  │  │
//! │  └──────────▲───────────┘               └─────────────────────┘  │
//! │             │ Command                                            │
//! │  ┌──────────┴───────────┐                                        │
//! │  │  rules (pure fns)    │                                        │
//! │  └──────────────────────┘                                        │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,ignore
//! use scoreboard_state::state::{Command, MatchConfig, ObserverRole, Scoreboard, Side};
//!
//! let mut board = Scoreboard::new();
//! let referee = board.join(ObserverRole::Referee);
//!
//! board.dispatch(Command::ConfigureMatch { config: MatchConfig::new("Alice", "Bob") });
//! board.dispatch(Command::ScorePoint { side: Side::A });
//!
//! for update in board.observers.take_pending(referee) {
//!     send_to_socket(update.message);
//! }
//! ```

pub mod config;
pub mod controller;
pub mod observer;
pub mod rules;
pub mod score;
pub mod snapshot;

// Re-export commonly used types
pub use config::{ConfigError, MatchConfig, MatchKind};
pub use controller::{apply_command, Command, CommandIgnored, MatchController, MatchEvent};
pub use observer::{Observer, ObserverManager, ObserverRole, PendingUpdate};
pub use rules::{ServiceState, SideChangeNotice};
pub use score::{
    CourtSide, HistoryPoint, MatchState, MatchStatus, PointKind, PointRestore, Score, Side,
    SideAssignment,
};
pub use snapshot::{load_snapshot, load_snapshot_str, restore_or_discard, LoadedSnapshot, SnapshotError};

/// Controller and viewers wired together.
///
/// Accepted commands are broadcast to every observer; a viewer joining mid-match
/// gets the current snapshot on its own.
#[derive(Debug, Default)]
pub struct Scoreboard {
    pub controller: MatchController,
    pub observers: ObserverManager,
}

impl Scoreboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a viewer, queueing the current snapshot for it alone.
    pub fn join(&mut self, role: ObserverRole) -> u64 {
        let id = self.observers.join(role);
        if let Some(event) = self.controller.snapshot_event() {
            self.observers.send_to(id, &event);
        }
        id
    }

    pub fn leave(&mut self, id: u64) -> Option<Observer> {
        self.observers.remove(id)
    }

    /// Apply a command and broadcast the result. Returns whether it was accepted.
    pub fn dispatch(&mut self, command: Command) -> bool {
        match self.controller.handle(command) {
            Some(event) => {
                self.observers.broadcast(&event);
                true
            }
            None => false,
        }
    }

    /// Decode and dispatch a command received from a viewer.
    pub fn dispatch_json(&mut self, raw: &str) -> serde_json::Result<bool> {
        let command = Command::from_json(raw)?;
        Ok(self.dispatch(command))
    }

    pub fn current(&self) -> Option<&MatchState> {
        self.controller.current()
    }
}
