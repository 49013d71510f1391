//! Scoreboard State Library
//!
//! This crate provides state management for live table-tennis scoring.
//!
//! # Overview
//!
//! The state module provides:
//!
//! - **Scoring Rules** - Set and match completion, service rotation and side
//!   changes as pure functions over snapshots.
//!
//! - **Match Controller** - Owns the one active match and turns commands
//!   (configure, score point, undo point, new set) into complete new snapshots.
//!
//! - **Observers** - Per-viewer outboxes so every referee console, spectator
//!   display and history page mirrors the same snapshot.
//!
//! - **Snapshot Loading** - Accepts previously persisted snapshots, backfilling
//!   fields that older snapshots lack and discarding ones missing core fields.
//!
//! # Design Principles
//!
//! 1. **Snapshots, not patches** - Every accepted command yields a whole new
//!    `MatchState`; nothing is updated in place behind the caller's back.
//!
//! 2. **Ignore, don't fail** - Commands that do not apply are dropped and the
//!    previous snapshot stays authoritative.
//!
//! 3. **No networking** - This crate is pure state, no WebSocket or HTTP.
//!
//! 4. **Serialization-ready** - All types round-trip through JSON.
//!
//! # Example
//!
//! ```rust
//! use scoreboard_state::state::{
//!     Command, MatchConfig, ObserverRole, Scoreboard, Score, Side,
//! };
//!
//! let mut board = Scoreboard::new();
//! let referee = board.join(ObserverRole::Referee);
//!
//! let config = MatchConfig::new("Alice", "Bob").with_first_server(Side::A);
//! assert!(board.dispatch(Command::ConfigureMatch { config }));
//! assert!(board.dispatch(Command::ScorePoint { side: Side::A }));
//!
//! let state = board.current().unwrap();
//! assert_eq!(state.score, Score(1, 0));
//! assert_eq!(state.server, Side::A);
//! assert_eq!(state.remaining_serves, 1);
//!
//! // Both updates were queued for the referee console.
//! assert_eq!(board.observers.take_pending(referee).len(), 2);
//!
//! // A spectator joining now only gets the current snapshot.
//! let spectator = board.join(ObserverRole::Spectator);
//! assert_eq!(board.observers.take_pending(spectator).len(), 1);
//! ```

pub mod state;

// Re-export everything from state module at crate root
pub use state::*;
