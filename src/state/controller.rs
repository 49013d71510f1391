//! Match state controller.
//!
//! Owns the single authoritative [`MatchState`] and turns commands into new
//! snapshots.
//!
//! # State Diagram
//!
//! ```text
//!                 configure (from anywhere)
//!        ┌────────────────────────────────────────┐
//!        ▼                                        │
//! ┌─────────────┐  score_point  ┌──────────┐      │
//! │   Playing   │──────────────▶│ Finished │──────┤
//! │             │◀──────────────│          │      │
//! └──────┬──────┘  undo_point / └──────────┘      │
//!        │         new_set                        │
//!        │ score_point / undo_point / new_set     │
//!        └────────────────────────────────────────┘
//! ```
//!
//! Each transition builds a complete new snapshot. Commands that do not apply
//! to the current state are ignored and leave the previous snapshot in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};
use uuid::Uuid;

use super::config::MatchConfig;
use super::rules::{self, MAX_SETS, SERVES_PER_TURN};
use super::score::{HistoryPoint, MatchState, MatchStatus, PointKind, PointRestore, Score, Side};

/// Inbound commands relayed from viewers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    ConfigureMatch { config: MatchConfig },
    ScorePoint { side: Side },
    UndoPoint,
    NewSet,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ConfigureMatch { .. } => "configure_match",
            Self::ScorePoint { .. } => "score_point",
            Self::UndoPoint => "undo_point",
            Self::NewSet => "new_set",
        }
    }

    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }
}

/// Outbound events for viewers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "state", rename_all = "snake_case")]
pub enum MatchEvent {
    MatchUpdated(MatchState),
}

impl MatchEvent {
    pub fn state(&self) -> &MatchState {
        match self {
            Self::MatchUpdated(state) => state,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

/// A command that does not apply to the current state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{command} ignored: {reason}")]
pub struct CommandIgnored {
    pub command: &'static str,
    pub reason: &'static str,
}

impl CommandIgnored {
    fn new(command: &'static str, reason: &'static str) -> Self {
        Self { command, reason }
    }
}

/// Compute the snapshot that follows `command`.
pub fn apply_command(
    current: Option<&MatchState>,
    command: &Command,
    now: DateTime<Utc>,
) -> Result<MatchState, CommandIgnored> {
    match (current, command) {
        (_, Command::ConfigureMatch { config }) => MatchState::configure(config.clone(), now),
        (None, _) => Err(CommandIgnored::new(command.name(), "no active match")),
        (Some(state), Command::ScorePoint { side }) => state.score_point(*side, now),
        (Some(state), Command::UndoPoint) => state.undo_point(),
        (Some(state), Command::NewSet) => state.new_set(),
    }
}

impl MatchState {
    /// Start a new match, replacing whatever was in progress.
    pub fn configure(config: MatchConfig, now: DateTime<Utc>) -> Result<Self, CommandIgnored> {
        if config.validate().is_err() {
            return Err(CommandIgnored::new("configure_match", "invalid configuration"));
        }
        Ok(Self::new(config, now))
    }

    /// Award a point to `side`.
    pub fn score_point(&self, side: Side, now: DateTime<Utc>) -> Result<Self, CommandIgnored> {
        if !self.status.is_active() {
            return Err(CommandIgnored::new("score_point", "match is not in play"));
        }

        let score = self.score.with_point(side);
        let service = rules::update_service_state(self, side);

        let point = HistoryPoint {
            id: Uuid::new_v4().to_string(),
            timestamp: now,
            set_number: self.set_number,
            before: self.score,
            after: score,
            winner: side,
            server: self.server,
            kind: PointKind::Normal,
            restore: Some(PointRestore {
                remaining_serves: self.remaining_serves,
                sides: self.current_sides,
                decider_swap_done: self.decider_swap_done,
            }),
        };

        let mut next = self.clone();
        next.score = score;
        next.server = service.server;
        next.remaining_serves = service.remaining_serves;
        next.history.push(point);

        if rules::should_change_sides(self, &next) {
            next.current_sides = rules::change_sides(&next);
            if next.set_number == MAX_SETS {
                next.decider_swap_done = true;
            }
        }

        if rules::is_set_won(score) {
            next.sets_history.push(score);
            info!(
                set = next.set_number,
                score = %score,
                "set won"
            );

            // A manual new set can leave the decider without a 3-set winner.
            if rules::is_match_finished(&next.sets_history) || next.set_number >= MAX_SETS {
                next.status = MatchStatus::Finished;
                info!(
                    sets_a = next.sets_won(Side::A),
                    sets_b = next.sets_won(Side::B),
                    "match finished"
                );
            } else {
                next.set_number += 1;
                next.score = Score::default();
                next.server = rules::first_server_of_set(next.config.first_server, next.set_number);
                next.remaining_serves = SERVES_PER_TURN;
                next.current_sides = rules::change_sides(&next);
                if next.set_number == MAX_SETS {
                    next.decider_swap_done = false;
                }
            }
        }

        Ok(next)
    }

    /// Take back the most recent point.
    pub fn undo_point(&self) -> Result<Self, CommandIgnored> {
        let Some(last) = self.history.last() else {
            return Err(CommandIgnored::new("undo_point", "no point to undo"));
        };

        let mut next = self.clone();
        next.history.pop();

        if rules::is_set_won(last.after) {
            next.sets_history.pop();
            next.status = MatchStatus::Playing;
        }
        if last.set_number != self.set_number {
            next.set_number = last.set_number;
            next.status = MatchStatus::Playing;
        }

        next.score = last.before;
        next.server = last.server;

        match last.restore {
            Some(restore) => {
                next.remaining_serves = restore.remaining_serves;
                next.current_sides = restore.sides;
                next.decider_swap_done = restore.decider_swap_done;
            }
            None => {
                next.remaining_serves = rules::services_per_player(last.before.0, last.before.1);
            }
        }

        Ok(next)
    }

    /// Manually move on to the next set.
    pub fn new_set(&self) -> Result<Self, CommandIgnored> {
        if self.set_number >= MAX_SETS {
            return Err(CommandIgnored::new("new_set", "already in the deciding set"));
        }

        let mut next = self.clone();
        next.set_number += 1;
        next.score = Score::default();
        next.server = rules::first_server_of_set(next.config.first_server, next.set_number);
        next.remaining_serves = SERVES_PER_TURN;
        next.status = MatchStatus::Playing;

        Ok(next)
    }
}

/// Single owner of the active match.
///
/// Commands must be handed in one at a time, in arrival order.
#[derive(Debug, Default)]
pub struct MatchController {
    current: Option<MatchState>,
}

impl MatchController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current snapshot, if a match exists.
    pub fn current(&self) -> Option<&MatchState> {
        self.current.as_ref()
    }

    /// Apply a command. Returns the update to broadcast, or `None` if ignored.
    pub fn handle(&mut self, command: Command) -> Option<MatchEvent> {
        self.handle_at(command, Utc::now())
    }

    /// Apply a command at a given instant.
    pub fn handle_at(&mut self, command: Command, now: DateTime<Utc>) -> Option<MatchEvent> {
        match apply_command(self.current.as_ref(), &command, now) {
            Ok(next) => {
                if let Command::ConfigureMatch { config } = &command {
                    info!(
                        player_a = %config.player_a,
                        player_b = %config.player_b,
                        kind = config.kind.as_str(),
                        replaced = self.current.is_some(),
                        "match configured"
                    );
                }
                self.current = Some(next.clone());
                Some(MatchEvent::MatchUpdated(next))
            }
            Err(ignored) => {
                debug!(command = ignored.command, reason = ignored.reason, "command ignored");
                None
            }
        }
    }

    /// Snapshot for an observer that just joined.
    pub fn snapshot_event(&self) -> Option<MatchEvent> {
        self.current.clone().map(MatchEvent::MatchUpdated)
    }
}
