//! Match state data model.
//!
//! Tracks the live score, service, sides and point history of the single
//! active match. Every type here serializes losslessly so a snapshot can be
//! broadcast or persisted verbatim.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::config::MatchConfig;
use super::rules::{self, SideChangeNotice, SERVES_PER_TURN};

/// One of the two competitors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
        }
    }

    /// The opponent.
    pub fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// End of the table a competitor plays from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CourtSide {
    Left,
    Right,
}

impl CourtSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }

    pub fn flipped(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// Current end of the table for each side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideAssignment {
    pub a: CourtSide,
    pub b: CourtSide,
}

impl SideAssignment {
    pub fn new(a: CourtSide, b: CourtSide) -> Self {
        Self { a, b }
    }

    pub fn get(&self, side: Side) -> CourtSide {
        match side {
            Side::A => self.a,
            Side::B => self.b,
        }
    }

    /// Both sides switch ends.
    pub fn flipped(self) -> Self {
        Self {
            a: self.a.flipped(),
            b: self.b.flipped(),
        }
    }
}

/// Points in a set, side A first. Serialized as `[a, b]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Score(pub u32, pub u32);

impl Score {
    pub fn new(a: u32, b: u32) -> Self {
        Self(a, b)
    }

    pub fn get(&self, side: Side) -> u32 {
        match side {
            Side::A => self.0,
            Side::B => self.1,
        }
    }

    /// Score after `side` wins one more point.
    pub fn with_point(self, side: Side) -> Self {
        match side {
            Side::A => Self(self.0 + 1, self.1),
            Side::B => Self(self.0, self.1 + 1),
        }
    }

    /// Leading side's points.
    pub fn max(&self) -> u32 {
        self.0.max(self.1)
    }

    pub fn leader(&self) -> Option<Side> {
        match self.0.cmp(&self.1) {
            std::cmp::Ordering::Greater => Some(Side::A),
            std::cmp::Ordering::Less => Some(Side::B),
            std::cmp::Ordering::Equal => None,
        }
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.0, self.1)
    }
}

/// How a point was won.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointKind {
    #[default]
    Normal,
    Service,
    Fault,
}

/// State needed to take a point back exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointRestore {
    pub remaining_serves: u8,
    pub sides: SideAssignment,
    pub decider_swap_done: bool,
}

/// One committed point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryPoint {
    pub id: String,
    pub timestamp: DateTime<Utc>,

    /// Set the point was played in
    pub set_number: u8,

    pub before: Score,
    pub after: Score,
    pub winner: Side,

    /// Server when the point was played
    pub server: Side,

    #[serde(default)]
    pub kind: PointKind,

    /// Absent on points recorded by older snapshots
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restore: Option<PointRestore>,
}

/// Match state machine states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStatus {
    #[default]
    Setup,
    Playing,
    /// Reserved, no command enters it
    Paused,
    Finished,
}

impl MatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Setup => "setup",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Finished => "finished",
        }
    }

    /// Check if points can be scored.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Playing)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished)
    }
}

/// Authoritative snapshot of the active match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchState {
    pub config: MatchConfig,

    /// Current set (1-indexed)
    pub set_number: u8,

    /// Score of the set in progress
    pub score: Score,

    /// Final scores of completed sets, oldest first
    pub sets_history: Vec<Score>,

    pub server: Side,

    /// Serves left for the current server (1 or 2)
    pub remaining_serves: u8,

    /// Committed points, oldest first
    pub history: Vec<HistoryPoint>,

    pub status: MatchStatus,

    pub start_time: Option<DateTime<Utc>>,

    pub current_sides: SideAssignment,

    /// Whether the mid-set swap of the deciding set already happened
    pub decider_swap_done: bool,
}

impl MatchState {
    /// Fresh match in play, first set at 0-0.
    pub fn new(config: MatchConfig, started_at: DateTime<Utc>) -> Self {
        let current_sides = SideAssignment::new(config.initial_side_a, config.initial_side_b);
        Self {
            server: config.first_server,
            config,
            set_number: 1,
            score: Score::default(),
            sets_history: Vec::new(),
            remaining_serves: SERVES_PER_TURN,
            history: Vec::new(),
            status: MatchStatus::Playing,
            start_time: Some(started_at),
            current_sides,
            decider_swap_done: false,
        }
    }

    /// Sets won so far by `side`.
    pub fn sets_won(&self, side: Side) -> usize {
        rules::sets_won(&self.sets_history, side)
    }

    /// Match winner, once finished.
    pub fn winner(&self) -> Option<Side> {
        if !self.status.is_terminal() {
            return None;
        }
        [Side::A, Side::B]
            .into_iter()
            .find(|side| self.sets_won(*side) >= rules::SETS_TO_WIN_MATCH)
    }

    pub fn last_point(&self) -> Option<&HistoryPoint> {
        self.history.last()
    }

    /// Points played in a given set.
    pub fn points_in_set(&self, set_number: u8) -> impl Iterator<Item = &HistoryPoint> {
        self.history
            .iter()
            .filter(move |p| p.set_number == set_number)
    }

    pub fn side_change_notice(&self) -> Option<SideChangeNotice> {
        rules::side_change_notice(self)
    }

    /// Convert to a JSON snapshot.
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_new_match() {
        let config = MatchConfig::new("Alice", "Bob")
            .with_first_server(Side::B)
            .with_initial_sides(CourtSide::Right, CourtSide::Left);
        let state = MatchState::new(config, Utc::now());

        assert_eq!(state.status, MatchStatus::Playing);
        assert_eq!(state.set_number, 1);
        assert_eq!(state.score, Score(0, 0));
        assert_eq!(state.server, Side::B);
        assert_eq!(state.remaining_serves, 2);
        assert_eq!(
            state.current_sides,
            SideAssignment::new(CourtSide::Right, CourtSide::Left)
        );
        assert!(!state.decider_swap_done);
        assert!(state.history.is_empty());
        assert!(state.start_time.is_some());
        assert_eq!(state.winner(), None);
    }

    #[test]
    fn test_score_helpers() {
        let score = Score::new(3, 5);
        assert_eq!(score.get(Side::A), 3);
        assert_eq!(score.with_point(Side::A), Score(4, 5));
        assert_eq!(score.max(), 5);
        assert_eq!(score.leader(), Some(Side::B));
        assert_eq!(Score(7, 7).leader(), None);
        assert_eq!(format!("{}", score), "3-5");
    }

    #[test]
    fn test_sides_flip() {
        let sides = SideAssignment::new(CourtSide::Left, CourtSide::Right);
        let flipped = sides.flipped();
        assert_eq!(flipped.get(Side::A), CourtSide::Right);
        assert_eq!(flipped.get(Side::B), CourtSide::Left);
        assert_eq!(flipped.flipped(), sides);
    }

    #[test]
    fn test_wire_format() {
        let state = MatchState::new(MatchConfig::new("Alice", "Bob"), Utc::now());
        let json = state.to_json().unwrap();

        assert_eq!(json["score"], serde_json::json!([0, 0]));
        assert_eq!(json["status"], "playing");
        assert_eq!(json["server"], "A");
        assert_eq!(json["current_sides"], serde_json::json!({"a": "left", "b": "right"}));
        assert_eq!(json["decider_swap_done"], false);
    }

    #[test]
    fn test_status_flags() {
        assert!(MatchStatus::Playing.is_active());
        assert!(!MatchStatus::Paused.is_active());
        assert!(MatchStatus::Finished.is_terminal());
        assert_eq!(MatchStatus::Setup.as_str(), "setup");
    }
}
