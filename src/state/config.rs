//! Match configuration.
//!
//! Built by the setup form and fixed for the lifetime of a match.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::score::{CourtSide, Side};

/// Singles or doubles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchKind {
    #[default]
    Singles,
    Doubles,
}

impl MatchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Singles => "singles",
            Self::Doubles => "doubles",
        }
    }
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("player name for side {0} is empty")]
    EmptyPlayerName(Side),

    #[error("invalid match configuration: {0}")]
    Parse(String),
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

fn default_side_a() -> CourtSide {
    CourtSide::Left
}

fn default_side_b() -> CourtSide {
    CourtSide::Right
}

/// Immutable match setup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchConfig {
    #[serde(default)]
    pub kind: MatchKind,

    /// Primary player on side A
    pub player_a: String,

    /// Primary player on side B
    pub player_b: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner_a: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partner_b: Option<String>,

    /// Side serving the first point of the match
    pub first_server: Side,

    #[serde(default = "default_side_a")]
    pub initial_side_a: CourtSide,

    #[serde(default = "default_side_b")]
    pub initial_side_b: CourtSide,
}

impl MatchConfig {
    /// Singles match, A serving first from the left.
    pub fn new(player_a: impl Into<String>, player_b: impl Into<String>) -> Self {
        Self {
            kind: MatchKind::Singles,
            player_a: player_a.into(),
            player_b: player_b.into(),
            partner_a: None,
            partner_b: None,
            first_server: Side::A,
            initial_side_a: default_side_a(),
            initial_side_b: default_side_b(),
        }
    }

    /// Turn this into a doubles match with the given partners.
    pub fn doubles(mut self, partner_a: impl Into<String>, partner_b: impl Into<String>) -> Self {
        self.kind = MatchKind::Doubles;
        self.partner_a = Some(partner_a.into());
        self.partner_b = Some(partner_b.into());
        self
    }

    pub fn with_first_server(mut self, side: Side) -> Self {
        self.first_server = side;
        self
    }

    pub fn with_initial_sides(mut self, side_a: CourtSide, side_b: CourtSide) -> Self {
        self.initial_side_a = side_a;
        self.initial_side_b = side_b;
        self
    }

    /// Parse a setup form payload and validate it.
    pub fn from_json(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for side in [Side::A, Side::B] {
            if self.player_name(side).trim().is_empty() {
                return Err(ConfigError::EmptyPlayerName(side));
            }
        }

        Ok(())
    }

    pub fn player_name(&self, side: Side) -> &str {
        match side {
            Side::A => &self.player_a,
            Side::B => &self.player_b,
        }
    }

    /// Partner name, if one was entered.
    pub fn partner_name(&self, side: Side) -> Option<&str> {
        let partner = match side {
            Side::A => self.partner_a.as_deref(),
            Side::B => self.partner_b.as_deref(),
        };
        partner.filter(|name| !name.trim().is_empty())
    }

    /// Display label for a side ("Alice" or "Alice / Carol").
    pub fn team_label(&self, side: Side) -> String {
        match (self.kind, self.partner_name(side)) {
            (MatchKind::Doubles, Some(partner)) => {
                format!("{} / {}", self.player_name(side), partner)
            }
            _ => self.player_name(side).to_string(),
        }
    }
}
