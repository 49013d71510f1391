//! Loading persisted snapshots.
//!
//! Viewers keep the last snapshot they saw and may hand it back after a
//! reconnect. Snapshots written before side tracking existed lack the side
//! fields; those are rebuilt from the config. A snapshot without a config or a
//! current score cannot be trusted and is discarded whole.

use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::warn;

use super::config::ConfigError;
use super::rules::{self, MAX_SETS, SERVES_PER_TURN};
use super::score::MatchState;

/// Why a snapshot was discarded.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot is not a JSON object")]
    NotAnObject,

    #[error("snapshot is missing required field `{0}`")]
    MissingField(&'static str),

    #[error("snapshot has an unexpected shape: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("snapshot carries an invalid config: {0}")]
    InvalidConfig(#[from] ConfigError),

    #[error("snapshot is inconsistent: {0}")]
    Inconsistent(&'static str),
}

/// A snapshot accepted by the loader.
#[derive(Debug, Clone)]
pub struct LoadedSnapshot {
    pub state: MatchState,

    /// Fields synthesized because the snapshot predates them
    pub backfilled: Vec<&'static str>,
}

impl LoadedSnapshot {
    pub fn was_migrated(&self) -> bool {
        !self.backfilled.is_empty()
    }
}

const DEFAULT_SIDE_A: &str = "left";
const DEFAULT_SIDE_B: &str = "right";

/// Validate a snapshot and fill in fields added after it was written.
pub fn load_snapshot(value: Value) -> Result<LoadedSnapshot, SnapshotError> {
    let Value::Object(mut root) = value else {
        return Err(SnapshotError::NotAnObject);
    };

    if root.get("score").map_or(true, Value::is_null) {
        return Err(SnapshotError::MissingField("score"));
    }

    let mut backfilled = Vec::new();

    let sides = {
        let Some(Value::Object(config)) = root.get_mut("config") else {
            return Err(SnapshotError::MissingField("config"));
        };
        backfill(config, "initial_side_a", json!(DEFAULT_SIDE_A), &mut backfilled);
        backfill(config, "initial_side_b", json!(DEFAULT_SIDE_B), &mut backfilled);
        json!({
            "a": config["initial_side_a"].clone(),
            "b": config["initial_side_b"].clone(),
        })
    };

    if !root.contains_key("current_sides") {
        root.insert("current_sides".to_string(), sides);
        backfilled.push("current_sides");
    }
    if !root.contains_key("decider_swap_done") {
        root.insert("decider_swap_done".to_string(), json!(false));
        backfilled.push("decider_swap_done");
    }

    let state: MatchState = serde_json::from_value(Value::Object(root))?;
    state.config.validate()?;
    check_consistency(&state)?;

    Ok(LoadedSnapshot { state, backfilled })
}

/// Reject values no sequence of commands can produce.
fn check_consistency(state: &MatchState) -> Result<(), SnapshotError> {
    if !(1..=MAX_SETS).contains(&state.set_number) {
        return Err(SnapshotError::Inconsistent("set number out of range"));
    }
    if !(1..=SERVES_PER_TURN).contains(&state.remaining_serves) {
        return Err(SnapshotError::Inconsistent("remaining serves out of range"));
    }

    // A manual new set starts a set without completing one, so fewer
    // completed sets than `set_number - 1` is allowed.
    let completed = state.sets_history.len();
    let started_before = usize::from(state.set_number - 1);
    if state.status.is_active() {
        if completed > started_before {
            return Err(SnapshotError::Inconsistent(
                "more completed sets than the current set allows",
            ));
        }
        if rules::is_match_finished(&state.sets_history) {
            return Err(SnapshotError::Inconsistent("match already decided while playing"));
        }
    } else if completed > usize::from(state.set_number) {
        return Err(SnapshotError::Inconsistent(
            "more completed sets than the current set allows",
        ));
    }

    Ok(())
}

pub fn load_snapshot_str(raw: &str) -> Result<LoadedSnapshot, SnapshotError> {
    load_snapshot(serde_json::from_str(raw)?)
}

/// Restore a saved snapshot, or `None` if it has to be thrown away.
pub fn restore_or_discard(raw: Option<&str>) -> Option<MatchState> {
    match load_snapshot_str(raw?) {
        Ok(loaded) => Some(loaded.state),
        Err(err) => {
            warn!(error = %err, "discarding incompatible snapshot");
            None
        }
    }
}

fn backfill(
    object: &mut Map<String, Value>,
    key: &'static str,
    default: Value,
    backfilled: &mut Vec<&'static str>,
) {
    if object.get(key).map_or(true, Value::is_null) {
        object.insert(key.to_string(), default);
        backfilled.push(key);
    }
}
