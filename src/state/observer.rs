//! Observer tracking.
//!
//! Keeps one outbox per connected viewer (referee console, spectator display,
//! history page). Updates are sequenced so a transport can replay anything the
//! viewer has not acknowledged.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::controller::MatchEvent;

/// What a viewer is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObserverRole {
    Referee,
    Spectator,
    History,
}

impl ObserverRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Referee => "referee",
            Self::Spectator => "spectator",
            Self::History => "history",
        }
    }
}

/// An update queued for an observer.
#[derive(Debug, Clone)]
pub struct PendingUpdate {
    pub seq: u64,
    pub message: serde_json::Value,
}

/// A connected viewer.
#[derive(Debug, Clone)]
pub struct Observer {
    pub id: u64,

    pub role: ObserverRole,

    /// Sequence number of the last queued update
    pub send_seq: u64,

    /// Last acknowledged sequence from the viewer
    pub ack_seq: u64,

    /// Updates not yet acknowledged
    pub pending: Vec<PendingUpdate>,
}

impl Observer {
    pub fn new(id: u64, role: ObserverRole) -> Self {
        Self {
            id,
            role,
            send_seq: 0,
            ack_seq: 0,
            pending: Vec::new(),
        }
    }

    /// Queue a message and return its sequence number.
    pub fn send(&mut self, message: serde_json::Value) -> u64 {
        self.send_seq += 1;
        self.pending.push(PendingUpdate {
            seq: self.send_seq,
            message,
        });
        self.send_seq
    }

    /// Drop everything up to and including `ack`.
    pub fn acknowledge(&mut self, ack: u64) {
        self.ack_seq = ack;
        self.pending.retain(|m| m.seq > ack);
    }

    pub fn messages_since(&self, seq: u64) -> Vec<&PendingUpdate> {
        self.pending.iter().filter(|m| m.seq > seq).collect()
    }

    /// Latest queued snapshot. Older ones are superseded by it.
    pub fn latest(&self) -> Option<&PendingUpdate> {
        self.pending.last()
    }

    /// Hand over all queued updates.
    pub fn take_pending(&mut self) -> Vec<PendingUpdate> {
        std::mem::take(&mut self.pending)
    }
}

/// Observer manager - tracks every connected viewer.
#[derive(Debug, Default)]
pub struct ObserverManager {
    observers: HashMap<u64, Observer>,
    next_id: u64,
}

impl ObserverManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a viewer and return its id.
    pub fn join(&mut self, role: ObserverRole) -> u64 {
        self.next_id += 1;
        let id = self.next_id;
        self.observers.insert(id, Observer::new(id, role));
        debug!(observer = id, role = role.as_str(), "observer joined");
        id
    }

    pub fn get(&self, id: u64) -> Option<&Observer> {
        self.observers.get(&id)
    }

    pub fn get_mut(&mut self, id: u64) -> Option<&mut Observer> {
        self.observers.get_mut(&id)
    }

    pub fn remove(&mut self, id: u64) -> Option<Observer> {
        let observer = self.observers.remove(&id)?;
        debug!(observer = id, "observer left");
        Some(observer)
    }

    /// Queue an event for one observer only.
    pub fn send_to(&mut self, id: u64, event: &MatchEvent) -> Option<u64> {
        let message = encode(event)?;
        self.observers.get_mut(&id).map(|o| o.send(message))
    }

    /// Queue an event for every observer. Returns how many received it.
    pub fn broadcast(&mut self, event: &MatchEvent) -> usize {
        let Some(message) = encode(event) else {
            return 0;
        };
        for observer in self.observers.values_mut() {
            observer.send(message.clone());
        }
        self.observers.len()
    }

    pub fn acknowledge(&mut self, id: u64, ack: u64) {
        if let Some(observer) = self.observers.get_mut(&id) {
            observer.acknowledge(ack);
        }
    }

    pub fn take_pending(&mut self, id: u64) -> Vec<PendingUpdate> {
        self.observers
            .get_mut(&id)
            .map(Observer::take_pending)
            .unwrap_or_default()
    }

    /// Ids of observers with the given role.
    pub fn with_role(&self, role: ObserverRole) -> Vec<u64> {
        self.observers
            .values()
            .filter(|o| o.role == role)
            .map(|o| o.id)
            .collect()
    }

    pub fn count(&self) -> usize {
        self.observers.len()
    }
}

fn encode(event: &MatchEvent) -> Option<serde_json::Value> {
    match event.to_json() {
        Ok(message) => Some(message),
        Err(err) => {
            warn!(error = %err, "failed to encode match update");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::config::MatchConfig;
    use crate::state::score::MatchState;
    use chrono::Utc;

    fn make_event() -> MatchEvent {
        MatchEvent::MatchUpdated(MatchState::new(MatchConfig::new("Alice", "Bob"), Utc::now()))
    }

    #[test]
    fn test_observer_sequence_numbers() {
        let mut observer = Observer::new(1, ObserverRole::Spectator);

        let seq1 = observer.send(serde_json::json!({"type": "test1"}));
        let seq2 = observer.send(serde_json::json!({"type": "test2"}));
        let seq3 = observer.send(serde_json::json!({"type": "test3"}));

        assert_eq!((seq1, seq2, seq3), (1, 2, 3));
        assert_eq!(observer.pending.len(), 3);
        assert_eq!(observer.messages_since(1).len(), 2);

        observer.acknowledge(2);
        assert_eq!(observer.ack_seq, 2);
        assert_eq!(observer.pending.len(), 1);
        assert_eq!(observer.latest().map(|m| m.seq), Some(3));
    }

    #[test]
    fn test_take_pending_empties_outbox() {
        let mut observer = Observer::new(1, ObserverRole::Referee);
        observer.send(serde_json::json!({}));
        observer.send(serde_json::json!({}));

        assert_eq!(observer.take_pending().len(), 2);
        assert!(observer.pending.is_empty());
        assert_eq!(observer.send_seq, 2);
    }

    #[test]
    fn test_manager_join_remove() {
        let mut manager = ObserverManager::new();
        let referee = manager.join(ObserverRole::Referee);
        let spectator = manager.join(ObserverRole::Spectator);

        assert_ne!(referee, spectator);
        assert_eq!(manager.count(), 2);
        assert_eq!(manager.with_role(ObserverRole::Referee), vec![referee]);

        assert!(manager.remove(referee).is_some());
        assert!(manager.get(referee).is_none());
        assert!(manager.remove(referee).is_none());
        assert_eq!(manager.count(), 1);
    }

    #[test]
    fn test_send_to_single_observer() {
        let mut manager = ObserverManager::new();
        let first = manager.join(ObserverRole::Spectator);
        let second = manager.join(ObserverRole::History);

        assert_eq!(manager.send_to(second, &make_event()), Some(1));
        assert!(manager.get(first).is_some_and(|o| o.pending.is_empty()));
        assert_eq!(manager.get(second).map(|o| o.pending.len()), Some(1));

        assert_eq!(manager.send_to(99, &make_event()), None);
    }

    #[test]
    fn test_broadcast_reaches_everyone() {
        let mut manager = ObserverManager::new();
        let ids: Vec<u64> = [ObserverRole::Referee, ObserverRole::Spectator, ObserverRole::History]
            .into_iter()
            .map(|role| manager.join(role))
            .collect();

        assert_eq!(manager.broadcast(&make_event()), 3);

        for id in ids {
            let pending = manager.take_pending(id);
            assert_eq!(pending.len(), 1);
            assert_eq!(pending[0].message["type"], "match_updated");
        }
    }
}
