//! # Transition Events
//!
//! Every accepted state change is described by a [`StateChange`] produced by the entity
//! itself ([`ActorEntity::state_changes`](super::ActorEntity::state_changes)). The actor
//! stamps it with a timestamp and publishes a [`TransitionEvent`] on the [`TransitionBus`].
//!
//! The bus is a thin wrapper over [`tokio::sync::broadcast`]:
//! - `publish()` never blocks and never fails; events with no subscriber are dropped.
//! - Slow subscribers observe `RecvError::Lagged(n)` and skip the oldest `n` events.
//!
//! Delivery, formatting and retries belong to whoever subscribes (push notifications,
//! kitchen display, analytics). The core never waits on them.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Display;
use tokio::sync::broadcast;

/// The entity families that emit transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityKind {
    Table,
    QrSession,
    Reservation,
    Order,
    OrderItem,
    OrderPayment,
}

/// A state change as reported by an entity, before it is stamped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateChange {
    pub kind: EntityKind,
    pub entity_id: String,
    pub old_state: Option<&'static str>,
    pub new_state: &'static str,
}

impl StateChange {
    /// Returns a change only when the state actually moved.
    pub fn between(
        kind: EntityKind,
        entity_id: impl Display,
        old_state: Option<&'static str>,
        new_state: &'static str,
    ) -> Option<Self> {
        if old_state == Some(new_state) {
            return None;
        }
        Some(Self {
            kind,
            entity_id: entity_id.to_string(),
            old_state,
            new_state,
        })
    }

    pub fn stamp(self, at: DateTime<Utc>) -> TransitionEvent {
        TransitionEvent {
            kind: self.kind,
            entity_id: self.entity_id,
            old_state: self.old_state.map(str::to_string),
            new_state: self.new_state.to_string(),
            at,
        }
    }
}

/// `(entityType, entityID, oldState, newState, timestamp)` as handed to the notification side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransitionEvent {
    pub kind: EntityKind,
    pub entity_id: String,
    pub old_state: Option<String>,
    pub new_state: String,
    pub at: DateTime<Utc>,
}

/// Broadcast channel for transition events. Cheap to clone.
#[derive(Clone, Debug)]
pub struct TransitionBus {
    tx: broadcast::Sender<TransitionEvent>,
}

impl TransitionBus {
    /// Creates a bus; capacity is clamped to at least 1.
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn publish(&self, event: TransitionEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TransitionEvent> {
        self.tx.subscribe()
    }
}
