//! Domain events produced by catalog mutations.
//!
//! Events are collected while a write transaction runs and handed to an
//! [`EventSink`] only once the transaction committed. Downstream consumers
//! (search indexing, notifications) live outside this crate.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::sync::Mutex;
use tracing::info;

// =============================================================================
// Enumerations
// =============================================================================

/// Operation type for a domain event
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum ChangeOperation {
    Create,
    Update,
    Delete,
}

impl ChangeOperation {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ChangeOperation::Create => "create",
            ChangeOperation::Update => "update",
            ChangeOperation::Delete => "delete",
        }
    }
}

/// Aggregate roots that produce events
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Release,
    Recording,
    Work,
    ReleaseArtist,
    TrackGroup,
}

impl EntityKind {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            EntityKind::Release => "release",
            EntityKind::Recording => "recording",
            EntityKind::Work => "work",
            EntityKind::ReleaseArtist => "release_artist",
            EntityKind::TrackGroup => "track_group",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_str())
    }
}

// =============================================================================
// Events
// =============================================================================

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct DomainEvent {
    pub entity: EntityKind,
    pub entity_id: i64,
    pub operation: ChangeOperation,
}

/// Per-transaction event buffer. The same (entity, id, operation) is only
/// kept once, first-emitted order is preserved.
#[derive(Debug, Default)]
pub struct EventBuffer {
    events: Vec<DomainEvent>,
    seen: HashSet<DomainEvent>,
}

impl EventBuffer {
    pub fn push(&mut self, event: DomainEvent) {
        if self.seen.insert(event) {
            self.events.push(event);
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn into_events(self) -> Vec<DomainEvent> {
        self.events
    }
}

// =============================================================================
// Sinks
// =============================================================================

/// Receiver of committed domain events.
pub trait EventSink: Send + Sync {
    fn publish(&self, event: &DomainEvent);
}

/// Logs every event through `tracing`.
pub struct LoggingEventSink;

impl EventSink for LoggingEventSink {
    fn publish(&self, event: &DomainEvent) {
        info!(
            "Catalog event: {} {} {}",
            event.entity,
            event.entity_id,
            event.operation.to_db_str()
        );
    }
}

pub struct NoOpEventSink;

impl EventSink for NoOpEventSink {
    fn publish(&self, _event: &DomainEvent) {}
}

/// Keeps published events in memory until drained.
#[derive(Default)]
pub struct CollectingEventSink {
    events: Mutex<Vec<DomainEvent>>,
}

impl CollectingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<DomainEvent> {
        match self.events.lock() {
            Ok(mut events) => std::mem::take(&mut *events),
            Err(poisoned) => std::mem::take(&mut *poisoned.into_inner()),
        }
    }
}

impl EventSink for CollectingEventSink {
    fn publish(&self, event: &DomainEvent) {
        match self.events.lock() {
            Ok(mut events) => events.push(*event),
            Err(poisoned) => poisoned.into_inner().push(*event),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(entity: EntityKind, id: i64, operation: ChangeOperation) -> DomainEvent {
        DomainEvent {
            entity,
            entity_id: id,
            operation,
        }
    }

    #[test]
    fn test_buffer_dedupes_and_keeps_order() {
        let mut buffer = EventBuffer::default();
        buffer.push(event(EntityKind::Release, 1, ChangeOperation::Update));
        buffer.push(event(EntityKind::TrackGroup, 3, ChangeOperation::Create));
        buffer.push(event(EntityKind::Release, 1, ChangeOperation::Update));
        buffer.push(event(EntityKind::Release, 1, ChangeOperation::Delete));

        assert_eq!(
            buffer.into_events(),
            vec![
                event(EntityKind::Release, 1, ChangeOperation::Update),
                event(EntityKind::TrackGroup, 3, ChangeOperation::Create),
                event(EntityKind::Release, 1, ChangeOperation::Delete),
            ]
        );
    }

    #[test]
    fn test_collecting_sink_drains() {
        let sink = CollectingEventSink::new();
        sink.publish(&event(EntityKind::Recording, 7, ChangeOperation::Create));
        assert_eq!(sink.drain().len(), 1);
        assert!(sink.drain().is_empty());
    }
}
