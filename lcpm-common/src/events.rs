//! Event types for the LCPM event system
//!
//! Provides the shared event enum and EventBus. Events are broadcast
//! in-process and serialized for SSE transmission to connected clients.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// LCPM event types
///
/// Events are broadcast via EventBus and can be serialized for SSE
/// transmission. All events carry the project they belong to so clients
/// can filter streams per project view.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum LcpmEvent {
    /// A task was created (individually, not via bulk generation)
    TaskCreated {
        task_id: Uuid,
        project_id: Uuid,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A task's fields changed (status, progress, dates, ...)
    TaskUpdated {
        task_id: Uuid,
        project_id: Uuid,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A task was deleted
    TaskDeleted {
        task_id: Uuid,
        project_id: Uuid,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A bulk generation run finished
    ///
    /// Emitted once per run with the final counts, after all inserts.
    TasksGenerated {
        project_id: Uuid,
        created_count: usize,
        skipped_count: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Sibling weights were redistributed under a parent scope
    WeightsDistributed {
        project_id: Uuid,
        /// Hierarchy level the siblings belong to ("grades", "books",
        /// "units", "lessons", or "stages")
        level: String,
        sibling_count: usize,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl LcpmEvent {
    /// Get event type as string for SSE event naming and filtering
    pub fn event_type(&self) -> &'static str {
        match self {
            LcpmEvent::TaskCreated { .. } => "TaskCreated",
            LcpmEvent::TaskUpdated { .. } => "TaskUpdated",
            LcpmEvent::TaskDeleted { .. } => "TaskDeleted",
            LcpmEvent::TasksGenerated { .. } => "TasksGenerated",
            LcpmEvent::WeightsDistributed { .. } => "WeightsDistributed",
        }
    }

    /// Project the event belongs to
    pub fn project_id(&self) -> Uuid {
        match self {
            LcpmEvent::TaskCreated { project_id, .. }
            | LcpmEvent::TaskUpdated { project_id, .. }
            | LcpmEvent::TaskDeleted { project_id, .. }
            | LcpmEvent::TasksGenerated { project_id, .. }
            | LcpmEvent::WeightsDistributed { project_id, .. } => *project_id,
        }
    }
}

/// Central event distribution bus for application-wide events
///
/// Wraps tokio::broadcast, providing:
/// - Non-blocking publish (slow subscribers don't block producers)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
/// - Lagged message detection for slow subscribers
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<LcpmEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with the given channel capacity
    ///
    /// Events beyond capacity overwrite the oldest buffered events;
    /// slow subscribers observe a lag error rather than blocking emitters.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<LcpmEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists,
    /// `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: LcpmEvent,
    ) -> Result<usize, broadcast::error::SendError<LcpmEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring whether anyone is listening
    ///
    /// Used for notification events where a missed delivery is acceptable
    /// (clients resynchronize from GET endpoints on reconnect).
    pub fn emit_lossy(&self, event: LcpmEvent) {
        let _ = self.tx.send(event);
    }

    /// Current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn generated_event() -> LcpmEvent {
        LcpmEvent::TasksGenerated {
            project_id: Uuid::new_v4(),
            created_count: 6,
            skipped_count: 0,
            timestamp: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_eventbus_new() {
        let bus = EventBus::new(100);
        assert_eq!(bus.capacity(), 100);
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_eventbus_emit_and_receive() {
        let bus = EventBus::new(10);
        let mut rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        bus.emit(generated_event()).expect("emit should succeed");

        let received = rx.try_recv().expect("Should receive event");
        assert_eq!(received.event_type(), "TasksGenerated");
    }

    #[test]
    fn test_eventbus_emit_lossy_without_subscribers() {
        let bus = EventBus::new(2);
        // No subscribers; must not panic or error
        bus.emit_lossy(generated_event());
        assert_eq!(bus.subscriber_count(), 0);
    }

    #[test]
    fn test_multiple_subscribers_receive_same_event() {
        let bus = EventBus::new(10);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        let task_id = Uuid::new_v4();
        let project_id = Uuid::new_v4();
        bus.emit(LcpmEvent::TaskCreated {
            task_id,
            project_id,
            timestamp: chrono::Utc::now(),
        })
        .expect("emit should succeed");

        let r1 = rx1.try_recv().expect("rx1 should receive");
        let r2 = rx2.try_recv().expect("rx2 should receive");
        assert_eq!(r1.event_type(), "TaskCreated");
        assert_eq!(r2.project_id(), project_id);
    }

    #[test]
    fn test_event_serialization_tags_type() {
        let event = LcpmEvent::WeightsDistributed {
            project_id: Uuid::new_v4(),
            level: "lessons".to_string(),
            sibling_count: 4,
            timestamp: chrono::Utc::now(),
        };

        let json = serde_json::to_string(&event).expect("serialization should succeed");
        assert!(json.contains("\"type\":\"WeightsDistributed\""));
        assert!(json.contains("\"level\":\"lessons\""));

        let back: LcpmEvent = serde_json::from_str(&json).expect("deserialization should succeed");
        assert_eq!(back.event_type(), "WeightsDistributed");
    }
}
