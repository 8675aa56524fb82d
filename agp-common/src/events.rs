//! Event types for the AutoGenre event system
//!
//! Provides the shared event definitions and the EventBus used to push pass
//! progress to the presentation layer (SSE clients).

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Kind of traversal currently running over the inventory
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PassKind {
    /// No pass running
    Idle,
    /// Folder traversal and tag reading
    Scanning,
    /// Provider lookups and ranking per file
    Resolving,
    /// Tag writes, renames and folder moves
    Applying,
}

/// AutoGenre event types
///
/// Events are broadcast via EventBus and serialized for SSE transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum AgpEvent {
    /// A pass started over the inventory
    PassStarted {
        pass_id: Uuid,
        pass: PassKind,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Progress or status changed
    ///
    /// Emitted after every file of a pass, never batched.
    ProgressUpdate {
        pass_id: Uuid,
        pass: PassKind,
        /// 0.0 - 100.0, non-decreasing within a pass
        progress: f64,
        status: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Resolution pass finished (or was cancelled)
    ResolutionCompleted {
        pass_id: Uuid,
        total_files: usize,
        resolved: usize,
        skipped: usize,
        failed: usize,
        cancelled: bool,
        status: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Apply pass finished (or was cancelled)
    ApplyCompleted {
        pass_id: Uuid,
        success_count: usize,
        organized_count: usize,
        failure_count: usize,
        errors: Vec<String>,
        cancelled: bool,
        message: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Pass aborted before processing files (scan boundary or settings failure)
    PassFailed {
        pass_id: Uuid,
        pass: PassKind,
        error: String,
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl AgpEvent {
    /// Event name used as the SSE `event:` field
    pub fn event_type(&self) -> &'static str {
        match self {
            AgpEvent::PassStarted { .. } => "PassStarted",
            AgpEvent::ProgressUpdate { .. } => "ProgressUpdate",
            AgpEvent::ResolutionCompleted { .. } => "ResolutionCompleted",
            AgpEvent::ApplyCompleted { .. } => "ApplyCompleted",
            AgpEvent::PassFailed { .. } => "PassFailed",
        }
    }
}

/// Broadcast channel for AgpEvent
///
/// Cloning is cheap; all clones share the same channel.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<AgpEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events to buffer before lagging receivers drop old events
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<AgpEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    #[allow(clippy::result_large_err)]
    pub fn emit(&self, event: AgpEvent) -> Result<usize, broadcast::error::SendError<AgpEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: AgpEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscriber_receives_emitted_event() {
        let bus = EventBus::new(10);
        let mut rx = bus.subscribe();

        let pass_id = Uuid::new_v4();
        bus.emit(AgpEvent::PassStarted {
            pass_id,
            pass: PassKind::Resolving,
            timestamp: chrono::Utc::now(),
        })
        .unwrap();

        match rx.recv().await.unwrap() {
            AgpEvent::PassStarted { pass_id: got, pass, .. } => {
                assert_eq!(got, pass_id);
                assert_eq!(pass, PassKind::Resolving);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_emit_without_subscribers() {
        let bus = EventBus::new(10);
        assert_eq!(bus.subscriber_count(), 0);

        let event = AgpEvent::PassFailed {
            pass_id: Uuid::new_v4(),
            pass: PassKind::Scanning,
            error: "Path not found".to_string(),
            timestamp: chrono::Utc::now(),
        };
        assert!(bus.emit(event.clone()).is_err());
        bus.emit_lossy(event);
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = AgpEvent::ProgressUpdate {
            pass_id: Uuid::nil(),
            pass: PassKind::Applying,
            progress: 42.0,
            status: "Applying".to_string(),
            timestamp: chrono::Utc::now(),
        };

        let json: serde_json::Value = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "ProgressUpdate");
        assert_eq!(json["pass"], "APPLYING");
        assert_eq!(json["progress"], 42.0);
        assert_eq!(event.event_type(), "ProgressUpdate");
    }
}
