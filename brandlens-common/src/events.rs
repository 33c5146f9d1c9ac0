//! Task event types and the broadcast event bus
//!
//! Completion signaling is push-based internally: the pipeline emits events
//! here, and the HTTP poll response is derived from task-store snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Task lifecycle events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum TaskEvent {
    /// Task accepted and queued
    TaskCreated {
        task_id: Uuid,
        filename: String,
        timestamp: DateTime<Utc>,
    },

    /// Pipeline started processing
    TaskStarted {
        task_id: Uuid,
        timestamp: DateTime<Utc>,
    },

    /// Progress message appended to the task log
    TaskProgress {
        task_id: Uuid,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// Task reached the completed state
    TaskCompleted {
        task_id: Uuid,
        total_processed: u64,
        timestamp: DateTime<Utc>,
    },

    /// Task reached the error state
    TaskFailed {
        task_id: Uuid,
        error: String,
        timestamp: DateTime<Utc>,
    },
}

impl TaskEvent {
    /// Event name used for SSE event types
    pub fn name(&self) -> &'static str {
        match self {
            TaskEvent::TaskCreated { .. } => "TaskCreated",
            TaskEvent::TaskStarted { .. } => "TaskStarted",
            TaskEvent::TaskProgress { .. } => "TaskProgress",
            TaskEvent::TaskCompleted { .. } => "TaskCompleted",
            TaskEvent::TaskFailed { .. } => "TaskFailed",
        }
    }
}

/// Broadcast bus for task events
///
/// Cloning is cheap; all clones share the same channel.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<TaskEvent>,
}

impl EventBus {
    /// Create a new bus with the given buffered capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<TaskEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    pub fn emit(
        &self,
        event: TaskEvent,
    ) -> Result<usize, broadcast::error::SendError<TaskEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring the case where no subscriber is listening
    pub fn emit_lossy(&self, event: TaskEvent) {
        if self.tx.send(event).is_err() {
            tracing::trace!("No subscribers for task event");
        }
    }
}
