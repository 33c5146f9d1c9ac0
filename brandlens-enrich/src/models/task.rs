//! Analysis task state machine
//!
//! A task progresses `pending → processing → (completed | error)`. Transitions
//! are one-directional; any mutation attempted after a terminal state is a
//! logged no-op so concurrent finalization attempts stay idempotent.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::ResultSummary;

/// Task lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    /// Created, pipeline not yet running
    Pending,
    /// Pipeline running
    Processing,
    /// Finished with results attached
    Completed,
    /// Finished with an error cause attached
    Error,
}

/// One timestamped, append-only log line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskLogEntry {
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

/// One submitted analysis job
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub task_id: Uuid,
    /// Original input filename, used for artifact naming
    pub filename: String,
    pub status: TaskStatus,
    /// Human-readable current phase
    pub progress: String,
    /// Ordered diagnostic log; insertion order is meaningful
    pub logs: Vec<TaskLogEntry>,
    /// Present only when status == completed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<ResultSummary>,
    /// Present only when status == error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Create a new pending task
    pub fn new(filename: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            task_id: Uuid::new_v4(),
            filename: filename.into(),
            status: TaskStatus::Pending,
            progress: "Waiting to start...".to_string(),
            logs: Vec::new(),
            results: None,
            error: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the task has reached a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self.status, TaskStatus::Completed | TaskStatus::Error)
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Append one log line (no state change)
    pub fn append_log(&mut self, message: impl Into<String>) {
        self.logs.push(TaskLogEntry {
            timestamp: Utc::now(),
            message: message.into(),
        });
        self.touch();
    }

    /// pending → processing
    ///
    /// Returns false when the task is already terminal.
    pub fn begin_processing(&mut self, progress: impl Into<String>) -> bool {
        if self.is_terminal() {
            tracing::warn!(task_id = %self.task_id, status = ?self.status, "Ignoring start on terminal task");
            return false;
        }
        self.status = TaskStatus::Processing;
        self.progress = progress.into();
        self.touch();
        true
    }

    /// Update the human-readable phase (processing only)
    pub fn set_progress(&mut self, progress: impl Into<String>) -> bool {
        if self.is_terminal() {
            tracing::warn!(task_id = %self.task_id, status = ?self.status, "Ignoring progress update on terminal task");
            return false;
        }
        self.progress = progress.into();
        self.touch();
        true
    }

    /// processing → completed; attaches the result summary
    pub fn complete(&mut self, results: ResultSummary) -> bool {
        if self.is_terminal() {
            tracing::warn!(task_id = %self.task_id, status = ?self.status, "Ignoring complete on terminal task");
            return false;
        }
        self.status = TaskStatus::Completed;
        self.progress = "Analysis complete".to_string();
        self.results = Some(results);
        self.error = None;
        self.touch();
        true
    }

    /// processing → error; attaches the error cause
    pub fn fail(&mut self, error: impl Into<String>) -> bool {
        if self.is_terminal() {
            tracing::warn!(task_id = %self.task_id, status = ?self.status, "Ignoring fail on terminal task");
            return false;
        }
        let error = error.into();
        self.status = TaskStatus::Error;
        self.progress = format!("Analysis failed: {}", error);
        self.error = Some(error);
        self.results = None;
        self.touch();
        true
    }
}
