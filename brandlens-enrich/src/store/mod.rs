//! In-memory task store
//!
//! The system of record polled by external callers. All tasks for this
//! process live behind one `RwLock`; every mutation holds the write lock for
//! its whole read-modify-write, so log appends are linearizable and callers
//! only ever observe committed snapshots. State is owned per process and
//! handed to workers by handle, never through globals.

use brandlens_common::events::{EventBus, TaskEvent};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::{ResultSummary, Task};

/// Shared handle to the task table
#[derive(Clone)]
pub struct TaskStore {
    tasks: Arc<RwLock<HashMap<Uuid, Task>>>,
    event_bus: EventBus,
}

impl TaskStore {
    pub fn new(event_bus: EventBus) -> Self {
        Self {
            tasks: Arc::new(RwLock::new(HashMap::new())),
            event_bus,
        }
    }

    /// Create a new pending task for the given input filename
    pub async fn create(&self, filename: &str) -> Task {
        let mut task = Task::new(filename);
        task.append_log("File received");
        task.append_log("Starting creator analysis...");

        let snapshot = task.clone();
        self.tasks.write().await.insert(task.task_id, task);

        self.event_bus.emit_lossy(TaskEvent::TaskCreated {
            task_id: snapshot.task_id,
            filename: snapshot.filename.clone(),
            timestamp: Utc::now(),
        });

        tracing::info!(task_id = %snapshot.task_id, filename = %snapshot.filename, "Task created");
        snapshot
    }

    /// Committed snapshot of one task
    pub async fn snapshot(&self, task_id: Uuid) -> Option<Task> {
        self.tasks.read().await.get(&task_id).cloned()
    }

    /// pending → processing
    pub async fn begin_processing(&self, task_id: Uuid, progress: &str) {
        let mut tasks = self.tasks.write().await;
        if let Some(task) = tasks.get_mut(&task_id) {
            if task.begin_processing(progress) {
                task.append_log(progress);
                self.event_bus.emit_lossy(TaskEvent::TaskStarted {
                    task_id,
                    timestamp: Utc::now(),
                });
            }
        }
    }

    /// Append one diagnostic log line
    pub async fn append_log(&self, task_id: Uuid, message: &str) {
        let mut tasks = self.tasks.write().await;
        if let Some(task) = tasks.get_mut(&task_id) {
            task.append_log(message);
        }
    }

    /// Update the current phase and mirror it into the log
    pub async fn set_progress(&self, task_id: Uuid, message: &str) {
        let mut tasks = self.tasks.write().await;
        if let Some(task) = tasks.get_mut(&task_id) {
            if task.set_progress(message) {
                task.append_log(message);
                self.event_bus.emit_lossy(TaskEvent::TaskProgress {
                    task_id,
                    message: message.to_string(),
                    timestamp: Utc::now(),
                });
            }
        }
    }

    /// processing → completed with results attached
    pub async fn complete(&self, task_id: Uuid, results: ResultSummary) -> bool {
        let total_processed = results.total_processed;
        let mut tasks = self.tasks.write().await;
        let Some(task) = tasks.get_mut(&task_id) else {
            return false;
        };
        if !task.complete(results) {
            return false;
        }
        task.append_log("Analysis complete");
        drop(tasks);

        self.event_bus.emit_lossy(TaskEvent::TaskCompleted {
            task_id,
            total_processed,
            timestamp: Utc::now(),
        });
        tracing::info!(task_id = %task_id, total_processed, "Task completed");
        true
    }

    /// processing → error with the cause attached
    pub async fn fail(&self, task_id: Uuid, error: &str) -> bool {
        let mut tasks = self.tasks.write().await;
        let Some(task) = tasks.get_mut(&task_id) else {
            return false;
        };
        if !task.fail(error) {
            return false;
        }
        task.append_log(format!("Error: {}", error));
        drop(tasks);

        self.event_bus.emit_lossy(TaskEvent::TaskFailed {
            task_id,
            error: error.to_string(),
            timestamp: Utc::now(),
        });
        tracing::error!(task_id = %task_id, error = %error, "Task failed");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TaskStatus;
    use tokio::task::JoinSet;

    fn store() -> TaskStore {
        TaskStore::new(EventBus::new(64))
    }

    #[tokio::test]
    async fn create_then_snapshot_round_trips() {
        let store = store();
        let task = store.create("creators.json").await;

        let snapshot = store.snapshot(task.task_id).await.unwrap();
        assert_eq!(snapshot.status, TaskStatus::Pending);
        assert_eq!(snapshot.filename, "creators.json");
        assert_eq!(snapshot.logs.len(), 2);
    }

    #[tokio::test]
    async fn unknown_task_has_no_snapshot() {
        let store = store();
        assert!(store.snapshot(Uuid::new_v4()).await.is_none());
    }

    #[tokio::test]
    async fn concurrent_appends_lose_nothing() {
        let store = store();
        let task = store.create("creators.json").await;
        let baseline = store.snapshot(task.task_id).await.unwrap().logs.len();

        let mut join_set = JoinSet::new();
        for i in 0..50 {
            let store = store.clone();
            let task_id = task.task_id;
            join_set.spawn(async move {
                store.append_log(task_id, &format!("worker log {}", i)).await;
            });
        }
        while let Some(result) = join_set.join_next().await {
            result.expect("append task panicked");
        }

        let snapshot = store.snapshot(task.task_id).await.unwrap();
        assert_eq!(snapshot.logs.len(), baseline + 50);
    }

    #[tokio::test]
    async fn first_terminal_outcome_wins() {
        let store = store();
        let task = store.create("creators.json").await;
        store.begin_processing(task.task_id, "working").await;

        assert!(store.complete(task.task_id, ResultSummary::default()).await);
        assert!(!store.fail(task.task_id, "late failure").await);
        assert!(!store.complete(task.task_id, ResultSummary::default()).await);

        let snapshot = store.snapshot(task.task_id).await.unwrap();
        assert_eq!(snapshot.status, TaskStatus::Completed);
        assert!(snapshot.error.is_none());
    }

    #[tokio::test]
    async fn completion_emits_a_task_event() {
        let bus = EventBus::new(16);
        let store = TaskStore::new(bus.clone());
        let mut rx = bus.subscribe();

        let task = store.create("creators.json").await;
        store.begin_processing(task.task_id, "working").await;
        store.complete(task.task_id, ResultSummary::default()).await;

        let mut saw_completed = false;
        while let Ok(event) = rx.try_recv() {
            if event.name() == "TaskCompleted" {
                saw_completed = true;
            }
        }
        assert!(saw_completed);
    }

    #[tokio::test]
    async fn progress_updates_are_ignored_after_terminal() {
        let store = store();
        let task = store.create("creators.json").await;
        store.begin_processing(task.task_id, "working").await;
        store.fail(task.task_id, "boom").await;

        let before = store.snapshot(task.task_id).await.unwrap();
        store.set_progress(task.task_id, "still going").await;
        let after = store.snapshot(task.task_id).await.unwrap();

        assert_eq!(after.progress, before.progress);
        assert_eq!(after.logs.len(), before.logs.len());
    }
}
