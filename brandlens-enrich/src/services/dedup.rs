//! Per-task deduplication set
//!
//! One `DedupSet` exists per task and is shared by all of its workers. The
//! claim operation is the single atomic step deciding which worker owns a
//! dedup key; every later claim of the same key loses.

use std::collections::HashSet;
use std::sync::Mutex;

/// Set of claimed dedup keys for one task
#[derive(Debug, Default)]
pub struct DedupSet {
    claimed: Mutex<HashSet<String>>,
}

impl DedupSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim a key; true exactly once per distinct key
    ///
    /// The lock is held for the whole test-and-insert, so no two workers can
    /// both win the same key.
    pub fn claim(&self, key: &str) -> bool {
        let key = key.trim();
        if key.is_empty() {
            return false;
        }
        let mut claimed = self.claimed.lock().expect("dedup set lock poisoned");
        claimed.insert(key.to_string())
    }

    /// Number of claimed keys so far
    pub fn len(&self) -> usize {
        self.claimed.lock().expect("dedup set lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
