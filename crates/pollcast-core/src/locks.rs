use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-poll async locks serialising vote application within this process.
///
/// Entries are created on first use and kept for the life of the process.
/// Callers lock only ids of stored polls, and polls are never deleted, so the
/// table is bounded by the number of polls.
#[derive(Clone, Default)]
pub struct PollLocks {
    inner: Arc<DashMap<String, Arc<Mutex<()>>>>,
}

impl PollLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn lock(&self, poll_id: &str) -> OwnedMutexGuard<()> {
        let mutex = self
            .inner
            .entry(poll_id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        mutex.lock_owned().await
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
