//! Active crawl session registry
//!
//! An explicit, injectable store mapping a session id to its in-flight
//! crawl. The orchestrator registers each batch of spawned tasks here as
//! the crawl advances between phases; a cancellation request removes the
//! entry and aborts the current batch. Registry presence is the whole
//! cancellation protocol: the orchestrator checks it at every phase
//! boundary and treats absence as "stopped by request".
//!
//! The map is shared between the orchestrator task and whichever task
//! issues the cancel, so all access goes through one mutex.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::task::AbortHandle;

/// Identifies one crawl session (e.g., the requesting chat id)
pub type SessionId = i64;

/// The currently outstanding task batch for one crawl
#[derive(Debug, Default)]
struct CrawlHandle {
    batch: Vec<AbortHandle>,
}

/// Shared registry of active crawl sessions
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<Mutex<HashMap<SessionId, CrawlHandle>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new session; false if one is already active under this id
    pub fn begin(&self, session: SessionId) -> bool {
        let mut map = self.inner.lock().unwrap();
        if map.contains_key(&session) {
            return false;
        }
        map.insert(session, CrawlHandle::default());
        true
    }

    /// Whether the session is still registered (i.e., not cancelled)
    pub fn is_active(&self, session: SessionId) -> bool {
        self.inner.lock().unwrap().contains_key(&session)
    }

    /// Replaces the session's outstanding batch
    ///
    /// Returns false if the session has been cancelled in the meantime;
    /// the caller must then abort the batch itself and stop.
    pub fn set_batch(&self, session: SessionId, handles: Vec<AbortHandle>) -> bool {
        match self.inner.lock().unwrap().get_mut(&session) {
            Some(handle) => {
                handle.batch = handles;
                true
            }
            None => false,
        }
    }

    /// Cancels an active session
    ///
    /// Removes the entry and aborts every outstanding task of the current
    /// batch. Returns true if a crawl existed and was cancelled.
    pub fn cancel(&self, session: SessionId) -> bool {
        let removed = self.inner.lock().unwrap().remove(&session);
        match removed {
            Some(handle) => {
                tracing::info!("Cancelling crawl session {}", session);
                for task in handle.batch {
                    task.abort();
                }
                true
            }
            None => false,
        }
    }

    /// Removes a session on normal completion, keeping its tasks alive
    pub fn finish(&self, session: SessionId) -> bool {
        self.inner.lock().unwrap().remove(&session).is_some()
    }

    /// Number of currently active sessions
    pub fn active_count(&self) -> usize {
        self.inner.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_begin_is_exclusive() {
        let registry = SessionRegistry::new();
        assert!(registry.begin(1));
        assert!(!registry.begin(1));
        assert!(registry.begin(2));
        assert_eq!(registry.active_count(), 2);
    }

    #[test]
    fn test_cancel_removes_entry() {
        let registry = SessionRegistry::new();
        registry.begin(1);
        assert!(registry.is_active(1));
        assert!(registry.cancel(1));
        assert!(!registry.is_active(1));
        // A second cancel finds nothing
        assert!(!registry.cancel(1));
    }

    #[test]
    fn test_set_batch_after_cancel_fails() {
        let registry = SessionRegistry::new();
        registry.begin(7);
        registry.cancel(7);
        assert!(!registry.set_batch(7, Vec::new()));
    }

    #[test]
    fn test_finish_removes_entry() {
        let registry = SessionRegistry::new();
        registry.begin(3);
        assert!(registry.finish(3));
        assert!(!registry.finish(3));
        assert_eq!(registry.active_count(), 0);
    }

    #[tokio::test]
    async fn test_cancel_aborts_batch() {
        let registry = SessionRegistry::new();
        registry.begin(1);

        let mut tasks = tokio::task::JoinSet::new();
        let handle = tasks.spawn(async {
            tokio::time::sleep(std::time::Duration::from_secs(60)).await;
        });
        assert!(registry.set_batch(1, vec![handle]));

        assert!(registry.cancel(1));
        let joined = tasks.join_next().await.unwrap();
        assert!(joined.unwrap_err().is_cancelled());
    }

    #[test]
    fn test_clones_share_state() {
        let registry = SessionRegistry::new();
        let clone = registry.clone();
        registry.begin(9);
        assert!(clone.is_active(9));
        clone.cancel(9);
        assert!(!registry.is_active(9));
    }
}
