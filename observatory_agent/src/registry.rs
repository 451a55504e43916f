//! Live viewer sessions and the per-tick fan-out.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::debug;

use crate::types::Snapshot;

pub type SessionId = u64;

/// Outbound queue depth per session. A viewer further behind than this misses samples.
pub const SESSION_QUEUE_DEPTH: usize = 4;

pub type SnapshotSender = mpsc::Sender<Arc<Snapshot>>;
pub type SnapshotReceiver = mpsc::Receiver<Arc<Snapshot>>;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub skipped: usize,
}

#[derive(Default)]
struct Inner {
    sessions: HashMap<SessionId, SnapshotSender>,
    latest: Option<Arc<Snapshot>>,
}

/// The set of open sessions plus the most recent snapshot.
///
/// One mutex serializes register/unregister/broadcast; it is never held across an
/// await, and pushes are `try_send`s so a stalled viewer can't hold it up.
#[derive(Default)]
pub struct SessionRegistry {
    inner: Mutex<Inner>,
    next_id: AtomicU64,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fresh id; ids are never reused.
    pub fn allocate_id(&self) -> SessionId {
        self.next_id.fetch_add(1, Ordering::Relaxed) + 1
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Inner stays consistent even if a holder panicked.
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Adds a session and immediately pushes the latest snapshot, if any.
    /// Returns whether that initial push happened.
    pub fn register(&self, id: SessionId, tx: SnapshotSender) -> bool {
        let mut inner = self.lock();
        let pushed = match inner.latest.as_ref() {
            Some(latest) => tx.try_send(Arc::clone(latest)).is_ok(),
            None => false,
        };
        inner.sessions.insert(id, tx);
        debug!(session = id, live = inner.sessions.len(), "session registered");
        pushed
    }

    /// Idempotent; returns whether the session was present.
    pub fn unregister(&self, id: SessionId) -> bool {
        let mut inner = self.lock();
        let removed = inner.sessions.remove(&id).is_some();
        if removed {
            debug!(session = id, live = inner.sessions.len(), "session unregistered");
        }
        removed
    }

    /// Records `snapshot` as the latest and hands it to every writable session.
    ///
    /// Sessions whose writer is gone, or whose queue is full, are skipped; removal
    /// is left to the session's own close path.
    pub fn broadcast(&self, snapshot: Arc<Snapshot>) -> BroadcastReport {
        let mut inner = self.lock();
        inner.latest = Some(Arc::clone(&snapshot));
        let mut report = BroadcastReport::default();
        for (id, tx) in inner.sessions.iter() {
            if tx.is_closed() {
                report.skipped += 1;
                continue;
            }
            match tx.try_send(Arc::clone(&snapshot)) {
                Ok(()) => report.delivered += 1,
                Err(TrySendError::Full(_)) => {
                    debug!(session = *id, "viewer behind, dropping sample");
                    report.skipped += 1;
                }
                Err(TrySendError::Closed(_)) => report.skipped += 1,
            }
        }
        report
    }

    pub fn len(&self) -> usize {
        self.lock().sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, id: SessionId) -> bool {
        self.lock().sessions.contains_key(&id)
    }

    pub fn latest(&self) -> Option<Arc<Snapshot>> {
        self.lock().latest.clone()
    }
}
