//! One viewer connection: Connecting → Open → Closed.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::registry::{SessionId, SessionRegistry, SnapshotReceiver, SESSION_QUEUE_DEPTH};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Open,
    Closed,
}

/// Registry membership tied to a session's lifetime. Dropping an open session
/// closes it, so a cancelled connection task can't leak a registry entry.
pub struct Session {
    id: SessionId,
    state: SessionState,
    registry: Arc<SessionRegistry>,
}

impl Session {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self {
            id: registry.allocate_id(),
            state: SessionState::Connecting,
            registry,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Handshake done: registers with the registry and returns the queue the
    /// snapshots will arrive on. `None` unless the session was still connecting.
    pub fn open(&mut self) -> Option<SnapshotReceiver> {
        if self.state != SessionState::Connecting {
            return None;
        }
        let (tx, rx) = mpsc::channel(SESSION_QUEUE_DEPTH);
        self.state = SessionState::Open;
        self.registry.register(self.id, tx);
        Some(rx)
    }

    /// Terminal. Repeated calls do nothing.
    pub fn close(&mut self) {
        if self.state == SessionState::Open {
            self.registry.unregister(self.id);
        }
        self.state = SessionState::Closed;
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.close();
    }
}

/// Drives an upgraded WebSocket until the viewer leaves or the transport fails.
///
/// Viewers are receive-only: inbound text/binary frames are ignored.
pub async fn run_session(socket: WebSocket, registry: Arc<SessionRegistry>) {
    let mut session = Session::new(registry.clone());
    let Some(mut outbound) = session.open() else {
        return;
    };
    info!(session = session.id(), live = registry.len(), "viewer connected");

    let (mut sink, mut inbound) = socket.split();
    loop {
        tokio::select! {
            next = outbound.recv() => {
                let Some(snapshot) = next else { break };
                let json = match snapshot.to_json() {
                    Ok(js) => js,
                    Err(e) => {
                        warn!("snapshot serialization failed: {e}");
                        continue;
                    }
                };
                if let Err(e) = sink.send(Message::Text(json)).await {
                    debug!(session = session.id(), "write failed: {e}");
                    break;
                }
            }
            frame = inbound.next() => match frame {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(e)) => {
                    debug!(session = session.id(), "transport error: {e}");
                    break;
                }
                Some(Ok(_)) => {}
            },
        }
    }

    session.close();
    let _ = sink.close().await;
    info!(session = session.id(), live = registry.len(), "viewer disconnected");
}
