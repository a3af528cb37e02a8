//! Session registry for WebSocket connections
//!
//! Sessions are keyed by a stable [`SessionId`] handed out from an atomic
//! counter, never by socket identity. Each entry carries the optional
//! display identity, the subscription set, and the outgoing channel its
//! connection's writer task drains. Removing the entry drops the sender,
//! so any later send to that session is a no-op.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use ticker_core::{ProtocolError, ServerMessage, SupportedTickers, Ticker};
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Unique identifier for a WebSocket client connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub u64);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Server-side state for one live connection.
#[derive(Debug)]
struct SessionEntry {
    email: Option<String>,
    subscriptions: HashSet<Ticker>,
    outgoing: mpsc::Sender<ServerMessage>,
}

/// Registry of live sessions and the supported set they validate against.
///
/// Subscription state is advisory: broadcasts go to every live session
/// regardless of what it subscribed to. One session can never read or
/// mutate another's entry; every operation is keyed by the caller's own id.
pub struct SessionRegistry {
    /// Next session ID to assign
    next_session_id: AtomicU64,
    supported: SupportedTickers,
    sessions: DashMap<SessionId, SessionEntry>,
}

impl SessionRegistry {
    /// Create an empty registry over the given supported set.
    pub fn new(supported: SupportedTickers) -> Self {
        Self {
            next_session_id: AtomicU64::new(1),
            supported,
            sessions: DashMap::new(),
        }
    }

    /// The supported-ticker set.
    pub fn supported(&self) -> &SupportedTickers {
        &self.supported
    }

    /// Register a fresh session around the connection's outgoing channel.
    pub fn register(&self, outgoing: mpsc::Sender<ServerMessage>) -> SessionId {
        let id = SessionId(self.next_session_id.fetch_add(1, Ordering::SeqCst));
        self.sessions.insert(
            id,
            SessionEntry {
                email: None,
                subscriptions: HashSet::new(),
                outgoing,
            },
        );
        info!("{} connected", id);
        id
    }

    /// Remove a session immediately; later broadcasts can no longer reach it.
    pub fn deregister(&self, id: SessionId) {
        if self.sessions.remove(&id).is_some() {
            info!("{} disconnected", id);
        }
    }

    /// Store the opaque display identity for a session.
    pub fn identify(&self, id: SessionId, email: Option<String>) {
        if let Some(mut entry) = self.sessions.get_mut(&id) {
            entry.email = email;
        }
    }

    /// The identity previously stored with [`identify`](Self::identify).
    pub fn identity(&self, id: SessionId) -> Option<String> {
        self.sessions.get(&id).and_then(|entry| entry.email.clone())
    }

    /// Add `ticker` to the session's subscription set.
    ///
    /// Idempotent. Fails only for tickers outside the supported set,
    /// leaving the set untouched.
    pub fn subscribe(&self, id: SessionId, ticker: Ticker) -> Result<(), ProtocolError> {
        if !self.supported.contains(&ticker) {
            return Err(ProtocolError::UnsupportedTicker(ticker));
        }
        if let Some(mut entry) = self.sessions.get_mut(&id) {
            debug!("{} subscribed to {}", id, ticker);
            entry.subscriptions.insert(ticker);
        }
        Ok(())
    }

    /// Remove `ticker` from the session's subscription set. Idempotent.
    pub fn unsubscribe(&self, id: SessionId, ticker: &Ticker) {
        if let Some(mut entry) = self.sessions.get_mut(&id) {
            debug!("{} unsubscribed from {}", id, ticker);
            entry.subscriptions.remove(ticker);
        }
    }

    /// The session's current subscription set (membership only).
    pub fn subscriptions(&self, id: SessionId) -> HashSet<Ticker> {
        self.sessions
            .get(&id)
            .map(|entry| entry.subscriptions.clone())
            .unwrap_or_default()
    }

    /// Number of live sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Queue `message` for one session.
    ///
    /// A no-op when the session is gone or its channel is not writable.
    pub fn send(&self, id: SessionId, message: ServerMessage) {
        if let Some(entry) = self.sessions.get(&id) {
            let _ = entry.outgoing.try_send(message);
        }
    }

    /// Deliver the same `message` to every live session.
    ///
    /// Sessions whose channel is full or already closed are skipped
    /// silently; a skip never aborts delivery to the rest.
    pub fn broadcast_all(&self, message: &ServerMessage) {
        for entry in self.sessions.iter() {
            if entry.outgoing.try_send(message.clone()).is_err() {
                debug!("skipping unwritable {}", entry.key());
            }
        }
    }
}

impl std::fmt::Debug for SessionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRegistry")
            .field("session_count", &self.session_count())
            .finish()
    }
}
