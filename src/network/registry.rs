//! Connection Registry
//!
//! Owning registry of live connections, keyed by connection id.
//!
//! A [`Connection`](super::Connection) holds the [`ConnectionTicket`] it got
//! at registration. The entry disappears when the ticket drops, which only
//! happens once the connection itself is dropped, after its last read or
//! write has returned.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;

use super::ConnectionState;

/// Identifier assigned to each accepted connection
pub type ConnectionId = u64;

/// Registry view of one live connection
#[derive(Debug, Clone)]
pub struct ConnectionEntry {
    pub id: ConnectionId,
    pub peer_addr: String,
    pub state: ConnectionState,
    pub opened_at: Instant,
}

/// Tracks every live connection on a listener
#[derive(Debug)]
pub struct ConnectionRegistry {
    next_id: AtomicU64,
    total_accepted: AtomicU64,
    live: Mutex<HashMap<ConnectionId, ConnectionEntry>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            total_accepted: AtomicU64::new(0),
            live: Mutex::new(HashMap::new()),
        }
    }

    /// Register a new connection in the `Idle` state
    pub fn register(self: &Arc<Self>, peer_addr: impl Into<String>) -> ConnectionTicket {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.total_accepted.fetch_add(1, Ordering::Relaxed);

        let entry = ConnectionEntry {
            id,
            peer_addr: peer_addr.into(),
            state: ConnectionState::Idle,
            opened_at: Instant::now(),
        };
        self.live.lock().insert(id, entry);

        ConnectionTicket {
            id,
            registry: Arc::clone(self),
        }
    }

    /// Number of live connections
    pub fn active(&self) -> usize {
        self.live.lock().len()
    }

    /// Connections registered since the registry was created
    pub fn total_accepted(&self) -> u64 {
        self.total_accepted.load(Ordering::Relaxed)
    }

    /// Current state of a live connection
    pub fn state_of(&self, id: ConnectionId) -> Option<ConnectionState> {
        self.live.lock().get(&id).map(|entry| entry.state)
    }

    /// Copy of all live entries, ordered by id
    pub fn snapshot(&self) -> Vec<ConnectionEntry> {
        let mut entries: Vec<_> = self.live.lock().values().cloned().collect();
        entries.sort_by_key(|entry| entry.id);
        entries
    }

    fn update(&self, id: ConnectionId, state: ConnectionState) {
        if let Some(entry) = self.live.lock().get_mut(&id) {
            entry.state = state;
        }
    }

    fn remove(&self, id: ConnectionId) {
        self.live.lock().remove(&id);
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Proof of registration; removes the entry on drop
#[derive(Debug)]
pub struct ConnectionTicket {
    id: ConnectionId,
    registry: Arc<ConnectionRegistry>,
}

impl ConnectionTicket {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Publish a state transition
    pub fn set_state(&self, state: ConnectionState) {
        self.registry.update(self.id, state);
    }
}

impl Drop for ConnectionTicket {
    fn drop(&mut self) {
        self.registry.remove(self.id);
    }
}
