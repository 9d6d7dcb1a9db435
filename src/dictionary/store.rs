//! Dictionary implementation
//!
//! HashMap-based store with a single Mutex for concurrency.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use parking_lot::Mutex;

use super::{GetStats, KEY_NOT_FOUND};
use crate::protocol::{Request, RequestKind, Response};

/// Shared key-value store
///
/// Every operation takes the lock for its whole duration and returns a
/// [`Response`]; none of them fail at the Rust level.
pub struct Dictionary {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    entries: HashMap<String, String>,
    stats: GetStats,
}

impl Dictionary {
    /// Create a new empty Dictionary
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Route a request to the matching operation
    pub fn execute(&self, request: Request) -> Response {
        match request.kind {
            RequestKind::Set => self.set(request.key, request.value),
            RequestKind::Get => self.get(&request.key),
            RequestKind::Stats => self.stats(),
        }
    }

    /// Insert `value` under `key` if the key is absent
    ///
    /// An existing key is left untouched and the call reports FAILURE.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) -> Response {
        let mut inner = self.inner.lock();
        match inner.entries.entry(key.into()) {
            Entry::Vacant(slot) => {
                slot.insert(value.into());
                Response::success("")
            }
            Entry::Occupied(_) => Response::failure(""),
        }
    }

    /// Look up `key`, counting the call in the GET statistics
    pub fn get(&self, key: &str) -> Response {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        inner.stats.total += 1;

        match inner.entries.get(key) {
            Some(value) => Response::success(value.clone()),
            None => {
                inner.stats.failed += 1;
                Response::failure(KEY_NOT_FOUND)
            }
        }
    }

    /// Report the GET usage counters
    pub fn stats(&self) -> Response {
        Response::success(self.get_stats().to_string())
    }

    /// Snapshot of the GET counters
    pub fn get_stats(&self) -> GetStats {
        self.inner.lock().stats
    }

    /// Number of stored keys
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }
}

impl Default for Dictionary {
    fn default() -> Self {
        Self::new()
    }
}
