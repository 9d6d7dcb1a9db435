//! Request definitions
//!
//! Represents requests from clients.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Request kinds
///
/// Declaration order fixes the wire tag: SET=0, GET=1, STATS=2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestKind {
    Set,
    Get,
    Stats,
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestKind::Set => f.write_str("SET"),
            RequestKind::Get => f.write_str("GET"),
            RequestKind::Stats => f.write_str("STATS"),
        }
    }
}

/// A decoded request
///
/// `value` is only meaningful for SET and travels empty otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub kind: RequestKind,
    pub key: String,
    pub value: String,
}

impl Request {
    /// Store `value` under `key` unless the key already exists
    pub fn set(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind: RequestKind::Set,
            key: key.into(),
            value: value.into(),
        }
    }

    /// Fetch the value stored under `key`
    pub fn get(key: impl Into<String>) -> Self {
        Self {
            kind: RequestKind::Get,
            key: key.into(),
            value: String::new(),
        }
    }

    /// Report GET usage counters
    pub fn stats() -> Self {
        Self {
            kind: RequestKind::Stats,
            key: String::new(),
            value: String::new(),
        }
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            RequestKind::Set => write!(f, "SET Key: {} Value: {}", self.key, self.value),
            RequestKind::Get => write!(f, "GET Key: {}", self.key),
            RequestKind::Stats => f.write_str("STATS"),
        }
    }
}
