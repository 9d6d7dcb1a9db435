//! Dictionary Module
//!
//! The shared in-memory key-value store.
//!
//! ## Responsibilities
//! - Insert-if-absent SET, GET, and STATS
//! - GET usage counters (total and failed)
//! - Per-call atomicity under concurrent connections
//!
//! ## Data Structure Choice
//! One `parking_lot::Mutex` around the map and both counters:
//! - STATS must see counters consistent with every completed SET/GET
//! - Hold time is a single map access, never an I/O wait

mod store;

use std::fmt;

pub use store::Dictionary;

/// Message returned by a GET on a missing key
pub const KEY_NOT_FOUND: &str = "Key not found!";

/// Snapshot of the GET usage counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GetStats {
    /// Every GET ever served
    pub total: u64,

    /// GETs on a missing key
    pub failed: u64,
}

impl GetStats {
    pub fn successful(&self) -> u64 {
        self.total - self.failed
    }
}

impl fmt::Display for GetStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total Get operations: {}", self.total)?;
        writeln!(f, "\tSuccessful: {}", self.successful())?;
        writeln!(f, "\tFailed: {}", self.failed)
    }
}
