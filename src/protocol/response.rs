//! Response definitions
//!
//! Represents responses to clients.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Response status codes
///
/// Declaration order fixes the wire tag: SUCCESS=0, FAILURE=1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Status {
    Success,
    Failure,
}

/// A response to send to client
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    /// Status code
    pub status: Status,

    /// Value for a GET hit, error text on failure, or the stats report
    pub message: String,
}

impl Response {
    /// Create a SUCCESS response
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            status: Status::Success,
            message: message.into(),
        }
    }

    /// Create a FAILURE response
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            status: Status::Failure,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }
}

impl fmt::Display for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let status = match self.status {
            Status::Success => "SUCCESS",
            Status::Failure => "FAILURE",
        };
        write!(f, "{} Message: {}", status, self.message)
    }
}
