//! # dictkv
//!
//! A minimal network dictionary service with:
//! - Insert-if-absent SET, GET and STATS over a shared in-memory map
//! - GET usage counters kept consistent under one lock
//! - Length-delimited binary TCP protocol
//! - One request per connection by default, persistent sessions on request
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       TCP Listener                           │
//! │              (accept loop, re-armed per accept)              │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ Connection (owns socket + buffers)
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                      Worker Pool                             │
//! │         read frame → decode → dispatch → encode → write      │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!                       ▼
//!               ┌──────────────┐
//!               │  Dictionary  │
//!               │   (Mutex)    │
//!               └──────────────┘
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod protocol;
pub mod dictionary;
pub mod network;
pub mod client;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{DictError, Result};
pub use config::{ClientConfig, ServerConfig, SessionMode};
pub use dictionary::Dictionary;
pub use protocol::{Request, RequestKind, Response, Status};
pub use network::{Listener, ServerHandle};
pub use client::ClientSession;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of dictkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
