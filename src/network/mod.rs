//! Network Module
//!
//! TCP server and connection handling.
//!
//! ## Architecture
//! - Single acceptor thread
//! - Worker thread pool for connections
//! - Requests routed through the shared Dictionary

mod listener;
mod connection;
mod pool;
mod registry;

pub use listener::{Listener, ServerHandle, ShutdownHandle};
pub use connection::{Connection, ConnectionState};
pub use pool::WorkerPool;
pub use registry::{ConnectionEntry, ConnectionId, ConnectionRegistry, ConnectionTicket};
