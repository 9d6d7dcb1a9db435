//! TCP Listener
//!
//! Accepts connections and dispatches them to worker threads.

use std::io;
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use super::pool::WorkerPool;
use super::registry::ConnectionRegistry;
use super::Connection;
use crate::config::ServerConfig;
use crate::dictionary::Dictionary;
use crate::error::{DictError, Result};

/// TCP listener for dictkv
///
/// Every accepted socket becomes a [`Connection`] sharing the one
/// [`Dictionary`]. There is no connection limit: the worker pool starts a
/// new worker whenever every existing one is busy, so a stalled client only
/// ever holds its own connection.
pub struct Listener {
    config: ServerConfig,
    listener: TcpListener,
    local_addr: SocketAddr,
    dictionary: Arc<Dictionary>,
    registry: Arc<ConnectionRegistry>,
    pool: WorkerPool,
    shutdown: ShutdownHandle,
}

impl Listener {
    /// Bind the configured address and start the worker pool
    pub fn bind(config: ServerConfig, dictionary: Arc<Dictionary>) -> Result<Self> {
        let listener = TcpListener::bind(config.listen_addr.as_str())?;
        // Non-blocking so an idle loop can notice shutdown
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;
        let pool = WorkerPool::new(config.workers)?;

        Ok(Self {
            config,
            listener,
            local_addr,
            dictionary,
            registry: Arc::new(ConnectionRegistry::new()),
            pool,
            shutdown: ShutdownHandle::default(),
        })
    }

    /// Bind and run the accept loop on a background thread
    pub fn spawn(config: ServerConfig, dictionary: Arc<Dictionary>) -> Result<ServerHandle> {
        let listener = Self::bind(config, dictionary)?;
        let local_addr = listener.local_addr();
        let shutdown = listener.shutdown_handle();
        let registry = listener.registry();
        let dictionary = listener.dictionary();

        let thread = thread::Builder::new()
            .name("dictkv-listener".to_string())
            .spawn(move || listener.run())?;

        Ok(ServerHandle {
            local_addr,
            shutdown,
            registry,
            dictionary,
            thread: Some(thread),
        })
    }

    /// Accept connections until shutdown is requested (blocking)
    ///
    /// A failed accept is logged and the loop carries on. On shutdown the
    /// worker pool is dropped, which waits for in-flight connections.
    pub fn run(self) -> Result<()> {
        tracing::info!("Listening on {}", self.local_addr);

        while !self.shutdown.is_shutdown() {
            match self.listener.accept() {
                Ok((stream, peer)) => self.handle_accept(stream, peer),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                    thread::sleep(self.config.accept_poll_interval);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => {
                    tracing::warn!("Accept failed on {}: {}", self.local_addr, e);
                }
            }
        }

        tracing::info!(
            "Listener on {} stopped, waiting for {} active connections",
            self.local_addr,
            self.registry.active()
        );
        Ok(())
    }

    fn handle_accept(&self, stream: TcpStream, peer: SocketAddr) {
        // Some platforms hand out sockets that inherit the listener's non-blocking flag
        if let Err(e) = stream.set_nonblocking(false) {
            tracing::warn!("Failed to configure socket from {}: {}", peer, e);
            return;
        }

        let connection = match Connection::new(
            stream,
            Arc::clone(&self.dictionary),
            &self.registry,
            &self.config,
        ) {
            Ok(connection) => connection,
            Err(e) => {
                tracing::warn!("Failed to set up connection from {}: {}", peer, e);
                return;
            }
        };

        let id = connection.id();
        tracing::debug!(conn = id, "Accepted connection from {}", peer);

        let job = move || {
            if let Err(e) = connection.start() {
                tracing::warn!(conn = id, "Connection from {} closed with error: {}", peer, e);
            }
        };
        if let Err(e) = self.pool.spawn(job) {
            tracing::warn!(conn = id, "Failed to dispatch connection from {}: {}", peer, e);
        }
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn dictionary(&self) -> Arc<Dictionary> {
        Arc::clone(&self.dictionary)
    }

    pub fn registry(&self) -> Arc<ConnectionRegistry> {
        Arc::clone(&self.registry)
    }

    /// Handle that stops the accept loop from another thread
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }
}

/// Shared flag that stops an accept loop
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
}

impl ShutdownHandle {
    /// Signal the listener to stop accepting
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// A listener running on its own thread
///
/// Dropping the handle stops the listener and waits for it.
pub struct ServerHandle {
    local_addr: SocketAddr,
    shutdown: ShutdownHandle,
    registry: Arc<ConnectionRegistry>,
    dictionary: Arc<Dictionary>,
    thread: Option<JoinHandle<Result<()>>>,
}

impl ServerHandle {
    /// Address the listener is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn registry(&self) -> Arc<ConnectionRegistry> {
        Arc::clone(&self.registry)
    }

    pub fn dictionary(&self) -> Arc<Dictionary> {
        Arc::clone(&self.dictionary)
    }

    /// Stop accepting, wait for in-flight connections, and join the listener thread
    pub fn shutdown(mut self) -> Result<()> {
        self.stop()
    }

    fn stop(&mut self) -> Result<()> {
        self.shutdown.shutdown();
        match self.thread.take() {
            Some(thread) => thread.join().map_err(|_| {
                DictError::Io(io::Error::new(io::ErrorKind::Other, "listener thread panicked"))
            })?,
            None => Ok(()),
        }
    }
}

impl Drop for ServerHandle {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            tracing::warn!("Listener on {} stopped with error: {}", self.local_addr, e);
        }
    }
}
