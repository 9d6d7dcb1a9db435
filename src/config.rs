//! Configuration for dictkv
//!
//! Centralized configuration with sensible defaults.

use std::time::Duration;

use crate::error::{DictError, Result};

/// Protocol default port. Binding it usually needs elevated privilege.
pub const DEFAULT_PORT: u16 = 80;

/// Default socket read/write timeout
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_millis(5000);

/// How many requests a connection serves before it closes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionMode {
    /// Read one request, write one response, close.
    #[default]
    SingleShot,

    /// Re-arm the read after every response until the peer closes.
    Persistent,
}

/// Server-side configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// TCP listen address
    pub listen_addr: String,

    /// Interval at which an idle accept loop checks for shutdown
    pub accept_poll_interval: Duration,

    // -------------------------------------------------------------------------
    // Connection Configuration
    // -------------------------------------------------------------------------
    /// Worker threads kept alive for accepted connections; more start on demand
    pub workers: usize,

    /// Requests served per connection
    pub session_mode: SessionMode,

    /// Connection read timeout (`None` waits forever)
    pub read_timeout: Option<Duration>,

    /// Connection write timeout (`None` waits forever)
    pub write_timeout: Option<Duration>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: format!("0.0.0.0:{}", DEFAULT_PORT),
            accept_poll_interval: Duration::from_millis(10),
            workers: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            session_mode: SessionMode::SingleShot,
            read_timeout: Some(DEFAULT_IO_TIMEOUT),
            write_timeout: Some(DEFAULT_IO_TIMEOUT),
        }
    }
}

impl ServerConfig {
    /// Create a new config builder
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }
}

/// Builder for ServerConfig
#[derive(Default)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    /// Set the TCP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the idle accept poll interval
    pub fn accept_poll_interval(mut self, interval: Duration) -> Self {
        self.config.accept_poll_interval = interval;
        self
    }

    /// Set the number of core worker threads
    pub fn workers(mut self, count: usize) -> Self {
        self.config.workers = count;
        self
    }

    /// Set how many requests a connection serves
    pub fn session_mode(mut self, mode: SessionMode) -> Self {
        self.config.session_mode = mode;
        self
    }

    /// Set the read timeout
    pub fn read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.read_timeout = timeout;
        self
    }

    /// Set the write timeout
    pub fn write_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.write_timeout = timeout;
        self
    }

    pub fn build(self) -> Result<ServerConfig> {
        if self.config.workers == 0 {
            return Err(DictError::Config("workers must be at least 1".to_string()));
        }
        if self.config.listen_addr.is_empty() {
            return Err(DictError::Config("listen address is empty".to_string()));
        }
        if matches!(self.config.read_timeout, Some(t) if t.is_zero())
            || matches!(self.config.write_timeout, Some(t) if t.is_zero())
        {
            return Err(DictError::Config(
                "timeouts must be non-zero; use None to disable".to_string(),
            ));
        }
        Ok(self.config)
    }
}

/// Client-side configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Candidate server endpoints, tried in order
    pub endpoints: Vec<String>,

    /// Per-address connect timeout (`None` uses the OS default)
    pub connect_timeout: Option<Duration>,

    /// Response read timeout (`None` waits forever)
    pub read_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoints: vec![format!("127.0.0.1:{}", DEFAULT_PORT)],
            connect_timeout: Some(DEFAULT_IO_TIMEOUT),
            read_timeout: Some(DEFAULT_IO_TIMEOUT),
        }
    }
}

impl ClientConfig {
    /// Create a new config builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }
}

/// Builder for ClientConfig
#[derive(Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Replace the candidate endpoints
    pub fn endpoints<I, S>(mut self, endpoints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.endpoints = endpoints.into_iter().map(Into::into).collect();
        self
    }

    /// Set the per-address connect timeout
    pub fn connect_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Set the response read timeout
    pub fn read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.read_timeout = timeout;
        self
    }

    pub fn build(self) -> Result<ClientConfig> {
        if self.config.endpoints.is_empty() {
            return Err(DictError::Config("no server endpoints given".to_string()));
        }
        if matches!(self.config.connect_timeout, Some(t) if t.is_zero())
            || matches!(self.config.read_timeout, Some(t) if t.is_zero())
        {
            return Err(DictError::Config(
                "timeouts must be non-zero; use None to disable".to_string(),
            ));
        }
        Ok(self.config)
    }
}
