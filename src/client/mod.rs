//! Client Module
//!
//! One connect, send, receive exchange with a dictkv server.

pub mod prompt;

use std::io::{BufReader, BufWriter};
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};

use crate::config::ClientConfig;
use crate::error::{DictError, Result};
use crate::protocol::{read_response, write_request, Request, Response};

/// A connected client, good for exactly one request
pub struct ClientSession {
    reader: BufReader<TcpStream>,
    writer: BufWriter<TcpStream>,
    server_addr: SocketAddr,
}

impl ClientSession {
    /// Connect to the first reachable endpoint
    ///
    /// Every endpoint string is resolved and each resulting address is tried
    /// in order. Fails only once all of them have been tried.
    pub fn connect(config: &ClientConfig) -> Result<Self> {
        let candidates = resolve_endpoints(&config.endpoints)?;

        let mut last_error = None;
        for addr in &candidates {
            tracing::debug!("Connecting to {}", addr);
            let attempt = match config.connect_timeout {
                Some(timeout) => TcpStream::connect_timeout(addr, timeout),
                None => TcpStream::connect(addr),
            };
            match attempt {
                Ok(stream) => return Self::from_stream(stream, *addr, config),
                Err(e) => {
                    tracing::debug!("Connect to {} failed: {}", addr, e);
                    last_error = Some(e);
                }
            }
        }

        Err(DictError::Connect(format!(
            "all {} endpoints failed, last error: {}",
            candidates.len(),
            last_error.map(|e| e.to_string()).unwrap_or_default()
        )))
    }

    fn from_stream(stream: TcpStream, server_addr: SocketAddr, config: &ClientConfig) -> Result<Self> {
        stream.set_nodelay(true)?;
        stream.set_read_timeout(config.read_timeout)?;

        let read_stream = stream.try_clone()?;
        tracing::debug!("Connected to {}", server_addr);

        Ok(Self {
            reader: BufReader::new(read_stream),
            writer: BufWriter::new(stream),
            server_addr,
        })
    }

    /// Send one request and wait for its response
    ///
    /// Consumes the session; the connection closes when it returns.
    pub fn exchange(mut self, request: &Request) -> Result<Response> {
        write_request(&mut self.writer, request)?;
        tracing::debug!("Sent {} to {}", request, self.server_addr);

        read_response(&mut self.reader)?.ok_or_else(|| {
            DictError::MalformedFrame(format!(
                "{} closed the connection without a response",
                self.server_addr
            ))
        })
    }

    /// Address of the server this session connected to
    pub fn server_addr(&self) -> SocketAddr {
        self.server_addr
    }
}

fn resolve_endpoints(endpoints: &[String]) -> Result<Vec<SocketAddr>> {
    let mut candidates = Vec::new();
    for endpoint in endpoints {
        match endpoint.to_socket_addrs() {
            Ok(addrs) => candidates.extend(addrs),
            Err(e) => tracing::debug!("Cannot resolve {}: {}", endpoint, e),
        }
    }

    if candidates.is_empty() {
        return Err(DictError::Connect(format!(
            "no address resolved from {:?}",
            endpoints
        )));
    }
    Ok(candidates)
}
