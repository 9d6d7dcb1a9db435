//! dictkv Server Binary
//!
//! Starts the TCP server for dictkv.

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use dictkv::network::Listener;
use dictkv::{Dictionary, ServerConfig, SessionMode};
use tracing_subscriber::{fmt, EnvFilter};

/// dictkv Server
#[derive(Parser, Debug)]
#[command(name = "dictkv-server")]
#[command(about = "Shared in-memory dictionary over TCP")]
#[command(version)]
struct Args {
    /// Listen address (host:port)
    #[arg(short, long, default_value = "0.0.0.0:80")]
    listen: String,

    /// Core worker threads, more start on demand (defaults to available parallelism)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Requests served per connection
    #[arg(long, value_enum, default_value_t = Mode::Single)]
    mode: Mode,

    /// Read timeout in milliseconds, 0 disables
    #[arg(long, default_value = "5000")]
    read_timeout_ms: u64,

    /// Write timeout in milliseconds, 0 disables
    #[arg(long, default_value = "5000")]
    write_timeout_ms: u64,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Mode {
    /// One request, then close
    Single,
    /// Keep serving until the client closes
    Persistent,
}

fn timeout(ms: u64) -> Option<Duration> {
    (ms > 0).then(|| Duration::from_millis(ms))
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,dictkv=debug"));

    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("dictkv Server v{}", dictkv::VERSION);
    tracing::info!("Listen address: {}", args.listen);

    let mut builder = ServerConfig::builder()
        .listen_addr(&args.listen)
        .session_mode(match args.mode {
            Mode::Single => SessionMode::SingleShot,
            Mode::Persistent => SessionMode::Persistent,
        })
        .read_timeout(timeout(args.read_timeout_ms))
        .write_timeout(timeout(args.write_timeout_ms));
    if let Some(workers) = args.workers {
        builder = builder.workers(workers);
    }

    let config = match builder.build() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    tracing::info!(
        "Workers: {}, session mode: {:?}",
        config.workers,
        config.session_mode
    );

    let dictionary = Arc::new(Dictionary::new());
    let listener = match Listener::bind(config, dictionary) {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", args.listen, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = listener.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }

    tracing::info!("Server stopped");
}
