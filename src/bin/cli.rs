//! dictkv CLI Client
//!
//! Sends one request to a dictkv server and prints the response.

use std::io;
use std::time::Duration;

use clap::{Parser, Subcommand};
use dictkv::client::prompt;
use dictkv::{ClientConfig, ClientSession, Request};
use tracing_subscriber::{fmt, EnvFilter};

/// dictkv CLI
#[derive(Parser, Debug)]
#[command(name = "dictkv-cli")]
#[command(about = "CLI for the dictkv dictionary server")]
#[command(version)]
struct Args {
    /// Server address; repeat to give fallbacks, tried in order
    #[arg(short, long, default_value = "127.0.0.1:80")]
    server: Vec<String>,

    /// Connect timeout per address in milliseconds
    #[arg(long, default_value = "5000")]
    connect_timeout_ms: u64,

    /// Request to send; prompts interactively when omitted
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Store a value unless the key already exists
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,
    },

    /// Get a value by key
    Get {
        /// The key to get
        key: String,
    },

    /// Show GET statistics
    Stats,
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(io::stderr).init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> dictkv::Result<()> {
    let request = match args.command {
        Some(Commands::Set { key, value }) => Request::set(key, value),
        Some(Commands::Get { key }) => Request::get(key),
        Some(Commands::Stats) => Request::stats(),
        None => {
            let stdin = io::stdin();
            let mut input = stdin.lock();
            let mut output = io::stdout();
            match prompt::read_request(&mut input, &mut output)? {
                Some(request) => request,
                None => return Ok(()),
            }
        }
    };

    let config = ClientConfig::builder()
        .endpoints(args.server)
        .connect_timeout(Some(Duration::from_millis(args.connect_timeout_ms.max(1))))
        .build()?;

    let session = ClientSession::connect(&config)?;
    let response = session.exchange(&request)?;
    println!("{}", response);
    Ok(())
}
