//! Client Session Tests
//!
//! Tests for endpoint fallback and the single request/response exchange.

use std::net::{SocketAddr, TcpListener};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use dictkv::network::Listener;
use dictkv::protocol::{read_request, write_response};
use dictkv::{
    ClientConfig, ClientSession, DictError, Dictionary, Request, Response, ServerConfig,
};

// =============================================================================
// Helper Functions
// =============================================================================

/// An address nothing is listening on
fn dead_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}

fn client_config(endpoints: Vec<String>) -> ClientConfig {
    ClientConfig::builder()
        .endpoints(endpoints)
        .connect_timeout(Some(Duration::from_secs(2)))
        .read_timeout(Some(Duration::from_secs(5)))
        .build()
        .unwrap()
}

// =============================================================================
// Endpoint Fallback Tests
// =============================================================================

#[test]
fn test_connect_falls_back_to_next_endpoint() {
    let config = ServerConfig::builder()
        .listen_addr("127.0.0.1:0")
        .workers(1)
        .build()
        .unwrap();
    let server = Listener::spawn(config, Arc::new(Dictionary::new())).unwrap();

    let dead = dead_addr();
    let session = ClientSession::connect(&client_config(vec![
        dead.to_string(),
        server.local_addr().to_string(),
    ]))
    .unwrap();

    assert_eq!(session.server_addr(), server.local_addr());
    assert!(session.exchange(&Request::set("x", "y")).unwrap().is_success());
}

#[test]
fn test_connect_skips_unresolvable_endpoint() {
    let config = ServerConfig::builder()
        .listen_addr("127.0.0.1:0")
        .workers(1)
        .build()
        .unwrap();
    let server = Listener::spawn(config, Arc::new(Dictionary::new())).unwrap();

    let session = ClientSession::connect(&client_config(vec![
        "not an address".to_string(),
        server.local_addr().to_string(),
    ]))
    .unwrap();

    assert_eq!(session.server_addr(), server.local_addr());
}

#[test]
fn test_connect_fails_when_all_endpoints_fail() {
    let result = ClientSession::connect(&client_config(vec![
        dead_addr().to_string(),
        dead_addr().to_string(),
    ]));

    match result {
        Err(DictError::Connect(msg)) => assert!(msg.contains("all 2 endpoints failed")),
        Err(e) => panic!("Expected Connect error, got {}", e),
        Ok(_) => panic!("Expected Connect error, got a session"),
    }
}

#[test]
fn test_connect_fails_when_nothing_resolves() {
    let result = ClientSession::connect(&client_config(vec!["nowhere".to_string()]));
    assert!(matches!(result, Err(DictError::Connect(_))));
}

#[test]
fn test_config_requires_an_endpoint() {
    let result = ClientConfig::builder().endpoints(Vec::<String>::new()).build();
    assert!(matches!(result, Err(DictError::Config(_))));
}

// =============================================================================
// Exchange Tests
// =============================================================================

#[test]
fn test_exchange_sends_one_request_and_reads_one_response() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let peer = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let request = read_request(&mut stream).unwrap().unwrap();
        write_response(&mut stream, &Response::success(format!("echo {}", request.key))).unwrap();
        request
    });

    let session = ClientSession::connect(&client_config(vec![addr.to_string()])).unwrap();
    let response = session.exchange(&Request::get("ping")).unwrap();

    assert_eq!(response, Response::success("echo ping"));
    assert_eq!(peer.join().unwrap(), Request::get("ping"));
}

#[test]
fn test_exchange_errors_when_server_closes_without_response() {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    let peer = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let _ = read_request(&mut stream);
    });

    let session = ClientSession::connect(&client_config(vec![addr.to_string()])).unwrap();
    assert!(session.exchange(&Request::stats()).is_err());
    peer.join().unwrap();
}
