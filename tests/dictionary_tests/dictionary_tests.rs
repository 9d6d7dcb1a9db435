//! Dictionary Tests
//!
//! Tests verify:
//! - Insert-if-absent SET
//! - GET hit/miss accounting
//! - STATS report contents
//! - Request dispatch
//! - Concurrent access patterns

use std::sync::{Arc, Barrier};
use std::thread;

use dictkv::dictionary::{Dictionary, GetStats, KEY_NOT_FOUND};
use dictkv::{Request, Response, Status};

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_new_dictionary_is_empty() {
    let dict = Dictionary::new();
    assert!(dict.is_empty());
    assert_eq!(dict.len(), 0);
    assert_eq!(dict.get_stats(), GetStats::default());
}

#[test]
fn test_set_and_get() {
    let dict = Dictionary::new();

    assert_eq!(dict.set("key1", "value1").status, Status::Success);
    assert_eq!(dict.get("key1"), Response::success("value1"));
    assert_eq!(dict.len(), 1);
}

#[test]
fn test_set_does_not_overwrite() {
    let dict = Dictionary::new();

    assert!(dict.set("k", "v1").is_success());
    let second = dict.set("k", "v2");

    assert_eq!(second.status, Status::Failure);
    assert_eq!(dict.get("k").message, "v1");
    assert_eq!(dict.len(), 1);
}

#[test]
fn test_empty_key_and_value() {
    let dict = Dictionary::new();

    assert!(dict.set("", "").is_success());
    assert_eq!(dict.get(""), Response::success(""));
    assert!(!dict.set("", "other").is_success());
}

#[test]
fn test_get_missing_key() {
    let dict = Dictionary::new();

    let response = dict.get("missing");
    assert_eq!(response.status, Status::Failure);
    assert_eq!(response.message, KEY_NOT_FOUND);
    assert_eq!(response.message, "Key not found!");
}

// =============================================================================
// Counter Tests
// =============================================================================

#[test]
fn test_miss_increments_both_counters() {
    let dict = Dictionary::new();
    dict.set("present", "1");
    dict.get("present");

    let before = dict.get_stats();
    dict.get("absent");
    let after = dict.get_stats();

    assert_eq!(after.total, before.total + 1);
    assert_eq!(after.failed, before.failed + 1);
}

#[test]
fn test_hit_increments_total_only() {
    let dict = Dictionary::new();
    dict.set("present", "1");

    let before = dict.get_stats();
    dict.get("present");
    let after = dict.get_stats();

    assert_eq!(after.total, before.total + 1);
    assert_eq!(after.failed, before.failed);
}

#[test]
fn test_set_and_stats_do_not_count_as_gets() {
    let dict = Dictionary::new();
    dict.set("a", "1");
    dict.set("a", "2");
    dict.stats();

    assert_eq!(dict.get_stats(), GetStats::default());
}

#[test]
fn test_stats_report() {
    let dict = Dictionary::new();
    dict.set("a", "1");
    for _ in 0..3 {
        dict.get("a");
    }
    for _ in 0..2 {
        dict.get("b");
    }

    let stats = dict.get_stats();
    assert_eq!(stats.total, 5);
    assert_eq!(stats.failed, 2);
    assert_eq!(stats.successful(), 3);

    let response = dict.stats();
    assert!(response.is_success());
    assert_eq!(
        response.message,
        "Total Get operations: 5\n\tSuccessful: 3\n\tFailed: 2\n"
    );
}

// =============================================================================
// Dispatch Tests
// =============================================================================

#[test]
fn test_execute_routes_by_kind() {
    let dict = Dictionary::new();

    assert!(dict.execute(Request::set("a", "1")).is_success());
    assert!(!dict.execute(Request::set("a", "2")).is_success());
    assert_eq!(dict.execute(Request::get("a")), Response::success("1"));

    let stats = dict.execute(Request::stats());
    assert!(stats.message.starts_with("Total Get operations: 1\n"));
    // STATS is not a GET
    assert_eq!(dict.get_stats().total, 1);
}

// =============================================================================
// Concurrent Access Tests
// =============================================================================

#[test]
fn test_concurrent_disjoint_sets() {
    let dict = Arc::new(Dictionary::new());
    let barrier = Arc::new(Barrier::new(2));

    let handles: Vec<_> = [("k1", "v1"), ("k2", "v2")]
        .into_iter()
        .map(|(key, value)| {
            let dict = Arc::clone(&dict);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                dict.set(key, value)
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap().is_success());
    }
    assert_eq!(dict.get("k1").message, "v1");
    assert_eq!(dict.get("k2").message, "v2");
}

#[test]
fn test_concurrent_same_key_sets() {
    for _ in 0..50 {
        let dict = Arc::new(Dictionary::new());
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = ["v1", "v2"]
            .into_iter()
            .map(|value| {
                let dict = Arc::clone(&dict);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    (value, dict.set("k", value))
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let winners: Vec<_> = results.iter().filter(|(_, r)| r.is_success()).collect();

        assert_eq!(winners.len(), 1);
        assert_eq!(dict.get("k").message, winners[0].0);
    }
}

#[test]
fn test_concurrent_writes() {
    let dict = Arc::new(Dictionary::new());

    let mut handles = vec![];
    for i in 0..10 {
        let dict = Arc::clone(&dict);
        handles.push(thread::spawn(move || {
            for j in 0..10 {
                assert!(dict.set(format!("key{}_{}", i, j), format!("value{}_{}", i, j)).is_success());
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(dict.len(), 100);
}

#[test]
fn test_concurrent_gets_keep_counters_consistent() {
    let dict = Arc::new(Dictionary::new());
    dict.set("hit", "1");

    let mut handles = vec![];
    for i in 0..8 {
        let dict = Arc::clone(&dict);
        handles.push(thread::spawn(move || {
            for _ in 0..250 {
                if i % 2 == 0 {
                    assert!(dict.get("hit").is_success());
                } else {
                    assert!(!dict.get("miss").is_success());
                }
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    let stats = dict.get_stats();
    assert_eq!(stats.total, 2000);
    assert_eq!(stats.failed, 1000);
    assert_eq!(stats.successful(), 1000);
}
