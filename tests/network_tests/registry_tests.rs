//! Registry and Worker Pool Tests

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::{Duration, Instant};

use dictkv::network::{ConnectionRegistry, ConnectionState, WorkerPool};

// =============================================================================
// Registry Tests
// =============================================================================

#[test]
fn test_register_assigns_increasing_ids() {
    let registry = Arc::new(ConnectionRegistry::new());

    let first = registry.register("127.0.0.1:1000");
    let second = registry.register("127.0.0.1:1001");

    assert!(second.id() > first.id());
    assert_eq!(registry.active(), 2);
    assert_eq!(registry.total_accepted(), 2);
}

#[test]
fn test_new_entry_is_idle() {
    let registry = Arc::new(ConnectionRegistry::new());
    let ticket = registry.register("peer");

    assert_eq!(registry.state_of(ticket.id()), Some(ConnectionState::Idle));
    let snapshot = registry.snapshot();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].peer_addr, "peer");
}

#[test]
fn test_ticket_publishes_state() {
    let registry = Arc::new(ConnectionRegistry::new());
    let ticket = registry.register("peer");

    ticket.set_state(ConnectionState::AwaitingRequest);
    assert_eq!(
        registry.state_of(ticket.id()),
        Some(ConnectionState::AwaitingRequest)
    );
}

#[test]
fn test_drop_ticket_deregisters() {
    let registry = Arc::new(ConnectionRegistry::new());
    let ticket = registry.register("peer");
    let id = ticket.id();
    let _other = registry.register("other");

    drop(ticket);

    assert_eq!(registry.active(), 1);
    assert_eq!(registry.state_of(id), None);
    assert_eq!(registry.total_accepted(), 2);
}

#[test]
fn test_snapshot_is_ordered_by_id() {
    let registry = Arc::new(ConnectionRegistry::new());
    let _tickets: Vec<_> = (0..5).map(|i| registry.register(format!("peer{}", i))).collect();

    let ids: Vec<_> = registry.snapshot().iter().map(|entry| entry.id).collect();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted);
}

// =============================================================================
// Worker Pool Tests
// =============================================================================

#[test]
fn test_pool_rejects_zero_workers() {
    assert!(WorkerPool::new(0).is_err());
}

#[test]
fn test_pool_runs_all_jobs_before_drop_returns() {
    let counter = Arc::new(AtomicUsize::new(0));

    let pool = WorkerPool::new(3).unwrap();
    assert_eq!(pool.size(), 3);
    for _ in 0..100 {
        let counter = Arc::clone(&counter);
        pool.spawn(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
    }
    drop(pool);

    assert_eq!(counter.load(Ordering::SeqCst), 100);
}

#[test]
fn test_pool_survives_panicking_job() {
    let counter = Arc::new(AtomicUsize::new(0));

    let pool = WorkerPool::new(1).unwrap();
    pool.spawn(|| panic!("boom")).unwrap();
    let after = Arc::clone(&counter);
    pool.spawn(move || {
        after.fetch_add(1, Ordering::SeqCst);
    })
    .unwrap();
    drop(pool);

    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[test]
fn test_pool_grows_when_all_workers_are_blocked() {
    let pool = WorkerPool::new(2).unwrap();
    let release = Arc::new(Barrier::new(3));

    // Occupy both core workers until the barrier opens
    for _ in 0..2 {
        let release = Arc::clone(&release);
        pool.spawn(move || {
            release.wait();
        })
        .unwrap();
    }

    let (tx, rx) = mpsc::channel();
    pool.spawn(move || {
        tx.send(()).unwrap();
    })
    .unwrap();

    assert!(rx.recv_timeout(Duration::from_secs(2)).is_ok());
    assert!(pool.live() >= 3);

    release.wait();
}

#[test]
fn test_pool_extra_workers_retire_when_idle() {
    let pool = WorkerPool::with_keep_alive(1, Duration::from_millis(50)).unwrap();
    let release = Arc::new(Barrier::new(2));

    let blocker = Arc::clone(&release);
    pool.spawn(move || {
        blocker.wait();
    })
    .unwrap();
    let (tx, rx) = mpsc::channel();
    pool.spawn(move || {
        tx.send(()).unwrap();
    })
    .unwrap();
    rx.recv_timeout(Duration::from_secs(2)).unwrap();
    release.wait();

    let deadline = Instant::now() + Duration::from_secs(5);
    while pool.live() > 1 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(10));
    }
    assert_eq!(pool.live(), 1);
    assert_eq!(pool.size(), 1);

    // The remaining core worker still takes jobs
    let (tx, rx) = mpsc::channel();
    pool.spawn(move || {
        tx.send(()).unwrap();
    })
    .unwrap();
    assert!(rx.recv_timeout(Duration::from_secs(2)).is_ok());
}
