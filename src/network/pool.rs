//! Worker Pool
//!
//! Threads that drive accepted connections to completion.
//!
//! A fixed number of core workers stay alive for the life of the pool. When
//! a job arrives and no worker is idle, an extra worker is started for it, so
//! a connection never waits behind another one that is blocked on I/O. Extra
//! workers exit after sitting idle for the keep-alive period.

use std::any::Any;
use std::io;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam::channel::{self, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;

use crate::error::{DictError, Result};

/// How long an extra worker waits for work before exiting
pub const DEFAULT_KEEP_ALIVE: Duration = Duration::from_secs(30);

/// A job is a function that can be executed by a worker.
type Job = Box<dyn FnOnce() + Send + 'static>;

/// Elastic thread pool fed by an unbounded channel
///
/// Dropping the pool closes the channel and joins every worker once the
/// queued jobs have run.
pub struct WorkerPool {
    core: usize,
    sender: Option<Sender<Job>>,
    shared: Arc<Shared>,
    threads: Mutex<Vec<JoinHandle<()>>>,
    next_id: AtomicUsize,
}

struct Shared {
    receiver: Receiver<Job>,

    /// Workers waiting on the channel minus jobs already promised to them
    idle: AtomicUsize,

    /// Worker threads currently alive
    live: AtomicUsize,

    keep_alive: Duration,
}

impl Shared {
    /// Give up one unpromised idle slot; false if every idle worker is spoken for
    fn try_retire(&self) -> bool {
        let mut idle = self.idle.load(Ordering::Acquire);
        while idle > 0 {
            match self
                .idle
                .compare_exchange(idle, idle - 1, Ordering::AcqRel, Ordering::Acquire)
            {
                Ok(_) => return true,
                Err(current) => idle = current,
            }
        }
        false
    }
}

impl WorkerPool {
    /// Start `size` core worker threads
    pub fn new(size: usize) -> Result<Self> {
        Self::with_keep_alive(size, DEFAULT_KEEP_ALIVE)
    }

    /// Start `size` core workers; extra workers exit after `keep_alive` idle
    pub fn with_keep_alive(size: usize, keep_alive: Duration) -> Result<Self> {
        if size == 0 {
            return Err(DictError::Config("worker pool needs at least one thread".to_string()));
        }

        let (sender, receiver) = channel::unbounded::<Job>();
        let pool = Self {
            core: size,
            sender: Some(sender),
            shared: Arc::new(Shared {
                receiver,
                // Core workers count as idle from the start
                idle: AtomicUsize::new(size),
                live: AtomicUsize::new(0),
                keep_alive,
            }),
            threads: Mutex::new(Vec::with_capacity(size)),
            next_id: AtomicUsize::new(0),
        };

        for _ in 0..size {
            pool.start_worker(None, true)?;
        }
        Ok(pool)
    }

    /// Run a job on an idle worker, starting a new worker if none is free
    pub fn spawn<F>(&self, job: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let sender = self.sender.as_ref().ok_or_else(pool_closed)?;
        let job: Job = Box::new(job);

        loop {
            let idle = self.shared.idle.load(Ordering::Acquire);
            if idle == 0 {
                return self.start_worker(Some(job), false);
            }
            if self
                .shared
                .idle
                .compare_exchange(idle, idle - 1, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return sender.send(job).map_err(|_| pool_closed());
            }
        }
    }

    /// Number of core worker threads
    pub fn size(&self) -> usize {
        self.core
    }

    /// Worker threads currently alive, core and extra
    pub fn live(&self) -> usize {
        self.shared.live.load(Ordering::Acquire)
    }

    fn start_worker(&self, first: Option<Job>, core: bool) -> Result<()> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let shared = Arc::clone(&self.shared);

        self.shared.live.fetch_add(1, Ordering::AcqRel);
        let spawned = thread::Builder::new()
            .name(format!("dictkv-worker-{}", id))
            .spawn(move || run_worker(id, shared, first, core));

        match spawned {
            Ok(handle) => {
                let mut threads = self.threads.lock();
                threads.retain(|handle| !handle.is_finished());
                threads.push(handle);
                Ok(())
            }
            Err(e) => {
                self.shared.live.fetch_sub(1, Ordering::AcqRel);
                if core {
                    self.shared.idle.fetch_sub(1, Ordering::AcqRel);
                }
                Err(e.into())
            }
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Closing the channel ends each worker's receive loop
        drop(self.sender.take());

        let threads = std::mem::take(&mut *self.threads.lock());
        for thread in threads {
            if thread.join().is_err() {
                tracing::error!("Worker thread join failed");
            }
        }
    }
}

fn pool_closed() -> DictError {
    DictError::Io(io::Error::new(io::ErrorKind::Other, "worker pool is shut down"))
}

fn run_worker(id: usize, shared: Arc<Shared>, first: Option<Job>, core: bool) {
    if let Some(job) = first {
        run_job(id, job);
        shared.idle.fetch_add(1, Ordering::AcqRel);
    }

    loop {
        let job = if core {
            match shared.receiver.recv() {
                Ok(job) => job,
                Err(_) => break,
            }
        } else {
            match shared.receiver.recv_timeout(shared.keep_alive) {
                Ok(job) => job,
                Err(RecvTimeoutError::Timeout) => {
                    if shared.try_retire() {
                        break;
                    }
                    // A job was promised to an idle worker; stay for it
                    continue;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        };

        run_job(id, job);
        shared.idle.fetch_add(1, Ordering::AcqRel);
    }

    shared.live.fetch_sub(1, Ordering::AcqRel);
    tracing::trace!(worker = id, "Worker exiting");
}

fn run_job(id: usize, job: Job) {
    if let Err(panic) = catch_unwind(AssertUnwindSafe(job)) {
        tracing::error!(
            worker = id,
            "Connection job panicked: {}",
            panic_message(panic.as_ref())
        );
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "unknown panic payload"
    }
}
