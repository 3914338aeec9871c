// src/thread_pool.rs
//! Fixed-size worker pool.
//!
//! Workers share one job queue (`parking_lot::Mutex` + `Condvar`). Every
//! submitted callable is wrapped so its return value, or its panic, lands in a
//! one-shot crossbeam channel behind a [`TaskHandle`].
//!
//! Shutdown modes:
//! - `shutdown(true)` drains: the caller blocks until every queued job has been
//!   picked up, then workers are stopped and joined.
//! - `shutdown(false)` cancels: queued jobs are discarded (their handles
//!   resolve to [`Error::TaskCancelled`]); running jobs still finish.
//!
//! Dropping the pool drains it.

use std::any::Any;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver, TryRecvError};
use parking_lot::{Condvar, Mutex};

use crate::error::{Error, Result};

type Job = Box<dyn FnOnce() + Send + 'static>;

struct PoolState {
    jobs: VecDeque<Job>,
    stopping: bool,
    draining: bool,
}

struct Shared {
    state: Mutex<PoolState>,
    job_available: Condvar,
    drained: Condvar,
}

pub struct ThreadPool {
    shared: Arc<Shared>,
    workers: Vec<JoinHandle<()>>,
}

impl ThreadPool {
    /// Spawn `worker_count` workers (at least one).
    pub fn new(worker_count: usize) -> Self {
        Self::with_name("pool-worker", worker_count)
    }

    /// Like [`ThreadPool::new`], naming threads `<name>-<index>`.
    pub fn with_name(name: &str, worker_count: usize) -> Self {
        let shared = Arc::new(Shared {
            state: Mutex::new(PoolState {
                jobs: VecDeque::new(),
                stopping: false,
                draining: false,
            }),
            job_available: Condvar::new(),
            drained: Condvar::new(),
        });

        let count = worker_count.max(1);
        let workers = (0..count)
            .map(|index| {
                let shared = Arc::clone(&shared);
                thread::Builder::new()
                    .name(format!("{}-{}", name, index))
                    .spawn(move || worker_loop(&shared))
                    .expect("failed to spawn thread pool worker")
            })
            .collect();

        log::debug!("thread pool '{}' started with {} workers", name, count);
        Self { shared, workers }
    }

    /// Queue `task` and return a handle to its eventual result.
    ///
    /// # Panics
    ///
    /// Panics if the pool has already been shut down.
    pub fn enqueue<F, R>(&self, task: F) -> TaskHandle<R>
    where
        F: FnOnce() -> R + Send + 'static,
        R: Send + 'static,
    {
        let (tx, rx) = channel::bounded(1);
        let job: Job = Box::new(move || {
            let result = panic::catch_unwind(AssertUnwindSafe(task))
                .map_err(|payload| Error::TaskPanicked(panic_payload_to_string(&*payload)));
            if let Err(err) = &result {
                log::debug!("pool task failed, forwarding to its handle: {}", err);
            }
            // The handle may already be gone; nobody wants the result then.
            let _ = tx.send(result);
        });

        {
            let mut state = self.shared.state.lock();
            assert!(!state.stopping, "can't enqueue on a stopped thread pool");
            state.jobs.push_back(job);
        }
        self.shared.job_available.notify_one();

        TaskHandle { rx, ready: None }
    }

    /// Stop the pool. A no-op after the first call.
    pub fn shutdown(&mut self, drain_queue: bool) {
        if self.workers.is_empty() {
            return;
        }

        let discarded = {
            let mut state = self.shared.state.lock();
            let discarded = if drain_queue {
                state.draining = true;
                while !state.jobs.is_empty() {
                    self.shared.drained.wait(&mut state);
                }
                VecDeque::new()
            } else {
                std::mem::take(&mut state.jobs)
            };
            state.stopping = true;
            discarded
        };
        self.shared.job_available.notify_all();

        log::debug!(
            "thread pool shutting down ({}), {} queued jobs discarded",
            if drain_queue { "drain" } else { "cancel" },
            discarded.len()
        );
        // Dropping the jobs drops their result senders, which resolves the
        // matching handles to `TaskCancelled`.
        drop(discarded);

        for worker in self.workers.drain(..) {
            if worker.join().is_err() {
                log::error!("thread pool worker terminated abnormally");
            }
        }
    }

    /// Jobs queued but not yet picked up by a worker.
    pub fn pending_tasks(&self) -> usize {
        self.shared.state.lock().jobs.len()
    }

    /// Live worker threads; zero after shutdown.
    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    pub fn is_shut_down(&self) -> bool {
        self.workers.is_empty()
    }
}

impl Drop for ThreadPool {
    fn drop(&mut self) {
        self.shutdown(true);
    }
}

fn worker_loop(shared: &Shared) {
    loop {
        let job = {
            let mut state = shared.state.lock();
            while !state.stopping && state.jobs.is_empty() {
                shared.job_available.wait(&mut state);
            }

            // Draining finishes the queue first, otherwise a stop exits right away.
            if state.stopping && (state.jobs.is_empty() || !state.draining) {
                if state.jobs.is_empty() {
                    shared.drained.notify_all();
                }
                break;
            }

            let Some(job) = state.jobs.pop_front() else {
                continue;
            };
            if state.jobs.is_empty() && state.draining {
                shared.drained.notify_all();
            }
            job
        };

        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(job)) {
            log::error!(
                "thread pool worker caught a panic: {}",
                panic_payload_to_string(&*payload)
            );
        }
    }
    log::trace!("thread pool worker exiting");
}

/// Readable text of a panic payload from `catch_unwind`.
pub(crate) fn panic_payload_to_string(payload: &(dyn Any + Send)) -> String {
    if let Some(text) = payload.downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Deferred result of a job submitted with [`ThreadPool::enqueue`].
#[must_use = "dropping a TaskHandle discards the task's result"]
pub struct TaskHandle<R> {
    rx: Receiver<Result<R>>,
    ready: Option<Result<R>>,
}

impl<R> TaskHandle<R> {
    /// Block until the job has run.
    ///
    /// Returns [`Error::TaskPanicked`] if the callable panicked and
    /// [`Error::TaskCancelled`] if the job was discarded before running.
    pub fn wait(mut self) -> Result<R> {
        match self.ready.take() {
            Some(result) => result,
            None => self.rx.recv().unwrap_or(Err(Error::TaskCancelled)),
        }
    }

    /// `true` once the job has run or has been discarded by a cancelling shutdown.
    pub fn is_finished(&mut self) -> bool {
        if self.ready.is_none() {
            match self.rx.try_recv() {
                Ok(result) => self.ready = Some(result),
                Err(TryRecvError::Disconnected) => self.ready = Some(Err(Error::TaskCancelled)),
                Err(TryRecvError::Empty) => {}
            }
        }
        self.ready.is_some()
    }
}
