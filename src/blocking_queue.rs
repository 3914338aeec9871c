// src/blocking_queue.rs
//! Thread-safe FIFO for handing values from producer threads to consumers.
//!
//! A `VecDeque` behind a `parking_lot::Mutex`, plus one `Condvar` that wakes
//! consumers blocked in [`BlockingQueue::wait_and_pop`]. Closing the queue is
//! permanent: later pushes are dropped and blocked consumers drain what is left
//! and then receive `None`.

use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};

struct QueueState<T> {
    items: VecDeque<T>,
    closed: bool,
}

pub struct BlockingQueue<T> {
    state: Mutex<QueueState<T>>,
    signal: Condvar,
}

impl<T> Default for BlockingQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> BlockingQueue<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::new(),
                closed: false,
            }),
            signal: Condvar::new(),
        }
    }

    /// Append `value`. Silently dropped once the queue is closed.
    pub fn push(&self, value: T) {
        {
            let mut state = self.state.lock();
            if state.closed {
                return;
            }
            state.items.push_back(value);
        }
        self.signal.notify_one();
    }

    /// Construct the value under the lock. `make` never runs on a closed queue.
    pub fn emplace<F>(&self, make: F)
    where
        F: FnOnce() -> T,
    {
        {
            let mut state = self.state.lock();
            if state.closed {
                return;
            }
            state.items.push_back(make());
        }
        self.signal.notify_one();
    }

    /// Stop accepting values and wake every blocked consumer. Idempotent.
    pub fn close(&self) {
        self.state.lock().closed = true;
        self.signal.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    pub fn is_empty(&self) -> bool {
        self.state.lock().items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.state.lock().items.len()
    }

    /// Pop the front value without blocking.
    pub fn try_pop(&self) -> Option<T> {
        self.state.lock().items.pop_front()
    }

    /// Block until a value is available or the queue is closed.
    ///
    /// Returns `None` only when the queue is closed and empty, so values pushed
    /// before `close()` are still delivered.
    pub fn wait_and_pop(&self) -> Option<T> {
        let mut state = self.state.lock();
        while !state.closed && state.items.is_empty() {
            self.signal.wait(&mut state);
        }
        state.items.pop_front()
    }
}
