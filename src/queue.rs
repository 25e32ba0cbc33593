use std::time::Duration;

use concurrent_queue::{ConcurrentQueue, PopError, PushError};
use parking_lot::{Condvar, Mutex};

/// Upper bound on how long a producer or worker sleeps before re-checking
/// the stop condition.
const WAIT: Duration = Duration::from_millis(20);

/// Bounded hand-off of candidate batches from one producer to the workers.
///
/// Only `capacity` batches exist at any time, so memory stays proportional
/// to `capacity * batch_size` no matter how large the search space is.
pub struct WorkQueue {
    queue: ConcurrentQueue<Vec<String>>,
    lock: Mutex<()>,
    ready: Condvar,
    space: Condvar,
}

impl WorkQueue {
    pub fn bounded(capacity: usize) -> Self {
        WorkQueue {
            queue: ConcurrentQueue::bounded(capacity.max(1)),
            lock: Mutex::new(()),
            ready: Condvar::new(),
            space: Condvar::new(),
        }
    }

    /// Pulls `candidates` in batches of `batch_size` and pushes them until
    /// the source runs dry, the queue is closed or `stop` returns true.
    /// Closes the queue on return. Returns the number of candidates queued.
    pub fn produce<I, F>(&self, candidates: I, batch_size: usize, stop: F) -> u64
    where
        I: IntoIterator<Item = String>,
        F: Fn() -> bool,
    {
        let batch_size = batch_size.max(1);
        let mut candidates = candidates.into_iter();
        let mut produced = 0u64;

        while !stop() {
            let batch: Vec<String> = candidates.by_ref().take(batch_size).collect();
            if batch.is_empty() {
                break;
            }
            let len = batch.len() as u64;
            if !self.push(batch, &stop) {
                break;
            }
            produced += len;
        }

        self.close();
        produced
    }

    fn push<F: Fn() -> bool>(&self, mut batch: Vec<String>, stop: &F) -> bool {
        loop {
            match self.queue.push(batch) {
                Ok(()) => {
                    let _guard = self.lock.lock();
                    self.ready.notify_one();
                    return true;
                }
                Err(PushError::Closed(_)) => return false,
                Err(PushError::Full(value)) => {
                    batch = value; // Retry once a worker frees a slot
                    if stop() {
                        return false;
                    }
                    let mut guard = self.lock.lock();
                    if self.queue.is_full() && !self.queue.is_closed() {
                        self.space.wait_for(&mut guard, WAIT);
                    }
                }
            }
        }
    }

    /// Takes the next batch, waiting while the queue is empty but still open.
    /// Returns `None` once the queue is closed and drained, or when `stop`
    /// returns true.
    pub fn pop<F: Fn() -> bool>(&self, stop: F) -> Option<Vec<String>> {
        loop {
            match self.queue.pop() {
                Ok(batch) => {
                    let _guard = self.lock.lock();
                    self.space.notify_one();
                    return Some(batch);
                }
                Err(PopError::Closed) => return None,
                Err(PopError::Empty) => {
                    if stop() {
                        return None;
                    }
                    let mut guard = self.lock.lock();
                    if self.queue.is_empty() && !self.queue.is_closed() {
                        self.ready.wait_for(&mut guard, WAIT);
                    }
                }
            }
        }
    }

    /// Stops accepting batches and wakes every waiting thread. Batches
    /// already queued can still be popped.
    pub fn close(&self) {
        self.queue.close();
        let _guard = self.lock.lock();
        self.ready.notify_all();
        self.space.notify_all();
    }

    pub fn is_closed(&self) -> bool {
        self.queue.is_closed()
    }
}
