//! The worker pool that drains a candidate stream through a verifier.

use std::sync::atomic::{AtomicU8, Ordering};
use std::thread;
use std::time::Instant;

use parking_lot::{Condvar, Mutex, MutexGuard};
use tracing::{debug, info, warn};

use crate::candidates::Candidates;
use crate::error::{CrackError, Result};
use crate::history::{FailureCause, RunEnd};
use crate::progress::{ProgressReporter, ResultAggregator, VerificationOutcome};
use crate::queue::WorkQueue;
use crate::verifier::{Verdict, Verifier, VerifyError};

const RUNNING: u8 = 0;
const FOUND: u8 = 1;
const CANCELLED: u8 = 2;
const ABORTED: u8 = 3;

/// Why the shared stop flag was raised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Found,
    Cancelled,
    Aborted,
}

/// State shared by every worker of one run: a stop flag raised at most
/// once, and write-once cells for the found password and a fatal error.
///
/// Whoever raises the flag first decides how the run ends; every later
/// attempt to raise it, including a second match, is a no-op.
#[derive(Debug)]
pub struct SharedRunState {
    stop: AtomicU8,
    found: Mutex<Option<String>>,
    fatal: Mutex<Option<VerifyError>>,
}

impl SharedRunState {
    pub fn new() -> Self {
        SharedRunState {
            stop: AtomicU8::new(RUNNING),
            found: Mutex::new(None),
            fatal: Mutex::new(None),
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.stop.load(Ordering::Acquire) != RUNNING
    }

    pub fn stop_reason(&self) -> Option<StopReason> {
        match self.stop.load(Ordering::Acquire) {
            FOUND => Some(StopReason::Found),
            CANCELLED => Some(StopReason::Cancelled),
            ABORTED => Some(StopReason::Aborted),
            _ => None,
        }
    }

    fn raise(&self, reason: u8) -> bool {
        self.stop
            .compare_exchange(RUNNING, reason, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Records a verified password. Only the first caller wins, and only
    /// while the run has not been stopped for another reason.
    pub fn record_match(&self, password: &str) -> bool {
        let mut found = self.found.lock();
        if !self.raise(FOUND) {
            return false;
        }
        *found = Some(password.to_string());
        true
    }

    /// External stop request.
    pub fn cancel(&self) -> bool {
        self.raise(CANCELLED)
    }

    /// Stops the run because the archive cannot be read.
    pub fn abort(&self, error: VerifyError) -> bool {
        let mut fatal = self.fatal.lock();
        if !self.raise(ABORTED) {
            return false;
        }
        *fatal = Some(error);
        true
    }

    pub fn found(&self) -> Option<String> {
        self.found.lock().clone()
    }

    pub fn fatal_error(&self) -> Option<VerifyError> {
        self.fatal.lock().clone()
    }

    /// How the run ended, once every worker has exited.
    pub fn outcome(&self) -> RunEnd {
        match self.stop_reason() {
            Some(StopReason::Found) => match self.found() {
                Some(password) => RunEnd::Found(password),
                None => RunEnd::Exhausted,
            },
            Some(StopReason::Cancelled) => RunEnd::Cancelled,
            Some(StopReason::Aborted) => {
                let detail = self
                    .fatal_error()
                    .map(|e| e.to_string())
                    .unwrap_or_default();
                RunEnd::Failed(FailureCause::ArchiveUnreadable(detail))
            }
            None => RunEnd::Exhausted,
        }
    }
}

impl Default for SharedRunState {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything a checker thread needs, borrowed for the duration of a run.
struct RunContext<'a, V: ?Sized> {
    queue: &'a WorkQueue,
    verifier: &'a V,
    shared: &'a SharedRunState,
    aggregator: &'a ResultAggregator,
    reporter: &'a ProgressReporter<'a>,
}

/// Fixed-size pool of checker threads fed by a single producer thread.
#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    thread_count: usize,
    batch_size: usize,
}

impl WorkerPool {
    pub fn new(thread_count: usize, batch_size: usize) -> Result<Self> {
        if thread_count == 0 {
            return Err(CrackError::config("thread_count must be at least 1"));
        }
        if batch_size == 0 {
            return Err(CrackError::config("batch_size must be at least 1"));
        }
        Ok(WorkerPool {
            thread_count,
            batch_size,
        })
    }

    pub fn thread_count(&self) -> usize {
        self.thread_count
    }

    /// Runs until a match, exhaustion, a fatal verifier error or an external
    /// cancel. The calling thread drives the reporter's wall-clock cadence.
    pub fn run<V>(
        &self,
        candidates: Candidates,
        verifier: &V,
        shared: &SharedRunState,
        aggregator: &ResultAggregator,
        reporter: &ProgressReporter<'_>,
    ) -> RunEnd
    where
        V: Verifier + ?Sized,
    {
        let queue = WorkQueue::bounded(self.thread_count * 4);
        let live = Mutex::new(0usize);
        let exited = Condvar::new();
        let mut spawn_error = None;
        let ctx = RunContext {
            queue: &queue,
            verifier,
            shared,
            aggregator,
            reporter,
        };

        thread::scope(|s| {
            let queue = &queue;
            let ctx = &ctx;
            let (live, exited) = (&live, &exited);
            let batch_size = self.batch_size;
            let producer = thread::Builder::new()
                .name("producer".to_string())
                .spawn_scoped(s, move || {
                    let queued = queue.produce(candidates, batch_size, || shared.is_stopped());
                    debug!("Producer queued {queued} candidates");
                });
            if let Err(e) = producer {
                spawn_error = Some(e.to_string());
                queue.close();
                return;
            }

            let mut last_error = None;
            for i in 0..self.thread_count {
                *live.lock() += 1;
                let spawned = thread::Builder::new()
                    .name(format!("checker-{i}"))
                    .spawn_scoped(s, move || {
                        let _checkout = Checkout { live, exited };
                        check_passwords(ctx);
                    });
                if let Err(e) = spawned {
                    *live.lock() -= 1;
                    warn!("Failed to start checker-{i}: {e}");
                    last_error = Some(e.to_string());
                }
            }

            if *live.lock() == 0 {
                spawn_error = last_error;
                queue.close();
                return;
            }

            drive_reporter(live.lock(), exited, reporter, aggregator);
        });

        match spawn_error {
            Some(e) if !shared.is_stopped() => RunEnd::Failed(FailureCause::WorkerSpawn(e)),
            _ => shared.outcome(),
        }
    }
}

/// Marks a checker as exited, even if it unwinds.
struct Checkout<'a> {
    live: &'a Mutex<usize>,
    exited: &'a Condvar,
}

impl Drop for Checkout<'_> {
    fn drop(&mut self) {
        *self.live.lock() -= 1;
        self.exited.notify_all();
    }
}

/// Samples progress once per interval until every checker has exited.
fn drive_reporter(
    mut live: MutexGuard<'_, usize>,
    exited: &Condvar,
    reporter: &ProgressReporter<'_>,
    aggregator: &ResultAggregator,
) {
    let interval = reporter.interval();
    let mut next_tick = Instant::now() + interval;
    while *live > 0 {
        exited.wait_until(&mut live, next_tick);
        if *live > 0 && Instant::now() >= next_tick {
            MutexGuard::unlocked(&mut live, || reporter.tick(aggregator));
            next_tick += interval;
        }
    }
}

fn check_passwords<V: Verifier + ?Sized>(ctx: &RunContext<'_, V>) {
    debug!("Checker started");
    while !ctx.shared.is_stopped() {
        let Some(batch) = ctx.queue.pop(|| ctx.shared.is_stopped()) else {
            break;
        };

        for candidate in batch {
            if ctx.shared.is_stopped() {
                break;
            }

            let started = Instant::now();
            let verdict = ctx.verifier.attempt(&candidate);
            let elapsed = started.elapsed();

            let success = match verdict {
                Ok(Verdict::Matched) => true,
                Ok(Verdict::NotMatched) => false,
                Err(e) if !e.is_fatal() => false,
                Err(e) => {
                    warn!("Aborting run, verifier failed on a candidate: {e}");
                    if ctx.shared.abort(e) {
                        ctx.queue.close();
                    }
                    return;
                }
            };

            let outcome = VerificationOutcome {
                candidate,
                success,
                elapsed,
            };
            let attempts = ctx.aggregator.record(&outcome);

            if outcome.success {
                if ctx.shared.record_match(&outcome.candidate) {
                    info!("Password found after {attempts} attempts");
                    ctx.queue.close();
                }
                return;
            }
            ctx.reporter.on_attempt(attempts, ctx.aggregator);
        }
    }
    debug!("Checker exiting");
}
