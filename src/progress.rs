//! Attempt accounting and the live progress callback.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::history::AttackRun;

/// One verified candidate, as published by a worker.
#[derive(Debug, Clone)]
pub struct VerificationOutcome {
    pub candidate: String,
    pub success: bool,
    pub elapsed: Duration,
}

/// Snapshot handed to an [`Observer`].
#[derive(Debug, Clone, PartialEq)]
pub struct Progress {
    pub attempts: u64,
    pub total: u64,
    pub last_candidate: String,
    pub matched: bool,
    /// Candidates per second over the latest sampling window.
    pub throughput: f64,
}

/// Receives progress snapshots. Called from worker threads and from the
/// coordinating thread, never concurrently, and never after the final
/// snapshot of a run.
pub trait Observer: Send + Sync {
    fn on_progress(&self, progress: &Progress);
}

impl<F> Observer for F
where
    F: Fn(&Progress) + Send + Sync,
{
    fn on_progress(&self, progress: &Progress) {
        self(progress)
    }
}

/// When progress is sampled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cadence {
    /// Wall-clock sampling period.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,
    /// Additionally sample every N attempts.
    #[serde(default = "default_every_attempts")]
    pub every_attempts: Option<u64>,
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_every_attempts() -> Option<u64> {
    Some(100)
}

impl Default for Cadence {
    fn default() -> Self {
        Cadence {
            interval_ms: default_interval_ms(),
            every_attempts: default_every_attempts(),
        }
    }
}

impl Cadence {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.max(1))
    }
}

/// Run-wide tallies, updated lock-free by every worker.
pub struct ResultAggregator {
    attempts: AtomicU64,
    busy_nanos: AtomicU64,
    matched: AtomicBool,
    last_candidate: Mutex<String>,
    started: Instant,
}

impl ResultAggregator {
    pub fn new() -> Self {
        ResultAggregator {
            attempts: AtomicU64::new(0),
            busy_nanos: AtomicU64::new(0),
            matched: AtomicBool::new(false),
            last_candidate: Mutex::new(String::new()),
            started: Instant::now(),
        }
    }

    /// Counts one outcome and returns the attempt count including it.
    pub fn record(&self, outcome: &VerificationOutcome) -> u64 {
        let nanos = u64::try_from(outcome.elapsed.as_nanos()).unwrap_or(u64::MAX);
        self.busy_nanos.fetch_add(nanos, Ordering::Relaxed);

        if outcome.success {
            let mut last = self.last_candidate.lock();
            if !self.matched.swap(true, Ordering::Relaxed) {
                last.clone_from(&outcome.candidate);
            }
        } else if let Some(mut last) = self.last_candidate.try_lock() {
            // Best effort: a contended sample is simply skipped, and a
            // matched candidate is never overwritten.
            if !self.matched.load(Ordering::Relaxed) {
                last.clone_from(&outcome.candidate);
            }
        }

        self.attempts.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::Relaxed)
    }

    pub fn last_candidate(&self) -> String {
        self.last_candidate.lock().clone()
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Mean verifier time per attempt, summed across workers.
    pub fn mean_attempt_time(&self) -> Duration {
        match self.attempts() {
            0 => Duration::ZERO,
            n => Duration::from_nanos(self.busy_nanos.load(Ordering::Relaxed) / n),
        }
    }

    /// Average candidates per second since the run started.
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed().as_secs_f64();
        if secs > 0.0 {
            self.attempts() as f64 / secs
        } else {
            0.0
        }
    }
}

impl Default for ResultAggregator {
    fn default() -> Self {
        Self::new()
    }
}

struct ReporterState {
    closed: bool,
    window_start: Instant,
    window_attempts: u64,
    throughput: f64,
}

/// Samples a [`ResultAggregator`] on a fixed cadence, keeps the live
/// [`AttackRun`] current and forwards snapshots to the observer.
pub struct ProgressReporter<'a> {
    total: u64,
    cadence: Cadence,
    observer: Option<&'a dyn Observer>,
    run: &'a Mutex<AttackRun>,
    state: Mutex<ReporterState>,
}

impl<'a> ProgressReporter<'a> {
    pub fn new(
        total: u64,
        cadence: Cadence,
        observer: Option<&'a dyn Observer>,
        run: &'a Mutex<AttackRun>,
    ) -> Self {
        ProgressReporter {
            total,
            cadence,
            observer,
            run,
            state: Mutex::new(ReporterState {
                closed: false,
                window_start: Instant::now(),
                window_attempts: 0,
                throughput: 0.0,
            }),
        }
    }

    pub fn interval(&self) -> Duration {
        self.cadence.interval()
    }

    /// Called by a worker after each counted attempt.
    pub fn on_attempt(&self, attempts: u64, aggregator: &ResultAggregator) {
        if let Some(every) = self.cadence.every_attempts {
            if every > 0 && attempts % every == 0 {
                self.sample(aggregator);
            }
        }
    }

    /// Called by the coordinating thread once per interval.
    pub fn tick(&self, aggregator: &ResultAggregator) {
        self.sample(aggregator);
    }

    /// Takes a snapshot and notifies the observer, unless the run is over.
    pub fn sample(&self, aggregator: &ResultAggregator) -> Option<Progress> {
        let mut state = self.state.lock();
        if state.closed {
            return None;
        }

        // Read under the lock so successive snapshots never go backwards.
        let attempts = aggregator.attempts();
        let window = state.window_start.elapsed();
        if window >= self.cadence.interval() || state.throughput == 0.0 {
            let secs = window.as_secs_f64();
            if secs > 0.0 {
                state.throughput = attempts.saturating_sub(state.window_attempts) as f64 / secs;
            }
            if window >= self.cadence.interval() {
                state.window_start = Instant::now();
                state.window_attempts = attempts;
            }
        }

        let progress = Progress {
            attempts,
            total: self.total,
            last_candidate: aggregator.last_candidate(),
            matched: false,
            throughput: state.throughput,
        };
        self.publish(&progress);
        Some(progress)
    }

    /// Emits the final snapshot and closes the reporter. Later samples are
    /// dropped.
    pub fn finish(&self, aggregator: &ResultAggregator, matched: bool) -> Option<Progress> {
        let mut state = self.state.lock();
        if state.closed {
            return None;
        }
        state.closed = true;

        let progress = Progress {
            attempts: aggregator.attempts(),
            total: self.total,
            last_candidate: aggregator.last_candidate(),
            matched,
            throughput: aggregator.throughput(),
        };
        self.publish(&progress);
        Some(progress)
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    fn publish(&self, progress: &Progress) {
        {
            let mut run = self.run.lock();
            run.attempts = progress.attempts;
            run.throughput = progress.throughput;
        }
        if let Some(observer) = self.observer {
            observer.on_progress(progress);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::strategy::AttackStrategy;
    use std::sync::Arc;
    use std::thread;

    fn outcome(candidate: &str, success: bool) -> VerificationOutcome {
        VerificationOutcome {
            candidate: candidate.to_string(),
            success,
            elapsed: Duration::from_micros(10),
        }
    }

    fn live_run() -> Mutex<AttackRun> {
        Mutex::new(AttackRun::new(
            1,
            "test.zip",
            AttackStrategy::Dictionary { words: vec![] },
            10,
        ))
    }

    #[test]
    fn test_aggregator_counts_attempts() {
        let aggregator = ResultAggregator::new();
        assert_eq!(aggregator.record(&outcome("a", false)), 1);
        assert_eq!(aggregator.record(&outcome("b", true)), 2);
        assert_eq!(aggregator.attempts(), 2);
        assert_eq!(aggregator.last_candidate(), "b");
        assert_eq!(aggregator.mean_attempt_time(), Duration::from_micros(10));
    }

    #[test]
    fn test_aggregator_counts_across_threads() {
        let aggregator = Arc::new(ResultAggregator::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let aggregator = Arc::clone(&aggregator);
                thread::spawn(move || {
                    for i in 0..250 {
                        aggregator.record(&outcome(&i.to_string(), false));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(aggregator.attempts(), 1000);
    }

    #[test]
    fn test_every_n_attempts_cadence() {
        let seen = Mutex::new(Vec::new());
        let observer = |p: &Progress| seen.lock().push(p.attempts);
        let run = live_run();
        let cadence = Cadence {
            interval_ms: 60_000,
            every_attempts: Some(3),
        };
        let reporter = ProgressReporter::new(10, cadence, Some(&observer), &run);
        let aggregator = ResultAggregator::new();
        for i in 0..10 {
            let attempts = aggregator.record(&outcome(&i.to_string(), false));
            reporter.on_attempt(attempts, &aggregator);
        }
        assert_eq!(*seen.lock(), vec![3, 6, 9]);
        assert_eq!(run.lock().attempts, 9);
    }

    #[test]
    fn test_no_callbacks_after_finish() {
        let calls = Mutex::new(Vec::new());
        let observer = |p: &Progress| calls.lock().push(p.matched);
        let run = live_run();
        let reporter = ProgressReporter::new(10, Cadence::default(), Some(&observer), &run);
        let aggregator = ResultAggregator::new();

        aggregator.record(&outcome("x", true));
        assert!(reporter.finish(&aggregator, true).is_some());
        assert!(reporter.is_closed());
        assert!(reporter.sample(&aggregator).is_none());
        assert!(reporter.finish(&aggregator, false).is_none());
        assert_eq!(*calls.lock(), vec![true]);
    }

    #[test]
    fn test_snapshots_are_monotonic_under_contention() {
        let seen = Mutex::new(Vec::new());
        let observer = |p: &Progress| seen.lock().push(p.attempts);
        let run = live_run();
        let cadence = Cadence {
            interval_ms: 1,
            every_attempts: Some(1),
        };
        let reporter = ProgressReporter::new(0, cadence, Some(&observer), &run);
        let aggregator = ResultAggregator::new();

        thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    for _ in 0..200 {
                        let attempts = aggregator.record(&outcome("c", false));
                        reporter.on_attempt(attempts, &aggregator);
                    }
                });
            }
        });

        let seen = seen.lock();
        assert_eq!(seen.len(), 800);
        assert!(seen.windows(2).all(|pair| pair[0] <= pair[1]));
    }
}
