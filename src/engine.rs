//! Orchestration of attack runs.
//!
//! An [`Engine`] owns the [`AttackHistory`]. [`Engine::attack`] validates a
//! configuration up front, so a bad configuration never produces a run
//! record, and returns an [`Attack`] that can be observed, cancelled from
//! another thread and finally run against a [`Verifier`].

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::info;

use crate::candidates::Candidates;
use crate::config::AttackConfig;
use crate::error::Result;
use crate::history::{AttackHistory, AttackRun, RunEnd};
use crate::pool::{SharedRunState, WorkerPool};
use crate::progress::{Cadence, Observer, ProgressReporter, ResultAggregator};
use crate::strategy::AttackStrategy;
use crate::verifier::Verifier;

#[derive(Debug, Default)]
pub struct Engine {
    history: AttackHistory,
}

impl Engine {
    pub fn new() -> Self {
        Engine {
            history: AttackHistory::new(),
        }
    }

    pub fn history(&self) -> &AttackHistory {
        &self.history
    }

    /// Prepares a run against `target`, failing with `InvalidConfiguration`
    /// before any thread is started.
    pub fn attack(&self, target: impl Into<String>, config: AttackConfig) -> Result<Attack<'_>> {
        config.validate()?;
        let pool = WorkerPool::new(config.thread_count, config.batch_size)?;
        let strategy = config.resolved_strategy();

        Ok(Attack {
            engine: self,
            target: target.into(),
            total: strategy.total(),
            strategy,
            pool,
            cadence: config.cadence,
            shared: Arc::new(SharedRunState::new()),
            observer: None,
        })
    }
}

/// Stops a run from any thread. The run ends as `Cancelled` unless it had
/// already found the password or failed.
#[derive(Debug, Clone)]
pub struct CancelHandle {
    shared: Arc<SharedRunState>,
}

impl CancelHandle {
    pub fn cancel(&self) -> bool {
        self.shared.cancel()
    }

    pub fn is_stopped(&self) -> bool {
        self.shared.is_stopped()
    }
}

/// A validated, not yet started run.
pub struct Attack<'e> {
    engine: &'e Engine,
    target: String,
    strategy: AttackStrategy,
    total: u64,
    pool: WorkerPool,
    cadence: Cadence,
    shared: Arc<SharedRunState>,
    observer: Option<Box<dyn Observer + 'e>>,
}

impl<'e> Attack<'e> {
    pub fn strategy(&self) -> &AttackStrategy {
        &self.strategy
    }

    pub fn thread_count(&self) -> usize {
        self.pool.thread_count()
    }

    /// Size of the search space.
    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn cancel_handle(&self) -> CancelHandle {
        CancelHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    pub fn observe(mut self, observer: impl Observer + 'e) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Runs to a terminal status, records the run in the engine's history
    /// and returns the finished record.
    pub fn run<V: Verifier + ?Sized>(self, verifier: &V) -> AttackRun {
        let history = &self.engine.history;
        let mut record = AttackRun::new(
            history.next_id(),
            self.target.clone(),
            self.strategy.clone(),
            self.total,
        );
        record.start();
        info!(
            "Starting run #{} on {} using {} with {} threads ({} candidates)",
            record.id,
            self.target,
            self.strategy,
            self.pool.thread_count(),
            self.total
        );

        let live = Mutex::new(record);
        let aggregator = ResultAggregator::new();
        let reporter =
            ProgressReporter::new(self.total, self.cadence, self.observer.as_deref(), &live);

        let end = self.pool.run(
            Candidates::new(&self.strategy),
            verifier,
            &self.shared,
            &aggregator,
            &reporter,
        );

        reporter.finish(&aggregator, matches!(end, RunEnd::Found(_)));
        drop(reporter);

        let mut record = live.into_inner();
        record.finish(end, aggregator.attempts(), aggregator.elapsed());
        info!(
            "Run #{} finished: {:?} after {} attempts in {:.2}s ({:.2} passwords/s, {:?} per attempt)",
            record.id,
            record.status,
            record.attempts,
            record.elapsed_secs,
            record.throughput,
            aggregator.mean_attempt_time()
        );

        history.append(record.clone());
        record
    }
}
