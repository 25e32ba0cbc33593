use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::strategy::AttackStrategy;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Created,
    Running,
    Success,
    Failed,
    Cancelled,
}

impl RunStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunStatus::Success | RunStatus::Failed | RunStatus::Cancelled
        )
    }
}

/// Why a `Failed` run stopped early. Exhausting the search space leaves
/// the cause empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FailureCause {
    ArchiveUnreadable(String),
    WorkerSpawn(String),
}

/// One invocation of the engine, from start to terminal status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttackRun {
    pub id: u64,
    pub target: String,
    pub strategy: AttackStrategy,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub status: RunStatus,
    pub attempts: u64,
    pub total: u64,
    /// Candidates per second: the latest sample while running, the run
    /// average once terminal.
    pub throughput: f64,
    pub elapsed_secs: f64,
    pub found: Option<String>,
    pub failure: Option<FailureCause>,
}

impl AttackRun {
    pub fn new(id: u64, target: impl Into<String>, strategy: AttackStrategy, total: u64) -> Self {
        AttackRun {
            id,
            target: target.into(),
            strategy,
            started_at: Utc::now(),
            ended_at: None,
            status: RunStatus::Created,
            attempts: 0,
            total,
            throughput: 0.0,
            elapsed_secs: 0.0,
            found: None,
            failure: None,
        }
    }

    pub fn start(&mut self) {
        if self.status == RunStatus::Created {
            self.status = RunStatus::Running;
            self.started_at = Utc::now();
        }
    }

    /// Moves a running record to a terminal status. Returns false, leaving
    /// the record untouched, if it was not running.
    pub fn finish(&mut self, end: RunEnd, attempts: u64, elapsed: Duration) -> bool {
        if self.status != RunStatus::Running {
            return false;
        }

        let (status, found, failure) = match end {
            RunEnd::Found(password) => (RunStatus::Success, Some(password), None),
            RunEnd::Exhausted => (RunStatus::Failed, None, None),
            RunEnd::Failed(cause) => (RunStatus::Failed, None, Some(cause)),
            RunEnd::Cancelled => (RunStatus::Cancelled, None, None),
        };

        let secs = elapsed.as_secs_f64();
        self.status = status;
        self.found = found;
        self.failure = failure;
        self.attempts = attempts;
        self.elapsed_secs = secs;
        self.throughput = if secs > 0.0 { attempts as f64 / secs } else { 0.0 };
        self.ended_at = Some(Utc::now());
        true
    }

    pub fn is_exhausted(&self) -> bool {
        self.status == RunStatus::Failed && self.failure.is_none()
    }
}

/// How a run ended, as decided by the worker pool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunEnd {
    Found(String),
    Exhausted,
    Failed(FailureCause),
    Cancelled,
}

/// Averages over the successful runs of one strategy kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KindSummary {
    pub kind: String,
    pub runs: usize,
    pub avg_attempts: f64,
    pub avg_secs: f64,
    pub avg_throughput: f64,
}

/// Append-only ledger of finished runs, kept for the life of the process.
#[derive(Debug)]
pub struct AttackHistory {
    runs: Mutex<Vec<AttackRun>>,
    next_id: AtomicU64,
}

impl AttackHistory {
    pub fn new() -> Self {
        AttackHistory {
            runs: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Hands out run ids; ids keep increasing across `clear`.
    pub fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Appends a finished run. Runs that are not terminal are rejected.
    pub fn append(&self, run: AttackRun) -> bool {
        if !run.status.is_terminal() {
            return false;
        }
        self.runs.lock().push(run);
        true
    }

    pub fn list(&self) -> Vec<AttackRun> {
        self.runs.lock().clone()
    }

    pub fn get(&self, id: u64) -> Option<AttackRun> {
        self.runs.lock().iter().find(|run| run.id == id).cloned()
    }

    pub fn latest(&self) -> Option<AttackRun> {
        self.runs.lock().last().cloned()
    }

    pub fn len(&self) -> usize {
        self.runs.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.lock().is_empty()
    }

    pub fn clear(&self) {
        self.runs.lock().clear();
    }

    /// Per-strategy averages over successful runs, sorted by kind.
    pub fn summary(&self) -> Vec<KindSummary> {
        let runs = self.runs.lock();
        let mut by_kind: BTreeMap<&'static str, Vec<&AttackRun>> = BTreeMap::new();
        for run in runs.iter().filter(|run| run.status == RunStatus::Success) {
            by_kind.entry(run.strategy.kind()).or_default().push(run);
        }

        by_kind
            .into_iter()
            .map(|(kind, runs)| {
                let n = runs.len() as f64;
                KindSummary {
                    kind: kind.to_string(),
                    runs: runs.len(),
                    avg_attempts: runs.iter().map(|r| r.attempts as f64).sum::<f64>() / n,
                    avg_secs: runs.iter().map(|r| r.elapsed_secs).sum::<f64>() / n,
                    avg_throughput: runs.iter().map(|r| r.throughput).sum::<f64>() / n,
                }
            })
            .collect()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&*self.runs.lock())?)
    }
}

impl Default for AttackHistory {
    fn default() -> Self {
        Self::new()
    }
}
