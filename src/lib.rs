//! Password recovery for encrypted archives.
//!
//! Candidates are generated lazily from a dictionary, a brute-force
//! charset or a mix of both, and tested concurrently by a pool of checker
//! threads until one verifies, the space is exhausted or the run is
//! cancelled. Every run ends up in an [`AttackHistory`].

pub mod candidates;
pub mod charset;
pub mod config;
pub mod engine;
pub mod error;
pub mod history;
pub mod pool;
pub mod progress;
pub mod queue;
pub mod strategy;
pub mod strength;
pub mod verifier;
pub mod zip_verifier;

pub use candidates::{Candidates, COMMON_PASSWORDS};
pub use charset::Charset;
pub use config::{load_dictionary, AttackConfig};
pub use engine::{Attack, CancelHandle, Engine};
pub use error::{CrackError, Result};
pub use history::{AttackHistory, AttackRun, FailureCause, KindSummary, RunEnd, RunStatus};
pub use pool::{SharedRunState, StopReason, WorkerPool};
pub use progress::{Cadence, Observer, Progress};
pub use strategy::AttackStrategy;
pub use strength::{score, Strength};
pub use verifier::{Verdict, Verifier, VerifyError};
pub use zip_verifier::ZipVerifier;
