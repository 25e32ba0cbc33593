use thiserror::Error;

/// Result of testing one candidate that the verifier could evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Matched,
    NotMatched,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    /// The archive rejected the candidate. Expected, never fatal.
    #[error("wrong password")]
    WrongPassword,

    #[error("archive is corrupt: {0}")]
    Corrupt(String),

    #[error("archive is unreadable: {0}")]
    Unreadable(String),
}

impl VerifyError {
    /// Whether this error must abort the whole run.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, VerifyError::WrongPassword)
    }
}

/// Capability to test passwords against one encrypted archive.
///
/// Implementations are shared by every worker of a run, so `attempt` takes
/// `&self`; if the underlying format needs exclusive access, the verifier
/// serializes that internally.
pub trait Verifier: Sync {
    fn attempt(&self, candidate: &str) -> Result<Verdict, VerifyError>;

    /// Whether the archive is protected at all. Callers check this before
    /// starting an attack; the engine never calls it.
    fn requires_password(&self) -> Result<bool, VerifyError>;
}

impl<V: Verifier + ?Sized> Verifier for &V {
    fn attempt(&self, candidate: &str) -> Result<Verdict, VerifyError> {
        (**self).attempt(candidate)
    }

    fn requires_password(&self) -> Result<bool, VerifyError> {
        (**self).requires_password()
    }
}
