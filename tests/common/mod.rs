//! Verifier doubles shared across integration tests

use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

use zipcrack::{Verdict, Verifier, VerifyError};

/// Accepts only the listed passwords.
pub struct PasswordVerifier {
    passwords: Vec<String>,
    delay: Option<Duration>,
    calls: AtomicU64,
}

#[allow(dead_code)] // Used across multiple test files
impl PasswordVerifier {
    pub fn new(password: &str) -> Self {
        Self::accepting(&[password])
    }

    pub fn accepting(passwords: &[&str]) -> Self {
        PasswordVerifier {
            passwords: passwords.iter().map(|p| p.to_string()).collect(),
            delay: None,
            calls: AtomicU64::new(0),
        }
    }

    /// Sleeps on every attempt, to keep a run busy long enough to cancel it.
    pub fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Verifier for PasswordVerifier {
    fn attempt(&self, candidate: &str) -> Result<Verdict, VerifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }
        if self.passwords.iter().any(|p| p == candidate) {
            Ok(Verdict::Matched)
        } else {
            Err(VerifyError::WrongPassword)
        }
    }

    fn requires_password(&self) -> Result<bool, VerifyError> {
        Ok(true)
    }
}

/// Fails every attempt as if the archive were truncated.
#[derive(Default)]
pub struct BrokenVerifier {
    calls: AtomicU64,
}

#[allow(dead_code)] // Used across multiple test files
impl BrokenVerifier {
    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Verifier for BrokenVerifier {
    fn attempt(&self, _candidate: &str) -> Result<Verdict, VerifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(VerifyError::Unreadable("unexpected end of archive".to_string()))
    }

    fn requires_password(&self) -> Result<bool, VerifyError> {
        Err(VerifyError::Unreadable("unexpected end of archive".to_string()))
    }
}
