use std::fmt;

use serde::Serialize;

use crate::candidates::is_common_password;

const COMMON_PENALTY: i32 = 30;
const CLASS_BONUS: i32 = 15;

/// Scores a password from 0 to 100.
///
/// Four points per character up to 40, fifteen for every character class
/// (lowercase, uppercase, digit, ASCII symbol) beyond the first, minus
/// thirty for a well-known password.
pub fn score(password: &str) -> u8 {
    let length = password.chars().count().min(10) as i32;
    let mut total = length * 4;

    let classes = [
        password.chars().any(|c| c.is_ascii_lowercase()),
        password.chars().any(|c| c.is_ascii_uppercase()),
        password.chars().any(|c| c.is_ascii_digit()),
        password.chars().any(|c| c.is_ascii_punctuation()),
    ]
    .into_iter()
    .filter(|present| *present)
    .count() as i32;
    total += (classes - 1) * CLASS_BONUS;

    if is_common_password(password) {
        total -= COMMON_PENALTY;
    }

    total.clamp(0, 100) as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Strength {
    Weak,
    Fair,
    Good,
    Strong,
}

impl Strength {
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=39 => Strength::Weak,
            40..=59 => Strength::Fair,
            60..=79 => Strength::Good,
            _ => Strength::Strong,
        }
    }

    pub fn of(password: &str) -> Self {
        Self::from_score(score(password))
    }
}

impl fmt::Display for Strength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Strength::Weak => "weak",
            Strength::Fair => "fair",
            Strength::Good => "good",
            Strength::Strong => "strong",
        };
        f.write_str(label)
    }
}

/// Histogram of scores over `buckets` equal-width bins covering 0..=100.
pub fn distribution<I, S>(passwords: I, buckets: usize) -> Vec<usize>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    if buckets == 0 {
        return Vec::new();
    }
    let mut counts = vec![0usize; buckets];
    for password in passwords {
        let bin = usize::from(score(password.as_ref())) * buckets / 101;
        counts[bin] += 1;
    }
    counts
}
