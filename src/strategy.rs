use std::fmt;

use serde::{Deserialize, Serialize};

use crate::candidates::{unique_words, COMMON_PASSWORDS};
use crate::charset::Charset;
use crate::error::{CrackError, Result};

/// How the search space of a run is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AttackStrategy {
    Dictionary {
        #[serde(default)]
        words: Vec<String>,
    },
    BruteForce {
        charset: Charset,
        min_len: usize,
        max_len: usize,
    },
    Hybrid {
        #[serde(default)]
        words: Vec<String>,
        charset: Charset,
        suffix_len: usize,
    },
}

impl AttackStrategy {
    pub fn kind(&self) -> &'static str {
        match self {
            AttackStrategy::Dictionary { .. } => "dictionary",
            AttackStrategy::BruteForce { .. } => "brute_force",
            AttackStrategy::Hybrid { .. } => "hybrid",
        }
    }

    pub fn validate(&self) -> Result<()> {
        if let AttackStrategy::BruteForce { min_len, max_len, .. } = *self {
            if min_len < 1 {
                return Err(CrackError::config("min_len must be at least 1"));
            }
            if min_len > max_len {
                return Err(CrackError::config(format!(
                    "min_len ({min_len}) must be less than or equal to max_len ({max_len})"
                )));
            }
        }
        Ok(())
    }

    /// Fills an empty word list from `fallback`, then from the built-in
    /// common passwords, and removes duplicate words.
    pub fn resolve(self, fallback: Option<&[String]>) -> AttackStrategy {
        let fill = |words: Vec<String>| -> Vec<String> {
            if !words.is_empty() {
                return unique_words(&words);
            }
            match fallback {
                Some(list) if !list.is_empty() => unique_words(list),
                _ => COMMON_PASSWORDS.iter().map(|w| w.to_string()).collect(),
            }
        };

        match self {
            AttackStrategy::Dictionary { words } => AttackStrategy::Dictionary { words: fill(words) },
            AttackStrategy::Hybrid {
                words,
                charset,
                suffix_len,
            } => AttackStrategy::Hybrid {
                words: fill(words),
                charset,
                suffix_len,
            },
            brute @ AttackStrategy::BruteForce { .. } => brute,
        }
    }

    /// Exact number of candidates, saturating at `u64::MAX`.
    pub fn total(&self) -> u64 {
        match self {
            AttackStrategy::Dictionary { words } => unique_words(words).len() as u64,
            AttackStrategy::BruteForce {
                charset,
                min_len,
                max_len,
            } => (*min_len..=*max_len).fold(0u64, |acc, len| {
                acc.saturating_add(space_size(charset.len(), len))
            }),
            AttackStrategy::Hybrid {
                words,
                charset,
                suffix_len,
            } => (unique_words(words).len() as u64)
                .saturating_mul(space_size(charset.len(), *suffix_len)),
        }
    }
}

impl fmt::Display for AttackStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttackStrategy::Dictionary { words } => write!(f, "dictionary ({} words)", words.len()),
            AttackStrategy::BruteForce {
                charset,
                min_len,
                max_len,
            } => write!(f, "brute force ({charset}, length {min_len}..={max_len})"),
            AttackStrategy::Hybrid {
                words,
                charset,
                suffix_len,
            } => write!(
                f,
                "hybrid ({} words + {suffix_len} {charset} chars)",
                words.len()
            ),
        }
    }
}

fn space_size(charset_len: usize, len: usize) -> u64 {
    let exp = u32::try_from(len).unwrap_or(u32::MAX);
    (charset_len as u64).saturating_pow(exp)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_brute_force_rejects_inverted_range() {
        let strategy = AttackStrategy::BruteForce {
            charset: Charset::Digits,
            min_len: 3,
            max_len: 2,
        };
        assert!(matches!(
            strategy.validate(),
            Err(CrackError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_brute_force_rejects_zero_min_len() {
        let strategy = AttackStrategy::BruteForce {
            charset: Charset::Digits,
            min_len: 0,
            max_len: 2,
        };
        assert!(strategy.validate().is_err());
    }

    #[test]
    fn test_brute_force_total_sums_lengths() {
        let strategy = AttackStrategy::BruteForce {
            charset: Charset::Digits,
            min_len: 1,
            max_len: 3,
        };
        assert_eq!(strategy.total(), 10 + 100 + 1000);
    }

    #[test]
    fn test_hybrid_total() {
        let strategy = AttackStrategy::Hybrid {
            words: words(&["a", "b", "a"]),
            charset: Charset::Lower,
            suffix_len: 2,
        };
        assert_eq!(strategy.total(), 2 * 26 * 26);
    }

    #[test]
    fn test_total_saturates() {
        let strategy = AttackStrategy::BruteForce {
            charset: Charset::All,
            min_len: 1,
            max_len: 64,
        };
        assert_eq!(strategy.total(), u64::MAX);
    }

    #[test]
    fn test_resolve_falls_back_to_common_passwords() {
        let resolved = AttackStrategy::Dictionary { words: vec![] }.resolve(None);
        assert_eq!(resolved.total(), COMMON_PASSWORDS.len() as u64);

        let fallback = words(&["x", "y", "x"]);
        let resolved = AttackStrategy::Dictionary { words: vec![] }.resolve(Some(&fallback));
        assert_eq!(resolved, AttackStrategy::Dictionary { words: words(&["x", "y"]) });
    }

    #[test]
    fn test_strategy_from_toml() {
        let strategy: AttackStrategy =
            toml::from_str("mode = \"brute_force\"\ncharset = \"digits\"\nmin_len = 1\nmax_len = 4\n")
                .unwrap();
        assert_eq!(
            strategy,
            AttackStrategy::BruteForce {
                charset: Charset::Digits,
                min_len: 1,
                max_len: 4,
            }
        );
    }
}
