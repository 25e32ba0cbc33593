//! Lazy enumeration of password candidates.
//!
//! Brute-force and hybrid spaces grow exponentially, so nothing here ever
//! materializes the whole space: [`Candidates`] is an iterator that keeps
//! only an odometer of charset indices and produces one string per call.

use std::collections::HashSet;

use crate::strategy::AttackStrategy;

/// Built-in dictionary, used when no word list is supplied and by the
/// strength scorer's common-password penalty.
pub const COMMON_PASSWORDS: [&str; 25] = [
    "password",
    "123456",
    "12345678",
    "123456789",
    "admin",
    "qwerty",
    "abc123",
    "letmein",
    "welcome",
    "password1",
    "12345",
    "1234567",
    "123123",
    "111111",
    "sunshine",
    "iloveyou",
    "monkey",
    "dragon",
    "football",
    "baseball",
    "000000",
    "1qaz2wsx",
    "qwertyuiop",
    "zxcvbnm",
    "asdfgh",
];

pub fn is_common_password(password: &str) -> bool {
    let lowered = password.to_lowercase();
    COMMON_PASSWORDS.iter().any(|common| *common == lowered)
}

/// Removes duplicates, keeping the first occurrence of every word.
pub fn unique_words(words: &[String]) -> Vec<String> {
    let mut seen = HashSet::with_capacity(words.len());
    words
        .iter()
        .filter(|word| seen.insert(word.as_str()))
        .cloned()
        .collect()
}

/// Every string over `chars` with a length in `min_len..=max_len`, shorter
/// lengths first and the rightmost position cycling fastest.
#[derive(Debug, Clone)]
struct Odometer {
    chars: Vec<char>,
    digits: Vec<usize>,
    max_len: usize,
    done: bool,
}

impl Odometer {
    fn new(chars: Vec<char>, min_len: usize, max_len: usize) -> Self {
        let done = min_len > max_len || (chars.is_empty() && min_len > 0);
        Odometer {
            chars,
            digits: vec![0; min_len],
            max_len,
            done,
        }
    }

    fn render(&self, prefix: &str) -> String {
        let mut out = String::with_capacity(prefix.len() + self.digits.len());
        out.push_str(prefix);
        out.extend(self.digits.iter().map(|&i| self.chars[i]));
        out
    }

    fn advance(&mut self) {
        let base = self.chars.len();
        for digit in self.digits.iter_mut().rev() {
            *digit += 1;
            if *digit < base {
                return;
            }
            *digit = 0;
        }

        // Every position wrapped: this length is exhausted.
        let next_len = self.digits.len() + 1;
        if next_len > self.max_len || base == 0 {
            self.done = true;
        } else {
            self.digits = vec![0; next_len];
        }
    }

    fn next_with_prefix(&mut self, prefix: &str) -> Option<String> {
        if self.done {
            return None;
        }
        let candidate = self.render(prefix);
        self.advance();
        Some(candidate)
    }
}

#[derive(Debug, Clone)]
enum Source {
    Words {
        words: Vec<String>,
        next: usize,
    },
    BruteForce(Odometer),
    Hybrid {
        words: Vec<String>,
        word: usize,
        chars: Vec<char>,
        suffix_len: usize,
        suffixes: Odometer,
    },
}

/// Deterministic, duplicate-free candidate stream for one strategy.
#[derive(Debug, Clone)]
pub struct Candidates {
    source: Source,
}

impl Candidates {
    pub fn new(strategy: &AttackStrategy) -> Self {
        let source = match strategy {
            AttackStrategy::Dictionary { words } => Source::Words {
                words: unique_words(words),
                next: 0,
            },
            AttackStrategy::BruteForce {
                charset,
                min_len,
                max_len,
            } => Source::BruteForce(Odometer::new(charset.chars(), *min_len, *max_len)),
            AttackStrategy::Hybrid {
                words,
                charset,
                suffix_len,
            } => {
                let chars = charset.chars();
                Source::Hybrid {
                    words: unique_words(words),
                    word: 0,
                    suffixes: Odometer::new(chars.clone(), *suffix_len, *suffix_len),
                    chars,
                    suffix_len: *suffix_len,
                }
            }
        };
        Candidates { source }
    }
}

impl Iterator for Candidates {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        match &mut self.source {
            Source::Words { words, next } => {
                let word = words.get(*next)?.clone();
                *next += 1;
                Some(word)
            }
            Source::BruteForce(odometer) => odometer.next_with_prefix(""),
            Source::Hybrid {
                words,
                word,
                chars,
                suffix_len,
                suffixes,
            } => loop {
                let base = words.get(*word)?;
                if let Some(candidate) = suffixes.next_with_prefix(base) {
                    return Some(candidate);
                }
                *word += 1;
                *suffixes = Odometer::new(chars.clone(), *suffix_len, *suffix_len);
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charset::Charset;

    fn words(list: &[&str]) -> Vec<String> {
        list.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_dictionary_keeps_order_and_dedups() {
        let strategy = AttackStrategy::Dictionary {
            words: words(&["abc", "target", "abc", "xyz"]),
        };
        let produced: Vec<String> = Candidates::new(&strategy).collect();
        assert_eq!(produced, words(&["abc", "target", "xyz"]));
    }

    #[test]
    fn test_brute_force_odometer_order() {
        let strategy = AttackStrategy::BruteForce {
            charset: Charset::Digits,
            min_len: 1,
            max_len: 2,
        };
        let produced: Vec<String> = Candidates::new(&strategy).collect();
        assert_eq!(produced.len(), 110);
        assert_eq!(produced[0], "0");
        assert_eq!(produced[9], "9");
        assert_eq!(produced[10], "00");
        assert_eq!(produced[11], "01");
        assert_eq!(produced[20], "10");
        assert_eq!(produced[109], "99");
    }

    #[test]
    fn test_brute_force_fixed_length_is_complete_and_unique() {
        let strategy = AttackStrategy::BruteForce {
            charset: Charset::Lower,
            min_len: 3,
            max_len: 3,
        };
        let produced: Vec<String> = Candidates::new(&strategy).collect();
        assert_eq!(produced.len(), 26usize.pow(3));
        assert!(produced.iter().all(|p| p.chars().count() == 3));
        let unique: HashSet<&String> = produced.iter().collect();
        assert_eq!(unique.len(), produced.len());
        assert_eq!(produced.first().map(String::as_str), Some("aaa"));
        assert_eq!(produced.last().map(String::as_str), Some("zzz"));
    }

    #[test]
    fn test_hybrid_prefixes_and_suffixes() {
        let charset = Charset::Digits;
        let strategy = AttackStrategy::Hybrid {
            words: words(&["cat", "dog"]),
            charset,
            suffix_len: 2,
        };
        let produced: Vec<String> = Candidates::new(&strategy).collect();
        assert_eq!(produced.len(), 2 * 100);
        assert_eq!(produced[0], "cat00");
        assert_eq!(produced[1], "cat01");
        assert_eq!(produced[100], "dog00");

        let alphabet = charset.chars();
        for candidate in &produced {
            let prefixes: Vec<&str> = ["cat", "dog"]
                .into_iter()
                .filter(|w| candidate.starts_with(w))
                .collect();
            assert_eq!(prefixes.len(), 1);
            let suffix = &candidate[prefixes[0].len()..];
            assert_eq!(suffix.chars().count(), 2);
            assert!(suffix.chars().all(|c| alphabet.contains(&c)));
        }
    }

    #[test]
    fn test_hybrid_zero_suffix_yields_words() {
        let strategy = AttackStrategy::Hybrid {
            words: words(&["one", "two"]),
            charset: Charset::Lower,
            suffix_len: 0,
        };
        let produced: Vec<String> = Candidates::new(&strategy).collect();
        assert_eq!(produced, words(&["one", "two"]));
    }

    #[test]
    fn test_lazy_consumption_stops_midstream() {
        let strategy = AttackStrategy::BruteForce {
            charset: Charset::All,
            min_len: 8,
            max_len: 8,
        };
        let mut candidates = Candidates::new(&strategy);
        let first: Vec<String> = candidates.by_ref().take(3).collect();
        assert_eq!(first, words(&["aaaaaaaa", "aaaaaaab", "aaaaaaac"]));
        assert_eq!(candidates.next().as_deref(), Some("aaaaaaad"));
    }

    #[test]
    fn test_common_password_lookup_is_case_insensitive() {
        assert!(is_common_password("PassWord"));
        assert!(!is_common_password("correct horse"));
    }
}
