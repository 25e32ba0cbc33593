use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{CrackError, Result};
use crate::pool::WorkerPool;
use crate::progress::Cadence;
use crate::strategy::AttackStrategy;

/// Options for one attack run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackConfig {
    pub strategy: AttackStrategy,

    /// Number of checker threads
    #[serde(default = "default_thread_count")]
    pub thread_count: usize,

    /// Word list used by dictionary and hybrid strategies whose own list is
    /// empty. Falls back to the built-in common passwords.
    #[serde(default)]
    pub dictionary: Option<Vec<String>>,

    /// Candidates handed to a checker at a time
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    #[serde(default)]
    pub cadence: Cadence,
}

fn default_thread_count() -> usize {
    4
}

fn default_batch_size() -> usize {
    256
}

impl AttackConfig {
    pub fn new(strategy: AttackStrategy) -> Self {
        AttackConfig {
            strategy,
            thread_count: default_thread_count(),
            dictionary: None,
            batch_size: default_batch_size(),
            cadence: Cadence::default(),
        }
    }

    pub fn with_threads(mut self, thread_count: usize) -> Self {
        self.thread_count = thread_count;
        self
    }

    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_dictionary(mut self, words: Vec<String>) -> Self {
        self.dictionary = Some(words);
        self
    }

    pub fn with_cadence(mut self, cadence: Cadence) -> Self {
        self.cadence = cadence;
        self
    }

    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        info!("Configuration loaded from: {}", path.display());
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: AttackConfig = toml::from_str(content)
            .map_err(|e| CrackError::config(format!("failed to parse TOML config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.strategy.validate()?;
        WorkerPool::new(self.thread_count, self.batch_size)?;
        Ok(())
    }

    /// The strategy with every empty word list filled in.
    pub fn resolved_strategy(&self) -> AttackStrategy {
        self.strategy.clone().resolve(self.dictionary.as_deref())
    }
}

/// Reads a word list, one candidate per line. Blank lines are skipped and
/// Windows line endings are tolerated.
pub fn load_dictionary(path: impl AsRef<Path>) -> Result<Vec<String>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let words: Vec<String> = content
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect();
    info!("Loaded {} words from {}", words.len(), path.display());
    Ok(words)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charset::Charset;
    use std::io::Write;

    #[test]
    fn test_defaults_from_minimal_toml() {
        let config = AttackConfig::from_toml_str(
            "[strategy]\nmode = \"hybrid\"\ncharset = \"digits\"\nsuffix_len = 2\n",
        )
        .unwrap();
        assert_eq!(config.thread_count, 4);
        assert_eq!(config.batch_size, 256);
        assert_eq!(config.cadence, Cadence::default());
        assert_eq!(
            config.strategy,
            AttackStrategy::Hybrid {
                words: vec![],
                charset: Charset::Digits,
                suffix_len: 2,
            }
        );
    }

    #[test]
    fn test_unknown_charset_is_invalid_configuration() {
        let err = AttackConfig::from_toml_str(
            "[strategy]\nmode = \"brute_force\"\ncharset = \"emoji\"\nmin_len = 1\nmax_len = 2\n",
        )
        .unwrap_err();
        assert!(matches!(err, CrackError::InvalidConfiguration(_)));
    }

    #[test]
    fn test_charset_aliases_in_toml() {
        let config = AttackConfig::from_toml_str(
            "[strategy]\nmode = \"brute_force\"\ncharset = \"lowercase\"\nmin_len = 1\nmax_len = 2\n",
        )
        .unwrap();
        assert_eq!(
            config.strategy,
            AttackStrategy::BruteForce {
                charset: Charset::Lower,
                min_len: 1,
                max_len: 2,
            }
        );
    }

    #[test]
    fn test_zero_threads_rejected() {
        let config =
            AttackConfig::new(AttackStrategy::Dictionary { words: vec![] }).with_threads(0);
        assert!(matches!(
            config.validate(),
            Err(CrackError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_config_round_trips_through_toml() {
        let config = AttackConfig::new(AttackStrategy::BruteForce {
            charset: Charset::Lower,
            min_len: 1,
            max_len: 3,
        })
        .with_threads(2);
        let text = toml::to_string(&config).unwrap();
        assert_eq!(AttackConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn test_resolved_strategy_uses_dictionary_option() {
        let config = AttackConfig::new(AttackStrategy::Dictionary { words: vec![] })
            .with_dictionary(vec!["a".into(), "b".into()]);
        assert_eq!(config.resolved_strategy().total(), 2);
    }

    #[test]
    fn test_load_dictionary_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "alpha\r\n\nbeta\ngamma\n").unwrap();
        let words = load_dictionary(file.path()).unwrap();
        assert_eq!(words, vec!["alpha", "beta", "gamma"]);
    }
}
