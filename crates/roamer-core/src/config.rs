//! Explorer configuration: strategy choice, pacing, seed, input dictionary
//! and where action logs go.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use roamer_explore::StrategyKind;
use serde::{Deserialize, Serialize};

/// Characters offered one at a time when no dictionary file is given.
const DEFAULT_ALPHABET: &str =
    "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ123456890!@#$%^&*()_+,./<>?;':";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    /// Strategy the runner starts with.
    pub strategy: StrategyKind,
    /// Pause between supervised steps, in milliseconds.
    pub step_interval_ms: u64,
    /// Length of a `Delay` action and of the waits inside external-link
    /// and delayed-back actions, in milliseconds.
    pub settle_delay_ms: u64,
    /// Seed for the random strategy.
    pub seed: u64,
    /// Input strings for the random strategy.
    pub dictionary: Vec<String>,
    /// One input string per line; replaces `dictionary` when set.
    pub dictionary_file: Option<PathBuf>,
    pub log_dir: PathBuf,
    /// Log files are named `<log_prefix>.<n>.log`.
    pub log_prefix: String,
    /// Action log read by the replay strategy.
    pub replay_log: Option<PathBuf>,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::DepthFirst,
            step_interval_ms: 500,
            settle_delay_ms: 2000,
            seed: 42,
            dictionary: DEFAULT_ALPHABET.chars().map(String::from).collect(),
            dictionary_file: None,
            log_dir: PathBuf::from("."),
            log_prefix: "hybrid_app_tester".to_string(),
            replay_log: None,
        }
    }
}

impl ExplorerConfig {
    /// Parse, resolve and validate.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let mut config: ExplorerConfig = serde_json::from_str(text)?;
        config.resolve()?;
        config.validate()?;
        Ok(config)
    }

    /// Load the dictionary file, if one is set, into `dictionary`.
    pub fn resolve(&mut self) -> Result<(), ConfigError> {
        self.load_dictionary_file()
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dictionary.is_empty() {
            return Err(ConfigError::Invalid("input dictionary is empty".to_string()));
        }
        // Action logs are line-oriented.
        if let Some(entry) = self.dictionary.iter().find(|e| e.contains(['\n', '\r'])) {
            return Err(ConfigError::Invalid(format!(
                "dictionary entry {entry:?} contains a line break"
            )));
        }
        if self.log_prefix.is_empty() {
            return Err(ConfigError::Invalid("log_prefix is empty".to_string()));
        }
        if self.strategy == StrategyKind::Replay && self.replay_log.is_none() {
            return Err(ConfigError::Invalid(
                "replay strategy needs replay_log".to_string(),
            ));
        }
        Ok(())
    }

    pub fn step_interval(&self) -> Duration {
        Duration::from_millis(self.step_interval_ms)
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    fn load_dictionary_file(&mut self) -> Result<(), ConfigError> {
        let Some(path) = &self.dictionary_file else {
            return Ok(());
        };
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        self.dictionary = text.lines().map(String::from).collect();
        tracing::info!(path = %path.display(), entries = self.dictionary.len(), "loaded input dictionary");
        Ok(())
    }
}
