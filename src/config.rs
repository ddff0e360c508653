//! Search configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Tunables shared by both partition strategies.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Only the most frequent words are searched by combined queries
    pub vocab_limit: usize,
    /// Neighbours requested per query
    pub top_k: usize,
    /// Clusters per trial, i.e. the desired number of turns
    pub cluster_count: usize,
    /// Clustering trials
    pub trials: usize,
    /// Exponent applied to the grouping size when weighting a score
    pub weight_exponent: f32,
    /// Characters a clue may never contain
    pub forbidden_chars: String,
    /// Shortest common prefix that makes two words collide
    pub min_prefix_len: usize,
    /// Most target words the exhaustive search will enumerate subsets of
    pub max_exhaustive_words: usize,
    /// Lloyd iterations per clustering run
    pub kmeans_iterations: usize,
    /// Base seed; trial `i` uses `seed + i`
    pub seed: u64,
    /// Worker threads, 0 for one per core
    pub workers: usize,
    /// Per-query timeout in milliseconds, 0 to wait forever
    pub query_timeout_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            vocab_limit: 50_000,
            top_k: 10,
            cluster_count: 4,
            trials: 100,
            weight_exponent: 0.2,
            forbidden_chars: String::from("0123456789#$,"),
            min_prefix_len: 4,
            max_exhaustive_words: 9,
            kmeans_iterations: 300,
            seed: 0,
            workers: 0,
            query_timeout_ms: 0,
        }
    }
}

impl SearchConfig {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(|err| ConfigError::Parse(err.to_string()))?;
        Self::from_json(&json)
    }

    /// Checks every field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_exhaustive()?;
        self.validate_clustering()
    }

    /// Fields read by the grouping evaluator.
    pub fn validate_evaluation(&self) -> Result<(), ConfigError> {
        positive(&[
            ("vocab_limit", self.vocab_limit),
            ("top_k", self.top_k),
            ("min_prefix_len", self.min_prefix_len),
        ])?;
        if !self.weight_exponent.is_finite() {
            return Err(ConfigError::NonFiniteExponent(self.weight_exponent));
        }
        Ok(())
    }

    pub fn validate_exhaustive(&self) -> Result<(), ConfigError> {
        self.validate_evaluation()?;
        positive(&[("max_exhaustive_words", self.max_exhaustive_words)])
    }

    pub fn validate_clustering(&self) -> Result<(), ConfigError> {
        self.validate_evaluation()?;
        positive(&[
            ("cluster_count", self.cluster_count),
            ("trials", self.trials),
            ("kmeans_iterations", self.kmeans_iterations),
        ])
    }

    pub fn query_timeout(&self) -> Option<Duration> {
        (self.query_timeout_ms > 0).then(|| Duration::from_millis(self.query_timeout_ms))
    }
}

fn positive(fields: &[(&'static str, usize)]) -> Result<(), ConfigError> {
    match fields.iter().find(|&&(_, value)| value == 0) {
        Some(&(field, _)) => Err(ConfigError::Zero { field }),
        None => Ok(()),
    }
}
