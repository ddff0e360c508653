//! Error types for clue search.

use std::time::Duration;

use thiserror::Error;

use crate::words::TargetWord;

/// Invalid search configuration, reported before any query is issued.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("weight exponent must be finite, got {0}")]
    NonFiniteExponent(f32),

    #[error("cluster count {clusters} exceeds target word count {words}")]
    TooManyClusters { clusters: usize, words: usize },

    #[error("{words} target words exceed the exhaustive search limit of {max}")]
    TooManyTargets { words: usize, max: usize },

    #[error("unreadable configuration: {0}")]
    Parse(String),
}

/// Failures of the similarity oracle. All of them are recoverable during a search.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum OracleError {
    #[error("unknown word {0}")]
    UnknownWord(TargetWord),

    #[error("cannot combine ({}): {reason}", joined(.words))]
    Combination {
        words: Vec<TargetWord>,
        reason: String,
    },

    #[error("query timed out after {0:?}")]
    Timeout(Duration),

    #[error("oracle worker disconnected")]
    Disconnected,
}

impl OracleError {
    pub fn combination(words: &[TargetWord], reason: impl Into<String>) -> Self {
        Self::Combination {
            words: words.to_vec(),
            reason: reason.into(),
        }
    }
}

fn joined(words: &[TargetWord]) -> String {
    words.iter().map(TargetWord::as_str).collect::<Vec<_>>().join(", ")
}

/// Malformed embedding table text.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("line {line}: expected {expected} components, found {found}")]
    Dimension {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("line {line}: invalid component {value:?}")]
    Component { line: usize, value: String },

    #[error("line {line}: non-finite component in {word}")]
    NonFinite { line: usize, word: String },

    #[error("line {line}: zero vector for {word}")]
    ZeroVector { line: usize, word: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("score {0} is not finite")]
    NonFiniteScore(f32),

    #[error("invalid grouping: {0}")]
    InvalidGrouping(&'static str),

    #[error("no embedding vector for {0}")]
    MissingVector(TargetWord),

    #[error("{0} was not covered by the partition")]
    Uncovered(TargetWord),

    #[error("{0} is not a target word")]
    Foreign(TargetWord),

    #[error("{0} was covered more than once")]
    Duplicated(TargetWord),

    #[error("worker pool: {0}")]
    Pool(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let words = vec![TargetWord::from("piano"), TargetWord::from("bugle")];
        let err = OracleError::combination(&words, "unknown word bugle");
        assert_eq!(err.to_string(), "cannot combine (piano, bugle): unknown word bugle");

        let err = SearchError::from(ConfigError::TooManyClusters { clusters: 5, words: 2 });
        assert_eq!(err.to_string(), "cluster count 5 exceeds target word count 2");

        assert_eq!(
            ConfigError::Zero { field: "trials" }.to_string(),
            "trials must be greater than zero"
        );
    }
}
