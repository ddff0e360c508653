//! Clue search for a word-association board game.
//!
//! Target words are split into groupings, and each grouping gets the single
//! clue word closest to all of its members in an embedding space. Two
//! strategies are provided: [`ExhaustiveSearch`] greedily commits the best
//! subset of the remaining words, [`ClusterSearch`] keeps the best of many
//! randomized k-means partitions.

pub mod config;
pub mod error;
pub mod evaluator;
pub mod kmeans;
pub mod oracle;
pub mod score;
pub mod search;
pub mod validator;
pub mod words;

pub use config::SearchConfig;
pub use error::{ConfigError, EmbeddingError, OracleError, SearchError};
pub use evaluator::{Clue, GroupingEvaluator, WeightedResult};
pub use oracle::{ClueCandidate, EmbeddingSpace, QueryOutcome, SimilarityOracle, TimedOracle, VectorSource};
pub use score::Score;
pub use search::{ClusterSearch, ExhaustiveSearch, Partition, PartitionSearch};
pub use validator::CandidateValidator;
pub use words::{ForbiddenSet, Grouping, TargetSet, TargetWord, WordLists};
