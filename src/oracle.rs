//! Similarity oracle: nearest-neighbour queries over an embedding space.
//!
//! The search engine only sees the [`SimilarityOracle`] trait. [`EmbeddingSpace`]
//! is an in-memory implementation over a frequency-ordered vocabulary, and
//! [`TimedOracle`] bounds the latency of any other implementation.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::io::BufRead;
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use itertools::Itertools;
use ordered_float::NotNan;

use crate::error::{EmbeddingError, OracleError};
use crate::words::TargetWord;

/// One neighbour returned by the oracle.
#[derive(Debug, Clone, PartialEq)]
pub struct ClueCandidate {
    pub word: String,
    pub score: f32,
}

impl ClueCandidate {
    pub fn new(word: impl Into<String>, score: f32) -> Self {
        Self {
            word: word.into(),
            score,
        }
    }
}

impl Display for ClueCandidate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({:.4})", self.word, self.score)
    }
}

/// Result of looking for the best legal clue of a grouping.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    Found(ClueCandidate),
    NoneFound,
    QueryFailed(OracleError),
}

pub trait SimilarityOracle: Send + Sync {
    /// Nearest neighbours of a single word, best first.
    fn neighbors(&self, word: &TargetWord, top_k: usize) -> Result<Vec<ClueCandidate>, OracleError>;

    /// Nearest neighbours of the combination of `words`, searched among the
    /// `vocab_limit` most frequent words only.
    fn combined_neighbors(
        &self,
        words: &[TargetWord],
        vocab_limit: usize,
        top_k: usize,
    ) -> Result<Vec<ClueCandidate>, OracleError>;
}

impl<O: SimilarityOracle + ?Sized> SimilarityOracle for Arc<O> {
    fn neighbors(&self, word: &TargetWord, top_k: usize) -> Result<Vec<ClueCandidate>, OracleError> {
        (**self).neighbors(word, top_k)
    }

    fn combined_neighbors(
        &self,
        words: &[TargetWord],
        vocab_limit: usize,
        top_k: usize,
    ) -> Result<Vec<ClueCandidate>, OracleError> {
        (**self).combined_neighbors(words, vocab_limit, top_k)
    }
}

/// Source of embedding vectors, used to cluster target words.
pub trait VectorSource {
    fn vector(&self, word: &TargetWord) -> Option<&[f32]>;
}

fn normalized(vector: &[f32]) -> Option<Vec<f32>> {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm == 0.0 || !norm.is_finite() {
        None
    } else {
        Some(vector.iter().map(|x| x / norm).collect_vec())
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Immutable, in-memory embedding table. Vectors are stored unit-normalized,
/// so similarity is a plain dot product. Vocabulary order is frequency order.
#[derive(Debug, Clone, Default)]
pub struct EmbeddingSpace {
    vocabulary: Vec<String>,
    vectors: Vec<Vec<f32>>,
    index: HashMap<String, usize>,
}

impl EmbeddingSpace {
    /// Builds a space from `(word, vector)` pairs, most frequent first.
    /// Zero vectors and repeated words are skipped.
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<f32>)>,
        S: Into<String>,
    {
        let mut space = Self::default();
        for (word, vector) in entries {
            let word = word.into();
            if space.index.contains_key(&word) {
                continue;
            }
            if let Some(vector) = normalized(&vector) {
                space.index.insert(word.clone(), space.vocabulary.len());
                space.vocabulary.push(word);
                space.vectors.push(vector);
            }
        }
        space
    }

    /// Reads `word v1 v2 ... vn` lines. A leading `count dimension` header, as
    /// written by word2vec, is skipped.
    pub fn parse<R: BufRead>(reader: R) -> Result<Self, EmbeddingError> {
        let mut entries: Vec<(String, Vec<f32>)> = Vec::new();
        let mut dimension: Option<usize> = None;

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let line_number = idx + 1;
            let mut fields = line.split_whitespace();
            let Some(word) = fields.next() else {
                continue;
            };
            let components = fields.collect_vec();

            if idx == 0 && components.len() == 1 && word.parse::<usize>().is_ok() {
                continue;
            }

            let vector = components
                .iter()
                .map(|value| {
                    value.parse::<f32>().map_err(|_err| EmbeddingError::Component {
                        line: line_number,
                        value: value.to_string(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;

            let expected = *dimension.get_or_insert(vector.len());
            if vector.len() != expected || expected == 0 {
                return Err(EmbeddingError::Dimension {
                    line: line_number,
                    expected,
                    found: vector.len(),
                });
            }
            if vector.iter().any(|x| !x.is_finite()) {
                return Err(EmbeddingError::NonFinite {
                    line: line_number,
                    word: word.to_string(),
                });
            }
            if normalized(&vector).is_none() {
                return Err(EmbeddingError::ZeroVector {
                    line: line_number,
                    word: word.to_string(),
                });
            }

            entries.push((word.to_string(), vector));
        }

        Ok(Self::new(entries))
    }

    pub fn len(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vocabulary.is_empty()
    }

    fn position(&self, word: &TargetWord) -> Option<usize> {
        self.index.get(word.as_str()).copied()
    }

    fn nearest(&self, query: &[f32], vocab_limit: usize, excluded: &[usize], top_k: usize) -> Vec<ClueCandidate> {
        self.vectors
            .iter()
            .take(vocab_limit)
            .enumerate()
            .filter(|(idx, _vector)| !excluded.contains(idx))
            .filter_map(|(idx, vector)| {
                NotNan::new(dot(query, vector)).ok().map(|score| (idx, score))
            })
            .sorted_by_key(|&(idx, score)| (Reverse(score), idx))
            .take(top_k)
            .map(|(idx, score)| ClueCandidate::new(self.vocabulary[idx].clone(), score.into_inner()))
            .collect_vec()
    }
}

impl VectorSource for EmbeddingSpace {
    fn vector(&self, word: &TargetWord) -> Option<&[f32]> {
        self.position(word).map(|idx| self.vectors[idx].as_slice())
    }
}

impl SimilarityOracle for EmbeddingSpace {
    fn neighbors(&self, word: &TargetWord, top_k: usize) -> Result<Vec<ClueCandidate>, OracleError> {
        let idx = self
            .position(word)
            .ok_or_else(|| OracleError::UnknownWord(word.clone()))?;
        Ok(self.nearest(&self.vectors[idx], self.len(), &[idx], top_k))
    }

    fn combined_neighbors(
        &self,
        words: &[TargetWord],
        vocab_limit: usize,
        top_k: usize,
    ) -> Result<Vec<ClueCandidate>, OracleError> {
        if words.is_empty() {
            return Err(OracleError::combination(words, "no words to combine"));
        }

        let positions = words
            .iter()
            .map(|word| {
                self.position(word)
                    .ok_or_else(|| OracleError::combination(words, format!("unknown word {word}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let dimension = self.vectors[positions[0]].len();
        let sum = positions.iter().fold(vec![0f32; dimension], |mut acc, &idx| {
            acc.iter_mut()
                .zip(self.vectors[idx].iter())
                .for_each(|(a, x)| *a += x);
            acc
        });
        let mean = normalized(&sum)
            .ok_or_else(|| OracleError::combination(words, "vectors cancel out"))?;

        Ok(self.nearest(&mean, vocab_limit, &positions, top_k))
    }
}

/// Runs every query of the wrapped oracle on a helper thread and gives up
/// after `timeout`. A late answer is dropped.
pub struct TimedOracle<O> {
    inner: Arc<O>,
    timeout: Duration,
}

impl<O> TimedOracle<O>
where
    O: SimilarityOracle + 'static,
{
    pub fn new(inner: Arc<O>, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    fn run<T, F>(&self, query: F) -> Result<T, OracleError>
    where
        T: Send + 'static,
        F: FnOnce(&O) -> Result<T, OracleError> + Send + 'static,
    {
        let (sender, receiver) = mpsc::channel();
        let inner = Arc::clone(&self.inner);
        thread::spawn(move || {
            let _ = sender.send(query(&*inner));
        });

        match receiver.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(mpsc::RecvTimeoutError::Timeout) => Err(OracleError::Timeout(self.timeout)),
            Err(mpsc::RecvTimeoutError::Disconnected) => Err(OracleError::Disconnected),
        }
    }
}

impl<O> SimilarityOracle for TimedOracle<O>
where
    O: SimilarityOracle + 'static,
{
    fn neighbors(&self, word: &TargetWord, top_k: usize) -> Result<Vec<ClueCandidate>, OracleError> {
        let word = word.clone();
        self.run(move |oracle| oracle.neighbors(&word, top_k))
    }

    fn combined_neighbors(
        &self,
        words: &[TargetWord],
        vocab_limit: usize,
        top_k: usize,
    ) -> Result<Vec<ClueCandidate>, OracleError> {
        let words = words.to_vec();
        self.run(move |oracle| oracle.combined_neighbors(&words, vocab_limit, top_k))
    }
}

impl<O: VectorSource> VectorSource for TimedOracle<O> {
    fn vector(&self, word: &TargetWord) -> Option<&[f32]> {
        self.inner.vector(word)
    }
}
