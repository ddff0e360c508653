//! Partition searches: cover every target word with groupings and clues.

use std::collections::HashSet;
use std::fmt::{Display, Formatter};

use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::config::SearchConfig;
use crate::error::SearchError;
use crate::evaluator::WeightedResult;
use crate::score::Score;
use crate::words::{ForbiddenSet, TargetSet};

mod cluster;
mod exhaustive;

pub use cluster::ClusterSearch;
pub use exhaustive::ExhaustiveSearch;

pub trait PartitionSearch {
    /// Returns groupings covering every word of `targets` exactly once.
    fn search(&self, targets: &TargetSet, forbidden: &ForbiddenSet) -> Result<Partition, SearchError>;
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partition {
    results: Vec<WeightedResult>,
}

impl Partition {
    pub fn new(results: Vec<WeightedResult>) -> Self {
        Self { results }
    }

    pub fn results(&self) -> &[WeightedResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &WeightedResult> {
        self.results.iter()
    }

    pub fn total_score(&self) -> Score {
        self.results.iter().map(WeightedResult::score).sum()
    }

    /// Checks that the groupings cover `targets` exactly: no target missing,
    /// none repeated, nothing else.
    pub fn covers(&self, targets: &TargetSet) -> Result<(), SearchError> {
        let mut seen = HashSet::new();
        for word in self.results.iter().flat_map(|result| result.grouping.iter()) {
            if !targets.contains(word) {
                return Err(SearchError::Foreign(word.clone()));
            }
            if !seen.insert(word) {
                return Err(SearchError::Duplicated(word.clone()));
            }
        }

        match targets.words().iter().find(|word| !seen.contains(word)) {
            Some(word) => Err(SearchError::Uncovered(word.clone())),
            None => Ok(()),
        }
    }
}

impl IntoIterator for Partition {
    type Item = WeightedResult;
    type IntoIter = std::vec::IntoIter<WeightedResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

impl Display for Partition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for result in &self.results {
            writeln!(f, "{result}")?;
        }
        write!(f, "total: {}", self.total_score())
    }
}

fn thread_pool(config: &SearchConfig) -> Result<ThreadPool, SearchError> {
    ThreadPoolBuilder::new()
        .num_threads(config.workers)
        .build()
        .map_err(|err| SearchError::Pool(err.to_string()))
}
