use std::cmp::Reverse;

use itertools::Itertools;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::SearchConfig;
use crate::error::{ConfigError, SearchError};
use crate::evaluator::{GroupingEvaluator, WeightedResult};
use crate::oracle::SimilarityOracle;
use crate::words::{ForbiddenSet, Grouping, TargetSet};

use super::{thread_pool, Partition, PartitionSearch};

/// Greedy search: evaluate every subset of the remaining words, commit the
/// best one, repeat on what is left. Exponential in the remaining word count.
pub struct ExhaustiveSearch<'a, O: ?Sized> {
    oracle: &'a O,
    config: &'a SearchConfig,
}

impl<'a, O> ExhaustiveSearch<'a, O>
where
    O: SimilarityOracle + ?Sized,
{
    pub fn new(oracle: &'a O, config: &'a SearchConfig) -> Self {
        Self { oracle, config }
    }
}

/// Highest score wins; among equal scores the first enumerated grouping.
fn best_grouping<O>(
    evaluator: &GroupingEvaluator<'_, O>,
    groupings: &[Grouping],
    forbidden: &ForbiddenSet,
) -> Option<WeightedResult>
where
    O: SimilarityOracle + ?Sized,
{
    groupings
        .par_iter()
        .map(|grouping| evaluator.evaluate(grouping, forbidden))
        .collect::<Vec<_>>()
        .into_iter()
        .enumerate()
        .max_by_key(|(idx, result)| (result.score(), Reverse(*idx)))
        .map(|(_idx, result)| result)
}

impl<'a, O> PartitionSearch for ExhaustiveSearch<'a, O>
where
    O: SimilarityOracle + ?Sized,
{
    fn search(&self, targets: &TargetSet, forbidden: &ForbiddenSet) -> Result<Partition, SearchError> {
        self.config.validate_exhaustive()?;
        if targets.len() > self.config.max_exhaustive_words {
            return Err(ConfigError::TooManyTargets {
                words: targets.len(),
                max: self.config.max_exhaustive_words,
            }
            .into());
        }

        let pool = thread_pool(self.config)?;
        let evaluator = GroupingEvaluator::new(self.oracle, self.config);

        let mut remaining = targets.clone();
        let mut results = Vec::new();

        while !remaining.is_empty() {
            let groupings = remaining.groupings();
            let Some(best) = pool.install(|| best_grouping(&evaluator, &groupings, forbidden)) else {
                break;
            };

            debug!(
                evaluated = groupings.len(),
                remaining = remaining.len() - best.grouping.len(),
                "committed {best}"
            );
            remaining = remaining.without(&best.grouping);
            results.push(best);
        }

        let partition = Partition::new(results);
        partition.covers(targets)?;

        info!(
            groupings = partition.len(),
            total = %partition.total_score(),
            clues = %partition.iter().map(|result| result.clue.word()).join(" "),
            "exhaustive search done"
        );
        Ok(partition)
    }
}
