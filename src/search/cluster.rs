use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::SearchConfig;
use crate::error::{ConfigError, SearchError};
use crate::evaluator::GroupingEvaluator;
use crate::kmeans::kmeans;
use crate::oracle::{SimilarityOracle, VectorSource};
use crate::words::{ForbiddenSet, Grouping, TargetSet, TargetWord};

use super::{thread_pool, Partition, PartitionSearch};

/// Approximate search: cluster the targets into `cluster_count` groups many
/// times with different seeds and keep the best scoring partition.
pub struct ClusterSearch<'a, O: ?Sized> {
    oracle: &'a O,
    config: &'a SearchConfig,
}

impl<'a, O> ClusterSearch<'a, O>
where
    O: SimilarityOracle + VectorSource + ?Sized,
{
    pub fn new(oracle: &'a O, config: &'a SearchConfig) -> Self {
        Self { oracle, config }
    }

    /// One clustering run, fully determined by `trial` and the inputs.
    fn trial(
        &self,
        trial: usize,
        evaluator: &GroupingEvaluator<'_, O>,
        words: &[TargetWord],
        vectors: &[&[f32]],
        forbidden: &ForbiddenSet,
    ) -> Result<Partition, SearchError> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed.wrapping_add(trial as u64));
        let clusters = kmeans(
            vectors,
            self.config.cluster_count,
            self.config.kmeans_iterations,
            &mut rng,
        );

        let results = clusters
            .into_iter()
            .filter(|members| !members.is_empty())
            .map(|members| {
                let grouping = Grouping::new(members.into_iter().map(|idx| words[idx].clone()).collect())?;
                Ok(evaluator.evaluate(&grouping, forbidden))
            })
            .collect::<Result<Vec<_>, SearchError>>()?;

        Ok(Partition::new(results))
    }
}

impl<'a, O> PartitionSearch for ClusterSearch<'a, O>
where
    O: SimilarityOracle + VectorSource + ?Sized,
{
    fn search(&self, targets: &TargetSet, forbidden: &ForbiddenSet) -> Result<Partition, SearchError> {
        self.config.validate_clustering()?;
        if targets.is_empty() {
            return Ok(Partition::default());
        }
        if self.config.cluster_count > targets.len() {
            return Err(ConfigError::TooManyClusters {
                clusters: self.config.cluster_count,
                words: targets.len(),
            }
            .into());
        }

        let words = targets.words();
        let vectors = words
            .iter()
            .map(|word| {
                self.oracle
                    .vector(word)
                    .ok_or_else(|| SearchError::MissingVector(word.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let pool = thread_pool(self.config)?;
        let evaluator = GroupingEvaluator::new(self.oracle, self.config);

        let trials = pool.install(|| {
            (0..self.config.trials)
                .into_par_iter()
                .map(|trial| self.trial(trial, &evaluator, words, &vectors, forbidden))
                .collect::<Result<Vec<_>, _>>()
        })?;

        // Strictly greater replaces, so the earliest trial keeps a tie.
        let best = trials
            .into_iter()
            .enumerate()
            .fold(None, |best: Option<(usize, Partition)>, (trial, partition)| {
                let improves = best
                    .as_ref()
                    .map_or(true, |(_, current)| partition.total_score() > current.total_score());
                if improves {
                    debug!(trial, total = %partition.total_score(), "new best partition");
                    Some((trial, partition))
                } else {
                    best
                }
            });

        let Some((trial, partition)) = best else {
            return Ok(Partition::default());
        };
        partition.covers(targets)?;

        info!(
            trial,
            groupings = partition.len(),
            total = %partition.total_score(),
            "cluster search done"
        );
        Ok(partition)
    }
}
