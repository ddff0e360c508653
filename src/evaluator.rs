//! Scores one grouping: best legal clue, weighted by grouping size.

use std::fmt::{Display, Formatter};

use tracing::{debug, warn};

use crate::config::SearchConfig;
use crate::error::OracleError;
use crate::oracle::{ClueCandidate, QueryOutcome, SimilarityOracle};
use crate::score::{weight, Score};
use crate::validator::CandidateValidator;
use crate::words::{ForbiddenSet, Grouping};

pub const NULL_CLUE: &str = "null";

#[derive(Debug, Clone, PartialEq)]
pub enum Clue {
    Word { word: String, score: Score },
    /// No legal candidate, or the oracle could not answer.
    Null,
}

impl Clue {
    pub fn word(&self) -> &str {
        match self {
            Self::Word { word, .. } => word,
            Self::Null => NULL_CLUE,
        }
    }

    pub fn score(&self) -> Score {
        match self {
            Self::Word { score, .. } => *score,
            Self::Null => Score::zero(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct WeightedResult {
    pub grouping: Grouping,
    pub clue: Clue,
}

impl WeightedResult {
    pub fn null(grouping: Grouping) -> Self {
        Self {
            grouping,
            clue: Clue::Null,
        }
    }

    pub fn score(&self) -> Score {
        self.clue.score()
    }
}

impl Display for WeightedResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {} ({})", self.grouping, self.clue.word(), self.score())
    }
}

pub struct GroupingEvaluator<'a, O: ?Sized> {
    oracle: &'a O,
    validator: CandidateValidator,
    config: &'a SearchConfig,
}

impl<'a, O> GroupingEvaluator<'a, O>
where
    O: SimilarityOracle + ?Sized,
{
    pub fn new(oracle: &'a O, config: &'a SearchConfig) -> Self {
        Self {
            oracle,
            validator: CandidateValidator::from_config(config),
            config,
        }
    }

    /// Singletons use the single-word query, larger groupings the combined one.
    fn candidates(&self, grouping: &Grouping) -> Result<Vec<ClueCandidate>, OracleError> {
        match grouping.words() {
            [word] => self.oracle.neighbors(word, self.config.top_k),
            words => self
                .oracle
                .combined_neighbors(words, self.config.vocab_limit, self.config.top_k),
        }
    }

    /// First legal candidate with a finite score.
    pub fn best_candidate(&self, grouping: &Grouping) -> QueryOutcome {
        match self.candidates(grouping) {
            Ok(candidates) => candidates
                .into_iter()
                .filter(|candidate| {
                    let finite = candidate.score.is_finite();
                    if !finite {
                        debug!(%grouping, %candidate, "skipping non-finite candidate");
                    }
                    finite
                })
                .find(|candidate| self.validator.is_legal(grouping, candidate))
                .map_or(QueryOutcome::NoneFound, QueryOutcome::Found),
            Err(err) => QueryOutcome::QueryFailed(err),
        }
    }

    /// The forbidden set is accepted for callers that track the whole board;
    /// legality only looks at the grouping itself.
    pub fn evaluate(&self, grouping: &Grouping, _forbidden: &ForbiddenSet) -> WeightedResult {
        let clue = match self.best_candidate(grouping) {
            QueryOutcome::Found(ClueCandidate { word, score }) => {
                match weight(grouping.len(), score, self.config.weight_exponent) {
                    Ok(score) => Clue::Word { word, score },
                    Err(err) => {
                        warn!(%grouping, clue = %word, error = %err, "clue score out of range");
                        Clue::Null
                    }
                }
            }
            QueryOutcome::NoneFound => Clue::Null,
            QueryOutcome::QueryFailed(err) => {
                warn!(%grouping, error = %err, "similarity query failed");
                Clue::Null
            }
        };

        WeightedResult {
            grouping: grouping.clone(),
            clue,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use crate::words::TargetWord;

    use super::*;

    /// Canned answers keyed by the space-joined query words. Records which
    /// query form every call used.
    #[derive(Default)]
    pub(crate) struct ScriptedOracle {
        answers: HashMap<String, Vec<ClueCandidate>>,
        pub(crate) calls: Mutex<Vec<(String, bool)>>,
    }

    impl ScriptedOracle {
        pub(crate) fn answer(mut self, query: &str, candidates: &[(&str, f32)]) -> Self {
            let candidates = candidates
                .iter()
                .map(|&(word, score)| ClueCandidate::new(word, score))
                .collect();
            self.answers.insert(query.to_string(), candidates);
            self
        }

        fn lookup(&self, words: &[TargetWord], combined: bool) -> Result<Vec<ClueCandidate>, OracleError> {
            let key = words.iter().map(TargetWord::as_str).collect::<Vec<_>>().join(" ");
            self.calls.lock().unwrap().push((key.clone(), combined));
            match self.answers.get(&key) {
                Some(candidates) => Ok(candidates.clone()),
                None if combined => Err(OracleError::combination(words, "not scripted")),
                None => Err(OracleError::UnknownWord(words[0].clone())),
            }
        }
    }

    impl SimilarityOracle for ScriptedOracle {
        fn neighbors(&self, word: &TargetWord, _top_k: usize) -> Result<Vec<ClueCandidate>, OracleError> {
            self.lookup(std::slice::from_ref(word), false)
        }

        fn combined_neighbors(
            &self,
            words: &[TargetWord],
            _vocab_limit: usize,
            _top_k: usize,
        ) -> Result<Vec<ClueCandidate>, OracleError> {
            self.lookup(words, true)
        }
    }

    pub(crate) fn grouping(words: &[&str]) -> Grouping {
        Grouping::new(words.iter().copied().map(TargetWord::from).collect()).unwrap()
    }

    #[test]
    fn test_pair_uses_combined_query() {
        let oracle = ScriptedOracle::default().answer("piano bugle", &[("violin", 0.85), ("trumpet", 0.7)]);
        let config = SearchConfig::default();
        let evaluator = GroupingEvaluator::new(&oracle, &config);

        let result = evaluator
            .evaluate(&grouping(&["piano", "bugle"]), &ForbiddenSet::default());

        assert_eq!(result.clue.word(), "violin");
        assert!((result.score().value() - 0.85 * 2f32.powf(0.2)).abs() < 1e-6);
        assert_eq!(*oracle.calls.lock().unwrap(), vec![("piano bugle".to_string(), true)]);
    }

    #[test]
    fn test_singleton_uses_single_query() {
        let oracle = ScriptedOracle::default().answer("heart", &[("cardiac", 0.51), ("love", 0.4)]);
        let config = SearchConfig::default();
        let evaluator = GroupingEvaluator::new(&oracle, &config);

        let result = evaluator
            .evaluate(&grouping(&["heart"]), &ForbiddenSet::default());

        assert_eq!(result.clue.word(), "cardiac");
        assert_eq!(result.score().value(), 0.51);
        assert!(oracle.calls.lock().unwrap().iter().all(|(_, combined)| !combined));
    }

    #[test]
    fn test_skips_illegal_candidates() {
        let oracle = ScriptedOracle::default().answer("heart", &[("hearts", 0.9), ("4ever", 0.8), ("love", 0.4)]);
        let config = SearchConfig::default();
        let evaluator = GroupingEvaluator::new(&oracle, &config);

        let outcome = evaluator.best_candidate(&grouping(&["heart"]));
        assert_eq!(outcome, QueryOutcome::Found(ClueCandidate::new("love", 0.4)));
    }

    #[test]
    fn test_all_candidates_collide() {
        let oracle = ScriptedOracle::default().answer("piano", &[("pianos", 0.9), ("pianist", 0.8)]);
        let config = SearchConfig::default();
        let evaluator = GroupingEvaluator::new(&oracle, &config);

        let result = evaluator
            .evaluate(&grouping(&["piano"]), &ForbiddenSet::default());

        assert_eq!(result, WeightedResult::null(grouping(&["piano"])));
        assert_eq!(result.clue.word(), "null");
        assert_eq!(result.score(), Score::zero());
    }

    #[test]
    fn test_query_failure_is_null() {
        let oracle = ScriptedOracle::default();
        let config = SearchConfig::default();
        let evaluator = GroupingEvaluator::new(&oracle, &config);

        assert!(matches!(
            evaluator.best_candidate(&grouping(&["piano", "bugle"])),
            QueryOutcome::QueryFailed(OracleError::Combination { .. })
        ));
        let result = evaluator
            .evaluate(&grouping(&["piano", "bugle"]), &ForbiddenSet::default());
        assert!(result.clue.is_null());
    }

    #[test]
    fn test_forbidden_set_not_consulted() {
        let oracle = ScriptedOracle::default().answer("heart", &[("love", 0.4)]);
        let config = SearchConfig::default();
        let evaluator = GroupingEvaluator::new(&oracle, &config);

        let forbidden = ForbiddenSet::new(["love"]);
        let result = evaluator.evaluate(&grouping(&["heart"]), &forbidden);
        assert_eq!(result.clue.word(), "love");
    }

    #[test]
    fn test_non_finite_candidates_skipped() {
        let oracle = ScriptedOracle::default().answer("alpha", &[("one", f32::NAN), ("two", f32::INFINITY), ("uno", 0.3)]);
        let config = SearchConfig::default();
        let evaluator = GroupingEvaluator::new(&oracle, &config);

        let result = evaluator.evaluate(&grouping(&["alpha"]), &ForbiddenSet::default());
        assert_eq!(result.clue.word(), "uno");
        assert_eq!(result.score().value(), 0.3);
    }

    #[test]
    fn test_weight_overflow_is_null() {
        let oracle = ScriptedOracle::default().answer("alpha beta", &[("huge", f32::MAX)]);
        let config = SearchConfig::default();
        let evaluator = GroupingEvaluator::new(&oracle, &config);

        let result = evaluator.evaluate(&grouping(&["alpha", "beta"]), &ForbiddenSet::default());
        assert!(result.clue.is_null());
        assert_eq!(result.score(), Score::zero());
    }

    #[test]
    fn test_display() {
        let result = WeightedResult {
            grouping: grouping(&["heart"]),
            clue: Clue::Word {
                word: "love".into(),
                score: Score::new(0.5).unwrap(),
            },
        };
        assert_eq!(result.to_string(), "(heart) -> love (0.5000)");
        assert_eq!(
            WeightedResult::null(grouping(&["a", "b"])).to_string(),
            "(a, b) -> null (0.0000)"
        );
    }
}
