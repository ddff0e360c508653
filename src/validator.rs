use std::collections::HashSet;
use std::fmt::{Display, Formatter};

use crate::config::SearchConfig;
use crate::oracle::ClueCandidate;
use crate::words::{Grouping, TargetWord};

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Violation {
    Substring { word: TargetWord },
    SharedPrefix { word: TargetWord, length: usize },
    ForbiddenCharacter(char),
}

impl Display for Violation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Substring { word } => write!(f, "overlaps {word}"),
            Self::SharedPrefix { word, length } => {
                write!(f, "shares a {length} character prefix with {word}")
            }
            Self::ForbiddenCharacter(chr) => write!(f, "contains {chr:?}"),
        }
    }
}

/// Rejects clues that give away a grouping word or that contain characters
/// which cannot be spoken as a clue.
#[derive(Debug, Clone)]
pub struct CandidateValidator {
    forbidden_chars: HashSet<char>,
    min_prefix_len: usize,
}

impl CandidateValidator {
    pub fn new(forbidden_chars: &str, min_prefix_len: usize) -> Self {
        Self {
            forbidden_chars: forbidden_chars.chars().collect(),
            min_prefix_len,
        }
    }

    pub fn from_config(config: &SearchConfig) -> Self {
        Self::new(&config.forbidden_chars, config.min_prefix_len)
    }

    pub fn is_legal(&self, grouping: &Grouping, candidate: &ClueCandidate) -> bool {
        self.violation(grouping, candidate).is_none()
    }

    /// First rule the candidate breaks against any grouping word, if any.
    pub fn violation(&self, grouping: &Grouping, candidate: &ClueCandidate) -> Option<Violation> {
        if let Some(chr) = candidate
            .word
            .chars()
            .find(|chr| self.forbidden_chars.contains(chr))
        {
            return Some(Violation::ForbiddenCharacter(chr));
        }

        let clue = candidate.word.to_lowercase();
        grouping.iter().find_map(|word| {
            let lowered = word.as_str().to_lowercase();
            if lowered.contains(&clue) || clue.contains(&lowered) {
                return Some(Violation::Substring { word: word.clone() });
            }

            let length = common_prefix_len(word.as_str(), &candidate.word);
            (length >= self.min_prefix_len).then(|| Violation::SharedPrefix {
                word: word.clone(),
                length,
            })
        })
    }
}

impl Default for CandidateValidator {
    fn default() -> Self {
        Self::from_config(&SearchConfig::default())
    }
}

fn common_prefix_len(a: &str, b: &str) -> usize {
    a.chars()
        .zip(b.chars())
        .take_while(|(x, y)| x == y)
        .count()
}
