use std::collections::HashSet;
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use itertools::Itertools;

use crate::error::SearchError;

#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct TargetWord(String);

impl TargetWord {
    pub fn new(word: impl Into<String>) -> Self {
        Self(word.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for TargetWord {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl FromStr for TargetWord {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl Display for TargetWord {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.0, f)
    }
}

/// Non-empty, duplicate-free tuple of target words sharing one clue.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub struct Grouping {
    words: Vec<TargetWord>,
}

impl Grouping {
    pub fn new(words: Vec<TargetWord>) -> Result<Self, SearchError> {
        if words.is_empty() {
            return Err(SearchError::InvalidGrouping("empty"));
        }
        if !words.iter().all_unique() {
            return Err(SearchError::InvalidGrouping("duplicated word"));
        }
        Ok(Self { words })
    }

    pub fn singleton(word: TargetWord) -> Self {
        Self { words: vec![word] }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn words(&self) -> &[TargetWord] {
        &self.words
    }

    pub fn iter(&self) -> impl Iterator<Item = &TargetWord> {
        self.words.iter()
    }

    pub fn contains(&self, word: &TargetWord) -> bool {
        self.words.contains(word)
    }
}

impl Display for Grouping {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "({})", self.words.iter().join(", "))
    }
}

/// Snapshot of the words still waiting for a clue. Never mutated in place:
/// committing a grouping produces a new, smaller set.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct TargetSet {
    words: Vec<TargetWord>,
}

impl TargetSet {
    /// Keeps the first occurrence of each word.
    pub fn new<I, W>(words: I) -> Self
    where
        I: IntoIterator<Item = W>,
        W: Into<TargetWord>,
    {
        let words = words.into_iter().map(Into::into).unique().collect_vec();
        Self { words }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn words(&self) -> &[TargetWord] {
        &self.words
    }

    pub fn contains(&self, word: &TargetWord) -> bool {
        self.words.contains(word)
    }

    pub fn without(&self, grouping: &Grouping) -> Self {
        let words = self
            .words
            .iter()
            .filter(|word| !grouping.contains(word))
            .cloned()
            .collect_vec();
        Self { words }
    }

    /// Every non-empty subset, smallest first, each in set order.
    pub fn groupings(&self) -> Vec<Grouping> {
        if let [word] = self.words.as_slice() {
            return vec![Grouping::singleton(word.clone())];
        }

        self.words
            .iter()
            .cloned()
            .powerset()
            .filter(|subset| !subset.is_empty())
            .map(|words| Grouping { words })
            .collect_vec()
    }
}

impl From<Vec<String>> for TargetSet {
    fn from(value: Vec<String>) -> Self {
        Self::new(value.into_iter().map(TargetWord::new))
    }
}

/// Words owned by the other side. Carried through the search untouched.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct ForbiddenSet {
    words: HashSet<TargetWord>,
}

impl ForbiddenSet {
    pub fn new<I, W>(words: I) -> Self
    where
        I: IntoIterator<Item = W>,
        W: Into<TargetWord>,
    {
        Self {
            words: words.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn contains(&self, word: &TargetWord) -> bool {
        self.words.contains(word)
    }
}

/// Targets, opposing words and penalty words as read from the board.
#[derive(Debug, Clone, Default)]
pub struct WordLists {
    pub targets: Vec<String>,
    pub opposing: Vec<String>,
    pub penalty: Vec<String>,
}

impl WordLists {
    pub fn target_set(&self) -> TargetSet {
        TargetSet::new(self.targets.iter().map(String::as_str))
    }

    pub fn forbidden_set(&self) -> ForbiddenSet {
        ForbiddenSet::new(
            self.opposing
                .iter()
                .chain(self.penalty.iter())
                .map(String::as_str),
        )
    }
}

impl FromStr for WordLists {
    type Err = SearchError;

    /// Three lines: targets, opposing words, penalty words. Missing trailing
    /// lines are empty lists.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut lines = s.lines().map(|line| {
            line.split_whitespace()
                .map(String::from)
                .collect_vec()
        });

        let targets = lines.next().unwrap_or_default();
        let opposing = lines.next().unwrap_or_default();
        let penalty = lines.next().unwrap_or_default();

        Ok(Self {
            targets,
            opposing,
            penalty,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(grouping: &Grouping) -> Vec<&str> {
        grouping.iter().map(TargetWord::as_str).collect_vec()
    }

    #[test]
    fn test_grouping_rejects_empty_and_duplicates() {
        assert!(Grouping::new(vec![]).is_err());
        assert!(Grouping::new(vec!["a".into(), "a".into()]).is_err());
        assert_eq!(Grouping::new(vec!["a".into(), "b".into()]).unwrap().len(), 2);
    }

    #[test]
    fn test_target_set_dedup() {
        let set = TargetSet::new(["piano", "bugle", "piano"]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.words()[0].as_str(), "piano");
    }

    #[test]
    fn test_powerset_order() {
        let set = TargetSet::new(["a", "b", "c"]);
        let groupings = set.groupings();
        assert_eq!(groupings.len(), 7);
        assert_eq!(words(&groupings[0]), vec!["a"]);
        assert_eq!(words(&groupings[3]), vec!["a", "b"]);
        assert_eq!(words(&groupings[6]), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_single_word_groupings() {
        let set = TargetSet::new(["heart"]);
        let groupings = set.groupings();
        assert_eq!(groupings.len(), 1);
        assert_eq!(words(&groupings[0]), vec!["heart"]);
    }

    #[test]
    fn test_without_leaves_original() {
        let set = TargetSet::new(["a", "b", "c"]);
        let grouping = Grouping::new(vec!["a".into(), "c".into()]).unwrap();
        let rest = set.without(&grouping);
        assert_eq!(rest.words(), &[TargetWord::from("b")]);
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_word_lists() {
        let lists: WordLists = "piano bugle\nheart\nbomb\n".parse().unwrap();
        assert_eq!(lists.target_set().len(), 2);
        let forbidden = lists.forbidden_set();
        assert!(forbidden.contains(&"heart".into()));
        assert!(forbidden.contains(&"bomb".into()));

        let lists: WordLists = "piano".parse().unwrap();
        assert!(lists.forbidden_set().is_empty());
    }

    #[test]
    fn test_display() {
        let grouping = Grouping::new(vec!["piano".into(), "bugle".into()]).unwrap();
        assert_eq!(grouping.to_string(), "(piano, bugle)");
    }
}
