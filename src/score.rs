use std::fmt::{Display, Formatter};
use std::iter::Sum;
use std::ops::Add;

use ordered_float::NotNan;

use crate::error::SearchError;

/// Weighted similarity score. Totally ordered and always finite; sums
/// saturate at the `f32` range.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Score(NotNan<f32>);

impl Score {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn new(value: f32) -> Result<Self, SearchError> {
        if !value.is_finite() {
            return Err(SearchError::NonFiniteScore(value));
        }
        NotNan::new(value)
            .map(Self)
            .map_err(|_err| SearchError::NonFiniteScore(value))
    }

    pub fn value(self) -> f32 {
        self.0.into_inner()
    }
}

impl TryFrom<f32> for Score {
    type Error = SearchError;

    fn try_from(value: f32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl Add for Score {
    type Output = Score;

    fn add(self, rhs: Self) -> Self::Output {
        let sum = (self.value() + rhs.value()).clamp(f32::MIN, f32::MAX);
        Score(NotNan::new(sum).unwrap_or_default())
    }
}

impl Sum for Score {
    fn sum<I: Iterator<Item = Score>>(iter: I) -> Self {
        iter.fold(Score::zero(), Add::add)
    }
}

impl Display for Score {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.4}", self.value())
    }
}

/// Boosts a raw similarity by `size ^ exponent` so larger groupings can compete
/// with single-word ones.
pub fn weight(group_size: usize, raw: f32, exponent: f32) -> Result<Score, SearchError> {
    Score::new(raw * (group_size as f32).powf(exponent))
}
