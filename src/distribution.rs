//! Discrete distributions used for start positions and true goals.
//!
//! A distribution is either a single concrete value (point mass) or an
//! ordered list of outcomes with un-normalized weights.

use rand::distributions::{Distribution as _, WeightedError, WeightedIndex};
use rand::Rng;
use thiserror::Error;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::gridworld::Position;

/// Errors raised when sampling from a [`Distribution`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SamplingError {
    #[error("Cannot sample from an empty distribution")]
    Empty,

    #[error("Distribution weights must be finite and non-negative")]
    InvalidWeight,

    #[error("Distribution weights sum to zero")]
    AllWeightsZero,

    #[error("Distribution has too many outcomes")]
    TooMany,
}

impl From<WeightedError> for SamplingError {
    fn from(e: WeightedError) -> Self {
        match e {
            WeightedError::NoItem => SamplingError::Empty,
            WeightedError::InvalidWeight => SamplingError::InvalidWeight,
            WeightedError::AllWeightsZero => SamplingError::AllWeightsZero,
            WeightedError::TooMany => SamplingError::TooMany,
            #[allow(unreachable_patterns)]
            _ => SamplingError::InvalidWeight,
        }
    }
}

/// A point mass or a weighted categorical distribution.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Distribution<T> {
    /// Always yields the same value.
    Point(T),
    /// Outcome/weight pairs; weights need not sum to one.
    Weighted(Vec<(T, f64)>),
}

impl<T: Clone> Distribution<T> {
    /// Uniform distribution over the given outcomes.
    pub fn uniform<I: IntoIterator<Item = T>>(outcomes: I) -> Self {
        Distribution::Weighted(outcomes.into_iter().map(|o| (o, 1.0)).collect())
    }

    /// Draws one outcome, normalizing weights.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<T, SamplingError> {
        match self {
            Distribution::Point(value) => Ok(value.clone()),
            Distribution::Weighted(options) => {
                let index = WeightedIndex::new(options.iter().map(|(_, w)| *w))?;
                Ok(options[index.sample(rng)].0.clone())
            }
        }
    }

    /// Outcomes with non-zero probability mass.
    pub fn support(&self) -> Vec<&T> {
        match self {
            Distribution::Point(value) => vec![value],
            Distribution::Weighted(options) => options
                .iter()
                .filter(|(_, w)| *w > 0.0)
                .map(|(o, _)| o)
                .collect(),
        }
    }
}

impl<T> From<T> for Distribution<T> {
    fn from(value: T) -> Self {
        Distribution::Point(value)
    }
}

/// Uniform distribution over the rectangle `[top_left, bottom_right)`.
///
/// The bottom and right bounds are exclusive.
pub fn uniform_over_rect(top_left: Position, bottom_right: Position) -> Distribution<Position> {
    Distribution::uniform(
        (top_left.x..bottom_right.x)
            .flat_map(|x| (top_left.y..bottom_right.y).map(move |y| Position::new(x, y))),
    )
}
