use ndarray::{Array1, ArrayD};

use super::{incompatible, unexpected, Wrapper, WrapperError};
use crate::gridworld::GridWorldEnv;
use crate::space::{Observation, ObservationSpace};

/// How the true goal is appended; picked from the input space at bind time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    /// One extra categorical entry holding the goal index.
    Index,
    /// One indicator per goal.
    OneHot,
    /// One `0.0`/`1.0` entry per goal.
    Float,
}

/// Flattens the observation and appends the true goal.
///
/// Categorical inputs get the goal index as one trailing entry; binary and
/// continuous inputs get a one-hot vector of length `n_goals`. This is the
/// "privileged" stage that tells the agent which goal is live.
#[derive(Debug, Clone, Default)]
pub struct AddTrueGoalFlat {
    encoding: Option<Encoding>,
    n_goals: usize,
}

impl AddTrueGoalFlat {
    pub fn new() -> Self {
        Self::default()
    }

    fn one_hot(&self, env: &GridWorldEnv) -> impl Iterator<Item = bool> {
        let true_idx = env.true_goal_idx();
        (0..self.n_goals).map(move |i| Some(i) == true_idx)
    }
}

impl Wrapper for AddTrueGoalFlat {
    fn name(&self) -> &str {
        "add_true_goal_flat"
    }

    fn bind(&mut self, input: &ObservationSpace, env: &GridWorldEnv) -> Result<ObservationSpace, WrapperError> {
        self.n_goals = env.n_goals();
        let (encoding, output) = match input {
            ObservationSpace::Categorical { shape, n } => (
                Encoding::Index,
                ObservationSpace::Categorical {
                    shape: vec![shape.iter().product::<usize>() + 1],
                    n: (*n).max(self.n_goals),
                },
            ),
            ObservationSpace::MultiBinary { shape } => (
                Encoding::OneHot,
                ObservationSpace::MultiBinary {
                    shape: vec![shape.iter().product::<usize>() + self.n_goals],
                },
            ),
            ObservationSpace::Continuous { low, high } => {
                let extend = |bounds: &ArrayD<f32>, fill: f32| {
                    let values: Vec<f32> = bounds
                        .iter()
                        .copied()
                        .chain(std::iter::repeat(fill).take(self.n_goals))
                        .collect();
                    Array1::from(values).into_dyn()
                };
                (
                    Encoding::Float,
                    ObservationSpace::Continuous {
                        low: extend(low, 0.0),
                        high: extend(high, 1.0),
                    },
                )
            }
            other => return Err(incompatible(self.name(), "a categorical, binary or continuous array", other)),
        };
        self.encoding = Some(encoding);
        Ok(output)
    }

    fn observation(&self, obs: Observation, env: &GridWorldEnv) -> Result<Observation, WrapperError> {
        let flat = match (self.encoding, obs) {
            (Some(Encoding::Index), Observation::Categorical(values)) => {
                let goal = env.true_goal_idx().unwrap_or(0) as i64;
                let flat: Vec<i64> = values.iter().copied().chain(std::iter::once(goal)).collect();
                Observation::Categorical(Array1::from(flat).into_dyn())
            }
            (Some(Encoding::OneHot), Observation::Binary(values)) => {
                let flat: Vec<bool> = values.iter().copied().chain(self.one_hot(env)).collect();
                Observation::Binary(Array1::from(flat).into_dyn())
            }
            (Some(Encoding::Float), Observation::Continuous(values)) => {
                let one_hot = self.one_hot(env).map(|b| if b { 1.0 } else { 0.0 });
                let flat: Vec<f32> = values.iter().copied().chain(one_hot).collect();
                Observation::Continuous(Array1::from(flat).into_dyn())
            }
            (_, other) => return Err(unexpected(self.name(), &other)),
        };
        Ok(flat)
    }
}
