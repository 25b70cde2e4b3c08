//! Observation transform pipeline.
//!
//! Stages are applied in declared order after every `reset` and `step` of
//! the underlying [`GridWorldEnv`]. Each stage checks the previous stage's
//! declared output space when it is added, so an incompatible pipeline fails
//! at construction rather than mid-episode.

pub mod blind;
pub mod channel;
pub mod error;
pub mod flatten;
pub mod pipeline;
pub mod reward;
pub mod switch_tag;

pub use blind::{ColorBlind, OneHotColorBlind, Reduction, DEFAULT_CORRECTED_REWARD};
pub use channel::WeightedChannel;
pub use error::WrapperError;
pub use flatten::AddTrueGoalFlat;
pub use pipeline::{EnvFactory, WrappedEnv};
pub use reward::FunctionReward;
pub use switch_tag::AddSwitch;

use crate::gridworld::GridWorldEnv;
use crate::space::{Observation, ObservationSpace};

/// One stage of an observation pipeline.
pub trait Wrapper: Send {
    /// Human-readable stage name.
    fn name(&self) -> &str;

    /// Checks the upstream output space and returns this stage's output
    /// space. Called once, when the stage is added to a pipeline.
    fn bind(
        &mut self,
        input: &ObservationSpace,
        env: &GridWorldEnv,
    ) -> Result<ObservationSpace, WrapperError>;

    /// Maps an upstream observation to this stage's output.
    fn observation(&self, obs: Observation, env: &GridWorldEnv)
        -> Result<Observation, WrapperError>;

    /// Adjusts the reward after a step. Passes it through by default.
    fn reward(&mut self, reward: f64, _terminated: bool, _env: &mut GridWorldEnv) -> f64 {
        reward
    }
}

pub(crate) fn incompatible(stage: &str, expected: &str, found: &ObservationSpace) -> WrapperError {
    WrapperError::IncompatibleSpace {
        stage: stage.to_string(),
        expected: expected.to_string(),
        found: found.to_string(),
    }
}

pub(crate) fn unexpected(stage: &str, obs: &Observation) -> WrapperError {
    let found = match obs {
        Observation::Categorical(a) => format!("categorical {:?}", a.shape()),
        Observation::Binary(a) => format!("binary {:?}", a.shape()),
        Observation::Continuous(a) => format!("continuous {:?}", a.shape()),
        Observation::Discrete(v) => format!("discrete {v}"),
        Observation::Dict(fields) => format!("dict {:?}", fields.keys().collect::<Vec<_>>()),
    };
    WrapperError::UnexpectedObservation {
        stage: stage.to_string(),
        found,
    }
}
