//! ambigrid - a research harness for goal ambiguity in reinforcement learning
//!
//! A gridworld where an agent pursues one of several visually similar goals,
//! observation wrappers controlling how distinguishable those goals are, and
//! switch networks whose designated layers are replicated and selected per
//! example by an integer index.

pub mod dedup;
pub mod distribution;
pub mod gridworld;
pub mod policy;
pub mod space;
pub mod switch;
pub mod trajectory;
pub mod wrappers;

use thiserror::Error;

pub use dedup::{DedupError, UniqueChecker};
pub use distribution::{Distribution, SamplingError};
pub use gridworld::{Environment, EnvError, GridWorldConfig, GridWorldEnv};
pub use policy::Policy;
pub use space::{Observation, ObservationSpace};
pub use switch::{SwitchError, SwitchNetwork};
pub use trajectory::{evaluate, EvaluationSummary, Trajectory};
pub use wrappers::{EnvFactory, WrappedEnv, Wrapper, WrapperError};

/// Identifier type used for trajectories.
pub type Id = String;

/// Generates a new unique identifier (UUID v4).
pub fn generate_id() -> Id {
    uuid::Uuid::new_v4().to_string()
}

/// Any error raised by the crate.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Env(#[from] EnvError),

    #[error(transparent)]
    Wrapper(#[from] WrapperError),

    #[error(transparent)]
    Switch(#[from] SwitchError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
