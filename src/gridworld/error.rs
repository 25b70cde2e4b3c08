use thiserror::Error;

use crate::distribution::SamplingError;

/// Errors raised by [`GridWorldEnv`](super::GridWorldEnv).
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EnvError {
    #[error("step() called before reset()")]
    NotReset,

    #[error("Invalid action {0}: expected 0..4 (right, up, left, down)")]
    InvalidAction(usize),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Sampling failed: {0}")]
    Sampling(#[from] SamplingError),
}
