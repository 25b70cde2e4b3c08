//! Goal-ambiguity gridworld environment.
//!
//! A deterministic-given-seed grid state machine: agent position, goal
//! layout, per-goal reward and termination policy, and the reset/step
//! transition function.

pub mod cell;
pub mod config;
pub mod environment;
pub mod error;
pub mod render;
pub mod types;

#[cfg(test)]
mod tests;

pub use cell::{Cell, CellKind, Rgb};
pub use config::{EndOnWrongGoal, GridWorldConfig, ObservationMode, WrongGoalPolicy};
pub use environment::{
    Environment, GridWorldEnv, Info, RngState, StepResult, AGENT_CHANNEL, EMPTY_CHANNEL,
    GOAL_CHANNEL_OFFSET,
};
pub use error::EnvError;
pub use types::{Action, Position};
