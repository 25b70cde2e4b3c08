//! Configuration for the goal-ambiguity gridworld.

use std::collections::HashSet;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::cell::Cell;
use super::error::EnvError;
use super::types::Position;
use crate::distribution::Distribution;

/// What happens when the agent reaches a goal that is not the true goal.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum WrongGoalPolicy {
    /// The episode always ends.
    Always,
    /// The episode never ends.
    Never,
    /// The episode ends with probability `p`, drawn from the env's RNG.
    Probability(f64),
}

impl From<bool> for WrongGoalPolicy {
    fn from(end: bool) -> Self {
        if end {
            WrongGoalPolicy::Always
        } else {
            WrongGoalPolicy::Never
        }
    }
}

/// Wrong-goal termination, either shared by every goal or given per goal.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EndOnWrongGoal {
    All(WrongGoalPolicy),
    PerGoal(Vec<WrongGoalPolicy>),
}

impl EndOnWrongGoal {
    /// Policy applying to goal `goal_idx`.
    pub fn for_goal(&self, goal_idx: usize) -> WrongGoalPolicy {
        match self {
            EndOnWrongGoal::All(policy) => *policy,
            EndOnWrongGoal::PerGoal(policies) => policies[goal_idx],
        }
    }
}

impl Default for EndOnWrongGoal {
    fn default() -> Self {
        EndOnWrongGoal::All(WrongGoalPolicy::Always)
    }
}

/// What `reset`/`step` return as the raw observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ObservationMode {
    /// The agent's `[x, y]` grid position.
    #[default]
    Position,
    /// A `width × height` grid of palette indices.
    Grid,
}

/// Configuration for [`GridWorldEnv`](super::GridWorldEnv).
///
/// The default is a 7×7 grid with the canonical three goals in three corners,
/// a uniformly random start and a uniformly random true goal.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GridWorldConfig {
    // --- Geometry ---
    /// Number of columns.
    pub width: usize,
    /// Number of rows.
    pub height: usize,
    /// Impassable cells.
    pub walls: Vec<Position>,

    // --- Goals ---
    /// Where each goal sits.
    pub goal_positions: Vec<Position>,
    /// Reward/terminal semantics of each goal, parallel to `goal_positions`.
    pub goal_cells: Vec<Cell>,
    /// What happens on reaching a wrong goal.
    pub end_on_wrong_goal: EndOnWrongGoal,

    // --- Episode ---
    /// Start-position distribution; `None` means uniform over non-wall cells.
    pub start: Option<Distribution<Position>>,
    /// True-goal distribution; `None` means uniform over goal indices.
    pub true_goal: Option<Distribution<usize>>,
    /// Step limit after which episodes are truncated.
    pub max_episode_steps: u32,
    /// Seed of the environment's random source.
    pub seed: u64,

    // --- Output ---
    /// Kind of raw observation.
    pub observation: ObservationMode,
    /// Pixels per cell in rendered frames.
    pub render_cell_size: usize,
}

impl GridWorldConfig {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), EnvError> {
        if self.width == 0 || self.height == 0 {
            return Err(invalid(format!(
                "grid must be non-empty, got {}x{}",
                self.width, self.height
            )));
        }
        if self.max_episode_steps == 0 {
            return Err(invalid("max_episode_steps must be positive".into()));
        }
        if self.render_cell_size == 0 {
            return Err(invalid("render_cell_size must be positive".into()));
        }
        if self.goal_positions.is_empty() {
            return Err(invalid("at least one goal is required".into()));
        }
        if self.goal_positions.len() != self.goal_cells.len() {
            return Err(invalid(format!(
                "{} goal positions but {} goal cells",
                self.goal_positions.len(),
                self.goal_cells.len()
            )));
        }

        for wall in &self.walls {
            if !wall.in_bounds(self.width, self.height) {
                return Err(invalid(format!("wall {wall} is outside the grid")));
            }
        }
        let walls: HashSet<_> = self.walls.iter().collect();

        let mut seen = HashSet::new();
        for goal in &self.goal_positions {
            if !goal.in_bounds(self.width, self.height) {
                return Err(invalid(format!("goal {goal} is outside the grid")));
            }
            if walls.contains(goal) {
                return Err(invalid(format!("goal {goal} is on a wall")));
            }
            if !seen.insert(goal) {
                return Err(invalid(format!("two goals share position {goal}")));
            }
        }

        if let EndOnWrongGoal::PerGoal(policies) = &self.end_on_wrong_goal {
            if policies.len() != self.goal_positions.len() {
                return Err(invalid(format!(
                    "{} wrong-goal policies for {} goals",
                    policies.len(),
                    self.goal_positions.len()
                )));
            }
        }
        let policies: Vec<WrongGoalPolicy> = (0..self.goal_positions.len())
            .map(|i| self.end_on_wrong_goal.for_goal(i))
            .collect();
        for policy in policies {
            if let WrongGoalPolicy::Probability(p) = policy {
                if !(0.0..=1.0).contains(&p) {
                    return Err(invalid(format!(
                        "wrong-goal termination probability {p} is outside [0, 1]"
                    )));
                }
            }
        }

        if let Some(start) = &self.start {
            for pos in start.support() {
                if !pos.in_bounds(self.width, self.height) {
                    return Err(invalid(format!("start position {pos} is outside the grid")));
                }
                if walls.contains(pos) {
                    return Err(invalid(format!("start position {pos} is on a wall")));
                }
            }
        }
        if let Some(true_goal) = &self.true_goal {
            for &idx in true_goal.support() {
                if idx >= self.goal_positions.len() {
                    return Err(invalid(format!(
                        "true goal index {idx} out of range for {} goals",
                        self.goal_positions.len()
                    )));
                }
            }
        }

        Ok(())
    }
}

fn invalid(message: String) -> EnvError {
    EnvError::InvalidConfig(message)
}

impl Default for GridWorldConfig {
    fn default() -> Self {
        Self {
            width: 7,
            height: 7,
            walls: Vec::new(),
            goal_positions: vec![Position::new(0, 0), Position::new(0, 6), Position::new(6, 0)],
            goal_cells: Cell::canonical_goals(),
            end_on_wrong_goal: EndOnWrongGoal::default(),
            start: None,
            true_goal: None,
            max_episode_steps: 100,
            seed: 0,
            observation: ObservationMode::Position,
            render_cell_size: 8,
        }
    }
}
