//! The goal-ambiguity gridworld.
//!
//! An agent moves on a walled grid towards one of several goals. Only the
//! true goal, sampled at every reset, pays its configured reward; reaching
//! any other goal pays nothing and ends the episode according to the
//! wrong-goal policy.

use std::collections::HashSet;

use ndarray::{Array1, Array2, Array3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::cell::Cell;
use super::config::{GridWorldConfig, ObservationMode, WrongGoalPolicy};
use super::error::EnvError;
use super::types::{Action, Position};
use crate::distribution::Distribution;
use crate::space::{Observation, ObservationSpace};

/// Palette index of empty cells in categorical grid observations.
pub const EMPTY_CHANNEL: usize = 0;
/// Palette index of the agent in categorical grid observations.
pub const AGENT_CHANNEL: usize = 1;
/// Palette index of the first goal; goal `i` uses `GOAL_CHANNEL_OFFSET + i`.
pub const GOAL_CHANNEL_OFFSET: usize = 2;

/// Snapshot of the environment's random source.
///
/// Restoring it with [`GridWorldEnv::restore_rng`] replays every subsequent
/// draw exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RngState {
    pub seed: [u8; 32],
    pub word_pos: u128,
}

/// Diagnostic record returned by `reset` and `step`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Info {
    pub true_goal_idx: usize,
    pub true_goal: Cell,
    pub agent_pos: Position,
    pub step_count: u32,
    pub rng_state: RngState,
}

/// Result of a single environment step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    pub observation: Observation,
    pub reward: f64,
    /// The episode reached a terminal state.
    pub terminated: bool,
    /// The step limit was reached.
    pub truncated: bool,
    pub info: Info,
}

impl StepResult {
    /// Whether the episode is over for either reason.
    pub fn done(&self) -> bool {
        self.terminated || self.truncated
    }
}

/// The reset/step/render interface shared by the raw environment and
/// wrapped pipelines.
pub trait Environment {
    /// Starts a new episode.
    fn reset(&mut self) -> crate::Result<(Observation, Info)>;

    /// Applies an integer action.
    fn step(&mut self, action: usize) -> crate::Result<StepResult>;

    /// Draws the current state.
    fn render(&self) -> Array3<u8>;

    /// Space of the observations returned by `reset` and `step`.
    fn observation_space(&self) -> &ObservationSpace;

    /// The underlying gridworld.
    fn base(&self) -> &GridWorldEnv;
}

#[derive(Debug, Clone)]
struct Episode {
    agent_pos: Position,
    true_goal_idx: usize,
    step_count: u32,
}

/// The gridworld state machine.
///
/// # Lifecycle
///
/// 1. Build with [`GridWorldEnv::new`].
/// 2. Call [`GridWorldEnv::reset`] to sample a start position and true goal.
/// 3. Call [`GridWorldEnv::step`] until the episode terminates or truncates.
#[derive(Debug, Clone)]
pub struct GridWorldEnv {
    config: GridWorldConfig,
    walls: HashSet<Position>,
    palette: Vec<Cell>,
    start: Distribution<Position>,
    true_goal: Distribution<usize>,
    observation_space: ObservationSpace,
    episode: Option<Episode>,
    last_reward: f64,
    episodes: u64,
    rng: ChaCha8Rng,
}

impl GridWorldEnv {
    /// Validates the configuration and builds the environment.
    pub fn new(config: GridWorldConfig) -> Result<Self, EnvError> {
        config.validate()?;

        let walls: HashSet<Position> = config.walls.iter().copied().collect();

        let start = config.start.clone().unwrap_or_else(|| {
            Distribution::uniform(
                (0..config.width)
                    .flat_map(|x| (0..config.height).map(move |y| Position::new(x, y)))
                    .filter(|p| !walls.contains(p)),
            )
        });
        let true_goal = config
            .true_goal
            .clone()
            .unwrap_or_else(|| Distribution::uniform(0..config.goal_positions.len()));

        let mut palette = vec![Cell::empty(), Cell::agent()];
        palette.extend(config.goal_cells.iter().cloned());
        palette.push(Cell::wall());

        let observation_space = match config.observation {
            ObservationMode::Position => ObservationSpace::Categorical {
                shape: vec![2],
                n: config.width.max(config.height),
            },
            ObservationMode::Grid => ObservationSpace::Categorical {
                shape: vec![config.width, config.height],
                n: palette.len(),
            },
        };

        if (0..config.goal_positions.len())
            .any(|i| config.end_on_wrong_goal.for_goal(i) == WrongGoalPolicy::Probability(0.0))
        {
            log::warn!("wrong-goal termination probability 0 never ends an episode");
        }

        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Ok(Self {
            config,
            walls,
            palette,
            start,
            true_goal,
            observation_space,
            episode: None,
            last_reward: 0.0,
            episodes: 0,
            rng,
        })
    }

    /// Starts a new episode.
    ///
    /// Samples the start position and the true goal from the environment's
    /// own random source, and zeroes the step counter and last reward.
    pub fn reset(&mut self) -> Result<(Observation, Info), EnvError> {
        let agent_pos = self.start.sample(&mut self.rng)?;
        let true_goal_idx = self.true_goal.sample(&mut self.rng)?;

        self.episode = Some(Episode {
            agent_pos,
            true_goal_idx,
            step_count: 0,
        });
        self.last_reward = 0.0;
        self.episodes += 1;

        log::debug!(
            "episode {} start: agent at {}, true goal {} ({})",
            self.episodes,
            agent_pos,
            true_goal_idx,
            self.config.goal_cells[true_goal_idx]
        );

        Ok((self.observe(), self.info()))
    }

    /// Applies one action.
    ///
    /// Fails without touching any state if the environment was never reset
    /// or the action is not in `0..4`.
    pub fn step(&mut self, action: usize) -> Result<StepResult, EnvError> {
        let action = Action::try_from(action)?;
        let (width, height) = (self.config.width, self.config.height);
        let episode = self.episode.as_mut().ok_or(EnvError::NotReset)?;

        let candidate = episode.agent_pos.moved(action, width, height);
        if !self.walls.contains(&candidate) {
            episode.agent_pos = candidate;
        }
        episode.step_count += 1;

        let agent_pos = episode.agent_pos;
        let true_goal_idx = episode.true_goal_idx;
        let step_count = episode.step_count;

        let (reward, terminated) = match self.goal_index_at(agent_pos) {
            Some(idx) if idx == true_goal_idx => {
                let cell = &self.config.goal_cells[idx];
                (cell.reward, cell.terminal)
            }
            Some(idx) => {
                let terminated = match self.config.end_on_wrong_goal.for_goal(idx) {
                    WrongGoalPolicy::Always => true,
                    WrongGoalPolicy::Never => false,
                    WrongGoalPolicy::Probability(p) => self.rng.gen_bool(p),
                };
                (0.0, terminated)
            }
            None => (0.0, false),
        };
        let truncated = step_count >= self.config.max_episode_steps;
        self.last_reward = reward;

        log::trace!(
            "step {step_count}: {action} -> {agent_pos}, reward {reward}, terminated {terminated}, truncated {truncated}"
        );
        if terminated {
            log::debug!(
                "episode {} terminated at {} after {} steps with reward {}",
                self.episodes,
                agent_pos,
                step_count,
                reward
            );
        }

        Ok(StepResult {
            observation: self.observe(),
            reward,
            terminated,
            truncated,
            info: self.info(),
        })
    }

    /// Raw observation of the current state.
    fn observe(&self) -> Observation {
        match self.config.observation {
            ObservationMode::Position => {
                let pos = self.agent_pos().unwrap_or_else(Position::origin);
                Observation::Categorical(Array1::from(vec![pos.x as i64, pos.y as i64]).into_dyn())
            }
            ObservationMode::Grid => Observation::Categorical(self.grid().into_dyn()),
        }
    }

    /// Categorical grid indexed `[x, y]`; each entry is a palette index.
    pub fn grid(&self) -> Array2<i64> {
        let mut grid = Array2::from_elem((self.config.width, self.config.height), EMPTY_CHANNEL as i64);
        let wall = self.wall_channel() as i64;
        for w in &self.walls {
            grid[[w.x, w.y]] = wall;
        }
        for (i, g) in self.config.goal_positions.iter().enumerate() {
            grid[[g.x, g.y]] = self.goal_channel(i) as i64;
        }
        if let Some(pos) = self.agent_pos() {
            grid[[pos.x, pos.y]] = AGENT_CHANNEL as i64;
        }
        grid
    }

    fn info(&self) -> Info {
        let episode = self.episode.as_ref();
        let true_goal_idx = episode.map_or(0, |e| e.true_goal_idx);
        Info {
            true_goal_idx,
            true_goal: self.config.goal_cells[true_goal_idx].clone(),
            agent_pos: episode.map_or(Position::origin(), |e| e.agent_pos),
            step_count: episode.map_or(0, |e| e.step_count),
            rng_state: self.rng_state(),
        }
    }

    // --- Accessors ---

    pub fn config(&self) -> &GridWorldConfig {
        &self.config
    }

    pub fn width(&self) -> usize {
        self.config.width
    }

    pub fn height(&self) -> usize {
        self.config.height
    }

    pub fn walls(&self) -> &HashSet<Position> {
        &self.walls
    }

    pub fn is_wall(&self, pos: Position) -> bool {
        self.walls.contains(&pos)
    }

    pub fn goal_positions(&self) -> &[Position] {
        &self.config.goal_positions
    }

    pub fn goal_cells(&self) -> &[Cell] {
        &self.config.goal_cells
    }

    pub fn n_goals(&self) -> usize {
        self.config.goal_positions.len()
    }

    /// Index of the goal at `pos`, if any.
    pub fn goal_index_at(&self, pos: Position) -> Option<usize> {
        self.config.goal_positions.iter().position(|g| *g == pos)
    }

    /// Cells indexed by categorical grid values:
    /// `[empty, agent, goal_0, …, goal_{n-1}, wall]`.
    pub fn palette(&self) -> &[Cell] {
        &self.palette
    }

    /// Palette index of goal `goal_idx`.
    pub fn goal_channel(&self, goal_idx: usize) -> usize {
        GOAL_CHANNEL_OFFSET + goal_idx
    }

    /// Palette index of walls.
    pub fn wall_channel(&self) -> usize {
        self.palette.len() - 1
    }

    /// Agent position, `None` before the first reset.
    pub fn agent_pos(&self) -> Option<Position> {
        self.episode.as_ref().map(|e| e.agent_pos)
    }

    /// True goal index, `None` before the first reset.
    pub fn true_goal_idx(&self) -> Option<usize> {
        self.episode.as_ref().map(|e| e.true_goal_idx)
    }

    /// True goal cell, `None` before the first reset.
    pub fn true_goal(&self) -> Option<&Cell> {
        self.true_goal_idx().map(|i| &self.config.goal_cells[i])
    }

    /// Steps taken in the current episode.
    pub fn step_count(&self) -> u32 {
        self.episode.as_ref().map_or(0, |e| e.step_count)
    }

    /// Number of resets so far; the current episode's 1-based index.
    pub fn episode(&self) -> u64 {
        self.episodes
    }

    /// Reward produced by the last step, after any wrapper correction.
    pub fn last_reward(&self) -> f64 {
        self.last_reward
    }

    /// Overwrites the last reward, used by wrappers that reshape rewards.
    pub fn override_last_reward(&mut self, reward: f64) {
        self.last_reward = reward;
    }

    pub fn max_episode_steps(&self) -> u32 {
        self.config.max_episode_steps
    }

    pub fn observation_space(&self) -> &ObservationSpace {
        &self.observation_space
    }

    /// Number of discrete actions.
    pub fn action_count(&self) -> usize {
        Action::COUNT
    }

    /// Current state of the random source.
    pub fn rng_state(&self) -> RngState {
        RngState {
            seed: self.rng.get_seed(),
            word_pos: self.rng.get_word_pos(),
        }
    }

    /// Restores a state previously obtained from [`GridWorldEnv::rng_state`].
    pub fn restore_rng(&mut self, state: RngState) {
        let mut rng = ChaCha8Rng::from_seed(state.seed);
        rng.set_word_pos(state.word_pos);
        self.rng = rng;
    }
}

impl Environment for GridWorldEnv {
    fn reset(&mut self) -> crate::Result<(Observation, Info)> {
        Ok(GridWorldEnv::reset(self)?)
    }

    fn step(&mut self, action: usize) -> crate::Result<StepResult> {
        Ok(GridWorldEnv::step(self, action)?)
    }

    fn render(&self) -> Array3<u8> {
        GridWorldEnv::render(self)
    }

    fn observation_space(&self) -> &ObservationSpace {
        &self.observation_space
    }

    fn base(&self) -> &GridWorldEnv {
        self
    }
}
