//! Goal-ambiguity blinding.
//!
//! Both stages take the categorical grid observation and make some cell
//! categories look alike. They also correct the reward: when an episode ends
//! on a goal the agent cannot tell apart from the true goal, the agent is paid
//! a fixed corrected reward, whichever of the merged goals is the true one.

use ndarray::{Array2, Array3, Axis, Ix2};

use super::{incompatible, unexpected, Wrapper, WrapperError};
use crate::gridworld::GridWorldEnv;
use crate::space::{Observation, ObservationSpace};

/// How merged colour channels are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Reduction {
    #[default]
    Mean,
    Max,
}

/// Reward paid for reaching a goal that looks like the true goal.
pub const DEFAULT_CORRECTED_REWARD: f64 = 1.0;

/// Pays `corrected` when the episode ended on a goal that
/// `indistinguishable(reached, true_goal)` deems identical to the true goal.
fn correct_reward(
    stage: &str,
    reward: f64,
    corrected: f64,
    terminated: bool,
    env: &mut GridWorldEnv,
    indistinguishable: impl Fn(usize, usize) -> bool,
) -> f64 {
    if !terminated {
        return reward;
    }
    let (Some(pos), Some(true_idx)) = (env.agent_pos(), env.true_goal_idx()) else {
        return reward;
    };
    let Some(reached) = env.goal_index_at(pos) else {
        return reward;
    };
    if !indistinguishable(reached, true_idx) {
        return reward;
    }

    if corrected != reward {
        log::debug!(
            "{stage}: goal {reached} looks like true goal {true_idx}, reward {reward} -> {corrected}"
        );
    }
    env.override_last_reward(corrected);
    corrected
}

/// Checks for a 2-D categorical grid over the env's palette; returns its
/// `(width, height)`.
fn grid_input(
    stage: &str,
    input: &ObservationSpace,
    env: &GridWorldEnv,
) -> Result<(usize, usize), WrapperError> {
    match input {
        ObservationSpace::Categorical { shape, n } if shape.len() == 2 && *n == env.palette().len() => {
            Ok((shape[0], shape[1]))
        }
        other => Err(incompatible(stage, "a 2-D categorical grid of palette indices", other)),
    }
}

fn grid_view<'a>(stage: &str, obs: &'a Observation) -> Result<ndarray::ArrayView2<'a, i64>, WrapperError> {
    match obs {
        Observation::Categorical(a) => a
            .view()
            .into_dimensionality::<Ix2>()
            .map_err(|_| unexpected(stage, obs)),
        other => Err(unexpected(stage, other)),
    }
}

fn check_channels(channels: &[usize], n_channels: usize) -> Result<(), WrapperError> {
    match channels.iter().find(|&&c| c >= n_channels) {
        Some(&channel) => Err(WrapperError::InvalidChannel {
            channel,
            n_channels,
        }),
        None => Ok(()),
    }
}

/// Maps the categorical grid to an RGB image in `[0, 1]` where the merged
/// colour channels are replaced by their mean or max.
///
/// With the default merge of channels 0 and 1, red and green goals become
/// the same colour.
///
/// Input: `Categorical((width, height))`. Output: `Continuous((width, height, 3))`.
#[derive(Debug, Clone)]
pub struct ColorBlind {
    pub merged_channels: Vec<usize>,
    pub reduction: Reduction,
    pub reward_indistinguishable_goals: bool,
    pub corrected_reward: f64,
    pub disabled: bool,
    color_map_full: Array2<f32>,
    color_map_blind: Array2<f32>,
}

impl ColorBlind {
    pub fn new(merged_channels: Vec<usize>, reduction: Reduction) -> Self {
        Self {
            merged_channels,
            reduction,
            reward_indistinguishable_goals: true,
            corrected_reward: DEFAULT_CORRECTED_REWARD,
            disabled: false,
            color_map_full: Array2::zeros((0, 3)),
            color_map_blind: Array2::zeros((0, 3)),
        }
    }

    pub fn with_reward_correction(mut self, enabled: bool) -> Self {
        self.reward_indistinguishable_goals = enabled;
        self
    }

    /// Sets the reward paid when an indistinguishable goal is reached.
    pub fn with_corrected_reward(mut self, reward: f64) -> Self {
        self.corrected_reward = reward;
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// Palette-indexed colours currently in use.
    pub fn color_map(&self) -> &Array2<f32> {
        if self.disabled {
            &self.color_map_full
        } else {
            &self.color_map_blind
        }
    }

    /// Whether goal `goal_idx` has the same colour as goal `true_idx`.
    pub fn is_indistinguishable(&self, env: &GridWorldEnv, goal_idx: usize, true_idx: usize) -> bool {
        let map = self.color_map();
        map.row(env.goal_channel(goal_idx)) == map.row(env.goal_channel(true_idx))
    }
}

impl Default for ColorBlind {
    fn default() -> Self {
        Self::new(vec![0, 1], Reduction::Mean)
    }
}

impl Wrapper for ColorBlind {
    fn name(&self) -> &str {
        "color_blind"
    }

    fn bind(&mut self, input: &ObservationSpace, env: &GridWorldEnv) -> Result<ObservationSpace, WrapperError> {
        let (width, height) = grid_input(self.name(), input, env)?;
        check_channels(&self.merged_channels, 3)?;

        let palette = env.palette();
        let full = Array2::from_shape_fn((palette.len(), 3), |(cell, c)| {
            palette[cell].display_color().channels()[c] as f32 / 255.0
        });
        let mut blind = full.clone();
        if !self.merged_channels.is_empty() {
            for mut row in blind.rows_mut() {
                let merged = self.merged_channels.iter().map(|&c| row[c]);
                let value = match self.reduction {
                    Reduction::Mean => merged.sum::<f32>() / self.merged_channels.len() as f32,
                    Reduction::Max => merged.fold(f32::NEG_INFINITY, f32::max),
                };
                for &c in &self.merged_channels {
                    row[c] = value;
                }
            }
        }
        self.color_map_full = full;
        self.color_map_blind = blind;

        Ok(ObservationSpace::continuous(&[width, height, 3], 0.0, 1.0))
    }

    fn observation(&self, obs: Observation, _env: &GridWorldEnv) -> Result<Observation, WrapperError> {
        let grid = grid_view(self.name(), &obs)?;
        let map = self.color_map();
        let (w, h) = grid.dim();
        let image = Array3::from_shape_fn((w, h, 3), |(x, y, c)| map[[grid[[x, y]] as usize, c]]);
        Ok(Observation::Continuous(image.into_dyn()))
    }

    fn reward(&mut self, reward: f64, terminated: bool, env: &mut GridWorldEnv) -> f64 {
        if self.disabled || !self.reward_indistinguishable_goals {
            return reward;
        }
        let this = &*self;
        correct_reward(this.name(), reward, this.corrected_reward, terminated, env, |goal, truth| {
            let map = this.color_map();
            map.row(goal + crate::gridworld::GOAL_CHANNEL_OFFSET)
                == map.row(truth + crate::gridworld::GOAL_CHANNEL_OFFSET)
        })
    }
}

/// Maps the categorical grid to per-cell indicator channels, OR-ing the
/// merged channels together.
///
/// With the default merge of channels 2 and 3, goals 0 and 1 light up the
/// same pair of channels.
///
/// Input: `Categorical((width, height))`. Output: `MultiBinary((width, height, n_cells))`.
#[derive(Debug, Clone)]
pub struct OneHotColorBlind {
    pub merged_channels: Vec<usize>,
    pub reward_indistinguishable_goals: bool,
    pub corrected_reward: f64,
    pub disabled: bool,
    n_cells: usize,
}

impl OneHotColorBlind {
    pub fn new(merged_channels: Vec<usize>) -> Self {
        Self {
            merged_channels,
            reward_indistinguishable_goals: true,
            corrected_reward: DEFAULT_CORRECTED_REWARD,
            disabled: false,
            n_cells: 0,
        }
    }

    pub fn with_reward_correction(mut self, enabled: bool) -> Self {
        self.reward_indistinguishable_goals = enabled;
        self
    }

    /// Sets the reward paid when an indistinguishable goal is reached.
    pub fn with_corrected_reward(mut self, reward: f64) -> Self {
        self.corrected_reward = reward;
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// Whether goal `goal_idx` lights up the same channels as goal `true_idx`.
    pub fn is_indistinguishable(&self, env: &GridWorldEnv, goal_idx: usize, true_idx: usize) -> bool {
        if goal_idx == true_idx {
            return true;
        }
        if self.disabled {
            return false;
        }
        self.merged_channels.contains(&env.goal_channel(goal_idx))
            && self.merged_channels.contains(&env.goal_channel(true_idx))
    }
}

impl Default for OneHotColorBlind {
    fn default() -> Self {
        Self::new(vec![2, 3])
    }
}

impl Wrapper for OneHotColorBlind {
    fn name(&self) -> &str {
        "one_hot_color_blind"
    }

    fn bind(&mut self, input: &ObservationSpace, env: &GridWorldEnv) -> Result<ObservationSpace, WrapperError> {
        let (width, height) = grid_input(self.name(), input, env)?;
        self.n_cells = env.palette().len();
        check_channels(&self.merged_channels, self.n_cells)?;
        Ok(ObservationSpace::MultiBinary {
            shape: vec![width, height, self.n_cells],
        })
    }

    fn observation(&self, obs: Observation, _env: &GridWorldEnv) -> Result<Observation, WrapperError> {
        let grid = grid_view(self.name(), &obs)?;
        let (w, h) = grid.dim();
        let mut one_hot = Array3::from_shape_fn((w, h, self.n_cells), |(x, y, c)| grid[[x, y]] as usize == c);

        if !self.disabled && !self.merged_channels.is_empty() {
            for mut lane in one_hot.lanes_mut(Axis(2)) {
                let any = self.merged_channels.iter().any(|&c| lane[c]);
                for &c in &self.merged_channels {
                    lane[c] = any;
                }
            }
        }
        Ok(Observation::Binary(one_hot.into_dyn()))
    }

    fn reward(&mut self, reward: f64, terminated: bool, env: &mut GridWorldEnv) -> f64 {
        if self.disabled || !self.reward_indistinguishable_goals {
            return reward;
        }
        let merged = self.merged_channels.clone();
        correct_reward(self.name(), reward, self.corrected_reward, terminated, env, |goal, truth| {
            goal == truth
                || (merged.contains(&(goal + crate::gridworld::GOAL_CHANNEL_OFFSET))
                    && merged.contains(&(truth + crate::gridworld::GOAL_CHANNEL_OFFSET)))
        })
    }
}
