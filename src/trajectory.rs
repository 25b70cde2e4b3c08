//! Policy rollouts and evaluation.
//!
//! A [`Trajectory`] is one bounded rollout of a policy: the rendered frames,
//! the summed reward and why it stopped. [`evaluate`] runs many of them and
//! reports how often the agent found the rewarding goal.

use std::fmt;

use ndarray::{concatenate, Array3, ArrayView3, Axis, ShapeError};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::gridworld::{Environment, GridWorldEnv, StepResult};
use crate::policy::Policy;
use crate::{generate_id, Id};

/// Why a rollout stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum EndReason {
    /// The step limit (environment or rollout) was reached.
    Truncated,
    /// The environment reported a terminal state.
    Terminated,
    /// The caller's end condition held.
    Condition,
}

impl fmt::Display for EndReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EndReason::Truncated => "truncated",
            EndReason::Terminated => "terminated",
            EndReason::Condition => "condition",
        };
        f.write_str(s)
    }
}

/// State visible to an end condition after each step.
#[derive(Debug)]
pub struct StepContext<'a> {
    /// Zero-based index of the step just taken.
    pub step: usize,
    pub action: usize,
    pub result: &'a StepResult,
    pub total_reward: f64,
    pub env: &'a GridWorldEnv,
}

/// Rollout limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RolloutOptions {
    pub max_len: usize,
    /// Keep only the initial frame.
    pub no_images: bool,
}

impl Default for RolloutOptions {
    fn default() -> Self {
        Self {
            max_len: 10,
            no_images: false,
        }
    }
}

/// One rollout of a policy.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Trajectory {
    id: Id,
    images: Vec<Array3<u8>>,
    reward: f64,
    ended: EndReason,
    steps: usize,
}

impl Trajectory {
    /// Resets `env` and rolls out `policy` for at most `options.max_len`
    /// steps.
    ///
    /// After each step the end checks run in order: `end_condition`, then
    /// termination, then truncation. Running out of steps counts as
    /// truncation.
    pub fn from_policy(
        policy: &mut dyn Policy,
        env: &mut dyn Environment,
        options: &RolloutOptions,
        end_condition: Option<&dyn Fn(&StepContext<'_>) -> bool>,
    ) -> crate::Result<Self> {
        let (mut obs, _info) = env.reset()?;
        policy.reset();
        let mut images = vec![env.render()];
        let mut reward = 0.0;

        for step in 0..options.max_len {
            let action = policy.select_action(&obs)?;
            let result = env.step(action)?;
            reward += result.reward;
            if !options.no_images {
                images.push(env.render());
            }

            let ended = {
                let ctx = StepContext {
                    step,
                    action,
                    result: &result,
                    total_reward: reward,
                    env: env.base(),
                };
                if end_condition.is_some_and(|cond| cond(&ctx)) {
                    Some(EndReason::Condition)
                } else if result.terminated {
                    Some(EndReason::Terminated)
                } else if result.truncated {
                    Some(EndReason::Truncated)
                } else {
                    None
                }
            };
            if let Some(ended) = ended {
                return Ok(Self::finish(images, reward, ended, step + 1, policy));
            }
            obs = result.observation;
        }
        Ok(Self::finish(images, reward, EndReason::Truncated, options.max_len, policy))
    }

    fn finish(images: Vec<Array3<u8>>, reward: f64, ended: EndReason, steps: usize, policy: &dyn Policy) -> Self {
        log::debug!("{} rollout {ended} after {steps} steps, reward {reward}", policy.name());
        Self {
            id: generate_id(),
            images,
            reward,
            ended,
            steps,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn images(&self) -> &[Array3<u8>] {
        &self.images
    }

    pub fn reward(&self) -> f64 {
        self.reward
    }

    pub fn ended(&self) -> EndReason {
        self.ended
    }

    /// Number of environment steps taken.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Frames side by side, left to right, padded with black frames up to
    /// `pad_to` frames.
    ///
    /// Fails if the frames do not share a height.
    pub fn image(&self, pad_to: Option<usize>) -> Result<Array3<u8>, ShapeError> {
        let Some(first) = self.images.first() else {
            return Ok(Array3::zeros((0, 0, 3)));
        };
        let blank = Array3::zeros(first.raw_dim());
        let n = pad_to.unwrap_or(0).max(self.images.len());
        let views: Vec<ArrayView3<'_, u8>> = self
            .images
            .iter()
            .map(|img| img.view())
            .chain(std::iter::repeat(blank.view()).take(n - self.images.len()))
            .collect();
        concatenate(Axis(1), &views)
    }
}

/// Equal frames, reward and end reason; the id is ignored.
impl PartialEq for Trajectory {
    fn eq(&self, other: &Self) -> bool {
        self.images == other.images && self.reward == other.reward && self.ended == other.ended
    }
}

/// Outcome fractions over many rollouts.
#[derive(Debug, Clone, PartialEq)]
pub struct EvaluationSummary {
    /// Episodes where a step paid a positive reward.
    pub got_reward: f64,
    /// Episodes that terminated without reward.
    pub wrong_goal: f64,
    /// Episodes that ran out of steps.
    pub no_goal: f64,
    /// Mean number of steps per episode.
    pub mean_steps: f64,
    pub n_episodes: usize,
}

/// Rolls out `policy` `n_episodes` times with at most `max_len` steps each.
///
/// An episode counts as rewarded when the environment's last reward, after
/// any wrapper correction, is positive.
pub fn evaluate(
    policy: &mut dyn Policy,
    env: &mut dyn Environment,
    n_episodes: usize,
    max_len: usize,
) -> crate::Result<EvaluationSummary> {
    let options = RolloutOptions {
        max_len,
        no_images: true,
    };
    let rewarded = |ctx: &StepContext<'_>| ctx.env.last_reward() > 0.0;

    let (mut found, mut terminated, mut steps) = (0usize, 0usize, 0usize);
    for _ in 0..n_episodes {
        let trajectory = Trajectory::from_policy(policy, env, &options, Some(&rewarded))?;
        match trajectory.ended() {
            EndReason::Condition => found += 1,
            EndReason::Terminated => terminated += 1,
            EndReason::Truncated => {}
        }
        steps += trajectory.steps();
    }

    let n = n_episodes.max(1) as f64;
    let summary = EvaluationSummary {
        got_reward: found as f64 / n,
        wrong_goal: terminated as f64 / n,
        no_goal: (n_episodes - found - terminated) as f64 / n,
        mean_steps: steps as f64 / n,
        n_episodes,
    };
    log::info!("{} evaluation: {}", policy.name(), summary.headline());
    Ok(summary)
}

impl EvaluationSummary {
    fn headline(&self) -> String {
        format!(
            "Got reward: {:.1}% | Truncated: {:.1}% | Wrong goal: {:.1}%",
            self.got_reward * 100.0,
            self.no_goal * 100.0,
            self.wrong_goal * 100.0
        )
    }
}

impl fmt::Display for EvaluationSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Evaluation ({} episodes) ===", self.n_episodes)?;
        writeln!(f, "  Got reward:   {:.1}%", self.got_reward * 100.0)?;
        writeln!(f, "  Wrong goal:   {:.1}%", self.wrong_goal * 100.0)?;
        writeln!(f, "  No goal:      {:.1}%", self.no_goal * 100.0)?;
        write!(f, "  Mean steps:   {:.1}", self.mean_steps)
    }
}
