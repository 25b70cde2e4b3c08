use super::{Wrapper, WrapperError};
use crate::gridworld::GridWorldEnv;
use crate::space::{Observation, ObservationSpace};

/// Replaces the reward with a function of the post-step environment state.
///
/// Observations pass through unchanged. The environment's own last reward is
/// left alone, so episode outcomes are still judged by the goal reached.
pub struct FunctionReward<F> {
    reward_fn: F,
}

impl<F> FunctionReward<F>
where
    F: Fn(&GridWorldEnv) -> f64 + Send,
{
    pub fn new(reward_fn: F) -> Self {
        Self { reward_fn }
    }
}

impl<F> Wrapper for FunctionReward<F>
where
    F: Fn(&GridWorldEnv) -> f64 + Send,
{
    fn name(&self) -> &str {
        "function_reward"
    }

    fn bind(&mut self, input: &ObservationSpace, _env: &GridWorldEnv) -> Result<ObservationSpace, WrapperError> {
        Ok(input.clone())
    }

    fn observation(&self, obs: Observation, _env: &GridWorldEnv) -> Result<Observation, WrapperError> {
        Ok(obs)
    }

    fn reward(&mut self, _reward: f64, _terminated: bool, env: &mut GridWorldEnv) -> f64 {
        (self.reward_fn)(&*env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::Distribution;
    use crate::gridworld::{GridWorldConfig, Position};
    use crate::policy::ScriptedPolicy;
    use crate::trajectory::evaluate;
    use crate::wrappers::WrappedEnv;

    #[test]
    fn distance_shaping() {
        let env = GridWorldEnv::new(GridWorldConfig {
            true_goal: Some(Distribution::Point(0)),
            start: Some(Distribution::Point(Position::new(3, 0))),
            ..GridWorldConfig::default()
        })
        .unwrap();
        let mut env = WrappedEnv::new(env)
            .wrap(FunctionReward::new(|env: &GridWorldEnv| {
                let goal = env.goal_positions()[0];
                env.agent_pos().map_or(0.0, |p| -(p.manhattan(&goal) as f64))
            }))
            .unwrap();
        env.reset().unwrap();
        let result = env.step(2).unwrap();
        assert_eq!(result.reward, -2.0);
        assert_eq!(env.env().last_reward(), 0.0);
        assert_eq!(result.observation.shape(), Some(&[2][..]));
    }

    #[test]
    fn shaping_does_not_count_as_reaching_a_goal() {
        let env = GridWorldEnv::new(GridWorldConfig {
            true_goal: Some(Distribution::Point(0)),
            start: Some(Distribution::Point(Position::new(3, 3))),
            ..GridWorldConfig::default()
        })
        .unwrap();
        let mut env = WrappedEnv::new(env)
            .wrap(FunctionReward::new(|_: &GridWorldEnv| 0.01))
            .unwrap();
        // RIGHT then DOWN forever ends in the goal-free bottom row.
        let mut policy = ScriptedPolicy::new(vec![0, 3]);
        let summary = evaluate(&mut policy, &mut env, 5, 10).unwrap();
        assert_eq!(summary.got_reward, 0.0);
        assert_eq!(summary.no_goal, 1.0);
    }
}
