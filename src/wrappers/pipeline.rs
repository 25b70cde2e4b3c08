//! Wrapped environments and reusable environment recipes.

use ndarray::Array3;

use super::{Wrapper, WrapperError};
use crate::gridworld::{Environment, GridWorldConfig, GridWorldEnv, Info, StepResult};
use crate::space::{Observation, ObservationSpace};

/// A [`GridWorldEnv`] followed by an ordered chain of [`Wrapper`] stages.
pub struct WrappedEnv {
    env: GridWorldEnv,
    stages: Vec<Box<dyn Wrapper>>,
    observation_space: ObservationSpace,
}

impl WrappedEnv {
    /// Wraps an environment with an empty pipeline.
    pub fn new(env: GridWorldEnv) -> Self {
        let observation_space = env.observation_space().clone();
        Self {
            env,
            stages: Vec::new(),
            observation_space,
        }
    }

    /// Appends a stage, checking it against the current output space.
    pub fn wrap<W: Wrapper + 'static>(self, stage: W) -> Result<Self, WrapperError> {
        self.wrap_boxed(Box::new(stage))
    }

    /// Appends an already boxed stage.
    pub fn wrap_boxed(mut self, mut stage: Box<dyn Wrapper>) -> Result<Self, WrapperError> {
        let output = stage.bind(&self.observation_space, &self.env)?;
        log::info!(
            "pipeline stage {} ({}): {} -> {}",
            self.stages.len(),
            stage.name(),
            self.observation_space,
            output
        );
        self.observation_space = output;
        self.stages.push(stage);
        Ok(self)
    }

    /// Resets the environment and maps the first observation.
    pub fn reset(&mut self) -> crate::Result<(Observation, Info)> {
        let (mut obs, info) = self.env.reset()?;
        for stage in &self.stages {
            obs = stage.observation(obs, &self.env)?;
        }
        Ok((obs, info))
    }

    /// Steps the environment, then lets each stage in order adjust the
    /// reward and map the observation.
    pub fn step(&mut self, action: usize) -> crate::Result<StepResult> {
        let mut result = self.env.step(action)?;
        for stage in self.stages.iter_mut() {
            result.reward = stage.reward(result.reward, result.terminated, &mut self.env);
            result.observation = stage.observation(result.observation, &self.env)?;
        }
        Ok(result)
    }

    /// Output space of the last stage.
    pub fn observation_space(&self) -> &ObservationSpace {
        &self.observation_space
    }

    pub fn env(&self) -> &GridWorldEnv {
        &self.env
    }

    pub fn env_mut(&mut self) -> &mut GridWorldEnv {
        &mut self.env
    }

    /// Names of the stages in application order.
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }
}

impl Environment for WrappedEnv {
    fn reset(&mut self) -> crate::Result<(Observation, Info)> {
        WrappedEnv::reset(self)
    }

    fn step(&mut self, action: usize) -> crate::Result<StepResult> {
        WrappedEnv::step(self, action)
    }

    fn render(&self) -> Array3<u8> {
        self.env.render()
    }

    fn observation_space(&self) -> &ObservationSpace {
        &self.observation_space
    }

    fn base(&self) -> &GridWorldEnv {
        &self.env
    }
}

type StageFn = Box<dyn Fn() -> Box<dyn Wrapper> + Send + Sync>;

/// A reusable recipe: a default configuration plus stage constructors.
///
/// Each call to [`EnvFactory::build`] produces a fresh environment wrapped
/// with fresh stages; [`EnvFactory::build_with`] applies the same stages to a
/// different configuration.
pub struct EnvFactory {
    config: GridWorldConfig,
    stages: Vec<StageFn>,
}

impl EnvFactory {
    pub fn new(config: GridWorldConfig) -> Self {
        Self {
            config,
            stages: Vec::new(),
        }
    }

    /// Adds a stage constructor, applied after the previous ones.
    pub fn with_stage<W, F>(mut self, make: F) -> Self
    where
        W: Wrapper + 'static,
        F: Fn() -> W + Send + Sync + 'static,
    {
        self.stages.push(Box::new(move || Box::new(make())));
        self
    }

    /// Builds an environment from the default configuration.
    pub fn build(&self) -> crate::Result<WrappedEnv> {
        self.build_with(self.config.clone())
    }

    /// Builds an environment from `config`, wrapped with the same stages.
    pub fn build_with(&self, config: GridWorldConfig) -> crate::Result<WrappedEnv> {
        let mut env = WrappedEnv::new(GridWorldEnv::new(config)?);
        for make in &self.stages {
            env = env.wrap_boxed(make())?;
        }
        Ok(env)
    }

    pub fn config(&self) -> &GridWorldConfig {
        &self.config
    }
}
