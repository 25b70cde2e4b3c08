use std::collections::BTreeMap;
use std::fmt;

use super::{unexpected, Wrapper, WrapperError};
use crate::gridworld::GridWorldEnv;
use crate::space::{Observation, ObservationSpace};

/// Key under which the switch value is stored.
pub const SWITCH_KEY: &str = "switch";
/// Key under which a non-record observation is stored.
pub const OBS_KEY: &str = "obs";

type SwitchFn = Box<dyn Fn(&GridWorldEnv) -> usize + Send>;

/// Tags every observation with a switch value computed from the environment.
///
/// Non-record observations become `{obs, switch}`; record observations get a
/// `switch` field added. A switch network reads this field to pick which
/// replica of its switched layers to run.
pub struct AddSwitch {
    n_switches: Option<usize>,
    switch_fn: SwitchFn,
    wraps_record: bool,
}

impl AddSwitch {
    pub fn new<F>(n_switches: usize, switch_fn: F) -> Self
    where
        F: Fn(&GridWorldEnv) -> usize + Send + 'static,
    {
        Self {
            n_switches: Some(n_switches),
            switch_fn: Box::new(switch_fn),
            wraps_record: false,
        }
    }

    /// Switches on the true goal index, with one switch per goal.
    pub fn by_true_goal() -> Self {
        Self {
            n_switches: None,
            switch_fn: Box::new(|env: &GridWorldEnv| env.true_goal_idx().unwrap_or(0)),
            wraps_record: false,
        }
    }

    /// Cycles through `n` switches, one per episode.
    pub fn by_episode(n: usize) -> Self {
        Self::new(n, move |env| (env.episode() as usize).wrapping_sub(1) % n.max(1))
    }

    /// Number of switch values; resolved at bind time for
    /// [`AddSwitch::by_true_goal`].
    pub fn n_switches(&self) -> Option<usize> {
        self.n_switches
    }
}

impl fmt::Debug for AddSwitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AddSwitch")
            .field("n_switches", &self.n_switches)
            .finish_non_exhaustive()
    }
}

impl Wrapper for AddSwitch {
    fn name(&self) -> &str {
        "add_switch"
    }

    fn bind(&mut self, input: &ObservationSpace, env: &GridWorldEnv) -> Result<ObservationSpace, WrapperError> {
        let n = *self.n_switches.get_or_insert(env.n_goals());
        let switch = ObservationSpace::Discrete { n };

        let fields = match input {
            ObservationSpace::Dict(fields) => {
                if fields.contains_key(SWITCH_KEY) {
                    return Err(WrapperError::DuplicateKey(SWITCH_KEY.to_string()));
                }
                self.wraps_record = true;
                let mut fields = fields.clone();
                fields.insert(SWITCH_KEY.to_string(), switch);
                fields
            }
            other => {
                self.wraps_record = false;
                BTreeMap::from([(OBS_KEY.to_string(), other.clone()), (SWITCH_KEY.to_string(), switch)])
            }
        };
        Ok(ObservationSpace::Dict(fields))
    }

    fn observation(&self, obs: Observation, env: &GridWorldEnv) -> Result<Observation, WrapperError> {
        let n_switches = self.n_switches.unwrap_or(0);
        let switch = (self.switch_fn)(env);
        if switch >= n_switches {
            return Err(WrapperError::SwitchOutOfRange { switch, n_switches });
        }

        let fields = match obs {
            Observation::Dict(mut fields) if self.wraps_record => {
                fields.insert(SWITCH_KEY.to_string(), Observation::Discrete(switch));
                fields
            }
            other if !self.wraps_record && !matches!(other, Observation::Dict(_)) => BTreeMap::from([
                (OBS_KEY.to_string(), other),
                (SWITCH_KEY.to_string(), Observation::Discrete(switch)),
            ]),
            other => return Err(unexpected(self.name(), &other)),
        };
        Ok(Observation::Dict(fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::Distribution;
    use crate::gridworld::GridWorldConfig;
    use crate::wrappers::WrappedEnv;

    fn env(true_goal: usize) -> GridWorldEnv {
        GridWorldEnv::new(GridWorldConfig {
            true_goal: Some(Distribution::Point(true_goal)),
            ..GridWorldConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn tags_true_goal() {
        let mut env = WrappedEnv::new(env(2)).wrap(AddSwitch::by_true_goal()).unwrap();
        let (obs, _) = env.reset().unwrap();
        assert!(env.observation_space().contains(&obs));
        assert_eq!(obs.get(SWITCH_KEY), Some(&Observation::Discrete(2)));
        assert_eq!(obs.get(OBS_KEY).and_then(Observation::shape), Some(&[2][..]));
        assert_eq!(
            env.observation_space().to_string(),
            "Dict(obs: Categorical([2], n=7), switch: Discrete(3))"
        );
    }

    /// Puts the observation under a `pos` field.
    struct Record;

    impl Wrapper for Record {
        fn name(&self) -> &str {
            "record"
        }

        fn bind(&mut self, input: &ObservationSpace, _env: &GridWorldEnv) -> Result<ObservationSpace, WrapperError> {
            Ok(ObservationSpace::Dict(BTreeMap::from([("pos".to_string(), input.clone())])))
        }

        fn observation(&self, obs: Observation, _env: &GridWorldEnv) -> Result<Observation, WrapperError> {
            Ok(Observation::Dict(BTreeMap::from([("pos".to_string(), obs)])))
        }
    }

    #[test]
    fn merges_into_existing_record() {
        let mut env = WrappedEnv::new(env(1))
            .wrap(Record)
            .unwrap()
            .wrap(AddSwitch::by_true_goal())
            .unwrap();
        let (obs, _) = env.reset().unwrap();
        assert!(env.observation_space().contains(&obs));
        let Observation::Dict(fields) = obs else {
            panic!("expected a record");
        };
        assert_eq!(fields.keys().collect::<Vec<_>>(), vec!["pos", "switch"]);
        assert_eq!(fields["switch"], Observation::Discrete(1));
    }

    #[test]
    fn second_switch_is_a_duplicate() {
        let result = WrappedEnv::new(env(0))
            .wrap(AddSwitch::by_true_goal())
            .unwrap()
            .wrap(AddSwitch::by_episode(2));
        assert_eq!(result.err(), Some(WrapperError::DuplicateKey("switch".into())));
    }

    #[test]
    fn episode_switch_cycles() {
        let mut env = WrappedEnv::new(env(0)).wrap(AddSwitch::by_episode(2)).unwrap();
        let switches: Vec<_> = (0..4)
            .map(|_| env.reset().unwrap().0.get(SWITCH_KEY).cloned())
            .collect();
        assert_eq!(
            switches,
            vec![
                Some(Observation::Discrete(0)),
                Some(Observation::Discrete(1)),
                Some(Observation::Discrete(0)),
                Some(Observation::Discrete(1)),
            ]
        );
    }

    #[test]
    fn out_of_range_switch_is_an_error() {
        let mut env = WrappedEnv::new(env(2)).wrap(AddSwitch::new(2, |env: &GridWorldEnv| env.true_goal_idx().unwrap_or(0)))
            .unwrap();
        let err = env.reset().unwrap_err();
        assert_eq!(
            err,
            crate::Error::Wrapper(WrapperError::SwitchOutOfRange {
                switch: 2,
                n_switches: 2
            })
        );
    }
}
