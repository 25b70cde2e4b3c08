use super::trait_::Policy;
use crate::gridworld::EnvError;
use crate::space::Observation;

/// Replays a fixed action list, restarting from the top every episode.
///
/// Once the list is exhausted the last action is repeated.
#[derive(Debug, Clone)]
pub struct ScriptedPolicy {
    actions: Vec<usize>,
    cursor: usize,
}

impl ScriptedPolicy {
    pub fn new(actions: Vec<usize>) -> Self {
        Self { actions, cursor: 0 }
    }
}

impl Policy for ScriptedPolicy {
    fn select_action(&mut self, _obs: &Observation) -> crate::Result<usize> {
        let action = self
            .actions
            .get(self.cursor)
            .or(self.actions.last())
            .copied()
            .ok_or_else(|| EnvError::InvalidConfig("scripted policy has no actions".to_string()))?;
        self.cursor += 1;
        Ok(action)
    }

    fn reset(&mut self) {
        self.cursor = 0;
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replays_then_repeats_last() {
        let obs = Observation::Discrete(0);
        let mut policy = ScriptedPolicy::new(vec![2, 1]);
        let actions: Vec<_> = (0..4).map(|_| policy.select_action(&obs).unwrap()).collect();
        assert_eq!(actions, vec![2, 1, 1, 1]);

        policy.reset();
        assert_eq!(policy.select_action(&obs).unwrap(), 2);
    }

    #[test]
    fn empty_script_is_an_error() {
        let mut policy = ScriptedPolicy::new(vec![]);
        assert!(policy.select_action(&Observation::Discrete(0)).is_err());
    }
}
