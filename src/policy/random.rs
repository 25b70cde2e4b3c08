//! Random policy for testing and baselines.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::trait_::Policy;
use crate::space::Observation;

/// Uniformly random action selection from `[0, action_dim)`.
///
/// Seeded, so rollouts of a seeded environment are reproducible.
pub struct RandomPolicy {
    action_dim: usize,
    rng: ChaCha8Rng,
}

impl RandomPolicy {
    /// Creates a new random policy.
    ///
    /// # Arguments
    ///
    /// * `action_dim` - Number of possible actions (4 for the gridworld).
    /// * `seed` - Seed of the policy's own random source.
    pub fn new(action_dim: usize, seed: u64) -> Self {
        Self {
            action_dim: action_dim.max(1),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl Policy for RandomPolicy {
    fn select_action(&mut self, _obs: &Observation) -> crate::Result<usize> {
        Ok(self.rng.gen_range(0..self.action_dim))
    }

    fn name(&self) -> &str {
        "random"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_policy_actions_in_range() {
        let mut policy = RandomPolicy::new(4, 0);
        let obs = Observation::Discrete(0);
        for _ in 0..100 {
            assert!(policy.select_action(&obs).unwrap() < 4);
        }
    }

    #[test]
    fn random_policy_is_seeded() {
        let obs = Observation::Discrete(0);
        let mut a = RandomPolicy::new(4, 9);
        let mut b = RandomPolicy::new(4, 9);
        for _ in 0..20 {
            assert_eq!(a.select_action(&obs).unwrap(), b.select_action(&obs).unwrap());
        }
    }
}
