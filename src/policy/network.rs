//! Greedy policy on top of a [`PolicyValueNetwork`].

use ndarray::Array2;
use rand::Rng;

use super::trait_::Policy;
use crate::space::Observation;
use crate::switch::{Layer, Linear, NetworkInput, PolicyValueNetwork};

/// Picks the argmax of a linear action head applied to the policy latent.
pub struct NetworkPolicy {
    network: PolicyValueNetwork,
    action_head: Linear,
}

impl NetworkPolicy {
    /// Creates a policy with a freshly initialised action head.
    pub fn new<R: Rng + ?Sized>(network: PolicyValueNetwork, action_dim: usize, rng: &mut R) -> Self {
        let action_head = Linear::new(network.latent_dim_pi(), action_dim, rng);
        Self {
            network,
            action_head,
        }
    }

    /// Uses an existing action head.
    pub fn with_head(network: PolicyValueNetwork, action_head: Linear) -> Self {
        Self {
            network,
            action_head,
        }
    }

    /// Action scores for a batch of observations, `(batch, action_dim)`.
    pub fn logits(&self, observations: &[Observation]) -> crate::Result<Array2<f32>> {
        let input = NetworkInput::from_observations(observations)?;
        let latent = self.network.forward_actor(&input)?;
        Ok(self.action_head.forward(&latent)?)
    }

    pub fn network(&self) -> &PolicyValueNetwork {
        &self.network
    }

    pub fn action_head(&self) -> &Linear {
        &self.action_head
    }
}

impl Policy for NetworkPolicy {
    fn select_action(&mut self, obs: &Observation) -> crate::Result<usize> {
        let logits = self.logits(std::slice::from_ref(obs))?;
        let best = logits
            .row(0)
            .iter()
            .enumerate()
            .fold((0, f32::NEG_INFINITY), |best, (i, &v)| if v > best.1 { (i, v) } else { best });
        Ok(best.0)
    }

    fn name(&self) -> &str {
        "network"
    }
}
