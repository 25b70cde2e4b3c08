use ndarray::Array2;
use rand::Rng;

use super::error::SwitchError;
use super::network::{Network, NetworkInput};
use crate::space::ObservationSpace;

/// A policy network and an optional value network over the same input.
///
/// Without a value network both latents come from the policy network.
pub struct PolicyValueNetwork {
    policy_net: Box<dyn Network>,
    value_net: Option<Box<dyn Network>>,
    latent_dim_pi: usize,
    latent_dim_vf: usize,
}

impl PolicyValueNetwork {
    /// Wraps the two networks and discovers their output widths with a
    /// forward pass on one observation sampled from `space`.
    pub fn new<R: Rng + ?Sized>(
        space: &ObservationSpace,
        policy_net: Box<dyn Network>,
        value_net: Option<Box<dyn Network>>,
        rng: &mut R,
    ) -> Result<Self, SwitchError> {
        let mut net = Self {
            policy_net,
            value_net,
            latent_dim_pi: 0,
            latent_dim_vf: 0,
        };
        let sample = NetworkInput::from_observations(&[space.sample(rng)])?;
        let (pi, vf) = net.forward(&sample)?;
        net.latent_dim_pi = pi.ncols();
        net.latent_dim_vf = vf.ncols();
        log::info!(
            "policy/value latents for {space}: pi {}, vf {}",
            net.latent_dim_pi,
            net.latent_dim_vf
        );
        Ok(net)
    }

    /// Returns `(latent_pi, latent_vf)`.
    pub fn forward(&self, input: &NetworkInput) -> Result<(Array2<f32>, Array2<f32>), SwitchError> {
        let pi = self.forward_actor(input)?;
        let vf = match &self.value_net {
            Some(net) => net.forward_batch(input)?,
            None => pi.clone(),
        };
        Ok((pi, vf))
    }

    pub fn forward_actor(&self, input: &NetworkInput) -> Result<Array2<f32>, SwitchError> {
        self.policy_net.forward_batch(input)
    }

    pub fn forward_critic(&self, input: &NetworkInput) -> Result<Array2<f32>, SwitchError> {
        match &self.value_net {
            Some(net) => net.forward_batch(input),
            None => self.forward_actor(input),
        }
    }

    pub fn latent_dim_pi(&self) -> usize {
        self.latent_dim_pi
    }

    pub fn latent_dim_vf(&self) -> usize {
        self.latent_dim_vf
    }

    pub fn has_value_net(&self) -> bool {
        self.value_net.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::switch::{mlp, Activation, SwitchNetwork};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use std::collections::BTreeMap;

    fn tagged_space() -> ObservationSpace {
        ObservationSpace::Dict(BTreeMap::from([
            ("obs".to_string(), ObservationSpace::continuous(&[5], 0.0, 1.0)),
            ("switch".to_string(), ObservationSpace::Discrete { n: 2 }),
        ]))
    }

    #[test]
    fn discovers_latent_dims() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let policy = SwitchNetwork::from_sequential(
            mlp(&[5, 16, 8], Activation::Tanh, false, true, &mut rng),
            &[0],
            2,
        )
        .unwrap();
        let value = mlp(&[5, 4], Activation::Relu, false, false, &mut rng);
        let net = PolicyValueNetwork::new(&tagged_space(), Box::new(policy), Some(Box::new(value)), &mut rng).unwrap();
        assert_eq!((net.latent_dim_pi(), net.latent_dim_vf()), (8, 4));
        assert!(net.has_value_net());
    }

    #[test]
    fn shared_latents_without_value_net() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let policy = mlp(&[3, 6], Activation::Tanh, false, true, &mut rng);
        let space = ObservationSpace::continuous(&[3], -1.0, 1.0);
        let net = PolicyValueNetwork::new(&space, Box::new(policy), None, &mut rng).unwrap();
        assert_eq!(net.latent_dim_vf(), 6);

        let input = NetworkInput::Features(Array2::from_elem((2, 3), 0.5));
        let (pi, vf) = net.forward(&input).unwrap();
        assert_eq!(pi, vf);
        assert_eq!(net.forward_critic(&input).unwrap(), pi);
    }

    #[test]
    fn untagged_sample_fails_for_switch_network() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let policy = SwitchNetwork::from_sequential(mlp(&[3, 2], Activation::Tanh, false, false, &mut rng), &[0], 2)
            .unwrap();
        let space = ObservationSpace::continuous(&[3], 0.0, 1.0);
        let result = PolicyValueNetwork::new(&space, Box::new(policy), None, &mut rng);
        assert_eq!(result.err(), Some(SwitchError::MissingSwitch));
    }
}
