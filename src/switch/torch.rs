//! Switched MLP on `tch` tensors (PyTorch bindings).
//!
//! Same routing as [`SwitchNetwork`](super::SwitchNetwork): every replica of
//! the switched layer runs on the whole batch and each example keeps the
//! output of its own replica. Only available with the `rl-nn` feature.

use tch::{nn, nn::Module, Device, Kind, Tensor};

use super::SwitchError;

/// MLP with a switched hidden layer.
///
/// Architecture: `obs_dim → hidden → [hidden → hidden] × n_switches → out_dim`
/// with tanh activations between linear layers.
pub struct TorchSwitchMlp {
    vs: nn::VarStore,
    pre: nn::Sequential,
    switched: Vec<nn::Linear>,
    post: nn::Sequential,
    hidden: i64,
}

impl TorchSwitchMlp {
    pub fn new(obs_dim: usize, hidden: usize, out_dim: usize, n_switches: usize, device: Device) -> Self {
        let vs = nn::VarStore::new(device);
        let p = &vs.root();
        let hidden = hidden as i64;
        let pre = nn::seq()
            .add(nn::linear(p / "pre", obs_dim as i64, hidden, Default::default()))
            .add_fn(|x| x.tanh());
        let switched = (0..n_switches)
            .map(|k| nn::linear(p / "switched" / k, hidden, hidden, Default::default()))
            .collect();
        let post = nn::seq()
            .add_fn(|x| x.tanh())
            .add(nn::linear(p / "post", hidden, out_dim as i64, Default::default()));

        Self {
            vs,
            pre,
            switched,
            post,
            hidden,
        }
    }

    pub fn n_switches(&self) -> usize {
        self.switched.len()
    }

    /// Forward pass; `switch` holds one `Int64` replica index per example.
    pub fn forward(&self, obs: &Tensor, switch: &Tensor) -> Tensor {
        let h = self.pre.forward(obs);
        // (batch, n_switches, hidden)
        let all = Tensor::stack(&self.switched.iter().map(|l| l.forward(&h)).collect::<Vec<_>>(), 1);
        let index = switch
            .to_kind(Kind::Int64)
            .view([-1, 1, 1])
            .expand([-1, 1, self.hidden], false);
        let h = all.gather(1, &index, false).squeeze_dim(1);
        self.post.forward(&h)
    }

    /// Forward pass with every example routed through replica `switch`.
    pub fn forward_fixed(&self, obs: &Tensor, switch: usize) -> Result<Tensor, SwitchError> {
        let layer = self.switched.get(switch).ok_or(SwitchError::SwitchOutOfRange {
            switch,
            n_switches: self.switched.len(),
        })?;
        let h = self.pre.forward(obs);
        Ok(self.post.forward(&layer.forward(&h)))
    }

    pub fn var_store_mut(&mut self) -> &mut nn::VarStore {
        &mut self.vs
    }

    pub fn var_store(&self) -> &nn::VarStore {
        &self.vs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn routing_matches_fixed_replicas() {
        tch::manual_seed(0);
        let net = TorchSwitchMlp::new(4, 8, 2, 3, Device::Cpu);
        let obs = Tensor::randn([6, 4], (Kind::Float, Device::Cpu));
        let switch = Tensor::from_slice(&[0i64, 1, 2, 2, 1, 0]);
        let routed = net.forward(&obs, &switch);

        for (i, k) in [0usize, 1, 2, 2, 1, 0].into_iter().enumerate() {
            let fixed = net.forward_fixed(&obs, k).unwrap();
            let diff = (routed.get(i as i64) - fixed.get(i as i64)).abs().max();
            assert!(diff.double_value(&[]) < 1e-6);
        }
    }

    #[test]
    fn fixed_switch_out_of_range_is_an_error() {
        let net = TorchSwitchMlp::new(4, 8, 2, 3, Device::Cpu);
        let obs = Tensor::zeros([1, 4], (Kind::Float, Device::Cpu));
        assert_eq!(
            net.forward_fixed(&obs, 3).err(),
            Some(SwitchError::SwitchOutOfRange { switch: 3, n_switches: 3 })
        );
    }
}
