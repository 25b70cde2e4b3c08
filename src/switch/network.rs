//! Networks whose designated layers are replicated per switch value.

use std::collections::HashSet;

use ndarray::Array2;

use super::error::SwitchError;
use super::layer::{Layer, Sequential};
use super::record::ActivationCache;
use crate::space::Observation;
use crate::wrappers::switch_tag::{OBS_KEY, SWITCH_KEY};

/// A batch ready for a network forward pass.
#[derive(Debug, Clone, PartialEq)]
pub enum NetworkInput {
    /// Plain `(batch, features)` matrix.
    Features(Array2<f32>),
    /// Features together with one switch value per example.
    Tagged { obs: Array2<f32>, switch: Vec<usize> },
}

impl NetworkInput {
    /// Batches pipeline observations.
    ///
    /// Records carrying `obs` and `switch` fields become [`NetworkInput::Tagged`];
    /// any other array observation is flattened into a feature row.
    pub fn from_observations(observations: &[Observation]) -> Result<Self, SwitchError> {
        let Some(first) = observations.first() else {
            return Err(SwitchError::InvalidInput("empty batch".to_string()));
        };
        let tagged = matches!(first, Observation::Dict(_));

        let mut rows = Vec::with_capacity(observations.len());
        let mut switch = Vec::new();
        for obs in observations {
            let features = match (tagged, obs) {
                (true, Observation::Dict(fields)) => {
                    match fields.get(SWITCH_KEY) {
                        Some(Observation::Discrete(s)) => switch.push(*s),
                        _ => return Err(SwitchError::MissingSwitch),
                    }
                    fields.get(OBS_KEY).and_then(Observation::to_features)
                }
                (false, other) => other.to_features(),
                _ => None,
            };
            let features = features.ok_or_else(|| {
                SwitchError::InvalidInput("observation cannot be flattened into features".to_string())
            })?;
            rows.push(features);
        }

        let width = rows[0].len();
        if let Some(row) = rows.iter().find(|r| r.len() != width) {
            return Err(SwitchError::ShapeMismatch {
                layer: "input batch".to_string(),
                expected: width,
                found: row.len(),
            });
        }
        let flat: Vec<f32> = rows.into_iter().flatten().collect();
        let obs = Array2::from_shape_vec((observations.len(), width), flat)
            .map_err(|e| SwitchError::InvalidInput(e.to_string()))?;

        Ok(if tagged {
            NetworkInput::Tagged { obs, switch }
        } else {
            NetworkInput::Features(obs)
        })
    }

    pub fn features(&self) -> &Array2<f32> {
        match self {
            NetworkInput::Features(x) => x,
            NetworkInput::Tagged { obs, .. } => obs,
        }
    }

    pub fn switch(&self) -> Option<&[usize]> {
        match self {
            NetworkInput::Features(_) => None,
            NetworkInput::Tagged { switch, .. } => Some(switch),
        }
    }
}

impl From<Array2<f32>> for NetworkInput {
    fn from(x: Array2<f32>) -> Self {
        NetworkInput::Features(x)
    }
}

/// Anything that maps a batch to a `(batch, out_features)` matrix.
pub trait Network: Send + Sync {
    fn forward_batch(&self, input: &NetworkInput) -> Result<Array2<f32>, SwitchError>;
}

impl Network for Sequential {
    /// Switch values, if any, are ignored.
    fn forward_batch(&self, input: &NetworkInput) -> Result<Array2<f32>, SwitchError> {
        self.forward(input.features())
    }
}

/// `n_switches` independent copies of one layer.
#[derive(Debug, Clone)]
pub struct SwitchedLayer {
    replicas: Vec<Box<dyn Layer>>,
}

impl SwitchedLayer {
    /// Deep-copies `layer` once per switch value.
    pub fn new(layer: &dyn Layer, n_switches: usize) -> Self {
        Self {
            replicas: (0..n_switches).map(|_| layer.box_clone()).collect(),
        }
    }

    pub fn n_switches(&self) -> usize {
        self.replicas.len()
    }

    pub fn replica(&self, switch: usize) -> Option<&dyn Layer> {
        self.replicas.get(switch).map(|l| l.as_ref())
    }

    pub fn replica_mut(&mut self, switch: usize) -> Option<&mut Box<dyn Layer>> {
        self.replicas.get_mut(switch)
    }

    /// Runs every replica on the whole batch, then takes row `i` from the
    /// replica selected by `switch[i]`.
    ///
    /// `switch` must already be validated against the batch.
    pub fn forward(&self, x: &Array2<f32>, switch: &[usize]) -> Result<Array2<f32>, SwitchError> {
        let outputs = self
            .replicas
            .iter()
            .map(|r| r.forward(x))
            .collect::<Result<Vec<_>, _>>()?;
        let Some(first) = outputs.first() else {
            return Err(SwitchError::ZeroSwitches);
        };

        let mut out = Array2::zeros(first.raw_dim());
        for (i, &s) in switch.iter().enumerate() {
            out.row_mut(i).assign(&outputs[s].row(i));
        }
        Ok(out)
    }
}

#[derive(Debug, Clone)]
enum Stage {
    Shared(Box<dyn Layer>),
    Switched(SwitchedLayer),
}

impl Stage {
    fn name(&self) -> &str {
        match self {
            Stage::Shared(layer) => layer.name(),
            Stage::Switched(_) => "SwitchedLayer",
        }
    }
}

/// An ordered stack of layers where the layers at the `switched` indices are
/// replicated `n_switches` times and selected per example.
#[derive(Debug, Clone)]
pub struct SwitchNetwork {
    stages: Vec<Stage>,
    n_switches: usize,
}

impl SwitchNetwork {
    pub fn new(
        layers: Vec<Box<dyn Layer>>,
        switched: &[usize],
        n_switches: usize,
    ) -> Result<Self, SwitchError> {
        if n_switches == 0 {
            return Err(SwitchError::ZeroSwitches);
        }
        let mut seen = HashSet::new();
        for &index in switched {
            if index >= layers.len() {
                return Err(SwitchError::InvalidLayerIndex {
                    index,
                    n_layers: layers.len(),
                });
            }
            if !seen.insert(index) {
                return Err(SwitchError::DuplicateLayerIndex(index));
            }
        }

        let stages = layers
            .into_iter()
            .enumerate()
            .map(|(i, layer)| {
                if seen.contains(&i) {
                    Stage::Switched(SwitchedLayer::new(layer.as_ref(), n_switches))
                } else {
                    Stage::Shared(layer)
                }
            })
            .collect();
        Ok(Self { stages, n_switches })
    }

    /// Convenience constructor from a [`Sequential`].
    pub fn from_sequential(net: Sequential, switched: &[usize], n_switches: usize) -> Result<Self, SwitchError> {
        Self::new(net.layers().to_vec(), switched, n_switches)
    }

    pub fn n_switches(&self) -> usize {
        self.n_switches
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Indices of the switched layers, ascending.
    pub fn switched_indices(&self) -> Vec<usize> {
        self.stages
            .iter()
            .enumerate()
            .filter(|(_, s)| matches!(s, Stage::Switched(_)))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn switched_layer(&self, index: usize) -> Option<&SwitchedLayer> {
        match self.stages.get(index) {
            Some(Stage::Switched(layer)) => Some(layer),
            _ => None,
        }
    }

    pub fn switched_layer_mut(&mut self, index: usize) -> Option<&mut SwitchedLayer> {
        match self.stages.get_mut(index) {
            Some(Stage::Switched(layer)) => Some(layer),
            _ => None,
        }
    }

    /// Forward pass. Explicit `switch` indices take precedence over those
    /// carried by a [`NetworkInput::Tagged`] input.
    pub fn forward(&self, input: &NetworkInput, switch: Option<&[usize]>) -> Result<Array2<f32>, SwitchError> {
        let (x, switch) = self.resolve(input, switch)?;
        self.run(x, switch, None)
    }

    /// Like [`SwitchNetwork::forward`], also storing each stage's output in
    /// `cache` under `"{index} {layer}"`.
    pub fn forward_recorded(
        &self,
        input: &NetworkInput,
        switch: Option<&[usize]>,
        cache: &mut ActivationCache,
    ) -> Result<Array2<f32>, SwitchError> {
        let (x, switch) = self.resolve(input, switch)?;
        self.run(x, switch, Some(cache))
    }

    fn resolve<'a>(
        &self,
        input: &'a NetworkInput,
        switch: Option<&'a [usize]>,
    ) -> Result<(&'a Array2<f32>, &'a [usize]), SwitchError> {
        let x = input.features();
        let switch = switch.or(input.switch()).ok_or(SwitchError::MissingSwitch)?;
        if switch.len() != x.nrows() {
            return Err(SwitchError::BatchMismatch {
                batch: x.nrows(),
                switches: switch.len(),
            });
        }
        if let Some(&bad) = switch.iter().find(|&&s| s >= self.n_switches) {
            return Err(SwitchError::SwitchOutOfRange {
                switch: bad,
                n_switches: self.n_switches,
            });
        }
        Ok((x, switch))
    }

    fn run(
        &self,
        x: &Array2<f32>,
        switch: &[usize],
        mut cache: Option<&mut ActivationCache>,
    ) -> Result<Array2<f32>, SwitchError> {
        let mut x = x.clone();
        for (i, stage) in self.stages.iter().enumerate() {
            x = match stage {
                Stage::Shared(layer) => layer.forward(&x)?,
                Stage::Switched(layer) => layer.forward(&x, switch)?,
            };
            if let Some(cache) = cache.as_deref_mut() {
                cache.record(format!("{i} {}", stage.name()), &x)?;
            }
        }
        Ok(x)
    }

    /// Plain network with every switched layer fixed to replica `switch`.
    /// Layers are deep-copied.
    pub fn extract_network(&self, switch: usize) -> Result<Sequential, SwitchError> {
        if switch >= self.n_switches {
            return Err(SwitchError::SwitchOutOfRange {
                switch,
                n_switches: self.n_switches,
            });
        }
        let layers = self
            .stages
            .iter()
            .map(|stage| match stage {
                Stage::Shared(layer) => Ok(layer.clone()),
                Stage::Switched(layer) => layer
                    .replica(switch)
                    .map(|r| r.box_clone())
                    .ok_or(SwitchError::SwitchOutOfRange {
                        switch,
                        n_switches: layer.n_switches(),
                    }),
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Sequential::new(layers))
    }

    /// One extracted network per switch value.
    pub fn extract_all_networks(&self) -> Result<Vec<Sequential>, SwitchError> {
        (0..self.n_switches).map(|k| self.extract_network(k)).collect()
    }
}

impl Network for SwitchNetwork {
    fn forward_batch(&self, input: &NetworkInput) -> Result<Array2<f32>, SwitchError> {
        self.forward(input, None)
    }
}
