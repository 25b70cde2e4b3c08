//! Dense layers evaluated on `(batch, features)` matrices.

use std::fmt;

use ndarray::{Array1, Array2, ArrayViewD, ArrayViewMutD};
use rand::Rng;

use super::error::SwitchError;

/// One stage of a feed-forward network.
pub trait Layer: fmt::Debug + Send + Sync {
    /// Maps a `(batch, in_features)` matrix to `(batch, out_features)`.
    fn forward(&self, x: &Array2<f32>) -> Result<Array2<f32>, SwitchError>;

    /// Type name used in activation keys, e.g. `"Linear"`.
    fn name(&self) -> &str;

    /// Deep copy with independent parameter storage.
    fn box_clone(&self) -> Box<dyn Layer>;

    fn parameters(&self) -> Vec<ArrayViewD<'_, f32>> {
        Vec::new()
    }

    fn parameters_mut(&mut self) -> Vec<ArrayViewMutD<'_, f32>> {
        Vec::new()
    }
}

impl Clone for Box<dyn Layer> {
    fn clone(&self) -> Self {
        self.box_clone()
    }
}

/// Fully connected layer computing `x · Wᵀ + b`.
#[derive(Debug, Clone, PartialEq)]
pub struct Linear {
    /// `(out_features, in_features)`
    pub weight: Array2<f32>,
    pub bias: Array1<f32>,
}

impl Linear {
    /// Initialises weights and bias uniformly in `±1/sqrt(in_features)`.
    pub fn new<R: Rng + ?Sized>(in_features: usize, out_features: usize, rng: &mut R) -> Self {
        let bound = 1.0 / (in_features.max(1) as f32).sqrt();
        Self {
            weight: Array2::from_shape_simple_fn((out_features, in_features), || {
                rng.gen_range(-bound..=bound)
            }),
            bias: Array1::from_shape_simple_fn(out_features, || rng.gen_range(-bound..=bound)),
        }
    }

    /// Builds a layer from explicit parameters.
    pub fn from_parts(weight: Array2<f32>, bias: Array1<f32>) -> Result<Self, SwitchError> {
        if weight.nrows() != bias.len() {
            return Err(SwitchError::ShapeMismatch {
                layer: "Linear bias".to_string(),
                expected: weight.nrows(),
                found: bias.len(),
            });
        }
        Ok(Self { weight, bias })
    }

    pub fn in_features(&self) -> usize {
        self.weight.ncols()
    }

    pub fn out_features(&self) -> usize {
        self.weight.nrows()
    }
}

impl Layer for Linear {
    fn forward(&self, x: &Array2<f32>) -> Result<Array2<f32>, SwitchError> {
        if x.ncols() != self.in_features() {
            return Err(SwitchError::ShapeMismatch {
                layer: self.name().to_string(),
                expected: self.in_features(),
                found: x.ncols(),
            });
        }
        Ok(x.dot(&self.weight.t()) + &self.bias)
    }

    fn name(&self) -> &str {
        "Linear"
    }

    fn box_clone(&self) -> Box<dyn Layer> {
        Box::new(self.clone())
    }

    fn parameters(&self) -> Vec<ArrayViewD<'_, f32>> {
        vec![self.weight.view().into_dyn(), self.bias.view().into_dyn()]
    }

    fn parameters_mut(&mut self) -> Vec<ArrayViewMutD<'_, f32>> {
        vec![self.weight.view_mut().into_dyn(), self.bias.view_mut().into_dyn()]
    }
}

/// Element-wise non-linearity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Activation {
    #[default]
    Tanh,
    Relu,
    Identity,
}

impl Layer for Activation {
    fn forward(&self, x: &Array2<f32>) -> Result<Array2<f32>, SwitchError> {
        Ok(match self {
            Activation::Tanh => x.mapv(f32::tanh),
            Activation::Relu => x.mapv(|v| v.max(0.0)),
            Activation::Identity => x.clone(),
        })
    }

    fn name(&self) -> &str {
        match self {
            Activation::Tanh => "Tanh",
            Activation::Relu => "ReLU",
            Activation::Identity => "Identity",
        }
    }

    fn box_clone(&self) -> Box<dyn Layer> {
        Box::new(*self)
    }
}

/// Layers applied one after the other.
#[derive(Debug, Clone, Default)]
pub struct Sequential {
    layers: Vec<Box<dyn Layer>>,
}

impl Sequential {
    pub fn new(layers: Vec<Box<dyn Layer>>) -> Self {
        Self { layers }
    }

    pub fn push<L: Layer + 'static>(&mut self, layer: L) {
        self.layers.push(Box::new(layer));
    }

    pub fn layers(&self) -> &[Box<dyn Layer>] {
        &self.layers
    }

    pub fn layers_mut(&mut self) -> &mut [Box<dyn Layer>] {
        &mut self.layers
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }
}

impl Layer for Sequential {
    fn forward(&self, x: &Array2<f32>) -> Result<Array2<f32>, SwitchError> {
        self.layers
            .iter()
            .try_fold(x.clone(), |x, layer| layer.forward(&x))
    }

    fn name(&self) -> &str {
        "Sequential"
    }

    fn box_clone(&self) -> Box<dyn Layer> {
        Box::new(self.clone())
    }

    fn parameters(&self) -> Vec<ArrayViewD<'_, f32>> {
        self.layers.iter().flat_map(|l| l.parameters()).collect()
    }

    fn parameters_mut(&mut self) -> Vec<ArrayViewMutD<'_, f32>> {
        self.layers.iter_mut().flat_map(|l| l.parameters_mut()).collect()
    }
}

/// Multi-layer perceptron over `dims` (input first, output last) with an
/// activation between consecutive linear layers.
///
/// `act_before` adds an activation in front of the first linear layer and
/// `act_after` one after the last. Fewer than two dims yield an empty network.
pub fn mlp<R: Rng + ?Sized>(
    dims: &[usize],
    activation: Activation,
    act_before: bool,
    act_after: bool,
    rng: &mut R,
) -> Sequential {
    let mut net = Sequential::default();
    if dims.len() < 2 {
        return net;
    }
    if act_before {
        net.push(activation);
    }
    for (i, pair) in dims.windows(2).enumerate() {
        net.push(Linear::new(pair[0], pair[1], rng));
        if i + 2 < dims.len() || act_after {
            net.push(activation);
        }
    }
    net
}
