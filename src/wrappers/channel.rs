use ndarray::{ArrayD, Axis};

use super::{incompatible, unexpected, Wrapper, WrapperError};
use crate::gridworld::GridWorldEnv;
use crate::space::{Observation, ObservationSpace};

/// Multiplies each channel of a `(width, height, channels)` image by a fixed
/// weight. A disabled stage passes observations through unchanged.
#[derive(Debug, Clone)]
pub struct WeightedChannel {
    pub weights: Vec<f32>,
    pub disabled: bool,
}

impl WeightedChannel {
    pub fn new(weights: Vec<f32>) -> Self {
        Self {
            weights,
            disabled: false,
        }
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    fn scale(&self, mut values: ArrayD<f32>) -> ArrayD<f32> {
        for (mut channel, &w) in values.axis_iter_mut(Axis(2)).zip(&self.weights) {
            channel *= w;
        }
        values
    }
}

impl Wrapper for WeightedChannel {
    fn name(&self) -> &str {
        "weighted_channel"
    }

    fn bind(&mut self, input: &ObservationSpace, _env: &GridWorldEnv) -> Result<ObservationSpace, WrapperError> {
        let ObservationSpace::Continuous { low, high } = input else {
            return Err(incompatible(self.name(), "a continuous (width, height, channels) image", input));
        };
        if low.ndim() != 3 {
            return Err(incompatible(self.name(), "a continuous (width, height, channels) image", input));
        }
        let n_channels = low.shape()[2];
        if self.weights.len() != n_channels {
            return Err(WrapperError::ChannelMismatch {
                expected: n_channels,
                found: self.weights.len(),
            });
        }
        if self.disabled {
            return Ok(input.clone());
        }

        // A negative weight swaps the bounds.
        let a = self.scale(low.clone());
        let b = self.scale(high.clone());
        let low = ndarray::Zip::from(&a).and(&b).map_collect(|&x, &y| x.min(y));
        let high = ndarray::Zip::from(&a).and(&b).map_collect(|&x, &y| x.max(y));
        Ok(ObservationSpace::Continuous { low, high })
    }

    fn observation(&self, obs: Observation, _env: &GridWorldEnv) -> Result<Observation, WrapperError> {
        match obs {
            Observation::Continuous(values) if values.ndim() == 3 => {
                if self.disabled {
                    Ok(Observation::Continuous(values))
                } else {
                    Ok(Observation::Continuous(self.scale(values)))
                }
            }
            other => Err(unexpected(self.name(), &other)),
        }
    }
}
