//! Observation values and the spaces that describe them.
//!
//! Spaces form a closed set of variants. Transforms inspect the variant once,
//! when they are bound into a pipeline, and never at every step.

use std::collections::BTreeMap;
use std::fmt;

use ndarray::{ArrayD, IxDyn};
use rand::Rng;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single observation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Observation {
    /// Integer categories, e.g. a grid of palette indices or a position.
    Categorical(ArrayD<i64>),
    /// Binary indicators.
    Binary(ArrayD<bool>),
    /// Real-valued image or vector.
    Continuous(ArrayD<f32>),
    /// A single integer, e.g. a switch index.
    Discrete(usize),
    /// Structured record, e.g. `{obs, switch}`.
    Dict(BTreeMap<String, Observation>),
}

impl Observation {
    /// Shape of array observations; `None` for scalars and records.
    pub fn shape(&self) -> Option<&[usize]> {
        match self {
            Observation::Categorical(a) => Some(a.shape()),
            Observation::Binary(a) => Some(a.shape()),
            Observation::Continuous(a) => Some(a.shape()),
            Observation::Discrete(_) | Observation::Dict(_) => None,
        }
    }

    /// Looks up a field of a record observation.
    pub fn get(&self, key: &str) -> Option<&Observation> {
        match self {
            Observation::Dict(fields) => fields.get(key),
            _ => None,
        }
    }

    /// Flattens the observation to `f32` features in row-major order.
    ///
    /// Records have no flat representation and return `None`.
    pub fn to_features(&self) -> Option<Vec<f32>> {
        match self {
            Observation::Categorical(a) => Some(a.iter().map(|&v| v as f32).collect()),
            Observation::Binary(a) => Some(a.iter().map(|&v| if v { 1.0 } else { 0.0 }).collect()),
            Observation::Continuous(a) => Some(a.iter().copied().collect()),
            Observation::Discrete(v) => Some(vec![*v as f32]),
            Observation::Dict(_) => None,
        }
    }
}

/// Describes the set of observations a stage can produce.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ObservationSpace {
    /// Integer arrays with entries in `0..n`.
    Categorical { shape: Vec<usize>, n: usize },
    /// Boolean arrays.
    MultiBinary { shape: Vec<usize> },
    /// Real arrays bounded element-wise by `low` and `high`.
    Continuous { low: ArrayD<f32>, high: ArrayD<f32> },
    /// A single integer in `0..n`.
    Discrete { n: usize },
    /// Named sub-spaces.
    Dict(BTreeMap<String, ObservationSpace>),
}

impl ObservationSpace {
    /// Continuous space of the given shape with uniform bounds.
    pub fn continuous(shape: &[usize], low: f32, high: f32) -> Self {
        ObservationSpace::Continuous {
            low: ArrayD::from_elem(IxDyn(shape), low),
            high: ArrayD::from_elem(IxDyn(shape), high),
        }
    }

    /// Array shape; `None` for scalars and records.
    pub fn shape(&self) -> Option<&[usize]> {
        match self {
            ObservationSpace::Categorical { shape, .. } => Some(shape),
            ObservationSpace::MultiBinary { shape } => Some(shape),
            ObservationSpace::Continuous { low, .. } => Some(low.shape()),
            ObservationSpace::Discrete { .. } | ObservationSpace::Dict(_) => None,
        }
    }

    /// Number of scalar features once flattened; `None` for records.
    pub fn flat_dim(&self) -> Option<usize> {
        match self {
            ObservationSpace::Discrete { .. } => Some(1),
            ObservationSpace::Dict(_) => None,
            _ => self.shape().map(|s| s.iter().product()),
        }
    }

    /// Short variant name used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            ObservationSpace::Categorical { .. } => "categorical",
            ObservationSpace::MultiBinary { .. } => "multi-binary",
            ObservationSpace::Continuous { .. } => "continuous",
            ObservationSpace::Discrete { .. } => "discrete",
            ObservationSpace::Dict(_) => "dict",
        }
    }

    /// Draws a random member of the space.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Observation {
        match self {
            ObservationSpace::Categorical { shape, n } => {
                let n = (*n).max(1) as i64;
                Observation::Categorical(ArrayD::from_shape_simple_fn(IxDyn(shape), || {
                    rng.gen_range(0..n)
                }))
            }
            ObservationSpace::MultiBinary { shape } => Observation::Binary(
                ArrayD::from_shape_simple_fn(IxDyn(shape), || rng.gen_bool(0.5)),
            ),
            ObservationSpace::Continuous { low, high } => {
                let mut out = low.clone();
                out.zip_mut_with(high, |l, &h| {
                    let u: f32 = rng.gen();
                    *l += (h - *l) * u;
                });
                Observation::Continuous(out)
            }
            ObservationSpace::Discrete { n } => Observation::Discrete(rng.gen_range(0..(*n).max(1))),
            ObservationSpace::Dict(spaces) => Observation::Dict(
                spaces
                    .iter()
                    .map(|(k, s)| (k.clone(), s.sample(rng)))
                    .collect(),
            ),
        }
    }

    /// Returns true if `obs` is a member of the space.
    pub fn contains(&self, obs: &Observation) -> bool {
        match (self, obs) {
            (ObservationSpace::Categorical { shape, n }, Observation::Categorical(a)) => {
                a.shape() == shape.as_slice() && a.iter().all(|&v| v >= 0 && (v as usize) < *n)
            }
            (ObservationSpace::MultiBinary { shape }, Observation::Binary(a)) => {
                a.shape() == shape.as_slice()
            }
            (ObservationSpace::Continuous { low, high }, Observation::Continuous(a)) => {
                a.shape() == low.shape()
                    && a.iter()
                        .zip(low.iter().zip(high.iter()))
                        .all(|(&v, (&l, &h))| v >= l && v <= h)
            }
            (ObservationSpace::Discrete { n }, Observation::Discrete(v)) => v < n,
            (ObservationSpace::Dict(spaces), Observation::Dict(fields)) => {
                spaces.len() == fields.len()
                    && spaces
                        .iter()
                        .all(|(k, s)| fields.get(k).is_some_and(|o| s.contains(o)))
            }
            _ => false,
        }
    }
}

impl fmt::Display for ObservationSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObservationSpace::Categorical { shape, n } => write!(f, "Categorical({shape:?}, n={n})"),
            ObservationSpace::MultiBinary { shape } => write!(f, "MultiBinary({shape:?})"),
            ObservationSpace::Continuous { low, .. } => write!(f, "Continuous({:?})", low.shape()),
            ObservationSpace::Discrete { n } => write!(f, "Discrete({n})"),
            ObservationSpace::Dict(spaces) => {
                write!(f, "Dict(")?;
                for (i, (k, s)) in spaces.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {s}")?;
                }
                write!(f, ")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn samples_are_members() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let spaces = vec![
            ObservationSpace::Categorical { shape: vec![4, 5], n: 6 },
            ObservationSpace::MultiBinary { shape: vec![2, 3, 4] },
            ObservationSpace::continuous(&[3, 3, 3], 0.0, 1.0),
            ObservationSpace::Discrete { n: 3 },
            ObservationSpace::Dict(BTreeMap::from([
                ("obs".to_string(), ObservationSpace::MultiBinary { shape: vec![7] }),
                ("switch".to_string(), ObservationSpace::Discrete { n: 2 }),
            ])),
        ];
        for space in spaces {
            for _ in 0..10 {
                let obs = space.sample(&mut rng);
                assert!(space.contains(&obs), "{space} does not contain {obs:?}");
            }
        }
    }

    #[test]
    fn flat_dim_is_product_of_shape() {
        let space = ObservationSpace::Categorical { shape: vec![7, 7], n: 6 };
        assert_eq!(space.flat_dim(), Some(49));
        assert_eq!(ObservationSpace::Discrete { n: 4 }.flat_dim(), Some(1));
    }

    #[test]
    fn binary_features_are_zero_one() {
        let obs = Observation::Binary(ArrayD::from_shape_vec(IxDyn(&[3]), vec![true, false, true]).unwrap());
        assert_eq!(obs.to_features(), Some(vec![1.0, 0.0, 1.0]));
    }

    #[test]
    fn records_have_no_flat_features() {
        let obs = Observation::Dict(BTreeMap::from([("switch".to_string(), Observation::Discrete(1))]));
        assert!(obs.to_features().is_none());
        assert_eq!(obs.get("switch"), Some(&Observation::Discrete(1)));
    }
}
