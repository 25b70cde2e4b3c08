use std::collections::BTreeMap;
use std::fmt;

use ndarray::{concatenate, Array2, Axis};

use super::error::SwitchError;

/// Stage outputs captured by `forward_recorded`, keyed `"{index} {layer}"`.
///
/// Repeated forward passes append along the batch axis. Lookups are exact;
/// [`ActivationCache::find`] resolves a key fragment only when it is unique.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActivationCache {
    activations: BTreeMap<String, Array2<f32>>,
}

impl ActivationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, key: String, output: &Array2<f32>) -> Result<(), SwitchError> {
        match self.activations.get_mut(&key) {
            None => {
                self.activations.insert(key, output.clone());
            }
            Some(existing) => {
                if existing.ncols() != output.ncols() {
                    return Err(SwitchError::ShapeMismatch {
                        layer: key,
                        expected: existing.ncols(),
                        found: output.ncols(),
                    });
                }
                let joined = concatenate(Axis(0), &[existing.view(), output.view()])
                    .map_err(|e| SwitchError::InvalidInput(e.to_string()))?;
                *existing = joined;
            }
        }
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&Array2<f32>> {
        self.activations.get(key)
    }

    /// Keys containing `fragment`, in sorted order.
    pub fn matching_keys(&self, fragment: &str) -> Vec<&str> {
        self.activations
            .keys()
            .filter(|k| k.contains(fragment))
            .map(String::as_str)
            .collect()
    }

    /// Exact key if present, otherwise the single key containing `fragment`.
    pub fn find(&self, fragment: &str) -> Result<&Array2<f32>, SwitchError> {
        if let Some(found) = self.activations.get(fragment) {
            return Ok(found);
        }
        match self.matching_keys(fragment).as_slice() {
            [] => Err(SwitchError::UnknownKey(fragment.to_string())),
            [key] => Ok(&self.activations[*key]),
            matches => Err(SwitchError::AmbiguousKey {
                fragment: fragment.to_string(),
                matches: matches.iter().map(|k| k.to_string()).collect(),
            }),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.activations.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.activations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.activations.is_empty()
    }

    pub fn clear(&mut self) {
        self.activations.clear();
    }
}

impl fmt::Display for ActivationCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cached activations:")?;
        for (name, activation) in &self.activations {
            write!(f, "\n- {name}: {:?}", activation.shape())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cache() -> ActivationCache {
        let mut cache = ActivationCache::new();
        cache.record("0 Linear".into(), &Array2::zeros((2, 4))).unwrap();
        cache.record("1 Tanh".into(), &Array2::zeros((2, 4))).unwrap();
        cache.record("2 Linear".into(), &Array2::zeros((2, 3))).unwrap();
        cache
    }

    #[test]
    fn exact_and_unique_lookup() {
        let cache = cache();
        assert_eq!(cache.get("2 Linear").map(|a| a.dim()), Some((2, 3)));
        assert_eq!(cache.find("Tanh").map(|a| a.dim()), Ok((2, 4)));
        assert_eq!(cache.get("Tanh"), None);
    }

    #[test]
    fn ambiguous_fragment_reports_matches() {
        let cache = cache();
        assert_eq!(cache.matching_keys("Linear"), vec!["0 Linear", "2 Linear"]);
        assert_eq!(
            cache.find("Linear"),
            Err(SwitchError::AmbiguousKey {
                fragment: "Linear".into(),
                matches: vec!["0 Linear".into(), "2 Linear".into()],
            })
        );
        assert_eq!(cache.find("ReLU"), Err(SwitchError::UnknownKey("ReLU".into())));
    }

    #[test]
    fn repeated_records_append_rows() {
        let mut cache = cache();
        cache.record("0 Linear".into(), &Array2::ones((3, 4))).unwrap();
        assert_eq!(cache.get("0 Linear").map(|a| a.dim()), Some((5, 4)));
        assert!(cache.record("0 Linear".into(), &Array2::ones((1, 2))).is_err());
    }

    #[test]
    fn display_lists_shapes() {
        let text = cache().to_string();
        assert!(text.starts_with("Cached activations:"));
        assert!(text.contains("- 2 Linear: [2, 3]"));
    }
}
