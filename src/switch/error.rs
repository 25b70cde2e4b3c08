use thiserror::Error;

/// Errors raised while building or evaluating switch networks.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SwitchError {
    #[error("A switch network needs at least one switch value")]
    ZeroSwitches,

    #[error("Switched layer index {index} out of range for {n_layers} layers")]
    InvalidLayerIndex { index: usize, n_layers: usize },

    #[error("Layer {0} is listed as switched more than once")]
    DuplicateLayerIndex(usize),

    #[error("No switch indices given and the input carries none")]
    MissingSwitch,

    #[error("Batch has {batch} examples but {switches} switch indices were given")]
    BatchMismatch { batch: usize, switches: usize },

    #[error("Switch value {switch} out of range for {n_switches} switches")]
    SwitchOutOfRange { switch: usize, n_switches: usize },

    #[error("{layer} expects {expected} input features, got {found}")]
    ShapeMismatch {
        layer: String,
        expected: usize,
        found: usize,
    },

    #[error("Invalid network input: {0}")]
    InvalidInput(String),

    #[error("Key fragment '{fragment}' matches several activations: {matches:?}")]
    AmbiguousKey {
        fragment: String,
        matches: Vec<String>,
    },

    #[error("No recorded activation matches '{0}'")]
    UnknownKey(String),
}
