use thiserror::Error;

/// Errors raised while building or running an observation pipeline.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WrapperError {
    #[error("{stage} expected {expected} input, got {found}")]
    IncompatibleSpace {
        stage: String,
        expected: String,
        found: String,
    },

    #[error("Expected {expected} channel weights, got {found}")]
    ChannelMismatch { expected: usize, found: usize },

    #[error("Channel {channel} out of range for {n_channels} channels")]
    InvalidChannel { channel: usize, n_channels: usize },

    #[error("Observation already has a '{0}' field")]
    DuplicateKey(String),

    #[error("Switch value {switch} out of range for {n_switches} switches")]
    SwitchOutOfRange { switch: usize, n_switches: usize },

    #[error("{stage} received an observation outside its input space: {found}")]
    UnexpectedObservation { stage: String, found: String },
}
