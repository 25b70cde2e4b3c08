//! Switch networks.
//!
//! A switch network is an ordered stack of layers in which some layers are
//! replicated once per switch value. Each example in a batch carries a switch
//! index choosing which replica it goes through; all other layers are shared.

pub mod error;
pub mod layer;
pub mod network;
pub mod policy_value;
pub mod record;

#[cfg(feature = "rl-nn")]
pub mod torch;

pub use error::SwitchError;
pub use layer::{mlp, Activation, Layer, Linear, Sequential};
pub use network::{Network, NetworkInput, SwitchNetwork, SwitchedLayer};
pub use policy_value::PolicyValueNetwork;
pub use record::ActivationCache;
