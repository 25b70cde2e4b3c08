//! Policy trait and implementations.

pub mod network;
pub mod random;
pub mod scripted;
pub mod trait_;

pub use network::NetworkPolicy;
pub use random::RandomPolicy;
pub use scripted::ScriptedPolicy;
pub use trait_::Policy;
