//! Policy trait for gridworld rollouts.

use crate::space::Observation;

/// A policy that picks an action from a (possibly wrapped) observation.
///
/// Actions are indices into `0..4`:
/// - 0: right
/// - 1: up
/// - 2: left
/// - 3: down
pub trait Policy: Send + Sync {
    /// Selects an action for the given observation.
    fn select_action(&mut self, obs: &Observation) -> crate::Result<usize>;

    /// Called before the first action of every episode.
    fn reset(&mut self) {}

    /// Returns a human-readable name for this policy.
    fn name(&self) -> &str;
}
