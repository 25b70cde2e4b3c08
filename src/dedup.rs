//! Duplicate detection with an explicit lifecycle.

use std::collections::HashSet;
use std::fmt::Debug;
use std::hash::Hash;

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DedupError {
    #[error("Duplicate value {0}")]
    Duplicate(String),
}

/// Remembers every value it has accepted and rejects repeats until reset.
///
/// Useful for checking that generated names, seeds or run labels are unique
/// within an experiment.
#[derive(Debug, Clone)]
pub struct UniqueChecker<T> {
    seen: HashSet<T>,
}

impl<T: Eq + Hash + Clone + Debug> UniqueChecker<T> {
    pub fn new() -> Self {
        Self {
            seen: HashSet::new(),
        }
    }

    /// Returns `value` if it was never seen, recording it.
    pub fn check(&mut self, value: T) -> Result<T, DedupError> {
        if self.seen.contains(&value) {
            return Err(DedupError::Duplicate(format!("{value:?}")));
        }
        self.seen.insert(value.clone());
        Ok(value)
    }

    pub fn contains(&self, value: &T) -> bool {
        self.seen.contains(value)
    }

    /// Forgets every recorded value.
    pub fn reset(&mut self) {
        self.seen.clear();
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

impl<T: Eq + Hash + Clone + Debug> Default for UniqueChecker<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_repeats_until_reset() {
        let mut checker = UniqueChecker::new();
        assert_eq!(checker.check("a"), Ok("a"));
        assert_eq!(checker.check("b"), Ok("b"));
        assert_eq!(checker.check("a"), Err(DedupError::Duplicate("\"a\"".into())));
        assert_eq!(checker.len(), 2);

        checker.reset();
        assert!(checker.is_empty());
        assert_eq!(checker.check("a"), Ok("a"));
    }

    #[test]
    fn checkers_are_independent() {
        let mut a = UniqueChecker::new();
        let mut b = UniqueChecker::new();
        a.check(1).unwrap();
        assert!(b.check(1).is_ok());
        assert!(a.contains(&1));
    }
}
