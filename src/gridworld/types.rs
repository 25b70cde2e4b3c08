//! Core grid types: integer positions and the four movement actions.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::error::EnvError;

/// A cell coordinate on the grid, `x` is the column and `y` the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    /// Creates a new position.
    pub fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Origin position (0, 0).
    pub fn origin() -> Self {
        Self { x: 0, y: 0 }
    }

    /// Returns true if the position lies within `[0, width) × [0, height)`.
    pub fn in_bounds(&self, width: usize, height: usize) -> bool {
        self.x < width && self.y < height
    }

    /// Applies a unit move and clamps the result to the grid.
    ///
    /// Moves saturate at the borders rather than wrapping around.
    pub fn moved(&self, action: Action, width: usize, height: usize) -> Self {
        let (dx, dy) = action.delta();
        let x = (self.x as i64 + dx).clamp(0, width as i64 - 1) as usize;
        let y = (self.y as i64 + dy).clamp(0, height as i64 - 1) as usize;
        Self { x, y }
    }

    /// Manhattan distance to another position.
    pub fn manhattan(&self, other: &Position) -> usize {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }
}

impl From<(usize, usize)> for Position {
    fn from((x, y): (usize, usize)) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A unit move on the grid.
///
/// The discriminants are the integer actions accepted by
/// [`GridWorldEnv::step`](super::GridWorldEnv::step).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Action {
    Right = 0,
    Up = 1,
    Left = 2,
    Down = 3,
}

impl Action {
    /// Number of distinct actions.
    pub const COUNT: usize = 4;

    /// Returns all actions in index order.
    pub fn all() -> [Action; 4] {
        [Action::Right, Action::Up, Action::Left, Action::Down]
    }

    /// Direction vector `(dx, dy)`; `y` grows downwards.
    pub fn delta(self) -> (i64, i64) {
        match self {
            Action::Right => (1, 0),
            Action::Up => (0, -1),
            Action::Left => (-1, 0),
            Action::Down => (0, 1),
        }
    }

    /// Returns the integer index of this action.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl TryFrom<usize> for Action {
    type Error = EnvError;

    fn try_from(v: usize) -> Result<Self, Self::Error> {
        Ok(match v {
            0 => Action::Right,
            1 => Action::Up,
            2 => Action::Left,
            3 => Action::Down,
            other => return Err(EnvError::InvalidAction(other)),
        })
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Right => write!(f, "right"),
            Action::Up => write!(f, "up"),
            Action::Left => write!(f, "left"),
            Action::Down => write!(f, "down"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_round_trips_through_index() {
        for action in Action::all() {
            assert_eq!(Action::try_from(action.index()).unwrap(), action);
        }
    }

    #[test]
    fn invalid_action_index_is_rejected() {
        assert_eq!(Action::try_from(4), Err(EnvError::InvalidAction(4)));
    }

    #[test]
    fn moves_saturate_at_borders() {
        let corner = Position::new(0, 0);
        assert_eq!(corner.moved(Action::Left, 5, 5), corner);
        assert_eq!(corner.moved(Action::Up, 5, 5), corner);
        assert_eq!(corner.moved(Action::Right, 5, 5), Position::new(1, 0));
        assert_eq!(corner.moved(Action::Down, 5, 5), Position::new(0, 1));

        let far = Position::new(4, 4);
        assert_eq!(far.moved(Action::Right, 5, 5), far);
        assert_eq!(far.moved(Action::Down, 5, 5), far);
    }

    #[test]
    fn manhattan_distance() {
        assert_eq!(Position::new(0, 0).manhattan(&Position::new(3, 4)), 7);
    }
}
