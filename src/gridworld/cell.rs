//! Cell definitions: immutable descriptions of what occupies a grid square.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// An 8-bit RGB colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const BLACK: Rgb = Rgb(0, 0, 0);
    pub const WHITE: Rgb = Rgb(255, 255, 255);
    pub const GREY: Rgb = Rgb(128, 128, 128);
    pub const RED: Rgb = Rgb(255, 0, 0);
    pub const GREEN: Rgb = Rgb(0, 255, 0);
    pub const BLUE: Rgb = Rgb(0, 0, 255);

    /// Channels as an array `[r, g, b]`.
    pub fn channels(self) -> [u8; 3] {
        [self.0, self.1, self.2]
    }
}

/// What a cell is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum CellKind {
    Empty,
    Wall,
    Goal,
    Agent,
}

impl CellKind {
    /// Lowercase name, used as the default cell name.
    pub fn name(&self) -> &'static str {
        match self {
            CellKind::Empty => "empty",
            CellKind::Wall => "wall",
            CellKind::Goal => "goal",
            CellKind::Agent => "agent",
        }
    }
}

impl fmt::Display for CellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Immutable description of a grid square.
///
/// For goals, `reward` and `terminal` define what happens when the agent
/// reaches the cell while it is the true goal.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Cell {
    pub kind: CellKind,
    pub color: Option<Rgb>,
    pub reward: f64,
    pub terminal: bool,
    pub name: String,
}

impl Cell {
    /// Creates a cell of the given kind with no colour, no reward, and the
    /// kind's name.
    pub fn new(kind: CellKind) -> Self {
        Self {
            kind,
            color: None,
            reward: 0.0,
            terminal: false,
            name: kind.name().to_string(),
        }
    }

    /// Creates a goal cell.
    pub fn goal(name: &str, color: Rgb, reward: f64, terminal: bool) -> Self {
        Self {
            kind: CellKind::Goal,
            color: Some(color),
            reward,
            terminal,
            name: name.to_string(),
        }
    }

    pub fn with_color(mut self, color: Rgb) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_reward(mut self, reward: f64) -> Self {
        self.reward = reward;
        self
    }

    pub fn with_terminal(mut self, terminal: bool) -> Self {
        self.terminal = terminal;
        self
    }

    pub fn named(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Colour used when drawing; uncoloured cells are black.
    pub fn display_color(&self) -> Rgb {
        self.color.unwrap_or(Rgb::BLACK)
    }

    pub fn empty() -> Self {
        Self::new(CellKind::Empty)
    }

    pub fn wall() -> Self {
        Self::new(CellKind::Wall).with_color(Rgb::GREY)
    }

    pub fn agent() -> Self {
        Self::new(CellKind::Agent).with_color(Rgb::WHITE)
    }

    /// The canonical three goals: a rewarding terminal "right" goal, a
    /// zero-reward terminal "wrong" goal and a zero-reward non-terminal one.
    pub fn canonical_goals() -> Vec<Cell> {
        vec![
            Cell::goal("right", Rgb::GREEN, 1.0, true),
            Cell::goal("wrong", Rgb::RED, 0.0, true),
            Cell::goal("wrong_nonterminal", Rgb::BLUE, 0.0, false),
        ]
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
