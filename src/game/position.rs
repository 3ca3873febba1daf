use std::ops::{Add, Mul, Sub};

use serde::{Deserialize, Serialize};

/// A board cell, `x` is the column and `y` the row.
///
/// Coordinates are signed so that direction walks may step one cell past an
/// edge before being checked against the board bounds.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, Hash, Eq, PartialEq, Ord, PartialOrd)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Swap the two axes
    pub fn flip(self) -> Self {
        Self {
            x: self.y,
            y: self.x,
        }
    }

    pub fn is_within(self, size: usize) -> bool {
        let size = size as i32;
        self.x >= 0 && self.y >= 0 && self.x < size && self.y < size
    }
}

impl Add for Position {
    type Output = Position;

    fn add(self, other: Position) -> Position {
        Position::new(self.x + other.x, self.y + other.y)
    }
}

impl Sub for Position {
    type Output = Position;

    fn sub(self, other: Position) -> Position {
        Position::new(self.x - other.x, self.y - other.y)
    }
}

impl Mul<i32> for Position {
    type Output = Position;

    fn mul(self, factor: i32) -> Position {
        Position::new(self.x * factor, self.y * factor)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Hash, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Horizontal,
    Vertical,
}

impl Direction {
    /// Unit step along this direction
    pub fn step(self) -> Position {
        match self {
            Direction::Horizontal => Position::new(1, 0),
            Direction::Vertical => Position::new(0, 1),
        }
    }

    pub fn perpendicular(self) -> Direction {
        match self {
            Direction::Horizontal => Direction::Vertical,
            Direction::Vertical => Direction::Horizontal,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Direction::Horizontal => 'h',
            Direction::Vertical => 'v',
        }
    }
}

/// A letter pinned to a board cell
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Hash, Eq, PartialEq)]
pub struct PlacedLetter {
    pub letter: char,
    pub position: Position,
}

impl PlacedLetter {
    pub fn new(letter: char, position: Position) -> Self {
        Self { letter, position }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum MultiplierKind {
    Letter,
    Word,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq)]
pub struct Multiplier {
    pub amount: i32,
    pub kind: MultiplierKind,
}

impl Multiplier {
    pub const fn letter(amount: i32) -> Self {
        Self {
            amount,
            kind: MultiplierKind::Letter,
        }
    }

    pub const fn word(amount: i32) -> Self {
        Self {
            amount,
            kind: MultiplierKind::Word,
        }
    }
}
