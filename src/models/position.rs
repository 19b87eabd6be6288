use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::GameError;

pub const GRID_SIZE: u8 = 10;

// A cell of the 10x10 grid, (column, row), both 1-based.
// On the wire a position is the array [col, row]. Stored rows go through the
// same range check as requests.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "(i64, i64)")]
pub struct Position(u8, u8);

impl TryFrom<(i64, i64)> for Position {
    type Error = GameError;

    fn try_from((col, row): (i64, i64)) -> Result<Self, Self::Error> {
        Position::new(col, row).ok_or_else(|| GameError::InvalidPosition(format!("[{},{}]", col, row)))
    }
}

impl Position {
    pub fn new(col: i64, row: i64) -> Option<Position> {
        let in_range = |v: i64| (1..=GRID_SIZE as i64).contains(&v);
        if in_range(col) && in_range(row) {
            Some(Position(col as u8, row as u8))
        } else {
            None
        }
    }

    /// Reads a position from untrusted JSON. Anything other than a
    /// two-element array of in-range integers yields `None`.
    pub fn from_value(value: &Value) -> Option<Position> {
        match value.as_array()?.as_slice() {
            [col, row] => Position::new(col.as_i64()?, row.as_i64()?),
            _ => None,
        }
    }

    /// Like `from_value`, but failing with `InvalidPosition`.
    pub fn parse(value: &Value) -> Result<Position, GameError> {
        Position::from_value(value).ok_or_else(|| GameError::InvalidPosition(value.to_string()))
    }

    pub fn col(&self) -> u8 {
        self.0
    }

    pub fn row(&self) -> u8 {
        self.1
    }

    pub fn manhattan_distance(&self, other: &Position) -> u8 {
        self.0.abs_diff(other.0) + self.1.abs_diff(other.1)
    }

    // Row-major index in 0..100
    pub fn index(&self) -> usize {
        (self.1 as usize - 1) * GRID_SIZE as usize + (self.0 as usize - 1)
    }
}
