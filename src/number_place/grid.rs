use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rows and columns on the board.
pub const SIZE: usize = 9;

/// Why a problem payload was rejected.
#[derive(Debug, Error)]
pub enum ProblemError {
    #[error("problem is not valid JSON: {0}")]
    Json(#[source] serde_json::Error),

    #[error("problem must be 9 rows of 9 digits")]
    Shape,

    #[error("digit {value} out of range at row {row}, column {col}")]
    Digit { row: usize, col: usize, value: u8 },
}

/// A board position. Rows and columns count from zero, top-left origin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Whether this position is on the board.
    pub fn in_bounds(&self) -> bool {
        self.row < SIZE && self.col < SIZE
    }
}

/// A 9x9 board of digits, `0` marking an empty cell.
///
/// Deserializes from the problem wire format, nine arrays of nine
/// integers, and serializes back to it. Construction checks the digit
/// range, so a `Grid` in hand always holds digits `0..=9`.
#[derive(Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<u8>>")]
pub struct Grid([[u8; SIZE]; SIZE]);

impl Grid {
    /// The empty board.
    pub const EMPTY: Grid = Grid([[0; SIZE]; SIZE]);

    /// Build a grid from raw rows, checking the digit range.
    pub fn new(rows: [[u8; SIZE]; SIZE]) -> Result<Self, ProblemError> {
        for (row, digits) in rows.iter().enumerate() {
            for (col, &value) in digits.iter().enumerate() {
                if value > 9 {
                    return Err(ProblemError::Digit { row, col, value });
                }
            }
        }
        Ok(Grid(rows))
    }

    /// Parse a problem in the JSON wire format.
    pub fn from_json(json: &str) -> Result<Self, ProblemError> {
        serde_json::from_str(json).map_err(ProblemError::Json)
    }

    /// Digit at `cell`, `0` when empty. Off-board positions read as
    /// empty.
    pub fn digit(&self, cell: Cell) -> u8 {
        if cell.in_bounds() {
            self.0[cell.row][cell.col]
        } else {
            0
        }
    }

    /// Write `digit` at `cell`. Off-board positions and digits above 9
    /// leave the grid untouched.
    pub(crate) fn set(&mut self, cell: Cell, digit: u8) {
        if cell.in_bounds() && digit <= 9 {
            self.0[cell.row][cell.col] = digit;
        }
    }

    /// How many cells hold `digit`.
    pub fn count(&self, digit: u8) -> usize {
        self.0.iter().flatten().filter(|&&d| d == digit).count()
    }

    /// The raw rows.
    pub fn rows(&self) -> &[[u8; SIZE]; SIZE] {
        &self.0
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl TryFrom<Vec<Vec<u8>>> for Grid {
    type Error = ProblemError;

    fn try_from(rows: Vec<Vec<u8>>) -> Result<Self, ProblemError> {
        if rows.len() != SIZE || rows.iter().any(|row| row.len() != SIZE) {
            return Err(ProblemError::Shape);
        }

        let mut grid = [[0u8; SIZE]; SIZE];
        for (row, digits) in rows.iter().enumerate() {
            for (col, &value) in digits.iter().enumerate() {
                if value > 9 {
                    return Err(ProblemError::Digit { row, col, value });
                }
                grid[row][col] = value;
            }
        }
        Ok(Grid(grid))
    }
}

impl fmt::Debug for Grid {
    // Rows print as digit strings: Grid(["530070000", ...])
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Grid(")?;
        f.debug_list()
            .entries(
                self.0
                    .iter()
                    .map(|row| row.iter().map(|&d| char::from(b'0' + d)).collect::<String>()),
            )
            .finish()?;
        write!(f, ")")
    }
}
