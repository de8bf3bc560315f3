//! Board grid, participant tokens, and coordinates.
//!
//! The grid is row-major with row 0 at the top, matching the backend's
//! serialized board. Tokens fall under gravity, so the landing row of a
//! column is the lowest empty cell.

#[cfg(test)]
#[path = "board_test.rs"]
mod board_test;

use std::fmt;

/// Token of one of the two participants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Token {
    /// Player one (wire value 1).
    One,
    /// Player two (wire value 2).
    Two,
}

impl Token {
    /// Map a wire value to a token; 0 and anything unknown yield `None`.
    #[must_use]
    pub fn from_wire(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::One),
            2 => Some(Self::Two),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_wire(self) -> u8 {
        match self {
            Self::One => 1,
            Self::Two => 2,
        }
    }

    /// The opposing participant's token.
    #[must_use]
    pub fn other(self) -> Self {
        match self {
            Self::One => Self::Two,
            Self::Two => Self::One,
        }
    }
}

/// Cell position on the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coord {
    pub row: usize,
    pub col: usize,
}

impl Coord {
    #[must_use]
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.row, self.col)
    }
}

/// Error returned by [`Board::from_rows`] when the wire grid is malformed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    #[error("board shape {rows}x{cols} is not playable")]
    EmptyShape { rows: usize, cols: usize },
    #[error("board has {actual} rows, expected {expected}")]
    RowCount { expected: usize, actual: usize },
    #[error("row {row} has {actual} columns, expected {expected}")]
    ColumnCount { row: usize, expected: usize, actual: usize },
    #[error("cell {row}-{col} holds unknown token {value}")]
    UnknownToken { row: usize, col: usize, value: u8 },
}

/// Fixed-size Connect Four grid.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    rows: usize,
    cols: usize,
    cells: Vec<Option<Token>>,
}

impl Board {
    /// Empty board of the given shape.
    #[cfg(test)]
    pub(crate) fn new(rows: usize, cols: usize) -> Self {
        Self { rows, cols, cells: vec![None; rows * cols] }
    }

    /// Build a board from the backend's nested wire grid.
    ///
    /// Cells are taken from `grid` itself; the declared shape is only
    /// compared against it, never used to size an allocation.
    ///
    /// # Errors
    ///
    /// Returns [`BoardError`] when either dimension is zero, the grid
    /// disagrees with the declared shape, or a cell holds a value other than
    /// 0, 1, or 2.
    pub fn from_rows(rows: usize, cols: usize, grid: &[Vec<u8>]) -> Result<Self, BoardError> {
        if rows == 0 || cols == 0 {
            return Err(BoardError::EmptyShape { rows, cols });
        }
        if grid.len() != rows {
            return Err(BoardError::RowCount { expected: rows, actual: grid.len() });
        }
        if let Some((row, line)) = grid.iter().enumerate().find(|(_, line)| line.len() != cols) {
            return Err(BoardError::ColumnCount { row, expected: cols, actual: line.len() });
        }

        let mut cells = Vec::with_capacity(grid.iter().map(Vec::len).sum());
        for (row, line) in grid.iter().enumerate() {
            for (col, &value) in line.iter().enumerate() {
                let cell = match value {
                    0 => None,
                    _ => Some(Token::from_wire(value).ok_or(BoardError::UnknownToken { row, col, value })?),
                };
                cells.push(cell);
            }
        }
        Ok(Self { rows, cols, cells })
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    #[must_use]
    pub fn cols(&self) -> usize {
        self.cols
    }

    #[must_use]
    pub fn contains(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols
    }

    /// Token at `(row, col)`; `None` for empty or out-of-bounds cells.
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<Token> {
        if !self.contains(row, col) {
            return None;
        }
        self.cells[row * self.cols + col]
    }

    /// Write a cell. Returns `false` (and leaves the board untouched) when the
    /// position is out of bounds.
    pub fn set(&mut self, row: usize, col: usize, cell: Option<Token>) -> bool {
        if !self.contains(row, col) {
            return false;
        }
        self.cells[row * self.cols + col] = cell;
        true
    }

    /// Lowest empty row of `col`, scanning up from the bottom. `None` when the
    /// column is full or does not exist.
    #[must_use]
    pub fn landing_row(&self, col: usize) -> Option<usize> {
        if col >= self.cols {
            return None;
        }
        (0..self.rows).rev().find(|&row| self.get(row, col).is_none())
    }

    /// Whether no token can be dropped into `col`.
    #[must_use]
    pub fn is_column_full(&self, col: usize) -> bool {
        self.landing_row(col).is_none()
    }
}
