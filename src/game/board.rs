use std::fmt;

use serde::{Deserialize, Serialize};

use super::player::Player;

pub const ROWS: usize = 6;
pub const COLS: usize = 7;

/// Pieces in a line needed to win.
const CONNECT: isize = 4;

/// Line directions as (row step, column step). Row 0 is the top, so `(1, 0)`
/// walks down a column and `(-1, 1)` climbs to the right.
const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (-1, 1)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Cell {
    #[default]
    Empty,
    One,
    Two,
}

impl Cell {
    /// The player owning this cell, if any.
    pub fn player(self) -> Option<Player> {
        match self {
            Cell::Empty => None,
            Cell::One => Some(Player::One),
            Cell::Two => Some(Player::Two),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum MoveError {
    #[error("no such column: {0}")]
    InvalidColumn(i32),

    #[error("column {0} is full")]
    ColumnFull(i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    cells: [[Cell; COLS]; ROWS],
}

impl Board {
    /// Create a new empty board
    pub fn new() -> Self {
        Board {
            cells: [[Cell::Empty; COLS]; ROWS],
        }
    }

    /// Build a board from an explicit grid. Returns `None` if any piece
    /// floats above an empty cell.
    pub fn from_cells(cells: [[Cell; COLS]; ROWS]) -> Option<Self> {
        let board = Board { cells };
        board.is_settled().then_some(board)
    }

    /// Get the cell at a specific position
    /// Row 0 is the top, row 5 is the bottom
    pub fn get(&self, row: usize, col: usize) -> Cell {
        self.cells[row][col]
    }

    /// Check if a column is full
    pub fn is_column_full(&self, col: usize) -> bool {
        if col >= COLS {
            return true;
        }
        self.cells[0][col] != Cell::Empty
    }

    /// Number of pieces stacked in a column (0-based index).
    pub fn height(&self, col: usize) -> usize {
        (0..ROWS)
            .filter(|&row| self.cells[row][col] != Cell::Empty)
            .count()
    }

    /// Total pieces on the board.
    pub fn piece_count(&self) -> usize {
        (0..COLS).map(|col| self.height(col)).sum()
    }

    /// Drop `player`'s piece into a 1-based column and return the row where
    /// it landed. A failed move leaves the board untouched.
    pub fn play(&mut self, column: i32, player: Player) -> Result<usize, MoveError> {
        let col = column_index(column)?;

        if self.is_column_full(col) {
            return Err(MoveError::ColumnFull(column));
        }

        // Find the lowest empty row in this column
        let row = (0..ROWS)
            .rev()
            .find(|&row| self.cells[row][col] == Cell::Empty)
            .ok_or(MoveError::ColumnFull(column))?;
        self.cells[row][col] = player.to_cell();
        Ok(row)
    }

    /// Columns (1-based, ascending) that still accept a piece.
    pub fn valid_movements(&self) -> Vec<i32> {
        (0..COLS)
            .filter(|&col| !self.is_column_full(col))
            .map(|col| col as i32 + 1)
            .collect()
    }

    /// Check if the board is completely full
    pub fn is_full(&self) -> bool {
        (0..COLS).all(|col| self.is_column_full(col))
    }

    /// A full board counts as a draw here even if it also holds a winning
    /// line; callers decide precedence.
    pub fn is_draw(&self) -> bool {
        self.is_full()
    }

    pub fn has_finished(&self) -> bool {
        self.is_draw() || self.has_won().is_some()
    }

    /// Scan occupied cells column by column, top to bottom, and return the
    /// owner of the first four-in-a-row found.
    pub fn has_won(&self) -> Option<Player> {
        for col in 0..COLS {
            for row in 0..ROWS {
                let Some(owner) = self.cells[row][col].player() else {
                    continue;
                };
                if DIRECTIONS
                    .iter()
                    .any(|&(dr, dc)| self.line_from(row, col, dr, dc, owner))
                {
                    return Some(owner);
                }
            }
        }
        None
    }

    /// Whether every piece rests on the bottom or on another piece.
    pub fn is_settled(&self) -> bool {
        (0..COLS).all(|col| {
            (1..ROWS).all(|row| {
                self.cells[row - 1][col] == Cell::Empty || self.cells[row][col] != Cell::Empty
            })
        })
    }

    /// Check that the three cells after (row, col) along (dr, dc) belong to `owner`.
    fn line_from(&self, row: usize, col: usize, dr: isize, dc: isize, owner: Player) -> bool {
        (1..CONNECT).all(|step| {
            let r = row as isize + dr * step;
            let c = col as isize + dc * step;
            self.cell_at(r, c).and_then(Cell::player) == Some(owner)
        })
    }

    fn cell_at(&self, row: isize, col: isize) -> Option<Cell> {
        if row < 0 || col < 0 {
            return None;
        }
        self.cells
            .get(row as usize)
            .and_then(|cells| cells.get(col as usize))
            .copied()
    }
}

/// Convert a 1-based column into an index in `[0, COLS)`.
fn column_index(column: i32) -> Result<usize, MoveError> {
    match usize::try_from(column) {
        Ok(c) if (1..=COLS).contains(&c) => Ok(c - 1),
        _ => Err(MoveError::InvalidColumn(column)),
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in &self.cells {
            for cell in row {
                let symbol = match cell {
                    Cell::Empty => '.',
                    Cell::One => 'X',
                    Cell::Two => 'O',
                };
                write!(f, " {symbol}")?;
            }
            writeln!(f)?;
        }
        for col in 1..=COLS {
            write!(f, " {col}")?;
        }
        Ok(())
    }
}
