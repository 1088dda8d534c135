use serde::{Deserialize, Serialize};

use super::board::Cell;

/// A seat at the table. Seat one is whoever was named first when the game
/// was created; the seat says nothing about who moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Player {
    One,
    Two,
}

impl Player {
    /// The opposing seat.
    pub fn other(self) -> Player {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }

    /// Marker this seat leaves on the board.
    pub fn to_cell(self) -> Cell {
        match self {
            Player::One => Cell::One,
            Player::Two => Cell::Two,
        }
    }

    /// Label used in posts and footers.
    pub fn name(self) -> &'static str {
        match self {
            Player::One => "Player1",
            Player::Two => "Player2",
        }
    }
}
