//! Core Connect Four game logic: board representation, player seats, the
//! game state machine and its byte encoding.

mod board;
mod codec;
mod player;
mod state;

pub use board::{Board, Cell, MoveError, COLS, ROWS};
pub use player::Player;
pub use state::{Game, GameError, Outcome};
