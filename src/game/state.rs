use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::board::{Board, MoveError, COLS};
use super::player::Player;

/// Terminal classification of a game, or `NoOutcome` while it is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Outcome {
    #[default]
    NoOutcome,
    Win(Player),
    Resigned(Player),
    Draw,
}

impl Outcome {
    pub fn is_finished(self) -> bool {
        self != Outcome::NoOutcome
    }

    /// The seat that effectively won. A resignation hands the game to the
    /// other seat.
    pub fn winner(self) -> Option<Player> {
        match self {
            Outcome::Win(player) => Some(player),
            Outcome::Resigned(player) => Some(player.other()),
            Outcome::NoOutcome | Outcome::Draw => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error(transparent)]
    Move(#[from] MoveError),

    #[error("the game is already over")]
    GameOver,

    #[error("it is not your turn")]
    NotYourTurn,

    #[error("{0} is not playing this game")]
    NotPlaying(String),
}

/// A two-seat game bound to a chat channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    board: Board,
    player_one: String,
    player_two: String,
    last_move: Option<i32>,
    turn: Player,
    channel_id: String,
    post_id: Option<String>,
    outcome: Outcome,
}

impl Game {
    /// Seat two players; the first turn is drawn uniformly from `rng`.
    #[instrument(skip(rng))]
    pub fn new<R: Rng>(
        player_one: &str,
        player_two: &str,
        channel_id: &str,
        rng: &mut R,
    ) -> Self {
        let turn = if rng.random_bool(0.5) {
            Player::One
        } else {
            Player::Two
        };
        debug!(?turn, "game created");

        Game {
            board: Board::new(),
            player_one: player_one.to_string(),
            player_two: player_two.to_string(),
            last_move: None,
            turn,
            channel_id: channel_id.to_string(),
            post_id: None,
            outcome: Outcome::NoOutcome,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn is_terminal(&self) -> bool {
        self.outcome.is_finished()
    }

    /// Seat whose turn it is.
    pub fn turn(&self) -> Player {
        self.turn
    }

    /// Identifier of the player whose turn it is.
    pub fn turn_player(&self) -> &str {
        self.player_id(self.turn)
    }

    pub fn player_id(&self, seat: Player) -> &str {
        match seat {
            Player::One => &self.player_one,
            Player::Two => &self.player_two,
        }
    }

    /// Seat occupied by `player_id`. If both seats share the identifier the
    /// first seat is reported.
    pub fn seat_of(&self, player_id: &str) -> Option<Player> {
        if player_id == self.player_one {
            Some(Player::One)
        } else if player_id == self.player_two {
            Some(Player::Two)
        } else {
            None
        }
    }

    pub fn winner_id(&self) -> Option<&str> {
        self.outcome.winner().map(|seat| self.player_id(seat))
    }

    /// Column (1-based) of the most recent move.
    pub fn last_move(&self) -> Option<i32> {
        self.last_move
    }

    pub fn channel_id(&self) -> &str {
        &self.channel_id
    }

    pub fn post_id(&self) -> Option<&str> {
        self.post_id.as_deref()
    }

    pub fn set_post_id(&mut self, post_id: &str) {
        self.post_id = Some(post_id.to_string());
    }

    /// Playable columns; empty once the game is over.
    pub fn valid_movements(&self) -> Vec<i32> {
        if self.is_terminal() {
            return Vec::new();
        }
        self.board.valid_movements()
    }

    /// Drop the current player's piece into `column` (1-based). On failure
    /// the game is unchanged.
    #[instrument(skip(self), fields(turn = ?self.turn, channel = %self.channel_id))]
    pub fn make_move(&mut self, column: i32) -> Result<(), GameError> {
        if self.is_terminal() {
            return Err(GameError::GameOver);
        }

        self.board.play(column, self.turn)?;
        self.turn = self.turn.other();
        self.last_move = Some(column);

        // Win takes precedence over a board filled by the same move
        if let Some(winner) = self.board.has_won() {
            self.outcome = Outcome::Win(winner);
        } else if self.board.is_draw() {
            self.outcome = Outcome::Draw;
        }

        if self.is_terminal() {
            debug!(outcome = ?self.outcome, "game finished");
        }
        Ok(())
    }

    /// Like [`Game::make_move`], but first checks that `player_id` is seated
    /// and holds the turn.
    pub fn play_as(&mut self, player_id: &str, column: i32) -> Result<(), GameError> {
        if self.seat_of(player_id).is_none() {
            return Err(GameError::NotPlaying(player_id.to_string()));
        }
        if self.is_terminal() {
            return Err(GameError::GameOver);
        }
        if self.turn_player() != player_id {
            return Err(GameError::NotYourTurn);
        }
        self.make_move(column)
    }

    /// Resign on behalf of `player_id` and return the resigning seat.
    #[instrument(skip(self), fields(channel = %self.channel_id))]
    pub fn resign(&mut self, player_id: &str) -> Result<Player, GameError> {
        let seat = self
            .seat_of(player_id)
            .ok_or_else(|| GameError::NotPlaying(player_id.to_string()))?;
        if self.is_terminal() {
            return Err(GameError::GameOver);
        }

        self.outcome = Outcome::Resigned(seat);
        debug!(?seat, "player resigned");
        Ok(seat)
    }

    /// Check invariants a freshly decoded game must hold.
    pub(crate) fn check_consistency(&self) -> Result<(), String> {
        if !self.board.is_settled() {
            return Err("board has pieces floating above empty cells".into());
        }
        if let Some(column) = self.last_move {
            if !(1..=COLS as i32).contains(&column) {
                return Err(format!("last move column {column} out of range"));
            }
            if self.board.height(column as usize - 1) == 0 {
                return Err(format!("last move column {column} is empty"));
            }
        }
        Ok(())
    }
}
