//! Byte encoding of [`Game`] for key-value storage.
//!
//! Games are stored as JSON. There is no schema version: changing the shape
//! of [`Game`] makes previously stored games undecodable.

use crate::error::DecodeError;

use super::state::Game;

impl Game {
    /// Encode every attribute of the game.
    pub fn to_bytes(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }

    /// Decode a game produced by [`Game::to_bytes`], rejecting input that
    /// parses but describes an impossible board.
    pub fn from_bytes(bytes: &[u8]) -> Result<Game, DecodeError> {
        let game: Game = serde_json::from_slice(bytes)?;
        game.check_consistency().map_err(DecodeError::Inconsistent)?;
        Ok(game)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{GameError, Outcome, Player};
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn new_game(seed: u64) -> Game {
        let mut rng = StdRng::seed_from_u64(seed);
        Game::new("alice", "bob", "town-square", &mut rng)
    }

    #[test]
    fn test_fresh_game_roundtrips() {
        let game = new_game(1);
        let decoded = Game::from_bytes(&game.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded, game);
    }

    #[test]
    fn test_random_playouts_roundtrip() {
        let mut rng = StdRng::seed_from_u64(99);
        for seed in 0..20 {
            let mut game = new_game(seed);
            game.set_post_id("post-1");
            while !game.is_terminal() {
                let moves = game.valid_movements();
                let column = moves[rng.random_range(0..moves.len())];
                game.make_move(column).unwrap();

                let decoded = Game::from_bytes(&game.to_bytes().unwrap()).unwrap();
                assert_eq!(decoded, game);
            }
        }
    }

    #[test]
    fn test_decoded_game_keeps_playing() {
        let mut game = new_game(4);
        game.make_move(4).unwrap();
        let mut decoded = Game::from_bytes(&game.to_bytes().unwrap()).unwrap();

        game.make_move(4).unwrap();
        decoded.make_move(4).unwrap();
        assert_eq!(decoded, game);
        assert_eq!(decoded.board().height(3), 2);
    }

    #[test]
    fn test_resigned_game_roundtrips() {
        let mut game = new_game(2);
        game.resign("alice").unwrap();
        let mut decoded = Game::from_bytes(&game.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded.outcome(), Outcome::Resigned(Player::One));
        assert_eq!(decoded.winner_id(), Some("bob"));
        assert_eq!(decoded.make_move(1), Err(GameError::GameOver));
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(matches!(
            Game::from_bytes(b"not json"),
            Err(DecodeError::Malformed(_))
        ));
        assert!(matches!(
            Game::from_bytes(b"{\"board\": 3}"),
            Err(DecodeError::Malformed(_))
        ));
        assert!(matches!(Game::from_bytes(b""), Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn test_floating_piece_is_rejected() {
        let game = new_game(3);
        let mut value: serde_json::Value = serde_json::to_value(&game).unwrap();
        value["board"]["cells"][0][0] = serde_json::Value::String("One".into());

        let bytes = serde_json::to_vec(&value).unwrap();
        assert!(matches!(
            Game::from_bytes(&bytes),
            Err(DecodeError::Inconsistent(_))
        ));
    }

    #[test]
    fn test_out_of_range_last_move_is_rejected() {
        let game = new_game(3);
        let mut value: serde_json::Value = serde_json::to_value(&game).unwrap();
        value["last_move"] = serde_json::json!(8);

        let bytes = serde_json::to_vec(&value).unwrap();
        assert!(matches!(
            Game::from_bytes(&bytes),
            Err(DecodeError::Inconsistent(_))
        ));
    }
}
