use serde::{Deserialize, Serialize};

use crate::game::{Game, Outcome, Player};

pub const POST_TITLE: &str = "Connect4 game";

/// Button offered on a running game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostAction {
    Move,
    Resign,
}

impl PostAction {
    pub fn label(self) -> &'static str {
        match self {
            PostAction::Move => "Move",
            PostAction::Resign => "Resign",
        }
    }
}

/// What the presentation layer shows for a game. `game_id` is the key the
/// actions and the board image refer back to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GamePost {
    pub game_id: String,
    pub post_id: Option<String>,
    pub title: String,
    pub text: String,
    pub footer: Option<String>,
    pub actions: Vec<PostAction>,
}

impl GamePost {
    pub fn from_game(game: &Game) -> Self {
        let text = format!(
            "Player1: {}\nPlayer2: {}\nTurn: {}",
            game.player_id(Player::One),
            game.player_id(Player::Two),
            game.turn_player()
        );
        let actions = if game.is_terminal() {
            Vec::new()
        } else {
            vec![PostAction::Move, PostAction::Resign]
        };

        GamePost {
            game_id: game.channel_id().to_string(),
            post_id: game.post_id().map(str::to_string),
            title: POST_TITLE.to_string(),
            text,
            footer: footer(game.outcome()),
            actions,
        }
    }
}

fn footer(outcome: Outcome) -> Option<String> {
    match outcome {
        Outcome::NoOutcome => None,
        Outcome::Win(player) => Some(format!("{} won!", player.name())),
        Outcome::Resigned(player) => Some(format!(
            "{} won because {} resigned!",
            player.other().name(),
            player.name()
        )),
        Outcome::Draw => Some("Draw!".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn new_game() -> Game {
        let mut rng = StdRng::seed_from_u64(11);
        Game::new("alice", "bob", "dm-alice-bob", &mut rng)
    }

    #[test]
    fn test_running_game_post() {
        let game = new_game();
        let post = GamePost::from_game(&game);

        assert_eq!(post.game_id, "dm-alice-bob");
        assert_eq!(post.post_id, None);
        assert_eq!(post.title, "Connect4 game");
        assert_eq!(
            post.text,
            format!("Player1: alice\nPlayer2: bob\nTurn: {}", game.turn_player())
        );
        assert_eq!(post.footer, None);
        assert_eq!(post.actions, vec![PostAction::Move, PostAction::Resign]);
    }

    #[test]
    fn test_resigned_game_post() {
        let mut game = new_game();
        game.set_post_id("p1");
        game.resign("alice").unwrap();
        let post = GamePost::from_game(&game);

        assert_eq!(post.post_id.as_deref(), Some("p1"));
        assert_eq!(
            post.footer.as_deref(),
            Some("Player2 won because Player1 resigned!")
        );
        assert!(post.actions.is_empty());
    }

    #[test]
    fn test_footers() {
        assert_eq!(footer(Outcome::NoOutcome), None);
        assert_eq!(footer(Outcome::Win(Player::Two)).as_deref(), Some("Player2 won!"));
        assert_eq!(footer(Outcome::Draw).as_deref(), Some("Draw!"));
        assert_eq!(
            footer(Outcome::Resigned(Player::Two)).as_deref(),
            Some("Player1 won because Player2 resigned!")
        );
    }

    #[test]
    fn test_action_labels() {
        assert_eq!(PostAction::Move.label(), "Move");
        assert_eq!(PostAction::Resign.label(), "Resign");
    }
}
