//! Glue between the game core and a chat host: games are stored per channel,
//! turns are enforced per user and outcomes are announced through injected
//! callbacks.

mod post;

use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

use dashmap::DashMap;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, instrument, warn};

use crate::error::{BoxError, ConfigError, ManagerError};
use crate::game::{Game, GameError};
use crate::render::{encode_board_with, RenderConfig};
use crate::store::GameStore;

pub use post::{GamePost, PostAction, POST_TITLE};

/// Publishes a post (creating it when `post_id` is `None`, updating it
/// otherwise) and returns the post id.
pub type PublishFn = Box<dyn Fn(&GamePost) -> Result<String, BoxError> + Send + Sync>;

/// Grants an achievement by name to a user id.
pub type GrantFn = Box<dyn Fn(&str, &str) + Send + Sync>;

/// Configuration for the game manager.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Fixed seed for first-turn draws; unset means OS entropy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
    /// Achievement granted to the winner of a game.
    pub winner_achievement: String,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        ManagerConfig {
            seed: None,
            winner_achievement: "connect4_winner".into(),
        }
    }
}

/// Per-game mutation locks. An entry only lives while someone holds or waits
/// on it.
type GameLocks = DashMap<String, Arc<Mutex<()>>>;

/// Owns the store and serializes mutations per game id.
pub struct GameManager<S> {
    store: S,
    rng: Mutex<StdRng>,
    render: RenderConfig,
    winner_achievement: String,
    publish: PublishFn,
    grant_achievement: GrantFn,
    locks: GameLocks,
}

impl<S: GameStore> GameManager<S> {
    pub fn new(store: S, config: &ManagerConfig, publish: PublishFn, grant_achievement: GrantFn) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        GameManager {
            store,
            rng: Mutex::new(rng),
            render: RenderConfig::default(),
            winner_achievement: config.winner_achievement.clone(),
            publish,
            grant_achievement,
            locks: DashMap::new(),
        }
    }

    /// Replace the image palette and geometry. The config is checked first.
    pub fn with_render_config(mut self, render: RenderConfig) -> Result<Self, ConfigError> {
        render.validate()?;
        self.render = render;
        Ok(self)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Start a game between two players in `game_id`. A finished game under
    /// the same id is replaced; a running one is not.
    #[instrument(skip(self))]
    pub fn create_game(&self, game_id: &str, player_a: &str, player_b: &str) -> Result<Game, ManagerError> {
        self.with_game_lock(game_id, || {
            if let Some(existing) = self.load(game_id)? {
                if !existing.is_terminal() {
                    return Err(ManagerError::ActiveGame(game_id.to_string()));
                }
            }

            let mut game = {
                let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
                Game::new(player_a, player_b, game_id, &mut *rng)
            };

            let post_id =
                (self.publish)(&GamePost::from_game(&game)).map_err(ManagerError::Publish)?;
            game.set_post_id(&post_id);
            self.save(game_id, &game)?;

            info!(%post_id, first = game.turn_player(), "game created");
            Ok(game)
        })
    }

    /// Play `column` for `player` and return the refreshed post.
    #[instrument(skip(self))]
    pub fn make_move(&self, game_id: &str, player: &str, column: i32) -> Result<GamePost, ManagerError> {
        self.mutate(game_id, |game| game.play_as(player, column))
    }

    /// Resign `player` from the game and return the refreshed post.
    #[instrument(skip(self))]
    pub fn resign(&self, game_id: &str, player: &str) -> Result<GamePost, ManagerError> {
        self.mutate(game_id, |game| game.resign(player).map(|_| ()))
    }

    /// Current post for a game without changing it.
    pub fn game_post(&self, game_id: &str) -> Result<GamePost, ManagerError> {
        Ok(GamePost::from_game(&self.require(game_id)?))
    }

    pub fn game(&self, game_id: &str) -> Result<Game, ManagerError> {
        self.require(game_id)
    }

    /// Whether it is `player`'s turn. False when there is no game.
    pub fn can_move(&self, game_id: &str, player: &str) -> Result<bool, ManagerError> {
        Ok(self
            .load(game_id)?
            .is_some_and(|game| !game.is_terminal() && game.turn_player() == player))
    }

    pub fn is_playing(&self, game_id: &str, player: &str) -> Result<bool, ManagerError> {
        Ok(self
            .load(game_id)?
            .is_some_and(|game| game.seat_of(player).is_some()))
    }

    pub fn valid_movements(&self, game_id: &str) -> Result<Vec<i32>, ManagerError> {
        Ok(self
            .load(game_id)?
            .map(|game| game.valid_movements())
            .unwrap_or_default())
    }

    /// Write the board image for a game to `writer`.
    pub fn render_image<W: Write>(&self, game_id: &str, writer: W) -> Result<W, ManagerError> {
        let game = self.require(game_id)?;
        Ok(encode_board_with(writer, game.board(), game.last_move(), &self.render)?)
    }

    /// Load, change, save and republish a game while holding its lock.
    fn mutate<F>(&self, game_id: &str, change: F) -> Result<GamePost, ManagerError>
    where
        F: FnOnce(&mut Game) -> Result<(), GameError>,
    {
        self.with_game_lock(game_id, || {
            let mut game = self.require(game_id)?;
            let was_finished = game.is_terminal();
            change(&mut game)?;
            self.save(game_id, &game)?;

            if !was_finished && game.is_terminal() {
                info!(outcome = ?game.outcome(), "game over");
                if let Some(winner) = game.winner_id() {
                    (self.grant_achievement)(&self.winner_achievement, winner);
                }
            }

            let post = GamePost::from_game(&game);
            if let Err(err) = (self.publish)(&post) {
                // The move is already stored; only the announcement is stale
                warn!(%err, "failed to update game post");
            }
            Ok(post)
        })
    }

    fn require(&self, game_id: &str) -> Result<Game, ManagerError> {
        self.load(game_id)?
            .ok_or_else(|| ManagerError::NoGame(game_id.to_string()))
    }

    fn load(&self, game_id: &str) -> Result<Option<Game>, ManagerError> {
        match self.store.get(game_id)? {
            Some(bytes) => Ok(Some(Game::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Written back under the key it was loaded from, whatever its channel id.
    fn save(&self, game_id: &str, game: &Game) -> Result<(), ManagerError> {
        let bytes = game.to_bytes()?;
        self.store.set(game_id, &bytes)?;
        Ok(())
    }

    /// Run `f` holding the lock for `game_id`, then drop the map entry unless
    /// another caller still holds a handle to it.
    fn with_game_lock<T>(&self, game_id: &str, f: impl FnOnce() -> T) -> T {
        let lock = self.locks.entry(game_id.to_string()).or_default().value().clone();
        let result = {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            f()
        };
        drop(lock);
        self.locks.remove_if(game_id, |_, held| Arc::strong_count(held) == 1);
        result
    }
}
