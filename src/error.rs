use std::path::PathBuf;

use crate::game::GameError;

/// Error type returned by injected callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that can occur when decoding a stored game.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed game state: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("inconsistent game state: {0}")]
    Inconsistent(String),
}

/// Errors raised by a [`GameStore`](crate::store::GameStore) backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid store key {0:?}")]
    InvalidKey(String),

    #[error("store I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("store lock poisoned")]
    Poisoned,
}

/// Errors that can occur while managing games on behalf of a chat channel.
#[derive(Debug, thiserror::Error)]
pub enum ManagerError {
    #[error("no game started in {0}")]
    NoGame(String),

    #[error("there is still an active game in {0}")]
    ActiveGame(String),

    #[error(transparent)]
    Game(#[from] GameError),

    #[error("stored game is unreadable: {0}")]
    Decode(#[from] DecodeError),

    #[error("failed to encode game: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    #[error("failed to publish game post: {0}")]
    Publish(#[source] BoxError),

    #[error("failed to write board image: {0}")]
    Render(#[from] std::io::Error),
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("config validation error: {0}")]
    Validation(String),
}
