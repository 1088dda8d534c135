//! # Connect Four bot
//!
//! Rules engine, state codec and board renderer for Connect Four games played
//! between two users of a chat host.
//!
//! ## Modules
//!
//! - [`game`]: Core game logic (board, player seats, game state machine, byte codec)
//! - [`render`]: Deterministic SVG rendering of a board
//! - [`store`]: Key-value storage for encoded games
//! - [`manager`]: Per-channel game management with injected host callbacks
//! - [`config`]: TOML configuration loading and validation
//! - [`error`]: Structured error types

pub mod config;
pub mod error;
pub mod game;
pub mod manager;
pub mod render;
pub mod store;
