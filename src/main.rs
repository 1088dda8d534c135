use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use connect_four_bot::config::AppConfig;
use connect_four_bot::error::BoxError;
use connect_four_bot::manager::{GameManager, GamePost};
use connect_four_bot::render::CONTENT_TYPE;
use connect_four_bot::store::DirStore;

/// Play Connect Four games stored as files.
#[derive(Parser)]
#[command(name = "connect-four", about = "Play Connect Four games stored on disk", version)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(long, default_value = "connect4.toml")]
    config: PathBuf,

    /// Override the directory games are stored in
    #[arg(long)]
    store_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start a game between two players
    New {
        game_id: String,
        player_a: String,
        player_b: String,
    },

    /// Drop a piece for a player
    #[command(allow_negative_numbers = true)]
    Move {
        game_id: String,
        player: String,
        /// Column, 1 to 7
        column: i32,
    },

    /// Resign a game
    Resign { game_id: String, player: String },

    /// Print the board and status of a game
    Show { game_id: String },

    /// Write the board as SVG
    Render {
        game_id: String,
        /// Output file; stdout when omitted
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Print a configuration file with every default filled in
    DefaultConfig,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    if let Command::DefaultConfig = cli.command {
        print!("{}", AppConfig::default_toml());
        return Ok(());
    }

    let mut config = AppConfig::load_or_default(&cli.config)
        .with_context(|| format!("loading config from {}", cli.config.display()))?;
    if let Some(dir) = cli.store_dir {
        config.store.dir = dir;
    }

    let store = DirStore::open(&config.store)
        .with_context(|| format!("opening store at {}", config.store.dir.display()))?;
    let manager = GameManager::new(
        store,
        &config.manager,
        Box::new(print_post),
        Box::new(|achievement: &str, user: &str| {
            info!(achievement, user, "achievement granted");
            println!("{user} earned {achievement}");
        }),
    )
    .with_render_config(config.render.clone())
    .context("applying render config")?;

    match cli.command {
        Command::New {
            game_id,
            player_a,
            player_b,
        } => {
            manager
                .create_game(&game_id, &player_a, &player_b)
                .with_context(|| format!("creating game {game_id}"))?;
        }
        Command::Move {
            game_id,
            player,
            column,
        } => {
            manager
                .make_move(&game_id, &player, column)
                .with_context(|| format!("{player} playing column {column} in {game_id}"))?;
            println!("{}", manager.game(&game_id)?.board());
        }
        Command::Resign { game_id, player } => {
            manager
                .resign(&game_id, &player)
                .with_context(|| format!("{player} resigning {game_id}"))?;
        }
        Command::Show { game_id } => {
            let game = manager.game(&game_id)?;
            println!("{}", game.board());
            print_post(&manager.game_post(&game_id)?).map_err(|e| anyhow::anyhow!(e))?;
            if !game.is_terminal() {
                let moves: Vec<String> = game
                    .valid_movements()
                    .iter()
                    .map(ToString::to_string)
                    .collect();
                println!("Valid columns: {}", moves.join(", "));
            }
        }
        Command::Render { game_id, out } => match out {
            Some(path) => {
                let file = File::create(&path)
                    .with_context(|| format!("creating {}", path.display()))?;
                manager
                    .render_image(&game_id, BufWriter::new(file))?
                    .flush()?;
                info!(path = %path.display(), content_type = CONTENT_TYPE, "board written");
            }
            None => {
                manager.render_image(&game_id, io::stdout().lock())?;
            }
        },
        Command::DefaultConfig => {}
    }

    Ok(())
}

/// Stand-in for a chat host: print the post and reuse the game id as post id.
fn print_post(post: &GamePost) -> Result<String, BoxError> {
    let mut out = io::stdout().lock();
    writeln!(out, "== {} ({}) ==", post.title, post.game_id)?;
    writeln!(out, "{}", post.text)?;
    if let Some(footer) = &post.footer {
        writeln!(out, "{footer}")?;
    }
    if !post.actions.is_empty() {
        let labels: Vec<&str> = post.actions.iter().map(|a| a.label()).collect();
        writeln!(out, "[{}]", labels.join("] ["))?;
    }
    Ok(post
        .post_id
        .clone()
        .unwrap_or_else(|| format!("{}-post", post.game_id)))
}
