use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use termines_core::{CellCount, Coord, FieldFilter, GameConfig, SortBy};
use uuid::Uuid;

use crate::config::NewGame;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// What log level to write to the log file
    #[command(flatten)]
    pub verbose: Verbosity<InfoLevel>,

    /// Directory holding settings, saved games and logs
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start a new game (default)
    Play(PlayArgs),
    /// Browse saved games
    Menu(FilterArgs),
    /// Print saved games
    List {
        /// latest, oldest, best or worst; defaults to the configured order
        #[arg(long)]
        sort: Option<SortBy>,
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Print a saved game as JSON
    Show { id: Uuid },
    /// Delete a saved game
    Delete { id: Uuid },
}

#[derive(Args, Debug, Default)]
pub struct PlayArgs {
    #[arg(long)]
    pub width: Option<Coord>,
    #[arg(long)]
    pub height: Option<Coord>,
    #[arg(long)]
    pub mines: Option<CellCount>,
    /// Force a seed instead of random
    #[arg(short, long)]
    pub seed: Option<u64>,
}

impl PlayArgs {
    /// Flags override the configured new game.
    pub fn game_config(&self, defaults: &NewGame) -> termines_core::Result<GameConfig> {
        GameConfig::new(
            (
                self.width.unwrap_or(defaults.width),
                self.height.unwrap_or(defaults.height),
            ),
            self.mines.unwrap_or(defaults.mines),
        )
    }
}

/// Restricts a listing to one board configuration.
#[derive(Args, Debug, Default)]
pub struct FilterArgs {
    #[arg(long)]
    pub width: Option<Coord>,
    #[arg(long)]
    pub height: Option<Coord>,
    #[arg(long)]
    pub mines: Option<CellCount>,
}

impl FilterArgs {
    pub fn filter(&self) -> anyhow::Result<FieldFilter> {
        match (self.width, self.height, self.mines) {
            (None, None, None) => Ok(FieldFilter::All),
            (Some(width), Some(height), Some(mines)) => Ok(FieldFilter::Exact(
                GameConfig::new_unchecked((width, height), mines),
            )),
            _ => anyhow::bail!("--width, --height and --mines must be given together"),
        }
    }
}
