//! termines: minesweeper in the terminal, with every game recorded for replay.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use termines_core::{FieldFilter, GameData, GameInfo, SortBy};
use uuid::Uuid;

use termines::app::Start;
use termines::cli::{Cli, Command, PlayArgs};
use termines::config::{self, Settings};
use termines::store::{GameStore, SledStore};
use termines::{logging, session, view};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let data_dir = config::resolve_data_dir(cli.data_dir);
    logging::init(&data_dir, cli.verbose.log_level_filter())?;
    log::info!("termines {} starting in {}", env!("CARGO_PKG_VERSION"), data_dir.display());

    let settings = Settings::load_or_init(&data_dir)
        .with_context(|| format!("loading settings from {}", data_dir.display()))?;
    let store = SledStore::open(&data_dir).context("opening saved games")?;

    match cli.command.unwrap_or_else(|| Command::Play(PlayArgs::default())) {
        Command::Play(args) => {
            let config = args
                .game_config(&settings.new_game)
                .context("invalid game settings")?;
            let start = Start::Play(config, args.seed);
            session::run(settings, Arc::new(store), config, FieldFilter::All, start).await
        }
        Command::Menu(filter) => {
            let filter = filter.filter()?;
            let new_game = settings.new_game.game_config()?;
            session::run(settings, Arc::new(store), new_game, filter, Start::Menu).await
        }
        Command::List { sort, filter } => {
            let sort = sort.unwrap_or(settings.saved_games.sort);
            list(&store, sort, &filter.filter()?)
        }
        Command::Show { id } => show(&store, id),
        Command::Delete { id } => delete(&store, id),
    }
}

fn list(store: &dyn GameStore, sort: SortBy, filter: &FieldFilter) -> anyhow::Result<()> {
    let games = store.list_prepared(sort, filter)?;
    if games.is_empty() {
        println!("no saved games");
    }
    for (index, info) in games.iter().enumerate() {
        println!("{}  {}", view::menu_row(index, info), info.id);
    }
    Ok(())
}

#[derive(Serialize)]
struct Shown<'a> {
    info: &'a GameInfo,
    data: &'a GameData,
}

fn show(store: &dyn GameStore, id: Uuid) -> anyhow::Result<()> {
    let (info, data) = store.get(id)?;
    let shown = Shown {
        info: &info,
        data: &data,
    };
    println!("{}", serde_json::to_string_pretty(&shown)?);
    Ok(())
}

fn delete(store: &dyn GameStore, id: Uuid) -> anyhow::Result<()> {
    // both halves must exist, so unknown ids are reported
    store.get(id)?;
    store.delete(id)?;
    log::info!("deleted game {id}");
    println!("deleted {id}");
    Ok(())
}
