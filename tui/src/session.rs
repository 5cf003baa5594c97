//! Wires the terminal, the pipeline tasks and the app together.

use std::sync::Arc;

use anyhow::Context;
use termines_core::{FieldFilter, GameConfig};
use tokio::sync::mpsc;

use crate::app::{App, Effect, Msg, Start};
use crate::config::Settings;
use crate::pipeline::{
    self, Control, QUEUE_CAPACITY, Shutdown, StopHandle, TICK_PERIOD, TaskToken, TaskTracker,
};
use crate::store::GameStore;
use crate::terminal::{self, Tui};
use crate::view;

/// Runs an interactive session until the user quits or it is cancelled.
pub async fn run(
    settings: Settings,
    store: Arc<dyn GameStore>,
    new_game: GameConfig,
    filter: FieldFilter,
    start: Start,
) -> anyhow::Result<()> {
    terminal::install_panic_hook();
    let mut tui = terminal::enter().context("setting up the terminal")?;
    let result = drive(&mut tui, settings, store, new_game, filter, start).await;
    terminal::restore();
    result
}

/// Owns the helper tasks started on behalf of the app.
struct Helpers {
    tx: mpsc::Sender<Msg>,
    store: Arc<dyn GameStore>,
    shutdown: Shutdown,
    token: TaskToken,
    ticker: Option<StopHandle>,
    autoplay: Option<StopHandle>,
}

impl Helpers {
    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::StartTicker => {
                self.ticker = Some(pipeline::spawn_ticker(
                    self.tx.clone(),
                    || Msg::Tick,
                    TICK_PERIOD,
                    self.shutdown.clone(),
                    self.token.clone(),
                ));
            }
            Effect::StopTicker => self.ticker = None,
            Effect::StartAutoplay { run, plan } => {
                self.autoplay = Some(pipeline::spawn_autoplay(
                    self.tx.clone(),
                    plan,
                    move |index| Msg::AutoplayStep { run, index },
                    self.shutdown.clone(),
                    self.token.clone(),
                ));
            }
            Effect::StopAutoplay => self.autoplay = None,
            Effect::Save(record) => {
                pipeline::spawn_save(
                    self.store.clone(),
                    *record,
                    self.shutdown.clone(),
                    self.token.clone(),
                );
            }
        }
    }
}

async fn drive(
    tui: &mut Tui,
    settings: Settings,
    store: Arc<dyn GameStore>,
    new_game: GameConfig,
    filter: FieldFilter,
    start: Start,
) -> anyhow::Result<()> {
    let size = tui.size()?;
    let mut app = App::new(settings, store.clone(), new_game, filter, (size.width, size.height));
    app.start(start)?;

    let shutdown = Shutdown::new();
    let tracker = TaskTracker::new();
    let (tx, mut rx) = mpsc::channel(QUEUE_CAPACITY);
    pipeline::spawn_input(
        tx.clone(),
        Msg::from_event,
        shutdown.clone(),
        tracker.token(),
    );

    let mut helpers = Helpers {
        tx,
        store,
        shutdown: shutdown.clone(),
        token: tracker.token(),
        ticker: None,
        autoplay: None,
    };

    tui.draw(|frame| view::draw(frame, &app))?;
    let after = |app: &mut App, control: Control| -> anyhow::Result<()> {
        for effect in app.take_effects() {
            helpers.apply(effect);
        }
        match control {
            Control::Skip | Control::Quit => return Ok(()),
            Control::Redraw => {}
            Control::FullRedraw => tui.clear()?,
        }
        tui.draw(|frame| view::draw(frame, app))?;
        Ok(())
    };
    let result = pipeline::dispatch(app, &mut rx, &shutdown, after, terminal::restore).await;
    shutdown.cancel();

    let fatal = match result {
        Ok(Some(mut app)) => {
            // a quitting handler may still have queued a save
            for effect in app.take_effects() {
                if let Effect::Save(_) = effect {
                    helpers.apply(effect);
                }
            }
            app.take_fatal()
        }
        Ok(None) => None,
        Err(err) => Some(err),
    };
    drop(helpers);

    log::debug!("waiting for background tasks");
    tracker.wait().await;
    log::info!("session ended");

    match fatal {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
