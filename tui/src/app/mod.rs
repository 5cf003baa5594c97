//! The application state machine driven by the dispatch consumer.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use crossterm::event::{Event, KeyEvent, KeyEventKind};
use termines_core::{Autoplay, FieldFilter, GameConfig, GameData, GameInfo, GameRecord, Viewport};

use crate::config::Settings;
use crate::keys;
use crate::pipeline::{Control, Handler};
use crate::store::GameStore;
use crate::theme::Theme;

pub use menu::{MenuOutcome, MenuState};
pub use play::{PlayOutcome, PlayState};
pub use replay::{ReplayOutcome, ReplayState};

mod menu;
mod play;
mod replay;

/// Everything the consumer reacts to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Msg {
    Key(KeyEvent),
    Resize(u16, u16),
    Tick,
    AutoplayStep { run: u64, index: isize },
}

impl Msg {
    /// Keeps key presses and resizes; everything else is dropped at the source.
    pub fn from_event(event: Event) -> Option<Self> {
        match event {
            Event::Key(key) if key.kind == KeyEventKind::Press => Some(Self::Key(key)),
            Event::Resize(width, height) => Some(Self::Resize(width, height)),
            _ => None,
        }
    }
}

/// Side effects requested by a handler, carried out by the consumer after it.
#[derive(Debug)]
pub enum Effect {
    StartTicker,
    StopTicker,
    StartAutoplay { run: u64, plan: Autoplay },
    StopAutoplay,
    Save(Box<GameRecord>),
}

#[derive(Debug)]
pub enum Mode {
    Menu,
    Play(PlayState),
    Replay(ReplayState),
}

/// Which screen a session opens on.
#[derive(Copy, Clone, Debug)]
pub enum Start {
    /// A new game, with a fixed seed when given.
    Play(GameConfig, Option<u64>),
    Menu,
}

pub struct App {
    settings: Settings,
    theme: Theme,
    store: Arc<dyn GameStore>,
    new_game: GameConfig,
    screen: (u16, u16),
    mode: Mode,
    menu: MenuState,
    effects: Vec<Effect>,
    autoplay_runs: u64,
    fatal: Option<anyhow::Error>,
}

impl App {
    pub fn new(
        settings: Settings,
        store: Arc<dyn GameStore>,
        new_game: GameConfig,
        filter: FieldFilter,
        screen: (u16, u16),
    ) -> Self {
        let menu = MenuState::new(settings.saved_games.sort, filter);
        Self {
            theme: Theme::new(settings.theme),
            settings,
            store,
            new_game,
            screen,
            mode: Mode::Menu,
            menu,
            effects: Vec::new(),
            autoplay_runs: 0,
            fatal: None,
        }
    }

    pub fn start(&mut self, start: Start) -> anyhow::Result<()> {
        match start {
            Start::Play(config, seed) => self.start_play(config, seed),
            Start::Menu => self.open_menu()?,
        }
        Ok(())
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn menu(&self) -> &MenuState {
        &self.menu
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    /// The field area: the whole screen minus the status line.
    pub fn viewport(&self) -> Viewport {
        Viewport::new(
            self.screen.0,
            self.screen.1.saturating_sub(1),
            self.settings.max_scrolloff,
        )
    }

    /// Saved games that fit below the header.
    pub fn list_rows(&self) -> usize {
        usize::from(self.screen.1.saturating_sub(1))
    }

    pub fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    /// The error that ended the session, if any.
    pub fn take_fatal(&mut self) -> Option<anyhow::Error> {
        self.fatal.take()
    }

    pub fn update(&mut self, msg: Msg) -> anyhow::Result<Control> {
        match msg {
            Msg::Key(key) => self.key(key, Instant::now()),
            Msg::Resize(width, height) => {
                self.resize(width, height);
                Ok(Control::FullRedraw)
            }
            Msg::Tick => Ok(match &self.mode {
                Mode::Play(play) if play.is_started() => Control::Redraw,
                _ => Control::Skip,
            }),
            Msg::AutoplayStep { run, index } => {
                let viewport = self.viewport();
                let Mode::Replay(state) = &mut self.mode else {
                    return Ok(Control::Skip);
                };
                Ok(if state.autoplay_step(run, index, &viewport)? {
                    Control::Redraw
                } else {
                    Control::Skip
                })
            }
        }
    }

    fn key(&mut self, key: KeyEvent, now: Instant) -> anyhow::Result<Control> {
        let viewport = self.viewport();
        let rows = self.list_rows();
        match &mut self.mode {
            Mode::Menu => {
                let Some(key) = keys::menu_key(key) else {
                    return Ok(Control::Skip);
                };
                let outcome = self.menu.handle(key, rows, now, self.store.as_ref())?;
                self.after_menu(outcome)
            }
            Mode::Play(play) => {
                let Some(key) = keys::play_key(key) else {
                    return Ok(Control::Skip);
                };
                let outcome = play.handle(key, &viewport, now)?;
                self.after_play(outcome)
            }
            Mode::Replay(state) => {
                let Some(key) = keys::replay_key(key) else {
                    return Ok(Control::Skip);
                };
                let outcome = state.handle(key, &viewport, now)?;
                self.after_replay(outcome)
            }
        }
    }

    fn after_menu(&mut self, outcome: MenuOutcome) -> anyhow::Result<Control> {
        match outcome {
            MenuOutcome::Continue => {}
            MenuOutcome::Open(id) => {
                let (info, data) = self
                    .store
                    .get(id)
                    .with_context(|| format!("loading game {id}"))?;
                self.show_replay(info, data)?;
            }
            MenuOutcome::NewGame => self.start_play(self.new_game, None),
            MenuOutcome::Quit => return Ok(Control::Quit),
        }
        Ok(Control::Redraw)
    }

    fn after_play(&mut self, outcome: PlayOutcome) -> anyhow::Result<Control> {
        match outcome {
            PlayOutcome::Continue => {}
            PlayOutcome::Started => self.effects.push(Effect::StartTicker),
            PlayOutcome::Abandon => {
                self.effects.push(Effect::StopTicker);
                self.open_menu()?;
            }
            PlayOutcome::Concluded(record) => {
                self.effects.push(Effect::StopTicker);
                let GameRecord { info, data } = (*record).clone();
                self.show_replay(info, data)?;
                self.effects.push(Effect::Save(record));
            }
        }
        Ok(Control::Redraw)
    }

    fn after_replay(&mut self, outcome: ReplayOutcome) -> anyhow::Result<Control> {
        match outcome {
            ReplayOutcome::Continue => {}
            ReplayOutcome::StartAutoplay(plan) => {
                self.autoplay_runs += 1;
                let run = self.autoplay_runs;
                if let Mode::Replay(state) = &mut self.mode {
                    state.begin_autoplay(run);
                }
                log::debug!("autoplay run {run} from step {:?}", plan.start_index());
                self.effects.push(Effect::StartAutoplay { run, plan });
            }
            ReplayOutcome::StopAutoplay => self.effects.push(Effect::StopAutoplay),
            ReplayOutcome::Restart(config) => {
                self.effects.push(Effect::StopAutoplay);
                self.start_play(config, None);
            }
            ReplayOutcome::Back => {
                self.effects.push(Effect::StopAutoplay);
                self.open_menu()?;
            }
            ReplayOutcome::Delete(id) => {
                self.effects.push(Effect::StopAutoplay);
                self.store
                    .delete(id)
                    .with_context(|| format!("deleting game {id}"))?;
                log::info!("deleted game {id}");
                self.open_menu()?;
            }
            ReplayOutcome::Quit => return Ok(Control::Quit),
        }
        Ok(Control::Redraw)
    }

    fn start_play(&mut self, config: GameConfig, seed: Option<u64>) {
        let seed = seed.unwrap_or_else(rand::random);
        log::info!(
            "new {}x{} game with {} mines, seed {seed}",
            config.size.0,
            config.size.1,
            config.mines
        );
        self.mode = Mode::Play(PlayState::new(config, seed));
    }

    fn show_replay(&mut self, info: GameInfo, data: GameData) -> anyhow::Result<()> {
        let id = info.id;
        let state = ReplayState::open(info, data, &self.viewport())
            .with_context(|| format!("replaying game {id}"))?;
        self.mode = Mode::Replay(state);
        Ok(())
    }

    fn open_menu(&mut self) -> anyhow::Result<()> {
        self.menu
            .reload(self.store.as_ref())
            .context("listing saved games")?;
        self.mode = Mode::Menu;
        Ok(())
    }

    fn resize(&mut self, width: u16, height: u16) {
        log::debug!("resized to {width}x{height}");
        self.screen = (width, height);
        let viewport = self.viewport();
        match &mut self.mode {
            Mode::Play(play) => play.realign(&viewport),
            Mode::Replay(state) => state.realign(&viewport),
            Mode::Menu => {}
        }
        self.menu.reset_scroll();
    }
}

impl Handler for App {
    type Msg = Msg;

    fn handle(&mut self, msg: Msg) -> Control {
        match self.update(msg) {
            Ok(control) => control,
            Err(err) => {
                log::error!("{err:#}");
                self.fatal = Some(err);
                Control::Quit
            }
        }
    }
}
