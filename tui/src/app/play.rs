use std::time::{Duration, Instant};

use termines_core::{
    Board, Coord2, GameConfig, GameError, GameRecord, History, Viewport, big_move, step,
};

use crate::keys::{DOUBLE_PRESS, DoublePress, PlayKey};

/// What the app has to do after a play key.
#[derive(Debug)]
pub enum PlayOutcome {
    Continue,
    /// The first open or flag started the clock.
    Started,
    Abandon,
    Concluded(Box<GameRecord>),
}

/// A game in progress.
#[derive(Debug)]
pub struct PlayState {
    board: Board,
    history: History,
    cursor: Coord2,
    scroll: Coord2,
    started_at: Option<Instant>,
    show_stats: bool,
    quit_press: DoublePress,
    big_prefix: Option<Instant>,
}

impl PlayState {
    pub fn new(config: GameConfig, seed: u64) -> Self {
        Self::from_board(Board::generate(config, seed))
    }

    pub fn from_board(board: Board) -> Self {
        Self {
            board,
            history: History::new(),
            cursor: (0, 0),
            scroll: (0, 0),
            started_at: None,
            show_stats: false,
            quit_press: DoublePress::default(),
            big_prefix: None,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn cursor(&self) -> Coord2 {
        self.cursor
    }

    pub fn scroll(&self) -> Coord2 {
        self.scroll
    }

    pub fn show_stats(&self) -> bool {
        self.show_stats
    }

    pub fn is_started(&self) -> bool {
        self.started_at.is_some()
    }

    /// Time on the game clock; zero until the first open or flag.
    pub fn elapsed(&self, now: Instant) -> Duration {
        self.started_at
            .map_or(Duration::ZERO, |start| now.saturating_duration_since(start))
    }

    pub fn realign(&mut self, viewport: &Viewport) {
        self.scroll = viewport.align(self.cursor, self.scroll);
    }

    pub fn handle(
        &mut self,
        key: PlayKey,
        viewport: &Viewport,
        now: Instant,
    ) -> Result<PlayOutcome, GameError> {
        use PlayKey::*;

        match key {
            Quit => {
                if self.quit_press.press(now) {
                    log::info!("game abandoned after {} steps", self.history.len());
                    return Ok(PlayOutcome::Abandon);
                }
            }
            BigPrefix => self.big_prefix = Some(now),
            Arrow(direction) => {
                let big = self
                    .big_prefix
                    .take()
                    .is_some_and(|at| now.saturating_duration_since(at) < DOUBLE_PRESS);
                let to = if big {
                    big_move(&self.board, direction, self.cursor)
                } else {
                    step(&self.board, direction, self.cursor)
                };
                self.move_cursor(to, viewport, now)?;
            }
            Move(direction) => {
                let to = step(&self.board, direction, self.cursor);
                self.move_cursor(to, viewport, now)?;
            }
            BigMove(direction) => {
                let to = big_move(&self.board, direction, self.cursor);
                self.move_cursor(to, viewport, now)?;
            }
            Open => return self.open(now),
            Flag => {
                let started = self.start_clock(now);
                self.history.record_flag(self.elapsed(now), self.cursor)?;
                self.board.flag(self.cursor);
                if started {
                    return Ok(PlayOutcome::Started);
                }
            }
            Scroll(direction) => {
                self.scroll = viewport.scroll(direction, false, self.cursor, self.scroll);
            }
            Page(direction) => {
                self.scroll = viewport.scroll(direction, true, self.cursor, self.scroll);
            }
            ToggleStats => self.show_stats = !self.show_stats,
        }
        Ok(PlayOutcome::Continue)
    }

    fn move_cursor(&mut self, to: Coord2, viewport: &Viewport, now: Instant) -> Result<(), GameError> {
        self.cursor = to;
        self.realign(viewport);
        self.history.record_move(self.elapsed(now), self.cursor)?;
        Ok(())
    }

    fn open(&mut self, now: Instant) -> Result<PlayOutcome, GameError> {
        let started = self.start_clock(now);
        let result = self.board.open(self.cursor);
        self.history
            .record_open(self.elapsed(now), self.cursor, result)?;
        log::debug!("open {:?}: {result}", self.cursor);

        if result.is_terminal() {
            self.started_at = None;
            let record = GameRecord::conclude(&self.board, self.history.clone())?;
            log::info!(
                "game {} {} in {:?}",
                record.info.id,
                record.info.result,
                record.info.duration
            );
            return Ok(PlayOutcome::Concluded(Box::new(record)));
        }
        Ok(if started {
            PlayOutcome::Started
        } else {
            PlayOutcome::Continue
        })
    }

    fn start_clock(&mut self, now: Instant) -> bool {
        if self.started_at.is_some() {
            return false;
        }
        log::debug!("game started");
        self.started_at = Some(now);
        true
    }
}
