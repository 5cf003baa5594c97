use std::time::Instant;

use termines_core::{
    Autoplay, GameConfig, GameData, GameError, GameInfo, Replay, Viewport,
};
use uuid::Uuid;

use crate::keys::{DoublePress, ReplayKey};

#[derive(Debug)]
pub enum ReplayOutcome {
    Continue,
    StartAutoplay(Autoplay),
    StopAutoplay,
    Restart(GameConfig),
    Back,
    Delete(Uuid),
    Quit,
}

/// A finished game opened for replay.
#[derive(Debug)]
pub struct ReplayState {
    info: GameInfo,
    replay: Replay,
    /// Run id of the active autoplay, if any.
    autoplay: Option<u64>,
    delete_press: DoublePress,
}

impl ReplayState {
    pub fn open(info: GameInfo, data: GameData, viewport: &Viewport) -> Result<Self, GameError> {
        let replay = Replay::new(data.board, data.history, viewport)?;
        Ok(Self {
            info,
            replay,
            autoplay: None,
            delete_press: DoublePress::default(),
        })
    }

    pub fn info(&self) -> &GameInfo {
        &self.info
    }

    pub fn replay(&self) -> &Replay {
        &self.replay
    }

    pub fn is_autoplaying(&self) -> bool {
        self.autoplay.is_some()
    }

    pub fn realign(&mut self, viewport: &Viewport) {
        self.replay.realign(viewport);
    }

    pub fn handle(
        &mut self,
        key: ReplayKey,
        viewport: &Viewport,
        now: Instant,
    ) -> Result<ReplayOutcome, GameError> {
        use ReplayKey::*;

        // while playing, keys only interrupt; leaving the screen still works
        if self.autoplay.take().is_some() {
            log::debug!("autoplay interrupted by {key:?}");
            return Ok(match key {
                Quit => ReplayOutcome::Quit,
                Restart => ReplayOutcome::Restart(self.info.game_config()),
                Back => ReplayOutcome::Back,
                _ => ReplayOutcome::StopAutoplay,
            });
        }

        match key {
            Next => self.replay.next(viewport)?,
            Prev => self.replay.prev(viewport)?,
            First => self.replay.first(viewport)?,
            Last => self.replay.last(viewport)?,
            Scroll(direction) => self.replay.scroll(viewport, direction, false),
            Page(direction) => self.replay.scroll(viewport, direction, true),
            Autoplay => {
                let plan = termines_core::Autoplay::plan(self.replay.history(), self.replay.index());
                let Some(start) = plan.start_index() else {
                    return Ok(ReplayOutcome::Continue);
                };
                // resuming keeps the current step on screen
                if start != self.replay.index() {
                    self.replay.seek(start - 1, viewport)?;
                }
                return Ok(ReplayOutcome::StartAutoplay(plan));
            }
            Restart => return Ok(ReplayOutcome::Restart(self.info.game_config())),
            Back => return Ok(ReplayOutcome::Back),
            Delete => {
                if self.delete_press.press(now) {
                    return Ok(ReplayOutcome::Delete(self.info.id));
                }
            }
            Quit => return Ok(ReplayOutcome::Quit),
        }
        Ok(ReplayOutcome::Continue)
    }

    pub fn begin_autoplay(&mut self, run: u64) {
        self.autoplay = Some(run);
    }

    /// Applies one autoplay step; false for steps of an interrupted run.
    pub fn autoplay_step(
        &mut self,
        run: u64,
        index: isize,
        viewport: &Viewport,
    ) -> Result<bool, GameError> {
        if self.autoplay != Some(run) {
            log::trace!("ignoring stale autoplay step {index} of run {run}");
            return Ok(false);
        }
        self.replay.seek(index, viewport)?;
        if self.replay.is_at_end() {
            log::debug!("autoplay run {run} finished");
            self.autoplay = None;
        }
        Ok(true)
    }
}
