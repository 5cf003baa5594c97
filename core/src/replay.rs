use core::time::Duration;

use crate::*;

/// Position of a replay: step index (`-1` before the first step), cursor and scroll.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ReplayCursor {
    pub index: isize,
    pub cursor: Coord2,
    pub scroll: Coord2,
}

impl ReplayCursor {
    pub const START: Self = Self {
        index: -1,
        cursor: (0, 0),
        scroll: (0, 0),
    };
}

impl Default for ReplayCursor {
    fn default() -> Self {
        Self::START
    }
}

/// Re-derives the board as it was right after entry `index`.
///
/// The board is closed first, then entries `0..=index` are applied in order.
/// Every recorded `Open` result is checked against the recomputed one.
pub fn reconstruct(
    board: &mut Board,
    history: &History,
    index: isize,
    viewport: &Viewport,
) -> Result<ReplayCursor> {
    if index < -1 || index > history.last_index() {
        return Err(GameError::StepOutOfRange(index));
    }

    board.close_all();
    let mut state = ReplayCursor {
        index,
        ..ReplayCursor::START
    };

    let count = (index + 1) as usize;
    for (i, step) in history.iter().enumerate().take(count) {
        match step.kind {
            StepKind::Move { x, y } => {
                if !board.contains((x, y)) {
                    return Err(GameError::InvalidCoords);
                }
                state.cursor = (x, y);
                state.scroll = viewport.align(state.cursor, state.scroll);
            }
            StepKind::Open { result: recorded } => {
                let computed = board.open(state.cursor);
                if computed != recorded {
                    return Err(GameError::ReplayDivergence {
                        index: i,
                        recorded,
                        computed,
                    });
                }
                if recorded.is_terminal() {
                    board.open_all_mines();
                }
            }
            StepKind::Flag => {
                board.flag(state.cursor);
            }
        }
    }

    Ok(state)
}

/// A stored game being walked through step by step.
#[derive(Clone, Debug)]
pub struct Replay {
    board: Board,
    history: History,
    state: ReplayCursor,
}

impl Replay {
    /// Opens a replay positioned at the last recorded step.
    pub fn new(board: Board, history: History, viewport: &Viewport) -> Result<Self> {
        let mut replay = Self {
            board,
            history,
            state: ReplayCursor::START,
        };
        replay.seek(replay.history.last_index(), viewport)?;
        Ok(replay)
    }

    pub fn seek(&mut self, index: isize, viewport: &Viewport) -> Result<()> {
        self.state = reconstruct(&mut self.board, &self.history, index, viewport)?;
        Ok(())
    }

    /// Steps forward, wrapping from the last entry back to the start.
    pub fn next(&mut self, viewport: &Viewport) -> Result<()> {
        let mut index = self.state.index + 1;
        if index > self.history.last_index() {
            index = -1;
        }
        self.seek(index, viewport)
    }

    /// Steps back, wrapping from the start to the last entry.
    pub fn prev(&mut self, viewport: &Viewport) -> Result<()> {
        let mut index = self.state.index - 1;
        if index < -1 {
            index = self.history.last_index();
        }
        self.seek(index, viewport)
    }

    pub fn first(&mut self, viewport: &Viewport) -> Result<()> {
        self.seek(-1, viewport)
    }

    pub fn last(&mut self, viewport: &Viewport) -> Result<()> {
        self.seek(self.history.last_index(), viewport)
    }

    pub fn scroll(&mut self, viewport: &Viewport, direction: Direction, big: bool) {
        self.state.scroll = viewport.scroll(direction, big, self.state.cursor, self.state.scroll);
    }

    pub fn realign(&mut self, viewport: &Viewport) {
        self.state.scroll = viewport.align(self.state.cursor, self.state.scroll);
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn state(&self) -> ReplayCursor {
        self.state
    }

    pub fn index(&self) -> isize {
        self.state.index
    }

    pub fn is_at_end(&self) -> bool {
        self.state.index == self.history.last_index()
    }

    /// Game time at the current step; the first entry's time before the start.
    pub fn elapsed(&self) -> Duration {
        let index = self.state.index.max(0) as usize;
        self.history
            .get(index)
            .map_or(Duration::ZERO, |step| step.elapsed)
    }
}

/// One scheduled autoplay step: wait `delay`, then show entry `index`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ScheduledStep {
    pub index: isize,
    pub delay: Duration,
}

/// Real-time schedule for playing a replay forward.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Autoplay {
    steps: Vec<ScheduledStep>,
}

impl Autoplay {
    /// Plans playback from `current`, restarting at the first entry when at
    /// the end or before the start.
    pub fn plan(history: &History, current: isize) -> Self {
        let last = history.last_index();
        let start = if current == last || current < 0 {
            0
        } else {
            current as usize
        };

        let steps = (start..history.len())
            .map(|index| ScheduledStep {
                index: index as isize,
                delay: Self::delay_before(history, index),
            })
            .collect();
        Self { steps }
    }

    /// Recorded gap between entry `index` and its predecessor.
    pub fn delay_before(history: &History, index: usize) -> Duration {
        let Some(prev) = index.checked_sub(1).and_then(|i| history.get(i)) else {
            return Duration::ZERO;
        };
        history
            .get(index)
            .map_or(Duration::ZERO, |step| step.elapsed.abs_diff(prev.elapsed))
    }

    pub fn start_index(&self) -> Option<isize> {
        self.steps.first().map(|step| step.index)
    }

    pub fn delays(&self) -> &[ScheduledStep] {
        &self.steps
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl IntoIterator for Autoplay {
    type Item = ScheduledStep;
    type IntoIter = std::vec::IntoIter<ScheduledStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.into_iter()
    }
}
