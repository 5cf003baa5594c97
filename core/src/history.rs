use core::time::Duration;

use serde::{Deserialize, Serialize};

use crate::*;

/// One recorded gameplay action.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepKind {
    Move { x: Coord, y: Coord },
    Flag,
    Open { result: OpenResult },
}

impl StepKind {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Move { .. } => "MOVE",
            Self::Flag => "FLAG",
            Self::Open { .. } => "OPEN",
        }
    }

    const fn concludes(self) -> bool {
        matches!(self, Self::Open { result } if result.is_terminal())
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryStep {
    /// Time since the game started.
    pub elapsed: Duration,
    pub kind: StepKind,
}

impl HistoryStep {
    pub const fn new(elapsed: Duration, kind: StepKind) -> Self {
        Self { elapsed, kind }
    }
}

/// Append-only log of a single game.
///
/// The first gameplay action starts the game and is preceded by a `Move` at
/// zero elapsed time with the cursor position. Once an `Open` ends the game no
/// further entries are accepted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct History {
    steps: Vec<HistoryStep>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a log from stored steps, rejecting entries after a concluding `Open`.
    pub fn from_steps(steps: Vec<HistoryStep>) -> Result<Self> {
        let mut history = Self::new();
        for step in steps {
            history.push(step)?;
        }
        Ok(history)
    }

    pub fn push(&mut self, step: HistoryStep) -> Result<()> {
        if self.is_concluded() {
            return Err(GameError::HistoryConcluded);
        }
        self.steps.push(step);
        Ok(())
    }

    /// Whether the first gameplay action has been recorded.
    pub fn is_started(&self) -> bool {
        !self.steps.is_empty()
    }

    pub fn is_concluded(&self) -> bool {
        self.steps.last().is_some_and(|step| step.kind.concludes())
    }

    /// Records a cursor move. Ignored before the game starts or when the
    /// cursor did not actually change; returns whether an entry was added.
    pub fn record_move(&mut self, elapsed: Duration, cursor: Coord2) -> Result<bool> {
        if !self.is_started() || self.last_cursor() == Some(cursor) {
            return Ok(false);
        }
        self.push(HistoryStep::new(elapsed, StepKind::Move { x: cursor.0, y: cursor.1 }))?;
        Ok(true)
    }

    pub fn record_flag(&mut self, elapsed: Duration, cursor: Coord2) -> Result<()> {
        self.start_if_needed(cursor)?;
        self.push(HistoryStep::new(elapsed, StepKind::Flag))
    }

    pub fn record_open(&mut self, elapsed: Duration, cursor: Coord2, result: OpenResult) -> Result<()> {
        self.start_if_needed(cursor)?;
        self.push(HistoryStep::new(elapsed, StepKind::Open { result }))
    }

    fn start_if_needed(&mut self, cursor: Coord2) -> Result<()> {
        if self.is_started() {
            return Ok(());
        }
        self.push(HistoryStep::new(
            Duration::ZERO,
            StepKind::Move { x: cursor.0, y: cursor.1 },
        ))
    }

    /// Cursor position according to the most recent `Move`.
    pub fn last_cursor(&self) -> Option<Coord2> {
        self.steps.iter().rev().find_map(|step| match step.kind {
            StepKind::Move { x, y } => Some((x, y)),
            _ => None,
        })
    }

    /// Elapsed time of the last entry.
    pub fn duration(&self) -> Duration {
        self.steps.last().map_or(Duration::ZERO, |step| step.elapsed)
    }

    /// Concluding result, if the game has ended.
    pub fn result(&self) -> Option<OpenResult> {
        match self.steps.last()?.kind {
            StepKind::Open { result } if result.is_terminal() => Some(result),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Index of the last entry, `-1` when empty.
    pub fn last_index(&self) -> isize {
        self.steps.len() as isize - 1
    }

    pub fn get(&self, index: usize) -> Option<&HistoryStep> {
        self.steps.get(index)
    }

    pub fn iter(&self) -> core::slice::Iter<'_, HistoryStep> {
        self.steps.iter()
    }

    pub fn steps(&self) -> &[HistoryStep] {
        &self.steps
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = &'a HistoryStep;
    type IntoIter = core::slice::Iter<'a, HistoryStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
