use thiserror::Error;

use crate::OpenResult;

#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("Invalid coordinates")]
    InvalidCoords,
    #[error("Too many mines")]
    TooManyMines,
    #[error("Board shape does not match declared size")]
    InvalidBoardShape,
    #[error("Game already concluded, no new steps are accepted")]
    HistoryConcluded,
    #[error("Game has not concluded yet")]
    GameInProgress,
    #[error("Replay diverged at step {index}: recorded {recorded:?}, computed {computed:?}")]
    ReplayDivergence {
        index: usize,
        recorded: OpenResult,
        computed: OpenResult,
    },
    #[error("Step index {0} is outside the history")]
    StepOutOfRange(isize),
}

pub type Result<T> = core::result::Result<T, GameError>;
