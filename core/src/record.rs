use core::cmp::Ordering;
use core::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::*;

/// Summary of a finished game, listed without loading the board.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameInfo {
    pub id: Uuid,
    pub duration: Duration,
    pub result: OpenResult,
    pub width: Coord,
    pub height: Coord,
    pub mines: CellCount,
    pub created_at: DateTime<Utc>,
}

impl GameInfo {
    pub fn game_config(&self) -> GameConfig {
        GameConfig::new_unchecked((self.width, self.height), self.mines)
    }

    pub fn is_won(&self) -> bool {
        self.result == OpenResult::Won
    }
}

/// Everything needed to replay a finished game.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameData {
    pub id: Uuid,
    /// Fully hidden snapshot of the board.
    pub board: Board,
    pub history: History,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GameRecord {
    pub info: GameInfo,
    pub data: GameData,
}

impl GameRecord {
    /// Builds the record of a concluded game with a fresh id.
    pub fn conclude(board: &Board, history: History) -> Result<Self> {
        Self::with_identity(Uuid::new_v4(), Utc::now(), board, history)
    }

    pub fn with_identity(
        id: Uuid,
        created_at: DateTime<Utc>,
        board: &Board,
        history: History,
    ) -> Result<Self> {
        let result = history.result().ok_or(GameError::GameInProgress)?;
        let (width, height) = board.size();

        let info = GameInfo {
            id,
            duration: history.duration(),
            result,
            width,
            height,
            mines: board.mine_count(),
            created_at,
        };
        let data = GameData {
            id,
            board: board.hidden_copy(),
            history,
        };
        Ok(Self { info, data })
    }
}

/// Order of the saved-games list.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    #[default]
    Latest,
    Oldest,
    Best,
    Worst,
}

impl SortBy {
    pub const ALL: [Self; 4] = [Self::Latest, Self::Oldest, Self::Best, Self::Worst];

    pub const fn label(self) -> &'static str {
        match self {
            Self::Latest => "Latest",
            Self::Oldest => "Oldest",
            Self::Best => "Best",
            Self::Worst => "Worst",
        }
    }

    /// Next ordering in the cycle.
    pub const fn next(self) -> Self {
        match self {
            Self::Latest => Self::Oldest,
            Self::Oldest => Self::Best,
            Self::Best => Self::Worst,
            Self::Worst => Self::Latest,
        }
    }
}

impl core::str::FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> core::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|sort| sort.label().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown sort order `{s}`"))
    }
}

/// Which saved games to show.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldFilter {
    #[default]
    All,
    Exact(GameConfig),
}

impl FieldFilter {
    pub fn matches(&self, info: &GameInfo) -> bool {
        match self {
            Self::All => true,
            Self::Exact(config) => info.game_config() == *config,
        }
    }
}

fn best_first(a: &GameInfo, b: &GameInfo) -> Ordering {
    b.is_won()
        .cmp(&a.is_won())
        .then_with(|| a.duration.cmp(&b.duration))
}

pub fn sort_infos(infos: &mut [GameInfo], sort: SortBy) {
    match sort {
        SortBy::Latest => infos.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        SortBy::Oldest => infos.sort_by(|a, b| a.created_at.cmp(&b.created_at)),
        SortBy::Best => infos.sort_by(best_first),
        SortBy::Worst => {
            infos.sort_by(best_first);
            infos.reverse();
        }
    }
}

pub fn filter_infos(infos: Vec<GameInfo>, filter: &FieldFilter) -> Vec<GameInfo> {
    infos.into_iter().filter(|info| filter.matches(info)).collect()
}

/// Sorts then filters a freshly listed set of games.
pub fn prepare_infos(mut infos: Vec<GameInfo>, sort: SortBy, filter: &FieldFilter) -> Vec<GameInfo> {
    sort_infos(&mut infos, sort);
    filter_infos(infos, filter)
}
