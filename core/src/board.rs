use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::*;

/// Minesweeper grid with all gameplay mutation rules.
///
/// Coordinates are expected to be in bounds; callers clamp them through the
/// viewport before they reach the board, an out-of-range index panics.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Board {
    cells: Array2<Cell>,
    mine_count: CellCount,
    opened_safe: CellCount,
}

impl Board {
    pub fn new(mine_layout: &MineLayout) -> Self {
        let size = mine_layout.size();
        let cells = Array2::from_shape_fn(size.to_nd_index(), |(x, y)| {
            let coords = (x as Coord, y as Coord);
            if mine_layout.contains_mine(coords) {
                Cell::new(CellValue::Mine)
            } else {
                Cell::new(CellValue::Count(mine_layout.adjacent_mine_count(coords)))
            }
        });
        Self {
            cells,
            mine_count: mine_layout.mine_count(),
            opened_safe: 0,
        }
    }

    /// Generates a fresh random board for `config`, reproducible per `seed`.
    pub fn generate(config: GameConfig, seed: u64) -> Self {
        Self::new(&RandomMinefieldGenerator::new(seed).generate(config))
    }

    /// Rebuilds a board from a stored cell grid.
    pub fn from_cells(cells: Array2<Cell>) -> Result<Self> {
        let (w, h) = cells.dim();
        if w == 0 || h == 0 || w > Coord::MAX as usize || h > Coord::MAX as usize {
            return Err(GameError::InvalidBoardShape);
        }

        let mut board = Self {
            cells,
            mine_count: 0,
            opened_safe: 0,
        };
        for cell in board.cells.iter() {
            if cell.is_mine() {
                board.mine_count += 1;
            } else if cell.is_opened() {
                board.opened_safe += 1;
            }
        }
        Ok(board)
    }

    pub fn cells(&self) -> &Array2<Cell> {
        &self.cells
    }

    pub fn size(&self) -> Coord2 {
        let dim = self.cells.dim();
        (dim.0 as Coord, dim.1 as Coord)
    }

    pub fn width(&self) -> Coord {
        self.size().0
    }

    pub fn height(&self) -> Coord {
        self.size().1
    }

    pub fn contains(&self, coords: Coord2) -> bool {
        let size = self.size();
        coords.0 < size.0 && coords.1 < size.1
    }

    pub fn cell_at(&self, coords: Coord2) -> Cell {
        self.cells[coords.to_nd_index()]
    }

    pub fn game_config(&self) -> GameConfig {
        GameConfig::new_unchecked(self.size(), self.mine_count)
    }

    pub fn mine_count(&self) -> CellCount {
        self.mine_count
    }

    /// Total mines minus opened mines minus flags; negative when over-flagged.
    pub fn mines_remaining(&self) -> i64 {
        let mut remaining = i64::from(self.mine_count);
        for cell in self.cells.iter() {
            if cell.is_flagged() || (cell.is_mine() && cell.is_opened()) {
                remaining -= 1;
            }
        }
        remaining
    }

    /// Won iff every non-mine cell is opened.
    pub fn is_won(&self) -> bool {
        self.opened_safe == self.safe_cell_count()
    }

    fn safe_cell_count(&self) -> CellCount {
        self.total_cells() - self.mine_count
    }

    fn total_cells(&self) -> CellCount {
        self.cells.len() as CellCount
    }

    pub fn flag(&mut self, coords: Coord2) -> MarkOutcome {
        use CellState::*;

        let cell = &mut self.cells[coords.to_nd_index()];
        match cell.state {
            Hidden => {
                cell.state = Flagged;
                MarkOutcome::Changed
            }
            Flagged => {
                cell.state = Hidden;
                MarkOutcome::Changed
            }
            Opened => MarkOutcome::NoChange,
        }
    }

    /// Opens a hidden cell, or chords an opened one.
    pub fn open(&mut self, coords: Coord2) -> OpenResult {
        let cell = self.cell_at(coords);
        match cell.state {
            CellState::Hidden => {
                if cell.is_mine() {
                    return OpenResult::Lost;
                }
                self.open_single(coords);
                self.clear_zeroes_from(coords);
                self.win_or_none()
            }
            CellState::Opened => self.chord(coords, cell),
            CellState::Flagged => OpenResult::None,
        }
    }

    fn chord(&mut self, coords: Coord2, cell: Cell) -> OpenResult {
        let CellValue::Count(count) = cell.value else {
            return OpenResult::None;
        };

        if self.count_flagged_neighbors(coords) != count {
            return OpenResult::None;
        }

        let mis_flagged = self.iter_neighbors(coords).any(|pos| {
            let neighbor = self.cell_at(pos);
            neighbor.is_flagged() != neighbor.is_mine()
        });
        if mis_flagged {
            return OpenResult::Lost;
        }

        for pos in self.iter_neighbors(coords) {
            if !self.cell_at(pos).is_flagged() {
                self.open_single(pos);
                self.clear_zeroes_from(pos);
            }
        }
        self.win_or_none()
    }

    fn win_or_none(&self) -> OpenResult {
        if self.is_won() {
            OpenResult::Won
        } else {
            OpenResult::None
        }
    }

    fn open_single(&mut self, coords: Coord2) {
        let cell = &mut self.cells[coords.to_nd_index()];
        if cell.is_hidden() {
            cell.state = CellState::Opened;
            if !cell.is_mine() {
                self.opened_safe += 1;
            }
        }
    }

    /// Flood-fill from a zero cell: hidden neighbours open, zero neighbours expand.
    fn clear_zeroes_from(&mut self, start: Coord2) {
        if !self.cell_at(start).value.is_zero() {
            return;
        }

        let mut to_visit = vec![start];
        while let Some(coords) = to_visit.pop() {
            for pos in self.iter_neighbors(coords) {
                let neighbor = self.cell_at(pos);
                if !neighbor.is_hidden() {
                    continue;
                }
                self.open_single(pos);
                if neighbor.value.is_zero() {
                    to_visit.push(pos);
                }
            }
        }
    }

    /// Reveals every hidden mine; display only, used once a game is over.
    pub fn open_all_mines(&mut self) {
        for cell in self.cells.iter_mut() {
            if cell.is_mine() && cell.is_hidden() {
                cell.state = CellState::Opened;
            }
        }
    }

    /// Resets every cell to hidden, keeping the values.
    pub fn close_all(&mut self) {
        for cell in self.cells.iter_mut() {
            cell.state = CellState::Hidden;
        }
        self.opened_safe = 0;
    }

    pub fn hidden_copy(&self) -> Self {
        let mut copy = self.clone();
        copy.close_all();
        copy
    }

    fn count_flagged_neighbors(&self, coords: Coord2) -> u8 {
        self.iter_neighbors(coords)
            .filter(|&pos| self.cell_at(pos).is_flagged())
            .count() as u8
    }

    pub fn iter_neighbors(&self, coords: Coord2) -> NeighborIter {
        self.cells.iter_neighbors(coords)
    }
}
