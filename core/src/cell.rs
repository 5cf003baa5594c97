use serde::{Deserialize, Serialize};

/// What lies under a cell; fixed once the board is generated.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellValue {
    Count(u8),
    Mine,
}

impl CellValue {
    pub const fn is_mine(self) -> bool {
        matches!(self, Self::Mine)
    }

    pub const fn is_zero(self) -> bool {
        matches!(self, Self::Count(0))
    }
}

impl Default for CellValue {
    fn default() -> Self {
        Self::Count(0)
    }
}

/// Player-visible state of a cell.
///
/// Valid transitions are `Hidden <-> Flagged` and `Hidden -> Opened`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CellState {
    Hidden,
    Flagged,
    Opened,
}

impl Default for CellState {
    fn default() -> Self {
        Self::Hidden
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub value: CellValue,
    pub state: CellState,
}

impl Cell {
    pub const fn new(value: CellValue) -> Self {
        Self {
            value,
            state: CellState::Hidden,
        }
    }

    pub const fn is_mine(self) -> bool {
        self.value.is_mine()
    }

    pub const fn is_hidden(self) -> bool {
        matches!(self.state, CellState::Hidden)
    }

    pub const fn is_flagged(self) -> bool {
        matches!(self.state, CellState::Flagged)
    }

    pub const fn is_opened(self) -> bool {
        matches!(self.state, CellState::Opened)
    }

    /// Glyph and symbolic style for the renderer; colours are bound elsewhere.
    pub const fn glyph(self) -> (char, StyleTag) {
        use CellState::*;
        use CellValue::*;

        match (self.state, self.value) {
            (Hidden, _) => ('-', StyleTag::Hidden),
            (Flagged, _) => ('F', StyleTag::Flag),
            (Opened, Mine) => ('M', StyleTag::Mine),
            (Opened, Count(n)) => (count_glyph(n), StyleTag::Count(n)),
        }
    }
}

const fn count_glyph(n: u8) -> char {
    match n {
        0..=9 => (b'0' + n) as char,
        _ => '?',
    }
}

/// Symbolic render category of a cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum StyleTag {
    Hidden,
    Flag,
    Mine,
    Count(u8),
}

impl StyleTag {
    pub const fn name(self) -> &'static str {
        use StyleTag::*;
        match self {
            Hidden => "hidden",
            Flag => "flag",
            Mine => "mine",
            Count(0) => "count-0",
            Count(1) => "count-1",
            Count(2) => "count-2",
            Count(3) => "count-3",
            Count(4) => "count-4",
            Count(5) => "count-5",
            Count(6) => "count-6",
            Count(7) => "count-7",
            Count(_) => "count-8",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_and_flagged_hide_the_value() {
        let mine = Cell::new(CellValue::Mine);
        assert_eq!(mine.glyph(), ('-', StyleTag::Hidden));

        let flagged = Cell {
            value: CellValue::Count(3),
            state: CellState::Flagged,
        };
        assert_eq!(flagged.glyph(), ('F', StyleTag::Flag));
    }

    #[test]
    fn opened_cells_show_value() {
        let opened = Cell {
            value: CellValue::Count(7),
            state: CellState::Opened,
        };
        assert_eq!(opened.glyph(), ('7', StyleTag::Count(7)));
        assert_eq!(opened.glyph().1.name(), "count-7");

        let mine = Cell {
            value: CellValue::Mine,
            state: CellState::Opened,
        };
        assert_eq!(mine.glyph(), ('M', StyleTag::Mine));
    }
}
