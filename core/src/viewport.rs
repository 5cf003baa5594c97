//! Cursor movement and the scroll window that follows it.

use serde::{Deserialize, Serialize};

use crate::*;

/// Visible window over the board, in cells.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: Coord,
    pub height: Coord,
    /// Requested minimum distance between cursor and window edge.
    pub max_scrolloff: Coord,
}

impl Viewport {
    pub const fn new(width: Coord, height: Coord, max_scrolloff: Coord) -> Self {
        Self {
            width,
            height,
            max_scrolloff,
        }
    }

    pub const fn scrolloff_x(&self) -> Coord {
        effective_scrolloff(self.width, self.max_scrolloff)
    }

    pub const fn scrolloff_y(&self) -> Coord {
        effective_scrolloff(self.height, self.max_scrolloff)
    }

    /// Restores the scrolloff invariant on both axes.
    pub fn align(&self, cursor: Coord2, scroll: Coord2) -> Coord2 {
        (
            align_axis(cursor.0, scroll.0, self.width, self.scrolloff_x()),
            align_axis(cursor.1, scroll.1, self.height, self.scrolloff_y()),
        )
    }

    /// Moves the window without moving the cursor.
    ///
    /// Small scrolls nudge by one and only clamp at zero; big scrolls page so the
    /// cursor lands on the opposite scrolloff edge.
    pub fn scroll(&self, direction: Direction, big: bool, cursor: Coord2, scroll: Coord2) -> Coord2 {
        use Direction::*;

        let (mut sx, mut sy) = scroll;
        if !big {
            match direction {
                Up => sy = sy.saturating_sub(1),
                Down => sy = sy.saturating_add(1),
                Left => sx = sx.saturating_sub(1),
                Right => sx = sx.saturating_add(1),
            }
            return (sx, sy);
        }

        let (cx, cy) = cursor;
        match direction {
            Up => sy = trailing_edge(cy, self.height, self.scrolloff_y()),
            Down => sy = cy.saturating_sub(self.scrolloff_y()),
            Left => sx = trailing_edge(cx, self.width, self.scrolloff_x()),
            Right => sx = cx.saturating_sub(self.scrolloff_x()),
        }
        (sx, sy)
    }
}

const fn effective_scrolloff(size: Coord, max: Coord) -> Coord {
    if size == 0 {
        return 0;
    }
    let half = (size - 1) / 2;
    if max < half { max } else { half }
}

/// Scroll that puts `cursor` exactly `margin` cells above the window's far edge.
fn trailing_edge(cursor: Coord, size: Coord, margin: Coord) -> Coord {
    let scroll = i64::from(cursor) - i64::from(size) + i64::from(margin) + 1;
    scroll.max(0) as Coord
}

fn align_axis(cursor: Coord, scroll: Coord, size: Coord, margin: Coord) -> Coord {
    if size == 0 {
        return scroll;
    }

    let offset = i64::from(cursor) - i64::from(scroll);
    if offset < i64::from(margin) {
        cursor.saturating_sub(margin)
    } else if offset > i64::from(size) - i64::from(margin) - 1 {
        trailing_edge(cursor, size, margin)
    } else {
        scroll
    }
}

/// Single-cell cursor move, clamped to the board.
pub fn step(board: &Board, direction: Direction, cursor: Coord2) -> Coord2 {
    apply_delta(cursor, direction.delta(), board.size()).unwrap_or(cursor)
}

/// Jumps to the next boundary between hidden and revealed cells.
///
/// From a revealed cell, runs until the first hidden cell (or the edge). From a
/// hidden cell, steps once if the next cell is revealed, otherwise runs to the
/// last hidden cell before a revealed one. Flags count as revealed.
pub fn big_move(board: &Board, direction: Direction, cursor: Coord2) -> Coord2 {
    let is_hidden = |pos: Coord2| board.cell_at(pos).is_hidden();
    let next = |pos: Coord2| apply_delta(pos, direction.delta(), board.size());

    let Some(first) = next(cursor) else {
        return cursor;
    };

    if !is_hidden(cursor) {
        let mut pos = first;
        while !is_hidden(pos) {
            match next(pos) {
                Some(following) => pos = following,
                None => break,
            }
        }
        return pos;
    }

    if !is_hidden(first) {
        return first;
    }

    let mut pos = cursor;
    while let Some(following) = next(pos) {
        if !is_hidden(following) {
            break;
        }
        pos = following;
    }
    pos
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scrolloff_degrades_to_half_window() {
        assert_eq!(Viewport::new(80, 5, 2).scrolloff_x(), 2);
        assert_eq!(Viewport::new(80, 5, 2).scrolloff_y(), 2);
        assert_eq!(Viewport::new(4, 3, 2).scrolloff_x(), 1);
        assert_eq!(Viewport::new(4, 3, 2).scrolloff_y(), 1);
        assert_eq!(Viewport::new(1, 0, 2).scrolloff_x(), 0);
        assert_eq!(Viewport::new(1, 0, 2).scrolloff_y(), 0);
    }

    #[test]
    fn align_keeps_margin() {
        let viewport = Viewport::new(10, 10, 2);

        // cursor near the bottom edge pushes the window down
        assert_eq!(viewport.align((0, 9), (0, 0)), (0, 2));
        // cursor near the top edge pulls it back up
        assert_eq!(viewport.align((0, 3), (0, 2)), (0, 1));
        // inside the comfortable zone nothing moves
        assert_eq!(viewport.align((5, 5), (1, 1)), (1, 1));
        // never negative
        assert_eq!(viewport.align((1, 0), (4, 4)), (0, 0));
    }

    #[test]
    fn align_is_idempotent() {
        let viewports = [
            Viewport::new(10, 7, 2),
            Viewport::new(1, 1, 3),
            Viewport::new(4, 2, 5),
            Viewport::new(0, 0, 2),
        ];
        for viewport in viewports {
            for cursor in 0..30 {
                for scroll in 0..30 {
                    let once = viewport.align((cursor, cursor), (scroll, scroll));
                    let twice = viewport.align((cursor, cursor), once);
                    assert_eq!(once, twice, "{viewport:?} cursor {cursor} scroll {scroll}");
                }
            }
        }
    }

    #[test]
    fn small_scroll_floors_at_zero() {
        let viewport = Viewport::new(10, 10, 2);

        assert_eq!(viewport.scroll(Direction::Up, false, (0, 0), (0, 0)), (0, 0));
        assert_eq!(viewport.scroll(Direction::Down, false, (0, 0), (0, 0)), (0, 1));
        assert_eq!(viewport.scroll(Direction::Right, false, (0, 0), (3, 0)), (4, 0));
        assert_eq!(viewport.scroll(Direction::Left, false, (0, 0), (3, 0)), (2, 0));
    }

    #[test]
    fn big_scroll_pages_one_window() {
        let viewport = Viewport::new(10, 10, 2);

        assert_eq!(viewport.scroll(Direction::Down, true, (20, 20), (0, 0)), (0, 18));
        assert_eq!(viewport.scroll(Direction::Up, true, (20, 20), (0, 18)), (0, 13));
        assert_eq!(viewport.scroll(Direction::Right, true, (20, 20), (0, 0)), (18, 0));
        assert_eq!(viewport.scroll(Direction::Left, true, (3, 3), (9, 9)), (0, 9));
    }

    fn row_board(opened: &[Coord]) -> Board {
        let mut cells = ndarray::Array2::<Cell>::default([8, 1]);
        for &x in opened {
            cells[[x as usize, 0]].state = CellState::Opened;
        }
        Board::from_cells(cells).unwrap()
    }

    #[test]
    fn big_move_from_revealed_runs_to_hidden() {
        let board = row_board(&[0, 1, 2]);
        assert_eq!(big_move(&board, Direction::Right, (0, 0)), (3, 0));
    }

    #[test]
    fn big_move_from_hidden_steps_onto_revealed() {
        let board = row_board(&[4]);
        assert_eq!(big_move(&board, Direction::Right, (3, 0)), (4, 0));
    }

    #[test]
    fn big_move_from_hidden_runs_to_region_end() {
        let board = row_board(&[5]);
        assert_eq!(big_move(&board, Direction::Right, (0, 0)), (4, 0));
        assert_eq!(big_move(&board, Direction::Left, (4, 0)), (0, 0));
    }

    #[test]
    fn big_move_stops_at_edges() {
        let board = row_board(&[5, 6, 7]);
        assert_eq!(big_move(&board, Direction::Right, (5, 0)), (7, 0));
        assert_eq!(big_move(&board, Direction::Right, (7, 0)), (7, 0));
        assert_eq!(big_move(&board, Direction::Up, (2, 0)), (2, 0));
    }

    #[test]
    fn step_clamps_to_board() {
        let board = row_board(&[]);
        assert_eq!(step(&board, Direction::Left, (0, 0)), (0, 0));
        assert_eq!(step(&board, Direction::Right, (0, 0)), (1, 0));
        assert_eq!(step(&board, Direction::Down, (0, 0)), (0, 0));
    }
}
