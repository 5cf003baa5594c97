//! Key bindings for each mode.

use std::time::{Duration, Instant};

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use termines_core::Direction;

/// Window for double presses (`q q`, `m m`) and the `s` arrow prefix.
pub const DOUBLE_PRESS: Duration = Duration::from_millis(500);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PlayKey {
    Move(Direction),
    BigMove(Direction),
    /// Small move, or a big one right after the `s` prefix.
    Arrow(Direction),
    BigPrefix,
    Open,
    Flag,
    Scroll(Direction),
    Page(Direction),
    ToggleStats,
    Quit,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ReplayKey {
    Next,
    Prev,
    First,
    Last,
    Autoplay,
    Restart,
    Back,
    Delete,
    Scroll(Direction),
    Page(Direction),
    Quit,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MenuKey {
    Down,
    Up,
    Open,
    NewGame,
    CycleSort,
    Delete,
    Quit,
}

fn arrow(code: KeyCode) -> Option<Direction> {
    match code {
        KeyCode::Up => Some(Direction::Up),
        KeyCode::Down => Some(Direction::Down),
        KeyCode::Left => Some(Direction::Left),
        KeyCode::Right => Some(Direction::Right),
        _ => None,
    }
}

fn scroll_letter(c: char) -> Option<Direction> {
    match c.to_ascii_lowercase() {
        'i' => Some(Direction::Up),
        'u' => Some(Direction::Down),
        'y' => Some(Direction::Left),
        'o' => Some(Direction::Right),
        _ => None,
    }
}

fn move_letter(c: char) -> Option<Direction> {
    match c.to_ascii_lowercase() {
        'k' => Some(Direction::Up),
        'j' => Some(Direction::Down),
        'h' => Some(Direction::Left),
        'l' => Some(Direction::Right),
        _ => None,
    }
}

pub fn is_ctrl_c(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && matches!(key.code, KeyCode::Char('c'))
}

pub fn play_key(key: KeyEvent) -> Option<PlayKey> {
    if let Some(dir) = arrow(key.code) {
        return Some(PlayKey::Arrow(dir));
    }
    let KeyCode::Char(c) = key.code else {
        return None;
    };

    if let Some(dir) = move_letter(c) {
        return Some(if c.is_ascii_uppercase() {
            PlayKey::BigMove(dir)
        } else {
            PlayKey::Move(dir)
        });
    }
    if let Some(dir) = scroll_letter(c) {
        return Some(if c.is_ascii_uppercase() {
            PlayKey::Page(dir)
        } else {
            PlayKey::Scroll(dir)
        });
    }
    match c {
        'd' | 'D' => Some(PlayKey::Open),
        'f' | 'F' => Some(PlayKey::Flag),
        's' => Some(PlayKey::BigPrefix),
        '?' => Some(PlayKey::ToggleStats),
        'q' => Some(PlayKey::Quit),
        _ => None,
    }
}

pub fn replay_key(key: KeyEvent) -> Option<ReplayKey> {
    match key.code {
        KeyCode::Right => return Some(ReplayKey::Next),
        KeyCode::Left => return Some(ReplayKey::Prev),
        KeyCode::Down => return Some(ReplayKey::First),
        KeyCode::Up => return Some(ReplayKey::Last),
        KeyCode::Esc => return Some(ReplayKey::Quit),
        _ => {}
    }
    let KeyCode::Char(c) = key.code else {
        return None;
    };

    if let Some(dir) = scroll_letter(c) {
        return Some(if c.is_ascii_uppercase() {
            ReplayKey::Page(dir)
        } else {
            ReplayKey::Scroll(dir)
        });
    }
    match c {
        'l' => Some(ReplayKey::Next),
        'h' => Some(ReplayKey::Prev),
        'j' => Some(ReplayKey::First),
        'k' => Some(ReplayKey::Last),
        'p' => Some(ReplayKey::Autoplay),
        'r' => Some(ReplayKey::Restart),
        'b' => Some(ReplayKey::Back),
        'm' => Some(ReplayKey::Delete),
        'q' => Some(ReplayKey::Quit),
        _ => None,
    }
}

pub fn menu_key(key: KeyEvent) -> Option<MenuKey> {
    match key.code {
        KeyCode::Down | KeyCode::Char('j') => Some(MenuKey::Down),
        KeyCode::Up | KeyCode::Char('k') => Some(MenuKey::Up),
        KeyCode::Enter | KeyCode::Tab | KeyCode::Char(' ' | 'd') => Some(MenuKey::Open),
        KeyCode::Char('n') => Some(MenuKey::NewGame),
        KeyCode::Char('s') => Some(MenuKey::CycleSort),
        KeyCode::Char('m') => Some(MenuKey::Delete),
        KeyCode::Esc | KeyCode::Char('q') => Some(MenuKey::Quit),
        _ => None,
    }
}

/// Detects a key pressed twice within [`DOUBLE_PRESS`].
#[derive(Copy, Clone, Debug, Default)]
pub struct DoublePress {
    last: Option<Instant>,
}

impl DoublePress {
    /// Registers a press; true when it completes a double press.
    pub fn press(&mut self, now: Instant) -> bool {
        match self.last.take() {
            Some(prev) if now.saturating_duration_since(prev) < DOUBLE_PRESS => true,
            _ => {
                self.last = Some(now);
                false
            }
        }
    }
}
