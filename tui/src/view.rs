//! Rendering of the three screens.

use std::time::Instant;

use chrono::{DateTime, Local, Utc};
use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::Modifier;
use ratatui::text::Line;
use ratatui::widgets::{Block, Paragraph, Widget};
use termines_core::{Board, Coord2, FieldFilter, GameInfo};

use crate::app::{App, MenuState, Mode, PlayState, ReplayState};
use crate::theme::Theme;

const GAP: &str = "   ";

pub fn draw(frame: &mut Frame, app: &App) {
    let area = frame.area();
    let theme = app.theme();
    frame.render_widget(Block::default().style(theme.base()), area);

    let [status, body] = Layout::vertical([Constraint::Length(1), Constraint::Fill(1)]).areas(area);
    match app.mode() {
        Mode::Menu => draw_menu(frame, app.menu(), theme, status, body),
        Mode::Play(play) => {
            let text = play_status(play, Instant::now());
            frame.render_widget(Paragraph::new(text).style(theme.base()), status);
            frame.render_widget(
                FieldView::new(play.board(), play.cursor(), play.scroll(), theme),
                body,
            );
        }
        Mode::Replay(state) => {
            let replay = state.replay();
            let cursor = replay.state();
            frame.render_widget(
                Paragraph::new(replay_status(state)).style(theme.base()),
                status,
            );
            frame.render_widget(
                FieldView::new(replay.board(), cursor.cursor, cursor.scroll, theme),
                body,
            );
        }
    }
}

fn draw_menu(frame: &mut Frame, menu: &MenuState, theme: &Theme, status: Rect, body: Rect) {
    frame.render_widget(Paragraph::new(menu_header(menu)).style(theme.base()), status);

    if menu.games().is_empty() {
        let hint = "No saved games yet. Press n to start one, q to quit.";
        frame.render_widget(Paragraph::new(hint).style(theme.base()), body);
        return;
    }

    let lines: Vec<Line> = menu
        .games()
        .iter()
        .enumerate()
        .skip(menu.offset())
        .take(usize::from(body.height))
        .map(|(index, info)| {
            let style = if index == menu.selected() {
                theme.highlight()
            } else {
                theme.base()
            };
            Line::styled(menu_row(index, info), style)
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), body);
}

fn local_date(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
}

pub fn play_status(play: &PlayState, now: Instant) -> String {
    let board = play.board();
    if play.show_stats() {
        let config = board.game_config();
        return format!(
            "{}x{}({}) {:.2}%",
            board.width(),
            board.height(),
            board.mine_count(),
            config.density()
        );
    }
    format!(
        "Mines Left:{}{GAP}Time:{}",
        board.mines_remaining(),
        play.elapsed(now).as_secs()
    )
}

pub fn replay_status(state: &ReplayState) -> String {
    let info = state.info();
    let replay = state.replay();
    let mut text = format!(
        "{}{GAP}Time:{}/{}{GAP}{}x{}({}/{}){GAP}Step:{}/{}{GAP}{}",
        info.result,
        replay.elapsed().as_secs(),
        info.duration.as_secs(),
        info.width,
        info.height,
        replay.board().mines_remaining(),
        info.mines,
        replay.index() + 1,
        replay.history().len(),
        local_date(info.created_at),
    );
    if state.is_autoplaying() {
        text.push_str(GAP);
        text.push_str("AUTOPLAY");
    }
    text
}

pub fn menu_header(menu: &MenuState) -> String {
    let field = match menu.filter() {
        FieldFilter::All => "ALL".to_string(),
        FieldFilter::Exact(config) => {
            format!("{}x{}({})", config.size.0, config.size.1, config.mines)
        }
    };
    format!(
        "Saved Games {field} {}",
        menu.sort().label().to_uppercase()
    )
}

pub fn menu_row(index: usize, info: &GameInfo) -> String {
    format!(
        "{}.{} {}x{}({}) {} {}",
        index + 1,
        info.result,
        info.width,
        info.height,
        info.mines,
        info.duration.as_secs(),
        local_date(info.created_at),
    )
}

/// The visible part of a board, one terminal cell per board cell.
struct FieldView<'a> {
    board: &'a Board,
    cursor: Coord2,
    scroll: Coord2,
    theme: &'a Theme,
}

impl<'a> FieldView<'a> {
    fn new(board: &'a Board, cursor: Coord2, scroll: Coord2, theme: &'a Theme) -> Self {
        Self {
            board,
            cursor,
            scroll,
            theme,
        }
    }
}

impl Widget for FieldView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        for dy in 0..area.height {
            for dx in 0..area.width {
                let pos = (self.scroll.0.saturating_add(dx), self.scroll.1.saturating_add(dy));
                if !self.board.contains(pos) {
                    continue;
                }
                let (glyph, tag) = self.board.cell_at(pos).glyph();
                let mut style = self.theme.cell(tag);
                if pos == self.cursor {
                    style = style.add_modifier(Modifier::REVERSED);
                }
                if let Some(cell) = buf.cell_mut((area.x + dx, area.y + dy)) {
                    cell.set_char(glyph).set_style(style);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::store::GameStore;
    use std::time::Duration;

    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::Terminal;
    use ratatui::backend::TestBackend;
    use termines_core::{GameConfig, SortBy};

    use super::*;
    use crate::app::{Msg, Start};
    use crate::config::Settings;
    use crate::pipeline::Handler;
    use crate::store::MemoryStore;
    use crate::store::tests::record;

    fn render(app: &App, width: u16, height: u16) -> Buffer {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| draw(frame, app)).unwrap();
        terminal.backend().buffer().clone()
    }

    fn row(buffer: &Buffer, y: u16) -> String {
        (0..buffer.area.width)
            .map(|x| buffer[(x, y)].symbol())
            .collect::<String>()
            .trim_end()
            .to_string()
    }

    fn app_with(store: Arc<MemoryStore>, screen: (u16, u16)) -> App {
        App::new(
            Settings::default(),
            store,
            GameConfig::new((5, 3), 2).unwrap(),
            FieldFilter::All,
            screen,
        )
    }

    #[test]
    fn play_screen_shows_status_and_hidden_field() {
        let mut app = app_with(Arc::new(MemoryStore::new()), (30, 5));
        app.start(Start::Play(GameConfig::new((5, 3), 2).unwrap(), Some(7)))
            .unwrap();

        let buffer = render(&app, 30, 5);

        assert_eq!(row(&buffer, 0), "Mines Left:2   Time:0");
        for y in 1..4 {
            assert_eq!(row(&buffer, y), "-----");
        }
        assert_eq!(row(&buffer, 4), "");
        assert!(buffer[(0, 1)].modifier.contains(Modifier::REVERSED));
        assert!(!buffer[(1, 1)].modifier.contains(Modifier::REVERSED));
    }

    #[test]
    fn stats_line_shows_density() {
        let mut app = app_with(Arc::new(MemoryStore::new()), (40, 5));
        app.start(Start::Play(GameConfig::new((5, 3), 2).unwrap(), Some(7)))
            .unwrap();
        app.handle(Msg::Key(KeyEvent::new(KeyCode::Char('?'), KeyModifiers::NONE)));

        let Mode::Play(play) = app.mode() else {
            panic!("expected play mode");
        };
        assert_eq!(play_status(play, Instant::now()), "5x3(2) 13.33%");
    }

    #[test]
    fn menu_lists_games_with_selection() {
        let store = Arc::new(MemoryStore::new());
        let saved = record(true);
        store.save(&saved).unwrap();
        let mut app = app_with(store, (60, 4));
        app.start(Start::Menu).unwrap();

        let buffer = render(&app, 60, 4);

        assert_eq!(row(&buffer, 0), "Saved Games ALL LATEST");
        assert_eq!(row(&buffer, 1), menu_row(0, &saved.info));
        assert!(row(&buffer, 1).starts_with("1.WON 2x1(1) 0 "));
        assert!(buffer[(0, 1)].modifier.contains(Modifier::REVERSED));
    }

    #[test]
    fn empty_menu_shows_a_hint() {
        let mut app = app_with(Arc::new(MemoryStore::new()), (60, 4));
        app.start(Start::Menu).unwrap();

        let buffer = render(&app, 60, 4);

        assert!(row(&buffer, 1).starts_with("No saved games yet."));
    }

    #[test]
    fn header_names_an_exact_filter() {
        let filter = FieldFilter::Exact(GameConfig::new((9, 9), 10).unwrap());
        let menu = MenuState::new(SortBy::Best, filter);

        assert_eq!(menu_header(&menu), "Saved Games 9x9(10) BEST");
    }

    #[test]
    fn replay_status_line() {
        let store = Arc::new(MemoryStore::new());
        let mut saved = record(false);
        saved.info.duration = Duration::from_secs(3);
        store.save(&saved).unwrap();
        let mut app = app_with(store, (100, 4));
        app.start(Start::Menu).unwrap();
        app.handle(Msg::Key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)));

        let Mode::Replay(state) = app.mode() else {
            panic!("expected replay mode");
        };
        let expected = format!(
            "LOST   Time:0/3   2x1(0/1)   Step:2/2   {}",
            local_date(saved.info.created_at)
        );
        assert_eq!(replay_status(state), expected);

        let buffer = render(&app, 100, 4);
        assert_eq!(row(&buffer, 1), "-M");
    }
}
