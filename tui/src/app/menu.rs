use std::time::Instant;

use termines_core::{FieldFilter, GameInfo, SortBy};
use uuid::Uuid;

use crate::keys::{DOUBLE_PRESS, MenuKey};
use crate::store::{GameStore, StoreError};

#[derive(Debug, PartialEq, Eq)]
pub enum MenuOutcome {
    Continue,
    Open(Uuid),
    NewGame,
    Quit,
}

/// The saved-games list.
#[derive(Debug)]
pub struct MenuState {
    sort: SortBy,
    filter: FieldFilter,
    games: Vec<GameInfo>,
    selected: usize,
    /// First list entry on screen.
    offset: usize,
    last_delete: Option<(Instant, usize)>,
}

impl MenuState {
    pub fn new(sort: SortBy, filter: FieldFilter) -> Self {
        Self {
            sort,
            filter,
            games: Vec::new(),
            selected: 0,
            offset: 0,
            last_delete: None,
        }
    }

    pub fn sort(&self) -> SortBy {
        self.sort
    }

    pub fn filter(&self) -> &FieldFilter {
        &self.filter
    }

    pub fn games(&self) -> &[GameInfo] {
        &self.games
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Re-reads the list, keeping the selection in range.
    pub fn reload(&mut self, store: &dyn GameStore) -> Result<(), StoreError> {
        self.games = store.list_prepared(self.sort, &self.filter)?;
        self.selected = self.selected.min(self.games.len().saturating_sub(1));
        self.offset = self.offset.min(self.selected);
        log::debug!("{} saved games listed by {}", self.games.len(), self.sort.label());
        Ok(())
    }

    pub fn reset_scroll(&mut self) {
        self.selected = 0;
        self.offset = 0;
    }

    /// `rows` is the number of list entries that fit on screen.
    pub fn handle(
        &mut self,
        key: MenuKey,
        rows: usize,
        now: Instant,
        store: &dyn GameStore,
    ) -> Result<MenuOutcome, StoreError> {
        use MenuKey::*;

        let rows = rows.max(1);
        match key {
            Down => self.down(rows),
            Up => self.up(rows),
            Open => {
                if let Some(info) = self.games.get(self.selected) {
                    return Ok(MenuOutcome::Open(info.id));
                }
            }
            NewGame => return Ok(MenuOutcome::NewGame),
            CycleSort => {
                self.sort = self.sort.next();
                self.reset_scroll();
                self.reload(store)?;
            }
            Delete => self.delete(now, store)?,
            Quit => return Ok(MenuOutcome::Quit),
        }
        Ok(MenuOutcome::Continue)
    }

    fn down(&mut self, rows: usize) {
        if self.games.is_empty() {
            return;
        }
        if self.selected + 1 == self.games.len() {
            self.reset_scroll();
        } else {
            self.selected += 1;
            if self.selected - self.offset >= rows {
                self.offset += 1;
            }
        }
    }

    fn up(&mut self, rows: usize) {
        if self.games.is_empty() {
            return;
        }
        if self.selected == 0 {
            self.selected = self.games.len() - 1;
            self.offset = self.games.len().saturating_sub(rows);
        } else {
            self.selected -= 1;
            if self.selected < self.offset {
                self.offset -= 1;
            }
        }
    }

    fn delete(&mut self, now: Instant, store: &dyn GameStore) -> Result<(), StoreError> {
        let confirmed = self.last_delete.take().is_some_and(|(at, index)| {
            index == self.selected && now.saturating_duration_since(at) < DOUBLE_PRESS
        });
        if !confirmed {
            self.last_delete = Some((now, self.selected));
            return Ok(());
        }

        let Some(info) = self.games.get(self.selected) else {
            return Ok(());
        };
        let id = info.id;
        store.delete(id)?;
        log::info!("deleted game {id}");
        self.reload(store)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::store::MemoryStore;
    use crate::store::tests::record;

    fn filled(count: usize) -> (MemoryStore, MenuState) {
        let store = MemoryStore::new();
        for i in 0..count {
            store.save(&record(i % 2 == 0)).unwrap();
        }
        let mut menu = MenuState::new(SortBy::Latest, FieldFilter::All);
        menu.reload(&store).unwrap();
        (store, menu)
    }

    #[test]
    fn selection_wraps_and_scrolls() {
        let (store, mut menu) = filled(5);
        let now = Instant::now();
        let press = |menu: &mut MenuState, key| {
            menu.handle(key, 2, now, &store).unwrap();
            (menu.selected(), menu.offset())
        };

        assert_eq!(press(&mut menu, MenuKey::Down), (1, 0));
        assert_eq!(press(&mut menu, MenuKey::Down), (2, 1));
        press(&mut menu, MenuKey::Down);
        assert_eq!(press(&mut menu, MenuKey::Down), (4, 3));
        assert_eq!(press(&mut menu, MenuKey::Down), (0, 0));
        assert_eq!(press(&mut menu, MenuKey::Up), (4, 3));
        assert_eq!(press(&mut menu, MenuKey::Up), (3, 3));
        assert_eq!(press(&mut menu, MenuKey::Up), (2, 2));
    }

    #[test]
    fn open_returns_the_selected_game() {
        let (store, mut menu) = filled(2);
        let now = Instant::now();
        menu.handle(MenuKey::Down, 10, now, &store).unwrap();

        let expected = menu.games()[1].id;
        assert_eq!(
            menu.handle(MenuKey::Open, 10, now, &store).unwrap(),
            MenuOutcome::Open(expected)
        );

        let (store, mut empty) = filled(0);
        assert_eq!(
            empty.handle(MenuKey::Open, 10, now, &store).unwrap(),
            MenuOutcome::Continue
        );
    }

    #[test]
    fn delete_needs_two_presses_on_the_same_entry() {
        let (store, mut menu) = filled(3);
        let t0 = Instant::now();
        let ms = Duration::from_millis;

        menu.handle(MenuKey::Delete, 10, t0, &store).unwrap();
        menu.handle(MenuKey::Down, 10, t0, &store).unwrap();
        menu.handle(MenuKey::Delete, 10, t0 + ms(100), &store).unwrap();
        assert_eq!(menu.games().len(), 3);

        menu.handle(MenuKey::Down, 10, t0, &store).unwrap();
        let doomed = menu.games()[2].id;
        menu.handle(MenuKey::Delete, 10, t0 + ms(200), &store).unwrap();
        menu.handle(MenuKey::Delete, 10, t0 + ms(300), &store).unwrap();

        assert_eq!(menu.games().len(), 2);
        assert!(menu.games().iter().all(|info| info.id != doomed));
        assert_eq!(menu.selected(), 1);
        assert_eq!(store.list().unwrap().len(), 2);
    }

    #[test]
    fn cycling_sort_reloads_from_the_top() {
        let (store, mut menu) = filled(3);
        let now = Instant::now();
        menu.handle(MenuKey::Down, 10, now, &store).unwrap();

        menu.handle(MenuKey::CycleSort, 10, now, &store).unwrap();

        assert_eq!(menu.sort(), SortBy::Oldest);
        assert_eq!(menu.selected(), 0);
        assert_eq!(menu.games().len(), 3);
    }
}
