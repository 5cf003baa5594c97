//! Persistence for finished games.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use sled::IVec;
use termines_core::{FieldFilter, GameData, GameInfo, GameRecord, SortBy, prepare_infos};
use thiserror::Error;
use uuid::Uuid;

const DB_DIR: &str = "data.db";
const TREE_INFO: &str = "game_info";
const TREE_DATA: &str = "game_data";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),
    #[error("serialization error: {0}")]
    Bincode(#[from] bincode::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("record not found: {0}")]
    NotFound(String),
}

/// Storage for the two halves of a game record, both keyed by the game id.
pub trait GameStore: Send + Sync {
    fn put_info(&self, info: &GameInfo) -> Result<(), StoreError>;

    fn put_data(&self, data: &GameData) -> Result<(), StoreError>;

    /// Fails unless both halves are present.
    fn get(&self, id: Uuid) -> Result<(GameInfo, GameData), StoreError>;

    /// Every stored summary, in no particular order.
    fn list(&self) -> Result<Vec<GameInfo>, StoreError>;

    fn delete(&self, id: Uuid) -> Result<(), StoreError>;

    fn save(&self, record: &GameRecord) -> Result<(), StoreError> {
        self.put_info(&record.info)?;
        self.put_data(&record.data)
    }

    fn list_prepared(&self, sort: SortBy, filter: &FieldFilter) -> Result<Vec<GameInfo>, StoreError> {
        Ok(prepare_infos(self.list()?, sort, filter))
    }
}

/// Sled-backed store living under the data directory.
pub struct SledStore {
    db: sled::Db,
    infos: sled::Tree,
    datas: sled::Tree,
}

impl SledStore {
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self, StoreError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let db = sled::open(dir.join(DB_DIR))?;
        let infos = db.open_tree(TREE_INFO)?;
        let datas = db.open_tree(TREE_DATA)?;
        Ok(Self { db, infos, datas })
    }

    fn key(id: Uuid) -> Vec<u8> {
        id.to_string().into_bytes()
    }

    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
        Ok(bincode::serialize(value)?)
    }

    fn deserialize<T: serde::de::DeserializeOwned>(bytes: IVec) -> Result<T, StoreError> {
        Ok(bincode::deserialize::<T>(&bytes)?)
    }
}

impl GameStore for SledStore {
    fn put_info(&self, info: &GameInfo) -> Result<(), StoreError> {
        self.infos.insert(Self::key(info.id), Self::serialize(info)?)?;
        self.db.flush()?;
        Ok(())
    }

    fn put_data(&self, data: &GameData) -> Result<(), StoreError> {
        self.datas.insert(Self::key(data.id), Self::serialize(data)?)?;
        self.db.flush()?;
        Ok(())
    }

    fn get(&self, id: Uuid) -> Result<(GameInfo, GameData), StoreError> {
        let key = Self::key(id);
        let info = self
            .infos
            .get(&key)?
            .ok_or_else(|| StoreError::NotFound(format!("game info {id}")))?;
        let data = self
            .datas
            .get(&key)?
            .ok_or_else(|| StoreError::NotFound(format!("game data {id}")))?;
        Ok((Self::deserialize(info)?, Self::deserialize(data)?))
    }

    fn list(&self) -> Result<Vec<GameInfo>, StoreError> {
        self.infos
            .iter()
            .values()
            .map(|value| Self::deserialize(value?))
            .collect()
    }

    fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let key = Self::key(id);
        self.infos.remove(&key)?;
        self.datas.remove(&key)?;
        self.db.flush()?;
        Ok(())
    }
}

/// In-process store, used by tests.
#[derive(Default)]
pub struct MemoryStore {
    infos: Mutex<HashMap<Uuid, GameInfo>>,
    datas: Mutex<HashMap<Uuid, GameData>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl GameStore for MemoryStore {
    fn put_info(&self, info: &GameInfo) -> Result<(), StoreError> {
        lock(&self.infos).insert(info.id, info.clone());
        Ok(())
    }

    fn put_data(&self, data: &GameData) -> Result<(), StoreError> {
        lock(&self.datas).insert(data.id, data.clone());
        Ok(())
    }

    fn get(&self, id: Uuid) -> Result<(GameInfo, GameData), StoreError> {
        let info = lock(&self.infos)
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("game info {id}")))?;
        let data = lock(&self.datas)
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("game data {id}")))?;
        Ok((info, data))
    }

    fn list(&self) -> Result<Vec<GameInfo>, StoreError> {
        Ok(lock(&self.infos).values().cloned().collect())
    }

    fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        lock(&self.infos).remove(&id);
        lock(&self.datas).remove(&id);
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::time::Duration;

    use termines_core::{Board, History, MineLayout, OpenResult};

    use super::*;

    /// A concluded 2x1 game; `won` picks which cell gets opened.
    pub(crate) fn record(won: bool) -> GameRecord {
        let mut board = Board::new(&MineLayout::from_mine_coords((2, 1), &[(1, 0)]).unwrap());
        let mut history = History::new();
        let cursor = if won { (0, 0) } else { (1, 0) };
        let result = board.open(cursor);
        assert_eq!(result, if won { OpenResult::Won } else { OpenResult::Lost });
        history
            .record_open(Duration::from_millis(250), cursor, result)
            .unwrap();
        GameRecord::conclude(&board, history).unwrap()
    }

    fn round_trip(store: &dyn GameStore) {
        let won = record(true);
        let lost = record(false);
        store.save(&won).unwrap();
        store.save(&lost).unwrap();

        let (info, data) = store.get(won.info.id).unwrap();
        assert_eq!(info, won.info);
        assert_eq!(data, won.data);

        let listed = store
            .list_prepared(SortBy::Best, &FieldFilter::All)
            .unwrap();
        assert_eq!(listed, vec![won.info.clone(), lost.info.clone()]);

        store.delete(won.info.id).unwrap();
        assert!(matches!(store.get(won.info.id), Err(StoreError::NotFound(_))));
        assert_eq!(store.list().unwrap(), vec![lost.info]);
    }

    fn missing_half(store: &dyn GameStore) {
        let record = record(true);
        store.put_info(&record.info).unwrap();

        assert!(matches!(store.get(record.info.id), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn memory_store_round_trip() {
        round_trip(&MemoryStore::new());
        missing_half(&MemoryStore::new());
    }

    #[test]
    fn sled_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        round_trip(&SledStore::open(dir.path()).unwrap());
    }

    #[test]
    fn sled_store_needs_both_halves() {
        let dir = tempfile::tempdir().unwrap();
        missing_half(&SledStore::open(dir.path()).unwrap());
    }

    #[test]
    fn sled_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let record = record(false);
        {
            let store = SledStore::open(dir.path()).unwrap();
            store.save(&record).unwrap();
        }

        let store = SledStore::open(dir.path()).unwrap();
        assert_eq!(store.get(record.info.id).unwrap().0, record.info);
    }
}
