use super::json_store::{JsonStore, Storable};
use super::PersistenceError;
use crate::game::GameRecord;
use std::path::Path;

impl Storable for GameRecord {
    fn id(&self) -> &str {
        &self.id
    }
}

/// Game records, one JSON file each under `<data_dir>/games`.
pub struct GameStore {
    inner: JsonStore<GameRecord>,
}

impl GameStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            inner: JsonStore::new(data_dir.join("games")),
        }
    }

    pub fn save(&self, record: &GameRecord) -> Result<(), PersistenceError> {
        self.inner.save(record)
    }

    pub fn load(&self, id: &str) -> Result<Option<GameRecord>, PersistenceError> {
        self.inner.load(id)
    }
}
