use super::json_store::{JsonStore, Storable};
use super::PersistenceError;
use crate::matches::MatchRecord;
use std::path::Path;

impl Storable for MatchRecord {
    fn id(&self) -> &str {
        &self.room_id
    }
}

/// Online match records under `<data_dir>/matches`.
pub struct MatchStore {
    inner: JsonStore<MatchRecord>,
}

impl MatchStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            inner: JsonStore::new(data_dir.join("matches")),
        }
    }

    pub fn save(&self, record: &MatchRecord) -> Result<(), PersistenceError> {
        self.inner.save(record)
    }

    pub fn load(&self, room_id: &str) -> Result<Option<MatchRecord>, PersistenceError> {
        self.inner.load(room_id)
    }

    /// Matches that have not finished yet.
    pub fn list_active(&self) -> Result<Vec<MatchRecord>, PersistenceError> {
        let mut records = self.inner.load_all()?;
        records.retain(|r| !r.play.is_over);
        records.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(records)
    }
}
