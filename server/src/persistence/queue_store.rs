use super::PersistenceError;
use crate::duel::TimeControl;
use crate::matchmaking::QueueEntry;
use std::path::{Path, PathBuf};

/// Waiting players, one JSON file per time-control bucket under
/// `<data_dir>/queue`. Each bucket is written only while its lock is held.
pub struct QueueStore {
    dir: PathBuf,
}

impl QueueStore {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            dir: data_dir.join("queue"),
        }
    }

    fn bucket_path(&self, time_control: TimeControl) -> PathBuf {
        self.dir.join(format!("{}.json", time_control.as_str()))
    }

    pub fn save_bucket(
        &self,
        time_control: TimeControl,
        entries: &[QueueEntry],
    ) -> Result<(), PersistenceError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.bucket_path(time_control);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_string_pretty(entries)?)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    pub fn load_bucket(&self, time_control: TimeControl) -> Result<Vec<QueueEntry>, PersistenceError> {
        let path = self.bucket_path(time_control);
        if !path.exists() {
            return Ok(vec![]);
        }
        let contents = std::fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&contents)?)
    }
}
