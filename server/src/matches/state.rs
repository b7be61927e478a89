use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info};

use super::record::MatchRecord;
use super::snapshot::MatchSnapshot;
use crate::error::GameError;
use crate::persistence::MatchStore;

/// All mutable state of one match, owned by its actor.
pub(crate) struct MatchState {
    pub record: MatchRecord,
    store: Arc<MatchStore>,
}

impl MatchState {
    pub fn new(record: MatchRecord, store: Arc<MatchStore>) -> Self {
        Self { record, store }
    }

    pub fn snapshot(&self, now: DateTime<Utc>) -> MatchSnapshot {
        MatchSnapshot::at(&self.record, now)
    }

    /// Apply elapsed deadlines and persist the result if anything changed.
    pub fn catch_up(&mut self, now: DateTime<Utc>) -> Result<(), GameError> {
        let before = self.record.clone();
        if !self.record.catch_up(now) {
            return Ok(());
        }
        info!(
            outcome = ?self.record.play.outcome,
            "Match ended on a deadline"
        );
        self.record.updated_at = now;
        if let Err(e) = self.store.save(&self.record) {
            error!("Failed to persist match: {}", e);
            self.record = before;
            return Err(e.into());
        }
        Ok(())
    }

    /// Run one mutation after catching up. The record is restored if the
    /// mutation or the save fails.
    pub fn apply<F>(&mut self, op: F) -> Result<MatchSnapshot, GameError>
    where
        F: FnOnce(&mut MatchRecord, DateTime<Utc>) -> Result<(), GameError>,
    {
        let now = Utc::now();
        self.catch_up(now)?;

        let before = self.record.clone();
        if let Err(e) = op(&mut self.record, now) {
            self.record = before;
            return Err(e);
        }
        self.record.updated_at = now;
        self.record.refresh_status();
        if let Err(e) = self.store.save(&self.record) {
            error!("Failed to persist match: {}", e);
            self.record = before;
            return Err(e.into());
        }
        Ok(self.snapshot(now))
    }

    pub fn read(&mut self) -> Result<MatchSnapshot, GameError> {
        let now = Utc::now();
        self.catch_up(now)?;
        Ok(self.snapshot(now))
    }

    /// How long until the next deadline, if any.
    pub fn next_wakeup(&self) -> Option<std::time::Duration> {
        let deadline = self.record.next_deadline()?;
        Some(
            (deadline - Utc::now())
                .to_std()
                .unwrap_or(std::time::Duration::ZERO),
        )
    }
}
