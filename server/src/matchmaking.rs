//! Time-control buckets of waiting players, paired first come first served.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::duel::TimeControl;
use crate::error::GameError;
use crate::matches::{MatchManager, MatchSnapshot, Seat};
use crate::persistence::QueueStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEntry {
    pub player_id: String,
    pub display_name: String,
    pub time_control: TimeControl,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum JoinOutcome {
    Waiting,
    #[serde(rename_all = "camelCase")]
    Matched { room_id: String },
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum QueueStatus {
    #[serde(rename_all = "camelCase")]
    Matched {
        room_id: String,
        #[serde(rename = "match")]
        snapshot: Box<MatchSnapshot>,
    },
    #[serde(rename_all = "camelCase")]
    Waiting { time_control: TimeControl },
    Idle,
}

/// Pairs waiting players. Each bucket has its own lock, held across the
/// scan, the pairing and the write-back.
pub struct Matchmaker {
    buckets: HashMap<TimeControl, Mutex<Vec<QueueEntry>>>,
    store: QueueStore,
    matches: Arc<MatchManager>,
}

impl Matchmaker {
    /// Load persisted buckets. A bucket that fails to load starts empty.
    pub fn new(store: QueueStore, matches: Arc<MatchManager>) -> Self {
        let buckets = TimeControl::ALL
            .into_iter()
            .map(|tc| {
                let entries = store.load_bucket(tc).unwrap_or_else(|e| {
                    warn!(time_control = tc.as_str(), "Could not load queue: {}", e);
                    Vec::new()
                });
                (tc, Mutex::new(entries))
            })
            .collect();
        Self {
            buckets,
            store,
            matches,
        }
    }

    pub async fn join(
        &self,
        player_id: &str,
        display_name: &str,
        time_control: TimeControl,
    ) -> Result<JoinOutcome, GameError> {
        let player_id = player_id.trim();
        let display_name = display_name.trim();
        if player_id.is_empty() || display_name.is_empty() {
            return Err(GameError::InvalidRequest(
                "playerId and displayName are required".into(),
            ));
        }

        if let Some(active) = self.matches.active_match_for(player_id).await {
            return Ok(JoinOutcome::Matched {
                room_id: active.room_id,
            });
        }

        for other in TimeControl::ALL.into_iter().filter(|tc| *tc != time_control) {
            self.remove_from(other, player_id).await?;
        }

        let mut entries = self.bucket(time_control).lock().await;
        // a pairing that held this lock may have seated the player meanwhile
        if let Some(active) = self.matches.active_match_for(player_id).await {
            return Ok(JoinOutcome::Matched {
                room_id: active.room_id,
            });
        }
        let mut updated = entries.clone();

        if let Some(mine) = updated.iter_mut().find(|e| e.player_id == player_id) {
            mine.display_name = display_name.to_string();
            self.store.save_bucket(time_control, &updated)?;
            *entries = updated;
            return Ok(JoinOutcome::Waiting);
        }

        if updated.is_empty() {
            updated.push(QueueEntry {
                player_id: player_id.to_string(),
                display_name: display_name.to_string(),
                time_control,
                joined_at: Utc::now(),
            });
            self.store.save_bucket(time_control, &updated)?;
            *entries = updated;
            info!(player_id, time_control = time_control.as_str(), "Player queued");
            return Ok(JoinOutcome::Waiting);
        }

        let opponent = updated.remove(0);
        self.store.save_bucket(time_control, &updated)?;
        let room_id = self
            .matches
            .create(
                time_control,
                Seat::new(opponent.player_id.clone(), opponent.display_name.clone(), time_control),
                Seat::new(player_id, display_name, time_control),
            )
            .await;
        let room_id = match room_id {
            Ok(room_id) => room_id,
            Err(e) => {
                // put the opponent back at the head of the queue
                if let Err(save) = self.store.save_bucket(time_control, &entries) {
                    warn!("Could not restore queue after failed pairing: {}", save);
                }
                return Err(e);
            }
        };
        *entries = updated;
        info!(
            room_id = %room_id,
            white = %opponent.player_id,
            black = player_id,
            "Players paired"
        );
        Ok(JoinOutcome::Matched { room_id })
    }

    /// Remove `player_id` from every bucket. No-op when not queued.
    pub async fn leave(&self, player_id: &str) -> Result<(), GameError> {
        for tc in TimeControl::ALL {
            self.remove_from(tc, player_id).await?;
        }
        Ok(())
    }

    pub async fn status(&self, player_id: &str) -> Result<QueueStatus, GameError> {
        if let Some(snapshot) = self.matches.active_match_for(player_id).await {
            return Ok(QueueStatus::Matched {
                room_id: snapshot.room_id.clone(),
                snapshot: Box::new(snapshot),
            });
        }
        for tc in TimeControl::ALL {
            if self
                .bucket(tc)
                .lock()
                .await
                .iter()
                .any(|e| e.player_id == player_id)
            {
                return Ok(QueueStatus::Waiting { time_control: tc });
            }
        }
        Ok(QueueStatus::Idle)
    }

    /// Number of players waiting in a bucket.
    pub async fn waiting(&self, time_control: TimeControl) -> usize {
        self.bucket(time_control).lock().await.len()
    }

    async fn remove_from(&self, time_control: TimeControl, player_id: &str) -> Result<(), GameError> {
        let mut entries = self.bucket(time_control).lock().await;
        if !entries.iter().any(|e| e.player_id == player_id) {
            return Ok(());
        }
        let updated: Vec<QueueEntry> = entries
            .iter()
            .filter(|e| e.player_id != player_id)
            .cloned()
            .collect();
        self.store.save_bucket(time_control, &updated)?;
        *entries = updated;
        info!(player_id, time_control = time_control.as_str(), "Player left queue");
        Ok(())
    }

    fn bucket(&self, time_control: TimeControl) -> &Mutex<Vec<QueueEntry>> {
        // every time control gets a bucket in `new`
        &self.buckets[&time_control]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MatchStore;
    use std::time::Duration;

    fn setup(dir: &std::path::Path) -> (Arc<Matchmaker>, Arc<MatchManager>) {
        let matches = Arc::new(MatchManager::new(
            MatchStore::new(dir),
            Duration::from_secs(60),
        ));
        let queue = Matchmaker::new(QueueStore::new(dir), matches.clone());
        (Arc::new(queue), matches)
    }

    #[tokio::test]
    async fn test_first_join_waits_second_pairs() {
        let dir = tempfile::tempdir().unwrap();
        let (queue, matches) = setup(dir.path());

        let first = queue.join("ann", "Ann", TimeControl::Blitz).await.unwrap();
        assert_eq!(first, JoinOutcome::Waiting);
        let again = queue.join("ann", "Annie", TimeControl::Blitz).await.unwrap();
        assert_eq!(again, JoinOutcome::Waiting);
        assert_eq!(queue.waiting(TimeControl::Blitz).await, 1);

        let JoinOutcome::Matched { room_id } =
            queue.join("bo", "Bo", TimeControl::Blitz).await.unwrap()
        else {
            panic!("expected a match");
        };
        assert_eq!(queue.waiting(TimeControl::Blitz).await, 0);

        let snap = matches.get_handle(&room_id).await.unwrap().snapshot().await.unwrap();
        assert_eq!(snap.white.player_id, "ann");
        assert_eq!(snap.white.display_name, "Annie");
        assert_eq!(snap.black.player_id, "bo");

        let rejoin = queue.join("ann", "Ann", TimeControl::Rapid).await.unwrap();
        assert_eq!(rejoin, JoinOutcome::Matched { room_id });
    }

    #[tokio::test]
    async fn test_buckets_do_not_mix() {
        let dir = tempfile::tempdir().unwrap();
        let (queue, _) = setup(dir.path());
        queue.join("ann", "Ann", TimeControl::Bullet).await.unwrap();
        let outcome = queue.join("bo", "Bo", TimeControl::Rapid).await.unwrap();
        assert_eq!(outcome, JoinOutcome::Waiting);
    }

    #[tokio::test]
    async fn test_switching_bucket_moves_entry() {
        let dir = tempfile::tempdir().unwrap();
        let (queue, _) = setup(dir.path());
        queue.join("ann", "Ann", TimeControl::Bullet).await.unwrap();
        queue.join("ann", "Ann", TimeControl::Rapid).await.unwrap();
        assert_eq!(queue.waiting(TimeControl::Bullet).await, 0);
        assert_eq!(queue.waiting(TimeControl::Rapid).await, 1);
    }

    #[tokio::test]
    async fn test_concurrent_joins_make_one_match() {
        let dir = tempfile::tempdir().unwrap();
        let (queue, _) = setup(dir.path());

        let (a, b) = tokio::join!(
            {
                let queue = queue.clone();
                tokio::spawn(async move { queue.join("ann", "Ann", TimeControl::Blitz).await })
            },
            {
                let queue = queue.clone();
                tokio::spawn(async move { queue.join("bo", "Bo", TimeControl::Blitz).await })
            }
        );
        let outcomes = [a.unwrap().unwrap(), b.unwrap().unwrap()];
        let rooms: Vec<_> = outcomes
            .iter()
            .filter_map(|o| match o {
                JoinOutcome::Matched { room_id } => Some(room_id.clone()),
                JoinOutcome::Waiting => None,
            })
            .collect();
        assert_eq!(rooms.len(), 1);

        let QueueStatus::Matched { room_id: ann_room, .. } = queue.status("ann").await.unwrap()
        else {
            panic!("ann should be matched");
        };
        let QueueStatus::Matched { room_id: bo_room, .. } = queue.status("bo").await.unwrap()
        else {
            panic!("bo should be matched");
        };
        assert_eq!(ann_room, rooms[0]);
        assert_eq!(bo_room, rooms[0]);
        assert_eq!(MatchStore::new(dir.path()).list_active().unwrap().len(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_rejoin_during_pairing_is_not_queued_again() {
        for _ in 0..20 {
            let dir = tempfile::tempdir().unwrap();
            let (queue, matches) = setup(dir.path());
            queue.join("ann", "Ann", TimeControl::Blitz).await.unwrap();

            let (bo, ann) = tokio::join!(
                {
                    let queue = queue.clone();
                    tokio::spawn(async move { queue.join("bo", "Bo", TimeControl::Blitz).await })
                },
                {
                    let queue = queue.clone();
                    tokio::spawn(async move { queue.join("ann", "Ann", TimeControl::Blitz).await })
                }
            );
            bo.unwrap().unwrap();
            ann.unwrap().unwrap();

            let room = matches.active_match_for("ann").await.unwrap().room_id;
            assert_eq!(queue.waiting(TimeControl::Blitz).await, 0);
            assert_eq!(
                queue.join("ann", "Ann", TimeControl::Blitz).await.unwrap(),
                JoinOutcome::Matched { room_id: room }
            );
        }
    }

    #[tokio::test]
    async fn test_leave_and_status() {
        let dir = tempfile::tempdir().unwrap();
        let (queue, _) = setup(dir.path());
        queue.join("ann", "Ann", TimeControl::Rapid).await.unwrap();
        assert!(matches!(
            queue.status("ann").await.unwrap(),
            QueueStatus::Waiting {
                time_control: TimeControl::Rapid
            }
        ));
        queue.leave("ann").await.unwrap();
        queue.leave("ann").await.unwrap();
        assert!(matches!(queue.status("ann").await.unwrap(), QueueStatus::Idle));
    }

    #[tokio::test]
    async fn test_queue_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        {
            let (queue, _) = setup(dir.path());
            queue.join("ann", "Ann", TimeControl::Bullet).await.unwrap();
        }
        let (queue, _) = setup(dir.path());
        assert_eq!(queue.waiting(TimeControl::Bullet).await, 1);
        let outcome = queue.join("bo", "Bo", TimeControl::Bullet).await.unwrap();
        assert!(matches!(outcome, JoinOutcome::Matched { .. }));
    }

    #[tokio::test]
    async fn test_blank_ids_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let (queue, _) = setup(dir.path());
        let err = queue.join("  ", "Ann", TimeControl::Blitz).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_REQUEST");
    }
}
