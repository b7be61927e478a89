//! Online matches between two remote players: a rock-paper-scissors
//! pre-phase, chess clocks, draw offers and chat. One actor per room.

pub mod actor;
pub mod commands;
pub mod handle;
pub mod record;
pub mod snapshot;
pub mod state;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, RwLock};
use tracing::{info, warn};
use uuid::Uuid;

use crate::duel::TimeControl;
use crate::error::GameError;
use crate::persistence::MatchStore;
use actor::run_match_actor;
pub use handle::MatchHandle;
pub use record::{ChatMessage, DrawAction, MatchRecord, Seat, CHAT_LOG_LIMIT, MAX_CHAT_CHARS};
pub use snapshot::{MatchSnapshot, SeatView};
use state::MatchState;

/// How long a finished match's actor stays up for late polls.
pub const FINISHED_MATCH_LINGER: Duration = Duration::from_secs(60);

type Rooms = Arc<RwLock<HashMap<String, MatchHandle>>>;
type Seating = Arc<RwLock<HashMap<String, String>>>;

/// Owns every live match actor and the player to room index.
pub struct MatchManager {
    matches: Rooms,
    players: Seating,
    store: Arc<MatchStore>,
    rps_window: Duration,
    linger: Duration,
}

impl MatchManager {
    pub fn new(store: MatchStore, rps_window: Duration) -> Self {
        Self {
            matches: Arc::new(RwLock::new(HashMap::new())),
            players: Arc::new(RwLock::new(HashMap::new())),
            store: Arc::new(store),
            rps_window,
            linger: FINISHED_MATCH_LINGER,
        }
    }

    pub fn with_linger(mut self, linger: Duration) -> Self {
        self.linger = linger;
        self
    }

    /// Spawn actors for every unfinished match on disk. Deadlines that
    /// passed while the server was down are applied by the actors.
    pub async fn restore(&self) -> Result<usize, GameError> {
        let records = self.store.list_active()?;
        let count = records.len();
        let mut matches = self.matches.write().await;
        let mut players = self.players.write().await;
        for record in records {
            players.insert(record.white.player_id.clone(), record.room_id.clone());
            players.insert(record.black.player_id.clone(), record.room_id.clone());
            let room_id = record.room_id.clone();
            matches.insert(room_id, self.spawn(record));
        }
        info!(count, "Restored active matches");
        Ok(count)
    }

    /// Create a match. `white` is the player who waited longest.
    pub async fn create(
        &self,
        time_control: TimeControl,
        white: Seat,
        black: Seat,
    ) -> Result<String, GameError> {
        let room_id = format!("room_{}", Uuid::new_v4().simple());
        let record = MatchRecord::new(
            room_id.clone(),
            time_control,
            white,
            black,
            Utc::now(),
            self.rps_window,
        );
        self.store.save(&record)?;
        info!(
            room_id = %room_id,
            white = %record.white.player_id,
            black = %record.black.player_id,
            time_control = time_control.as_str(),
            "Match created"
        );

        {
            let mut players = self.players.write().await;
            players.insert(record.white.player_id.clone(), room_id.clone());
            players.insert(record.black.player_id.clone(), room_id.clone());
        }
        let handle = self.spawn(record);
        self.matches.write().await.insert(room_id.clone(), handle);
        Ok(room_id)
    }

    /// Handle for a live match, reviving it from the store if needed.
    pub async fn get_handle(&self, room_id: &str) -> Result<MatchHandle, GameError> {
        if let Some(handle) = self.matches.read().await.get(room_id) {
            if !handle.is_closed() {
                return Ok(handle.clone());
            }
        }

        let mut matches = self.matches.write().await;
        if let Some(handle) = matches.get(room_id) {
            if !handle.is_closed() {
                return Ok(handle.clone());
            }
        }
        let record = self
            .store
            .load(room_id)?
            .ok_or_else(|| GameError::NotFound(format!("Match {room_id}")))?;
        let handle = self.spawn(record);
        matches.insert(room_id.to_string(), handle.clone());
        Ok(handle)
    }

    /// The unfinished match `player_id` is seated in, if any.
    pub async fn active_match_for(&self, player_id: &str) -> Option<MatchSnapshot> {
        let room_id = self.players.read().await.get(player_id).cloned()?;
        let snapshot = match self.get_handle(&room_id).await {
            Ok(handle) => handle.snapshot().await,
            Err(e) => Err(e),
        };
        match snapshot {
            Ok(snap) if !snap.is_over => Some(snap),
            Ok(_) => {
                let mut players = self.players.write().await;
                if players.get(player_id) == Some(&room_id) {
                    players.remove(player_id);
                }
                None
            }
            Err(e) => {
                warn!(player_id, room_id = %room_id, "Could not read match: {}", e);
                None
            }
        }
    }

    pub async fn shutdown(&self) {
        let handles: Vec<MatchHandle> = self
            .matches
            .write()
            .await
            .drain()
            .map(|(_, h)| h)
            .collect();
        for handle in handles {
            handle.shutdown().await;
        }
    }

    fn spawn(&self, record: MatchRecord) -> MatchHandle {
        let room_id = record.room_id.clone();
        let (cmd_tx, cmd_rx) = mpsc::channel(32);
        let state = MatchState::new(record, self.store.clone());
        let linger = self.linger;
        let matches = self.matches.clone();
        let players = self.players.clone();
        let room = room_id.clone();
        tokio::spawn(async move {
            let finished = run_match_actor(state, cmd_rx, linger).await;
            forget_room(&matches, &players, &room, finished).await;
        });
        MatchHandle::new(room_id, cmd_tx)
    }
}

/// Drop a stopped actor's entry. A revived actor under the same id is kept.
async fn forget_room(matches: &Rooms, players: &Seating, room_id: &str, finished: bool) {
    {
        let mut matches = matches.write().await;
        if matches.get(room_id).is_some_and(MatchHandle::is_closed) {
            matches.remove(room_id);
        }
    }
    if finished {
        players.write().await.retain(|_, room| room.as_str() != room_id);
    }
}
