//! Local games: one human against an AI bot, or two humans sharing a device
//! with a chaos duel. Each game lives in its own actor task.

pub mod actor;
pub mod commands;
pub mod handle;
pub mod record;
pub mod snapshot;
pub mod state;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chess::PieceColor;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use tokio::sync::{mpsc, RwLock};
use tracing::info;
use uuid::Uuid;

use crate::ai::{find_bot, random_bot, AiMover};
use crate::error::GameError;
use crate::persistence::GameStore;
use actor::run_game_actor;
pub use commands::MoveInput;
pub use handle::GameHandle;
pub use record::{GameMode, GamePhase, GameRecord, RECENT_COMMENT_LIMIT};
pub use snapshot::GameSnapshot;
use state::GameState;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorChoice {
    #[default]
    White,
    Black,
    Random,
}

/// What to create.
#[derive(Debug, Clone)]
pub enum NewGame {
    VsAi {
        bot_id: Option<String>,
        player_name: Option<String>,
        color: ColorChoice,
    },
    LocalDuel {
        white_name: Option<String>,
        black_name: Option<String>,
    },
}

/// How long a game actor waits for a command before it retires.
pub const GAME_IDLE_TIMEOUT: Duration = Duration::from_secs(600);

type Games = Arc<RwLock<HashMap<String, GameHandle>>>;

/// Owns every live game actor and revives stored games on demand.
pub struct GameManager {
    games: Games,
    store: Arc<GameStore>,
    ai: Arc<AiMover>,
    rng: Mutex<StdRng>,
    idle_timeout: Duration,
}

impl GameManager {
    pub fn new(store: GameStore, ai: Arc<AiMover>) -> Self {
        Self {
            games: Arc::new(RwLock::new(HashMap::new())),
            store: Arc::new(store),
            ai,
            rng: Mutex::new(StdRng::from_entropy()),
            idle_timeout: GAME_IDLE_TIMEOUT,
        }
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub async fn create(&self, new: NewGame) -> Result<GameSnapshot, GameError> {
        let mode = self.resolve_mode(new)?;
        let id = Uuid::new_v4().to_string();
        let record = GameRecord::new(id.clone(), mode);
        self.store.save(&record)?;
        info!(game_id = %id, "Game created");

        let handle = self.spawn(record);
        self.games.write().await.insert(id, handle.clone());
        handle.snapshot().await
    }

    /// Handle for a live game, reviving it from the store if needed.
    pub async fn get_handle(&self, id: &str) -> Result<GameHandle, GameError> {
        if let Some(handle) = self.games.read().await.get(id) {
            if !handle.is_closed() {
                return Ok(handle.clone());
            }
        }

        let mut games = self.games.write().await;
        if let Some(handle) = games.get(id) {
            if !handle.is_closed() {
                return Ok(handle.clone());
            }
        }
        let record = self
            .store
            .load(id)?
            .ok_or_else(|| GameError::NotFound(format!("Game {id}")))?;
        info!(game_id = %id, "Reviving game from store");
        let handle = self.spawn(record);
        games.insert(id.to_string(), handle.clone());
        Ok(handle)
    }

    pub async fn shutdown(&self) {
        let handles: Vec<GameHandle> = self.games.write().await.drain().map(|(_, h)| h).collect();
        for handle in handles {
            handle.shutdown().await;
        }
    }

    fn spawn(&self, record: GameRecord) -> GameHandle {
        let id = record.id.clone();
        let (cmd_tx, cmd_rx) = mpsc::channel(32);
        let state = GameState::new(record, self.store.clone(), self.ai.clone());
        let idle = self.idle_timeout;
        let games = self.games.clone();
        let game_id = id.clone();
        tokio::spawn(async move {
            run_game_actor(state, cmd_rx, idle).await;
            let mut games = games.write().await;
            // a revived actor under the same id is kept
            if games.get(&game_id).is_some_and(GameHandle::is_closed) {
                games.remove(&game_id);
            }
        });
        GameHandle::new(id, cmd_tx)
    }

    fn resolve_mode(&self, new: NewGame) -> Result<GameMode, GameError> {
        let mut rng = self
            .rng
            .lock()
            .map_err(|_| GameError::Internal("rng lock poisoned".into()))?;
        match new {
            NewGame::VsAi {
                bot_id,
                player_name,
                color,
            } => {
                let bot = match bot_id.as_deref() {
                    Some(id) => find_bot(id)
                        .ok_or_else(|| GameError::InvalidRequest(format!("unknown bot {id:?}")))?,
                    None => random_bot(&mut *rng),
                };
                let human_side = match color {
                    ColorChoice::White => PieceColor::White,
                    ColorChoice::Black => PieceColor::Black,
                    ColorChoice::Random if rng.gen_bool(0.5) => PieceColor::White,
                    ColorChoice::Random => PieceColor::Black,
                };
                Ok(GameMode::VsAi {
                    human_side,
                    player_name: non_blank(player_name),
                    bot,
                })
            }
            NewGame::LocalDuel {
                white_name,
                black_name,
            } => Ok(GameMode::LocalDuel {
                white_name: non_blank(white_name).unwrap_or_else(|| "White".into()),
                black_name: non_blank(black_name).unwrap_or_else(|| "Black".into()),
            }),
        }
    }
}

fn non_blank(name: Option<String>) -> Option<String> {
    name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}
