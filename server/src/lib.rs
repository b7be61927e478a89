//! Unfair Chess server: local games against AI bots or a second human,
//! matchmaking and online chaos duels, served over HTTP.

pub mod ai;
pub mod api;
pub mod config;
pub mod duel;
pub mod error;
pub mod game;
pub mod matches;
pub mod matchmaking;
pub mod persistence;
pub mod play;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use ai::AiMover;
use api::AppState;
use error::GameError;
use game::GameManager;
use matches::MatchManager;
use matchmaking::Matchmaker;
use persistence::{GameStore, MatchStore, QueueStore};

/// Wire stores, managers and the queue over `data_dir`, restoring any
/// matches that were in progress.
pub async fn build_state(
    data_dir: &Path,
    rps_deadline: Duration,
    ai: Arc<AiMover>,
) -> Result<AppState, GameError> {
    let games = Arc::new(GameManager::new(GameStore::new(data_dir), ai));
    let matches = Arc::new(MatchManager::new(MatchStore::new(data_dir), rps_deadline));
    matches.restore().await?;
    let queue = Arc::new(Matchmaker::new(QueueStore::new(data_dir), matches.clone()));
    Ok(AppState {
        games,
        matches,
        queue,
    })
}
