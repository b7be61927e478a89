mod game_store;
mod json_store;
mod match_store;
mod queue_store;

pub(crate) use json_store::{JsonStore, Storable};

pub use game_store::GameStore;
pub use match_store::MatchStore;
pub use queue_store::QueueStore;

/// Errors from the persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid record id: {0}")]
    InvalidId(String),
}
