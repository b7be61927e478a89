use chess::ResolveError;

use crate::duel::DuelError;
use crate::persistence::PersistenceError;

/// Errors surfaced by game, match and matchmaking operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GameError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("Illegal move: {0}")]
    IllegalMove(String),
    #[error("It is not your turn")]
    OutOfTurn,
    #[error("The game is already over")]
    GameAlreadyOver,
    #[error("Invalid phase: {0}")]
    InvalidPhase(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Not a participant: {0}")]
    NotParticipant(String),
    #[error("AI provider failure: {0}")]
    AiProviderFailure(String),
    #[error("Persistence error: {0}")]
    Persistence(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GameError {
    /// Stable machine-readable code for API clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::IllegalMove(_) => "ILLEGAL_MOVE",
            Self::OutOfTurn => "OUT_OF_TURN",
            Self::GameAlreadyOver => "GAME_ALREADY_OVER",
            Self::InvalidPhase(_) => "INVALID_PHASE",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::NotParticipant(_) => "NOT_PARTICIPANT",
            Self::AiProviderFailure(_) => "AI_PROVIDER_FAILURE",
            Self::Persistence(_) => "PERSISTENCE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<PersistenceError> for GameError {
    fn from(e: PersistenceError) -> Self {
        Self::Persistence(e.to_string())
    }
}

impl From<ResolveError> for GameError {
    fn from(e: ResolveError) -> Self {
        Self::IllegalMove(e.to_string())
    }
}

impl From<DuelError> for GameError {
    fn from(e: DuelError) -> Self {
        match e {
            DuelError::WrongPhase(_) => Self::InvalidPhase(e.to_string()),
            DuelError::AlreadyChosen => Self::InvalidRequest(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_error_maps_to_illegal_move() {
        let err: GameError = ResolveError::NullMove.into();
        assert_eq!(err.code(), "ILLEGAL_MOVE");
    }

    #[test]
    fn test_duel_error_mapping() {
        let err: GameError = DuelError::AlreadyChosen.into();
        assert_eq!(err.code(), "INVALID_REQUEST");
        let err: GameError = DuelError::WrongPhase("playing".into()).into();
        assert_eq!(err.code(), "INVALID_PHASE");
    }
}
