use chess::PieceColor;
use cozy_chess::{Piece, Square};
use tokio::sync::oneshot;

use super::snapshot::GameSnapshot;
use crate::duel::RpsChoice;
use crate::error::GameError;

/// A human move as submitted by a client.
#[derive(Debug, Clone, Copy)]
pub struct MoveInput {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<Piece>,
    pub use_chaos_token: bool,
}

pub type Reply = oneshot::Sender<Result<GameSnapshot, GameError>>;

/// Commands sent to a game actor. Each embeds a oneshot for the reply.
pub enum GameCommand {
    GetSnapshot {
        reply: oneshot::Sender<GameSnapshot>,
    },
    MakeMove {
        input: MoveInput,
        reply: Reply,
    },
    RetryAi {
        reply: Reply,
    },
    Resign {
        reply: Reply,
    },
    Reset {
        reply: Reply,
    },
    SubmitRps {
        side: PieceColor,
        choice: RpsChoice,
        reply: Reply,
    },
    Shutdown,
}
