use cozy_chess::{Piece, Square};
use tokio::sync::oneshot;

use super::record::DrawAction;
use super::snapshot::MatchSnapshot;
use crate::duel::RpsChoice;
use crate::error::GameError;

pub type Reply = oneshot::Sender<Result<MatchSnapshot, GameError>>;

/// Commands sent to a match actor. Each embeds a oneshot for the reply.
pub enum MatchCommand {
    GetSnapshot {
        reply: Reply,
    },
    SubmitRps {
        player_id: String,
        choice: RpsChoice,
        reply: Reply,
    },
    MakeMove {
        player_id: String,
        from: Square,
        to: Square,
        promotion: Option<Piece>,
        use_chaos_token: bool,
        reply: Reply,
    },
    Resign {
        player_id: String,
        reply: Reply,
    },
    Draw {
        player_id: String,
        action: DrawAction,
        reply: Reply,
    },
    Chat {
        player_id: String,
        message: String,
        reply: Reply,
    },
    Shutdown,
}
