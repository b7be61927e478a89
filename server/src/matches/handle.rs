use cozy_chess::{Piece, Square};
use tokio::sync::{mpsc, oneshot};

use super::commands::{MatchCommand, Reply};
use super::record::DrawAction;
use super::snapshot::MatchSnapshot;
use crate::duel::RpsChoice;
use crate::error::GameError;

/// Cheap, cloneable handle to a match actor.
#[derive(Clone)]
pub struct MatchHandle {
    room_id: String,
    cmd_tx: mpsc::Sender<MatchCommand>,
}

impl MatchHandle {
    pub(crate) fn new(room_id: String, cmd_tx: mpsc::Sender<MatchCommand>) -> Self {
        Self { room_id, cmd_tx }
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn is_closed(&self) -> bool {
        self.cmd_tx.is_closed()
    }

    pub async fn snapshot(&self) -> Result<MatchSnapshot, GameError> {
        self.request(|reply| MatchCommand::GetSnapshot { reply })
            .await
    }

    pub async fn submit_rps(
        &self,
        player_id: String,
        choice: RpsChoice,
    ) -> Result<MatchSnapshot, GameError> {
        self.request(|reply| MatchCommand::SubmitRps {
            player_id,
            choice,
            reply,
        })
        .await
    }

    pub async fn make_move(
        &self,
        player_id: String,
        from: Square,
        to: Square,
        promotion: Option<Piece>,
        use_chaos_token: bool,
    ) -> Result<MatchSnapshot, GameError> {
        self.request(|reply| MatchCommand::MakeMove {
            player_id,
            from,
            to,
            promotion,
            use_chaos_token,
            reply,
        })
        .await
    }

    pub async fn resign(&self, player_id: String) -> Result<MatchSnapshot, GameError> {
        self.request(|reply| MatchCommand::Resign { player_id, reply })
            .await
    }

    pub async fn draw(
        &self,
        player_id: String,
        action: DrawAction,
    ) -> Result<MatchSnapshot, GameError> {
        self.request(|reply| MatchCommand::Draw {
            player_id,
            action,
            reply,
        })
        .await
    }

    pub async fn chat(&self, player_id: String, message: String) -> Result<MatchSnapshot, GameError> {
        self.request(|reply| MatchCommand::Chat {
            player_id,
            message,
            reply,
        })
        .await
    }

    pub async fn shutdown(&self) {
        let _ = self.cmd_tx.send(MatchCommand::Shutdown).await;
    }

    async fn request(
        &self,
        build: impl FnOnce(Reply) -> MatchCommand,
    ) -> Result<MatchSnapshot, GameError> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(build(tx))
            .await
            .map_err(|_| GameError::Internal("Match actor closed".into()))?;
        rx.await
            .map_err(|_| GameError::Internal("Reply dropped".into()))?
    }
}
