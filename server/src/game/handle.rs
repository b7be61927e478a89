use chess::PieceColor;
use tokio::sync::{mpsc, oneshot};

use super::commands::{GameCommand, MoveInput};
use super::snapshot::GameSnapshot;
use crate::duel::RpsChoice;
use crate::error::GameError;

/// Cheap, cloneable handle to a game actor.
#[derive(Clone)]
pub struct GameHandle {
    id: String,
    cmd_tx: mpsc::Sender<GameCommand>,
}

impl GameHandle {
    pub(crate) fn new(id: String, cmd_tx: mpsc::Sender<GameCommand>) -> Self {
        Self { id, cmd_tx }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_closed(&self) -> bool {
        self.cmd_tx.is_closed()
    }

    pub async fn snapshot(&self) -> Result<GameSnapshot, GameError> {
        let (tx, rx) = oneshot::channel();
        self.send(GameCommand::GetSnapshot { reply: tx }).await?;
        rx.await
            .map_err(|_| GameError::Internal("Reply dropped".into()))
    }

    pub async fn make_move(&self, input: MoveInput) -> Result<GameSnapshot, GameError> {
        let (tx, rx) = oneshot::channel();
        self.send(GameCommand::MakeMove { input, reply: tx })
            .await?;
        rx.await
            .map_err(|_| GameError::Internal("Reply dropped".into()))?
    }

    pub async fn retry_ai(&self) -> Result<GameSnapshot, GameError> {
        let (tx, rx) = oneshot::channel();
        self.send(GameCommand::RetryAi { reply: tx }).await?;
        rx.await
            .map_err(|_| GameError::Internal("Reply dropped".into()))?
    }

    pub async fn resign(&self) -> Result<GameSnapshot, GameError> {
        let (tx, rx) = oneshot::channel();
        self.send(GameCommand::Resign { reply: tx }).await?;
        rx.await
            .map_err(|_| GameError::Internal("Reply dropped".into()))?
    }

    pub async fn reset(&self) -> Result<GameSnapshot, GameError> {
        let (tx, rx) = oneshot::channel();
        self.send(GameCommand::Reset { reply: tx }).await?;
        rx.await
            .map_err(|_| GameError::Internal("Reply dropped".into()))?
    }

    pub async fn submit_rps(
        &self,
        side: PieceColor,
        choice: RpsChoice,
    ) -> Result<GameSnapshot, GameError> {
        let (tx, rx) = oneshot::channel();
        self.send(GameCommand::SubmitRps {
            side,
            choice,
            reply: tx,
        })
        .await?;
        rx.await
            .map_err(|_| GameError::Internal("Reply dropped".into()))?
    }

    pub async fn shutdown(&self) {
        let _ = self.cmd_tx.send(GameCommand::Shutdown).await;
    }

    async fn send(&self, cmd: GameCommand) -> Result<(), GameError> {
        self.cmd_tx
            .send(cmd)
            .await
            .map_err(|_| GameError::Internal("Game actor closed".into()))
    }
}
