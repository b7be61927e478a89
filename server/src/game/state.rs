use std::sync::Arc;

use chess::{resolve_move, Outcome, PieceColor};
use chrono::Utc;
use tracing::{error, info, warn};

use super::commands::MoveInput;
use super::record::{GameMode, GameRecord};
use super::snapshot::GameSnapshot;
use crate::ai::{AiMover, AiTurn};
use crate::duel::{ChaosDuel, RpsChoice, RpsOutcome};
use crate::error::GameError;
use crate::persistence::GameStore;

/// All mutable state of one game, owned by its actor.
pub(crate) struct GameState {
    pub record: GameRecord,
    store: Arc<GameStore>,
    ai: Arc<AiMover>,
}

impl GameState {
    pub fn new(record: GameRecord, store: Arc<GameStore>, ai: Arc<AiMover>) -> Self {
        Self { record, store, ai }
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot::from(&self.record)
    }

    /// Let the AI move if it is its turn, e.g. it plays white or the server
    /// restarted mid-turn. A failure is recorded on the game, not returned.
    pub async fn on_start(&mut self) {
        if !self.record.is_ai_turn() {
            return;
        }
        let before = self.record.clone();
        let result = self.ai_step().await.or_else(|_| Ok(()));
        if let Err(e) = self.commit(before, result) {
            warn!("Could not persist the opening AI move: {}", e);
        }
    }

    pub async fn make_move(&mut self, input: MoveInput) -> Result<GameSnapshot, GameError> {
        let before = self.record.clone();
        let result = self.apply_human_move(input).await;
        self.commit(before, result)
    }

    pub async fn retry_ai(&mut self) -> Result<GameSnapshot, GameError> {
        let before = self.record.clone();
        let result = self.apply_retry_ai().await;
        self.commit(before, result)
    }

    pub fn resign(&mut self) -> Result<GameSnapshot, GameError> {
        let before = self.record.clone();
        let result = self.apply_resign();
        self.commit(before, result)
    }

    pub async fn reset(&mut self) -> Result<GameSnapshot, GameError> {
        let before = self.record.clone();
        self.record.reset();
        info!("Game reset");
        if self.record.is_ai_turn() {
            let _ = self.ai_step().await;
        }
        self.commit(before, Ok(()))
    }

    pub fn submit_rps(
        &mut self,
        side: PieceColor,
        choice: RpsChoice,
    ) -> Result<GameSnapshot, GameError> {
        let before = self.record.clone();
        let result = self.apply_rps(side, choice);
        self.commit(before, result)
    }

    /// Persist a successful mutation, or restore `before` on any failure so
    /// that memory never holds a state the store does not.
    fn commit(
        &mut self,
        before: GameRecord,
        result: Result<(), GameError>,
    ) -> Result<GameSnapshot, GameError> {
        if let Err(e) = result {
            self.record = before;
            return Err(e);
        }
        self.record.updated_at = Utc::now();
        self.record.refresh_status();
        if let Err(e) = self.store.save(&self.record) {
            error!("Failed to persist game: {}", e);
            self.record = before;
            return Err(e.into());
        }
        Ok(self.snapshot())
    }

    async fn apply_human_move(&mut self, input: MoveInput) -> Result<(), GameError> {
        self.record.play.ensure_ongoing()?;
        let side = self.record.play.side_to_move();

        let allow_illegal = match &self.record.mode {
            GameMode::VsAi { human_side, .. } => {
                if side != *human_side {
                    return Err(GameError::OutOfTurn);
                }
                false
            }
            GameMode::LocalDuel { .. } => {
                let chaos = self.record.chaos.get_or_insert_with(ChaosDuel::new);
                if !chaos.is_playing() {
                    return Err(GameError::InvalidPhase(
                        "rock-paper-scissors must finish first".into(),
                    ));
                }
                chaos.may_force(side, input.use_chaos_token)
            }
        };

        let resolution = resolve_move(
            &self.record.play.position,
            input.from,
            input.to,
            input.promotion,
            allow_illegal,
        )?;
        if resolution.was_forced {
            if let Some(chaos) = self.record.chaos.as_mut() {
                chaos.consume();
            }
        }

        info!(
            side = side.as_str(),
            notation = %resolution.notation,
            forced = resolution.was_forced,
            "Human move applied"
        );
        if let Some(terminal) = self.record.play.apply(resolution) {
            info!(outcome = ?terminal.outcome, "Game over");
        }
        self.record.ai_error = None;

        if self.record.is_ai_turn() {
            // The failure is kept on the record; the human move still stands.
            let _ = self.ai_step().await;
        }
        Ok(())
    }

    async fn apply_retry_ai(&mut self) -> Result<(), GameError> {
        self.record.play.ensure_ongoing()?;
        if !self.record.is_ai_turn() {
            return Err(GameError::InvalidRequest("it is not the AI's turn".into()));
        }
        self.ai_step().await
    }

    fn apply_resign(&mut self) -> Result<(), GameError> {
        self.record.play.ensure_ongoing()?;
        let loser = match &self.record.mode {
            GameMode::VsAi { human_side, .. } => *human_side,
            GameMode::LocalDuel { .. } => self.record.play.side_to_move(),
        };
        info!(side = loser.as_str(), "Resigned");
        self.record.play.finish(Outcome::Resigned, None, Some(!loser));
        Ok(())
    }

    fn apply_rps(&mut self, side: PieceColor, choice: RpsChoice) -> Result<(), GameError> {
        if !matches!(self.record.mode, GameMode::LocalDuel { .. }) {
            return Err(GameError::InvalidRequest(
                "rock-paper-scissors only applies to local duels".into(),
            ));
        }
        self.record.play.ensure_ongoing()?;
        let chaos = self.record.chaos.get_or_insert_with(ChaosDuel::new);
        match chaos.submit(side, choice)? {
            RpsOutcome::Won(winner) => info!(winner = winner.as_str(), "Chaos token awarded"),
            RpsOutcome::Tie => info!(round = chaos.round, "Rock-paper-scissors tie"),
            RpsOutcome::Pending => {}
        }
        Ok(())
    }

    /// Run the AI strategy chain once and apply its move.
    async fn ai_step(&mut self) -> Result<(), GameError> {
        let Some(bot) = self.record.bot().cloned() else {
            return Ok(());
        };
        let decision = self
            .ai
            .decide(AiTurn {
                position: &self.record.play.position,
                bot: &bot,
                recent_comments: &self.record.recent_comments,
            })
            .await;

        match decision {
            Ok(decision) => {
                self.record.last_ai_strategy = Some(decision.strategy);
                self.record.ai_error = None;
                self.record.push_comment(decision.comment);
                if let Some(terminal) = self.record.play.apply(decision.resolution) {
                    info!(outcome = ?terminal.outcome, "Game over");
                }
                Ok(())
            }
            Err(e) => {
                warn!(bot = %bot.name, "AI move failed: {}", e);
                self.record.ai_error = Some(e.to_string());
                Err(GameError::AiProviderFailure(e.to_string()))
            }
        }
    }
}
