//! AI move selection: primary model, fallback models, then a random legal
//! move.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chess::{format_san, resolve_move, Position, Resolution};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::{info, warn};

use super::personas::{pool_comment, Bot};
use super::provider::{AiError, MoveProvider, MoveRequest, ProposedMove};
use crate::config::AiConfig;

/// Which branch of the chain produced a move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Primary,
    /// Index into the configured model list (1 is the first fallback).
    Fallback(usize),
    Random,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => write!(f, "primary"),
            Self::Fallback(n) => write!(f, "fallback:{n}"),
            Self::Random => write!(f, "random"),
        }
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "primary" => Ok(Self::Primary),
            "random" => Ok(Self::Random),
            other => other
                .strip_prefix("fallback:")
                .and_then(|n| n.parse().ok())
                .map(Self::Fallback)
                .ok_or_else(|| format!("unknown strategy {other:?}")),
        }
    }
}

impl Serialize for Strategy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Strategy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// The AI's side of one turn.
pub struct AiTurn<'a> {
    pub position: &'a Position,
    pub bot: &'a Bot,
    pub recent_comments: &'a [String],
}

#[derive(Debug, Clone)]
pub struct AiDecision {
    pub strategy: Strategy,
    pub resolution: Resolution,
    pub comment: String,
}

pub struct AiMover {
    provider: Option<Arc<dyn MoveProvider>>,
    models: Vec<String>,
    timeout: Duration,
    comment_retries: u32,
    rng: Mutex<StdRng>,
}

impl AiMover {
    pub fn new(provider: Option<Arc<dyn MoveProvider>>, config: &AiConfig) -> Self {
        Self {
            provider,
            models: config.models.clone(),
            timeout: config.timeout,
            comment_retries: config.comment_retries,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Only ever plays random legal moves.
    pub fn random_only() -> Self {
        Self::new(None, &AiConfig::default())
    }

    /// Make random choices reproducible.
    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            ..self
        }
    }

    pub async fn decide(&self, turn: AiTurn<'_>) -> Result<AiDecision, AiError> {
        if let Some(provider) = &self.provider {
            let request = self.request_for(&turn);
            for (index, model) in self.models.iter().enumerate() {
                let strategy = if index == 0 {
                    Strategy::Primary
                } else {
                    Strategy::Fallback(index)
                };

                let (proposal, comment) =
                    match self.ask(provider.as_ref(), model, &request, turn.recent_comments).await {
                        Ok(found) => found,
                        Err(e) => {
                            warn!(%strategy, model, provider = provider.name(), "Provider failed: {}", e);
                            continue;
                        }
                    };

                match resolve_move(turn.position, proposal.from, proposal.to, proposal.promotion, true) {
                    Ok(resolution) => {
                        info!(
                            %strategy,
                            model,
                            notation = %resolution.notation,
                            forced = resolution.was_forced,
                            "AI move chosen"
                        );
                        return Ok(AiDecision {
                            strategy,
                            resolution,
                            comment,
                        });
                    }
                    Err(e) => warn!(%strategy, model, "Proposal rejected: {}", e),
                }
            }
        }

        self.random_move(&turn)
    }

    /// Query one model, retrying on comments the bot already used. After the
    /// retries run out the last proposal is kept with a pool comment.
    async fn ask(
        &self,
        provider: &dyn MoveProvider,
        model: &str,
        request: &MoveRequest,
        recent: &[String],
    ) -> Result<(ProposedMove, String), AiError> {
        let mut attempt = 0;
        loop {
            let proposal = tokio::time::timeout(self.timeout, provider.propose(model, request))
                .await
                .map_err(|_| AiError::Timeout)??;

            let fresh = !proposal.comment.is_empty() && !recent.contains(&proposal.comment);
            if fresh {
                let comment = proposal.comment.clone();
                return Ok((proposal, comment));
            }
            if attempt >= self.comment_retries {
                let comment = self.with_rng(|rng| pool_comment(rng, recent));
                return Ok((proposal, comment));
            }
            attempt += 1;
            info!(model, attempt, "Repeated comment, asking again");
        }
    }

    fn random_move(&self, turn: &AiTurn<'_>) -> Result<AiDecision, AiError> {
        let legal = turn.position.legal_moves();
        let (mv, comment) = self.with_rng(|rng| {
            let mv = legal.choose(rng).copied();
            (mv, pool_comment(rng, turn.recent_comments))
        });
        let mv = mv.ok_or(AiError::NoLegalMoves)?;
        let resolution = resolve_move(turn.position, mv.from, mv.to, mv.promotion, false)
            .map_err(|e| AiError::Parse(e.to_string()))?;

        info!(strategy = %Strategy::Random, notation = %resolution.notation, "AI move chosen");
        Ok(AiDecision {
            strategy: Strategy::Random,
            resolution,
            comment,
        })
    }

    fn request_for(&self, turn: &AiTurn<'_>) -> MoveRequest {
        let board = turn.position.board();
        MoveRequest {
            fen: turn.position.to_fen(),
            side: turn.position.side_to_move(),
            legal_moves: turn
                .position
                .legal_moves()
                .into_iter()
                .map(|mv| format_san(board, mv))
                .collect(),
            bot_name: turn.bot.name.clone(),
            personality: turn.bot.personality,
            recent_comments: turn.recent_comments.to_vec(),
        }
    }

    fn with_rng<T>(&self, f: impl FnOnce(&mut StdRng) -> T) -> T {
        let mut guard = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::ai::personas::{find_bot, FALLBACK_COMMENTS};
    use async_trait::async_trait;
    use chess::parse_square;
    use std::collections::VecDeque;

    /// Replays canned replies per model. Models without a script fail.
    pub(crate) struct ScriptedProvider {
        scripts: Mutex<Vec<(String, VecDeque<Result<ProposedMove, AiError>>)>>,
        pub(crate) calls: Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        pub(crate) fn new() -> Self {
            Self {
                scripts: Mutex::new(Vec::new()),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn reply(self, model: &str, reply: Result<ProposedMove, AiError>) -> Self {
            {
                let mut scripts = self.scripts.lock().unwrap();
                match scripts.iter_mut().find(|(m, _)| m == model) {
                    Some((_, queue)) => queue.push_back(reply),
                    None => scripts.push((model.to_string(), VecDeque::from([reply]))),
                }
            }
            self
        }
    }

    #[async_trait]
    impl MoveProvider for ScriptedProvider {
        fn name(&self) -> &'static str {
            "scripted"
        }

        async fn propose(&self, model: &str, _request: &MoveRequest) -> Result<ProposedMove, AiError> {
            self.calls.lock().unwrap().push(model.to_string());
            let mut scripts = self.scripts.lock().unwrap();
            scripts
                .iter_mut()
                .find(|(m, _)| m == model)
                .and_then(|(_, queue)| queue.pop_front())
                .unwrap_or(Err(AiError::Http("no script".into())))
        }
    }

    pub(crate) fn proposal(from: &str, to: &str, comment: &str) -> Result<ProposedMove, AiError> {
        Ok(ProposedMove {
            from: parse_square(from).unwrap(),
            to: parse_square(to).unwrap(),
            promotion: None,
            comment: comment.to_string(),
        })
    }

    fn config() -> AiConfig {
        AiConfig {
            api_key: Some("test".into()),
            models: vec!["main".into(), "backup".into()],
            timeout: Duration::from_millis(200),
            comment_retries: 2,
            ..AiConfig::default()
        }
    }

    fn black_to_move() -> Position {
        Position::from_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1").unwrap()
    }

    async fn decide(provider: ScriptedProvider, recent: &[String]) -> (AiDecision, Arc<ScriptedProvider>) {
        let provider = Arc::new(provider);
        let mover = AiMover::new(Some(provider.clone()), &config()).with_seed(1);
        let bot = find_bot("kronos").unwrap();
        let position = black_to_move();
        let decision = mover
            .decide(AiTurn {
                position: &position,
                bot: &bot,
                recent_comments: recent,
            })
            .await
            .unwrap();
        (decision, provider)
    }

    #[test]
    fn test_strategy_text_round_trip() {
        for s in [Strategy::Primary, Strategy::Fallback(2), Strategy::Random] {
            assert_eq!(s.to_string().parse::<Strategy>(), Ok(s));
        }
        assert_eq!(
            serde_json::to_string(&Strategy::Fallback(1)).unwrap(),
            "\"fallback:1\""
        );
    }

    #[tokio::test]
    async fn test_primary_legal_move() {
        let provider = ScriptedProvider::new().reply("main", proposal("e7", "e5", "Eons."));
        let (decision, _) = decide(provider, &[]).await;
        assert_eq!(decision.strategy, Strategy::Primary);
        assert_eq!(decision.resolution.notation, "e5");
        assert!(!decision.resolution.was_forced);
        assert_eq!(decision.comment, "Eons.");
    }

    #[tokio::test]
    async fn test_primary_illegal_move_is_forced() {
        let provider = ScriptedProvider::new().reply("main", proposal("d8", "d2", "Behold."));
        let (decision, _) = decide(provider, &[]).await;
        assert_eq!(decision.strategy, Strategy::Primary);
        assert!(decision.resolution.was_forced);
        assert_eq!(decision.resolution.notation, "d8-d2*");
    }

    #[tokio::test]
    async fn test_opponent_piece_can_be_forced() {
        let provider = ScriptedProvider::new().reply("main", proposal("e4", "e6", "Yours is mine."));
        let (decision, _) = decide(provider, &[]).await;
        assert_eq!(decision.strategy, Strategy::Primary);
        assert!(decision.resolution.was_forced);
        assert_eq!(decision.resolution.notation, "e4-e6*");
    }

    #[tokio::test]
    async fn test_king_capture_falls_back() {
        let provider = ScriptedProvider::new()
            .reply("main", proposal("d8", "e1", "Checkmate, mortal."))
            .reply("backup", proposal("g8", "f6", "Patience."));
        let (decision, _) = decide(provider, &[]).await;
        assert_eq!(decision.strategy, Strategy::Fallback(1));
        assert_eq!(decision.resolution.notation, "Nf6");
    }

    #[tokio::test]
    async fn test_all_models_fail_uses_random() {
        let provider = ScriptedProvider::new()
            .reply("main", Err(AiError::Timeout))
            .reply("backup", proposal("e3", "e5", "From nowhere."));
        let (decision, provider) = decide(provider, &[]).await;
        assert_eq!(decision.strategy, Strategy::Random);
        assert!(!decision.resolution.was_forced);
        assert!(FALLBACK_COMMENTS.contains(&decision.comment.as_str()));
        assert_eq!(*provider.calls.lock().unwrap(), vec!["main", "backup"]);
    }

    #[tokio::test]
    async fn test_repeated_comment_is_retried_then_replaced() {
        let recent = vec!["Again.".to_string()];
        let provider = ScriptedProvider::new()
            .reply("main", proposal("e7", "e5", "Again."))
            .reply("main", proposal("e7", "e5", "Again."))
            .reply("main", proposal("e7", "e6", "Again."));
        let (decision, provider) = decide(provider, &recent).await;
        assert_eq!(decision.strategy, Strategy::Primary);
        assert_eq!(decision.resolution.notation, "e6");
        assert!(FALLBACK_COMMENTS.contains(&decision.comment.as_str()));
        assert_eq!(provider.calls.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_repeated_comment_then_fresh_one() {
        let recent = vec!["Again.".to_string()];
        let provider = ScriptedProvider::new()
            .reply("main", proposal("e7", "e5", "Again."))
            .reply("main", proposal("c7", "c5", "Something new."));
        let (decision, _) = decide(provider, &recent).await;
        assert_eq!(decision.resolution.notation, "c5");
        assert_eq!(decision.comment, "Something new.");
    }

    #[tokio::test]
    async fn test_random_only_mover() {
        let mover = AiMover::random_only().with_seed(3);
        let bot = find_bot("vortex").unwrap();
        let position = black_to_move();
        let decision = mover
            .decide(AiTurn {
                position: &position,
                bot: &bot,
                recent_comments: &[],
            })
            .await
            .unwrap();
        assert_eq!(decision.strategy, Strategy::Random);
        assert_eq!(decision.resolution.position.side_to_move(), chess::PieceColor::White);
    }

    #[tokio::test]
    async fn test_no_legal_moves() {
        let mover = AiMover::random_only();
        let bot = find_bot("vortex").unwrap();
        // Black is checkmated.
        let position = Position::from_fen("7k/6Q1/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        let err = mover
            .decide(AiTurn {
                position: &position,
                bot: &bot,
                recent_comments: &[],
            })
            .await
            .unwrap_err();
        assert_eq!(err, AiError::NoLegalMoves);
    }
}
