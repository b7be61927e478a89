use chess::PieceColor;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ai::{Bot, Strategy};
use crate::duel::ChaosDuel;
use crate::play::{title, PlayState};

/// Size of the rolling window of AI comments.
pub const RECENT_COMMENT_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum GameMode {
    #[serde(rename_all = "camelCase")]
    VsAi {
        human_side: PieceColor,
        #[serde(default)]
        player_name: Option<String>,
        bot: Bot,
    },
    #[serde(rename_all = "camelCase")]
    LocalDuel {
        white_name: String,
        black_name: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GamePhase {
    RockPaperScissors,
    AwaitingHumanMove,
    AwaitingAiMove,
    GameOver,
}

/// Persistent state of one local game, vs the AI or two humans on one device.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    pub id: String,
    #[serde(flatten)]
    pub play: PlayState,
    pub mode: GameMode,
    pub last_comment: Option<String>,
    pub recent_comments: Vec<String>,
    pub status_text: String,
    /// Present for local duels only.
    pub chaos: Option<ChaosDuel>,
    pub last_ai_strategy: Option<Strategy>,
    pub ai_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl GameRecord {
    pub fn new(id: String, mode: GameMode) -> Self {
        let now = Utc::now();
        let chaos = matches!(mode, GameMode::LocalDuel { .. }).then(ChaosDuel::new);
        let mut record = Self {
            id,
            play: PlayState::new(),
            mode,
            last_comment: None,
            recent_comments: Vec::new(),
            status_text: String::new(),
            chaos,
            last_ai_strategy: None,
            ai_error: None,
            created_at: now,
            updated_at: now,
        };
        record.refresh_status();
        record
    }

    pub fn bot(&self) -> Option<&Bot> {
        match &self.mode {
            GameMode::VsAi { bot, .. } => Some(bot),
            GameMode::LocalDuel { .. } => None,
        }
    }

    pub fn is_ai_turn(&self) -> bool {
        match &self.mode {
            GameMode::VsAi { human_side, .. } => {
                !self.play.is_over && self.play.side_to_move() != *human_side
            }
            GameMode::LocalDuel { .. } => false,
        }
    }

    pub fn phase(&self) -> GamePhase {
        if self.play.is_over {
            GamePhase::GameOver
        } else if self.chaos.as_ref().is_some_and(|c| !c.is_playing()) {
            GamePhase::RockPaperScissors
        } else if self.is_ai_turn() {
            GamePhase::AwaitingAiMove
        } else {
            GamePhase::AwaitingHumanMove
        }
    }

    pub fn push_comment(&mut self, comment: String) {
        if self.recent_comments.len() >= RECENT_COMMENT_LIMIT {
            self.recent_comments.remove(0);
        }
        self.recent_comments.push(comment.clone());
        self.last_comment = Some(comment);
    }

    /// Back to the starting position, keeping the id and opponent.
    pub fn reset(&mut self) {
        self.play = PlayState::new();
        self.last_comment = None;
        self.recent_comments.clear();
        self.last_ai_strategy = None;
        self.ai_error = None;
        if let Some(chaos) = self.chaos.as_mut() {
            chaos.reset();
        }
    }

    pub fn refresh_status(&mut self) {
        self.status_text = match self.phase() {
            GamePhase::GameOver => self.play.summary(),
            GamePhase::RockPaperScissors => {
                "Rock-paper-scissors decides who gets the chaos token. Both sides choose."
                    .to_string()
            }
            GamePhase::AwaitingAiMove => match (&self.ai_error, self.bot()) {
                (Some(err), Some(bot)) => {
                    format!("{} could not move ({err}). Retry the AI move.", bot.name)
                }
                (_, Some(bot)) => format!("{} is thinking...", bot.name),
                _ => self.play.summary(),
            },
            GamePhase::AwaitingHumanMove => {
                let mut text = self.play.summary();
                if let Some(chaos) = &self.chaos {
                    if let (Some(holder), false) = (chaos.token_holder, chaos.token_used) {
                        text.push_str(&format!(" {} holds the chaos token.", title(holder)));
                    }
                }
                text
            }
        };
    }
}
