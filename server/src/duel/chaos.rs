use chess::PieceColor;
use serde::{Deserialize, Serialize};

use super::rps::{resolve, RoundResult, RpsChoice};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DuelError {
    #[error("not allowed during {0}")]
    WrongPhase(String),
    #[error("a choice was already submitted this round")]
    AlreadyChosen,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DuelPhase {
    #[default]
    RockPaperScissors,
    Playing,
}

impl DuelPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RockPaperScissors => "rockPaperScissors",
            Self::Playing => "playing",
        }
    }
}

/// A resolved round, kept so clients can show what happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevealedRound {
    pub white: RpsChoice,
    pub black: RpsChoice,
    pub winner: Option<PieceColor>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpsOutcome {
    /// Still waiting for the other side.
    Pending,
    Tie,
    Won(PieceColor),
}

/// Rock-paper-scissors pre-phase and the single-use chaos token it awards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChaosDuel {
    pub phase: DuelPhase,
    pub round: u32,
    white_choice: Option<RpsChoice>,
    black_choice: Option<RpsChoice>,
    pub last_round: Option<RevealedRound>,
    pub token_holder: Option<PieceColor>,
    pub token_used: bool,
}

impl ChaosDuel {
    pub fn new() -> Self {
        Self {
            round: 1,
            ..Self::default()
        }
    }

    pub fn is_playing(&self) -> bool {
        self.phase == DuelPhase::Playing
    }

    pub fn has_chosen(&self, side: PieceColor) -> bool {
        match side {
            PieceColor::White => self.white_choice.is_some(),
            PieceColor::Black => self.black_choice.is_some(),
        }
    }

    pub fn submit(&mut self, side: PieceColor, choice: RpsChoice) -> Result<RpsOutcome, DuelError> {
        if self.is_playing() {
            return Err(DuelError::WrongPhase(self.phase.as_str().into()));
        }
        let slot = match side {
            PieceColor::White => &mut self.white_choice,
            PieceColor::Black => &mut self.black_choice,
        };
        if slot.is_some() {
            return Err(DuelError::AlreadyChosen);
        }
        *slot = Some(choice);

        let (Some(white), Some(black)) = (self.white_choice, self.black_choice) else {
            return Ok(RpsOutcome::Pending);
        };
        let winner = match resolve(white, black) {
            RoundResult::First => Some(PieceColor::White),
            RoundResult::Second => Some(PieceColor::Black),
            RoundResult::Tie => None,
        };
        self.last_round = Some(RevealedRound {
            white,
            black,
            winner,
        });
        self.white_choice = None;
        self.black_choice = None;

        match winner {
            Some(side) => {
                self.phase = DuelPhase::Playing;
                self.token_holder = Some(side);
                Ok(RpsOutcome::Won(side))
            }
            None => {
                self.round += 1;
                Ok(RpsOutcome::Tie)
            }
        }
    }

    /// Whether a move by `side` may break the rules. Requests from the
    /// non-holder, or after the token is spent, fall back to strict play.
    pub fn may_force(&self, side: PieceColor, requested: bool) -> bool {
        requested && self.is_playing() && !self.token_used && self.token_holder == Some(side)
    }

    pub fn consume(&mut self) {
        self.token_used = true;
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

/// Client-facing view of a duel. Pending choices are reported only as
/// submitted flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChaosView {
    pub phase: DuelPhase,
    pub round: u32,
    pub white_submitted: bool,
    pub black_submitted: bool,
    pub last_round: Option<RevealedRound>,
    pub token_holder: Option<PieceColor>,
    pub token_used: bool,
}

impl From<&ChaosDuel> for ChaosView {
    fn from(duel: &ChaosDuel) -> Self {
        Self {
            phase: duel.phase,
            round: duel.round,
            white_submitted: duel.white_choice.is_some(),
            black_submitted: duel.black_choice.is_some(),
            last_round: duel.last_round,
            token_holder: duel.token_holder,
            token_used: duel.token_used,
        }
    }
}
