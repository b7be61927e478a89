//! AI opponent: bot personas, the injected move provider, and the strategy
//! chain that turns proposals into applied moves.

pub mod mover;
pub mod personas;
pub mod provider;

pub use mover::{AiDecision, AiMover, AiTurn, Strategy};
pub use personas::{catalogue, find_bot, random_bot, Bot, BotInfo, Personality};
pub use provider::{AiError, MoveProvider, MoveRequest, OpenRouterProvider, ProposedMove};
