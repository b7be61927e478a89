//! Chaos duel rules shared by local duel games and online matches:
//! the rock-paper-scissors pre-phase, the chaos token it awards, and
//! time controls.

pub mod chaos;
pub mod clock;
pub mod rps;

pub use chaos::{ChaosDuel, ChaosView, DuelError, DuelPhase, RevealedRound, RpsOutcome};
pub use clock::TimeControl;
pub use rps::{resolve, RoundResult, RpsChoice};
