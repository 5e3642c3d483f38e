//! Authoritative game-session state machine and winner resolution.

pub mod engine;
pub mod errors;
pub mod events;
pub mod resolver;
pub mod state;
pub mod types;

#[cfg(test)]
mod tests;

pub use engine::{DealerEngine, GameEngine, Transition};
pub use errors::GameError;
pub use events::GameEvent;
pub use resolver::{is_match, payout_regime, PayoutRegime};
pub use state::{SessionState, WinningOutcome};
pub use types::{
    clamp_countdown, BettorId, DealtCard, Phase, Round, Rupees, SavedPair, SessionId, Side,
    StakeId, MAX_COUNTDOWN_SECS, MIN_COUNTDOWN_SECS,
};
