use thiserror::Error;

use super::types::{Phase, Round, Rupees, Side};
use crate::cards::DuplicateCard;

/// Recoverable command failures. The command is rejected, the caller is
/// told why, and no state is mutated.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("command not valid while {phase}")]
    InvalidTransition { phase: Phase },

    #[error(transparent)]
    DuplicateCard(#[from] DuplicateCard),

    #[error("no betting window is open")]
    BettingClosed,

    #[error("no stake to undo on {side} in round {round}")]
    NothingToUndo { side: Side, round: Round },

    #[error("insufficient balance: needed {needed}, available {available}")]
    InsufficientBalance { needed: Rupees, available: Rupees },

    #[error("stake amount must be positive")]
    ZeroStake,

    #[error("stale command: client saw seq {seen}, authoritative seq is {current}")]
    StaleCommand { seen: u64, current: u64 },
}

impl GameError {
    /// Stable machine-readable code sent to clients alongside the message.
    pub fn code(&self) -> &'static str {
        match self {
            GameError::InvalidTransition { .. } => "invalid_transition",
            GameError::DuplicateCard(_) => "duplicate_card",
            GameError::BettingClosed => "betting_closed",
            GameError::NothingToUndo { .. } => "nothing_to_undo",
            GameError::InsufficientBalance { .. } => "insufficient_balance",
            GameError::ZeroStake => "zero_stake",
            GameError::StaleCommand { .. } => "stale_command",
        }
    }
}
