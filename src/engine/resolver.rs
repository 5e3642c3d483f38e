//! Winner determination and payout-regime classification.
//!
//! Pure and stateless; safe to call from any task. A dealt card matches the
//! opening card when their ranks are equal, suit is irrelevant. The payout
//! regime is a classification consumed by the balance collaborator, not a
//! money transfer.

use serde::{Deserialize, Serialize};

use super::types::{Round, Rupees, Side};
use crate::cards::Card;

/// Payout regime per (winning side, round).
///
/// The asymmetric table is a core game-design invariant:
///
/// | Winning side | Round  | Regime        |
/// |--------------|--------|---------------|
/// | Andar        | any    | double payout |
/// | Bahar        | 1 or 2 | refund        |
/// | Bahar        | 3      | even money    |
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutRegime {
    /// Winning stake pays out at stake × 2; losing side forfeits.
    DoublePayout,
    /// Winning stake is returned unchanged; losing side forfeits.
    Refund,
    /// Winning stake pays stake × 1 profit; losing side forfeits.
    EvenMoney,
}

impl PayoutRegime {
    /// Total amount credited back for a winning stake under this regime.
    /// Losing stakes are never credited.
    pub fn winning_credit(self, stake: Rupees) -> Rupees {
        match self {
            PayoutRegime::DoublePayout => stake * 2,
            PayoutRegime::Refund => stake,
            PayoutRegime::EvenMoney => stake * 2,
        }
    }
}

pub fn payout_regime(winning_side: Side, round: Round) -> PayoutRegime {
    match (winning_side, round) {
        (Side::Andar, _) => PayoutRegime::DoublePayout,
        (Side::Bahar, Round::First) | (Side::Bahar, Round::Second) => PayoutRegime::Refund,
        (Side::Bahar, Round::Third) => PayoutRegime::EvenMoney,
    }
}

/// Rank-equality match rule.
pub fn is_match(opening: Card, dealt: Card) -> bool {
    opening.matches_rank(dealt)
}
