use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::resolver::PayoutRegime;
use super::types::{DealtCard, Phase, Round, SavedPair, SessionId, Side};
use crate::cards::{Card, UsedCards};

/// The recorded outcome of a completed session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinningOutcome {
    pub side: Side,
    pub card: Card,
    pub round: Round,
    pub regime: PayoutRegime,
}

/// The root aggregate. Exactly one session is current at a time; it is
/// mutated exclusively by dealer commands and the betting-window timer,
/// both applied through the single authoritative task.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub session_id: SessionId,
    pub phase: Phase,
    pub opening_card: Option<Card>,
    /// Append-only dealing history, both sides interleaved.
    pub dealt: Vec<DealtCard>,
    pub used: UsedCards,
    /// Configured betting-window duration; round 2 re-arms with the same value.
    pub countdown_secs: u64,
    /// Absolute end of the open betting window, if one is running.
    pub betting_deadline: Option<DateTime<Utc>>,
    /// Face-down pair staged for the current round (rounds 1 and 2 only).
    pub saved_pair: Option<SavedPair>,
    /// Which side receives the next card in round 3. Alternates
    /// deterministically starting with Bahar.
    pub round3_next_side: Side,
    pub winner: Option<WinningOutcome>,
    pub created_at: DateTime<Utc>,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            phase: Phase::Idle,
            opening_card: None,
            dealt: Vec::new(),
            used: UsedCards::new(),
            countdown_secs: 0,
            betting_deadline: None,
            saved_pair: None,
            round3_next_side: Side::Bahar,
            winner: None,
            created_at: Utc::now(),
        }
    }

    /// Cards dealt to one side, in dealing order.
    pub fn cards_for(&self, side: Side) -> Vec<Card> {
        self.dealt
            .iter()
            .filter(|d| d.side == side)
            .map(|d| d.card)
            .collect()
    }

    /// 1-based sequence for the next dealt card.
    pub fn next_sequence(&self) -> u32 {
        self.dealt.len() as u32 + 1
    }

    pub fn is_betting_open(&self, round: Round) -> bool {
        self.phase == Phase::Betting { round }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
