//! Snapshot DTO served over HTTP and on WebSocket connect; the full
//! authoritative view a client needs to (re)build local state.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cards::Card;
use crate::engine::{Phase, Round, SessionId, SessionState, WinningOutcome};
use crate::ledger::{BettingLedger, SideTotals};

#[derive(Clone, Debug, Serialize)]
pub struct RoundTotalsDto {
    pub round: Round,
    pub andar: u64,
    pub bahar: u64,
}

#[derive(Clone, Debug, Serialize)]
pub struct SessionSnapshot {
    /// Seq of the last broadcast event this snapshot reflects.
    pub seq: u64,
    pub session_id: SessionId,
    pub phase: Phase,
    pub opening_card: Option<Card>,
    pub bahar_cards: Vec<Card>,
    pub andar_cards: Vec<Card>,
    pub countdown_secs: Option<u64>,
    pub betting_deadline: Option<DateTime<Utc>>,
    pub round_totals: Vec<RoundTotalsDto>,
    pub winner: Option<WinningOutcome>,
}

impl SessionSnapshot {
    pub fn from_domain(seq: u64, state: &SessionState, ledger: &BettingLedger) -> Self {
        let countdown_secs = match state.phase {
            Phase::Betting { .. } => Some(state.countdown_secs),
            _ => None,
        };
        let round_totals = [Round::First, Round::Second]
            .into_iter()
            .map(|round| {
                let SideTotals { andar, bahar } = ledger.round_totals(round);
                RoundTotalsDto {
                    round,
                    andar,
                    bahar,
                }
            })
            .collect();
        Self {
            seq,
            session_id: state.session_id,
            phase: state.phase,
            opening_card: state.opening_card,
            bahar_cards: state.cards_for(crate::engine::Side::Bahar),
            andar_cards: state.cards_for(crate::engine::Side::Andar),
            countdown_secs,
            betting_deadline: state.betting_deadline,
            round_totals,
            winner: state.winner,
        }
    }
}
