//! Per-round betting ledger: global cumulative totals per side plus
//! per-bettor stake history for LIFO undo.
//!
//! The ledger enforces money-shape invariants only (positive stakes,
//! round 3 takes no bets, totals equal the sum of active stakes). Whether
//! a betting window is open is the state machine's call, and balances
//! belong to the balance collaborator. All mutation goes through the single
//! authoritative task, which serializes same-round+side updates by
//! construction.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::engine::{BettorId, GameError, Round, Rupees, Side, StakeId};

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("round {round} does not accept bets")]
    RoundClosedToBets { round: Round },
    #[error("no stake to undo on {side} in round {round}")]
    NothingToUndo { side: Side, round: Round },
    #[error("stake amount must be positive")]
    ZeroStake,
}

impl From<LedgerError> for GameError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::RoundClosedToBets { .. } => GameError::BettingClosed,
            LedgerError::NothingToUndo { side, round } => GameError::NothingToUndo { side, round },
            LedgerError::ZeroStake => GameError::ZeroStake,
        }
    }
}

/// One individual wager instance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stake {
    pub stake_id: StakeId,
    pub bettor_id: BettorId,
    pub side: Side,
    pub amount: Rupees,
    pub round: Round,
    pub placed_at: DateTime<Utc>,
}

/// Global cumulative totals for one round.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideTotals {
    pub andar: Rupees,
    pub bahar: Rupees,
}

impl SideTotals {
    pub fn for_side(&self, side: Side) -> Rupees {
        match side {
            Side::Andar => self.andar,
            Side::Bahar => self.bahar,
        }
    }

    fn add(&mut self, side: Side, amount: Rupees) {
        match side {
            Side::Andar => self.andar += amount,
            Side::Bahar => self.bahar += amount,
        }
    }

    fn sub(&mut self, side: Side, amount: Rupees) {
        match side {
            Side::Andar => self.andar -= amount,
            Side::Bahar => self.bahar -= amount,
        }
    }
}

/// A bettor's active stakes in one round, one ordered (FIFO) list per side.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
struct BettorStakes {
    andar: Vec<Stake>,
    bahar: Vec<Stake>,
}

impl BettorStakes {
    fn list(&self, side: Side) -> &Vec<Stake> {
        match side {
            Side::Andar => &self.andar,
            Side::Bahar => &self.bahar,
        }
    }

    fn list_mut(&mut self, side: Side) -> &mut Vec<Stake> {
        match side {
            Side::Andar => &mut self.andar,
            Side::Bahar => &mut self.bahar,
        }
    }

    fn is_empty(&self) -> bool {
        self.andar.is_empty() && self.bahar.is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundLedger {
    totals: SideTotals,
    bettors: HashMap<BettorId, BettorStakes>,
}

impl RoundLedger {
    pub fn totals(&self) -> SideTotals {
        self.totals
    }

    fn active_stakes(&self) -> impl Iterator<Item = &Stake> {
        self.bettors
            .values()
            .flat_map(|b| b.andar.iter().chain(b.bahar.iter()))
    }
}

/// Rounds are an indexed mapping so round 3's "no ledger" case is a natural
/// absence of key rather than a zeroed struct.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BettingLedger {
    rounds: BTreeMap<u8, RoundLedger>,
}

impl BettingLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a stake and bumps the round's cumulative total.
    pub fn place_stake(
        &mut self,
        round: Round,
        side: Side,
        bettor_id: BettorId,
        amount: Rupees,
    ) -> Result<StakeId, LedgerError> {
        if !round.accepts_bets() {
            return Err(LedgerError::RoundClosedToBets { round });
        }
        if amount == 0 {
            return Err(LedgerError::ZeroStake);
        }
        let stake = Stake {
            stake_id: Uuid::new_v4(),
            bettor_id,
            side,
            amount,
            round,
            placed_at: Utc::now(),
        };
        let stake_id = stake.stake_id;
        let ledger = self.rounds.entry(round.number()).or_default();
        ledger
            .bettors
            .entry(bettor_id)
            .or_default()
            .list_mut(side)
            .push(stake);
        ledger.totals.add(side, amount);
        Ok(stake_id)
    }

    /// Removes the most recent stake for that bettor+side+round and returns
    /// the amount to refund. Strictly LIFO; never touches another list.
    pub fn undo_last_stake(
        &mut self,
        round: Round,
        side: Side,
        bettor_id: BettorId,
    ) -> Result<Rupees, LedgerError> {
        let ledger = self
            .rounds
            .get_mut(&round.number())
            .ok_or(LedgerError::NothingToUndo { side, round })?;
        let stakes = ledger
            .bettors
            .get_mut(&bettor_id)
            .ok_or(LedgerError::NothingToUndo { side, round })?;
        let stake = stakes
            .list_mut(side)
            .pop()
            .ok_or(LedgerError::NothingToUndo { side, round })?;
        ledger.totals.sub(side, stake.amount);
        if stakes.is_empty() {
            ledger.bettors.remove(&bettor_id);
        }
        Ok(stake.amount)
    }

    /// Administrative correction: clears one side or both for a bettor in a
    /// round, returning the total removed (for balance refund).
    pub fn clear_bettor_stakes(
        &mut self,
        round: Round,
        side: Option<Side>,
        bettor_id: BettorId,
    ) -> Rupees {
        let Some(ledger) = self.rounds.get_mut(&round.number()) else {
            return 0;
        };
        let Some(stakes) = ledger.bettors.get_mut(&bettor_id) else {
            return 0;
        };
        let sides = match side {
            Some(s) => vec![s],
            None => vec![Side::Andar, Side::Bahar],
        };
        let mut removed = 0;
        for s in sides {
            let list = stakes.list_mut(s);
            let amount: Rupees = list.iter().map(|stake| stake.amount).sum();
            list.clear();
            ledger.totals.sub(s, amount);
            removed += amount;
        }
        if stakes.is_empty() {
            ledger.bettors.remove(&bettor_id);
        }
        removed
    }

    /// Read-only aggregate; zero totals for rounds with no ledger.
    pub fn round_totals(&self, round: Round) -> SideTotals {
        self.rounds
            .get(&round.number())
            .map(|l| l.totals())
            .unwrap_or_default()
    }

    /// Active stakes across all rounds, for settlement and reset refunds.
    pub fn active_stakes(&self) -> impl Iterator<Item = &Stake> {
        self.rounds.values().flat_map(|l| l.active_stakes())
    }

    /// A bettor's active stake count on one side of a round.
    pub fn stake_count(&self, round: Round, side: Side, bettor_id: BettorId) -> usize {
        self.rounds
            .get(&round.number())
            .and_then(|l| l.bettors.get(&bettor_id))
            .map(|b| b.list(side).len())
            .unwrap_or(0)
    }

    pub fn clear(&mut self) {
        self.rounds.clear();
    }
}
