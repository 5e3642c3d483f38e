use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::cards::Card;

/// Monetary amounts in whole rupees.
pub type Rupees = u64;
pub type SessionId = Uuid;
pub type BettorId = Uuid;
pub type StakeId = Uuid;

pub const MIN_COUNTDOWN_SECS: u64 = 10;
pub const MAX_COUNTDOWN_SECS: u64 = 300;

/// Clamps a dealer-supplied countdown into the allowed window.
pub fn clamp_countdown(secs: u64) -> u64 {
    secs.clamp(MIN_COUNTDOWN_SECS, MAX_COUNTDOWN_SECS)
}

/// The two sides a bettor can back; also the two piles cards are dealt into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Andar,
    Bahar,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::Andar => Side::Bahar,
            Side::Bahar => Side::Andar,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Andar => write!(f, "andar"),
            Side::Bahar => write!(f, "bahar"),
        }
    }
}

/// Rounds advance strictly 1 → 2 → 3. Rounds 1 and 2 open a betting window
/// and deal one card per side; round 3 deals continuously with no betting.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Round {
    First = 1,
    Second = 2,
    Third = 3,
}

impl Round {
    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn next(self) -> Option<Round> {
        match self {
            Round::First => Some(Round::Second),
            Round::Second => Some(Round::Third),
            Round::Third => None,
        }
    }

    pub fn accepts_bets(self) -> bool {
        !matches!(self, Round::Third)
    }
}

impl fmt::Display for Round {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.number())
    }
}

/// Coarse lifecycle state of a session. The active round is carried only
/// where it is meaningful.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Opening,
    Betting { round: Round },
    Dealing { round: Round },
    Complete,
}

impl Phase {
    pub fn round(&self) -> Option<Round> {
        match self {
            Phase::Betting { round } | Phase::Dealing { round } => Some(*round),
            Phase::Idle | Phase::Opening | Phase::Complete => None,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Phase::Idle => "Waiting for dealer to start a game",
            Phase::Opening => "Dealer selecting the opening card",
            Phase::Betting { .. } => "Betting window open",
            Phase::Dealing { .. } => "Dealing cards",
            Phase::Complete => "Session complete",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Idle => write!(f, "idle"),
            Phase::Opening => write!(f, "opening"),
            Phase::Betting { round } => write!(f, "betting(round {round})"),
            Phase::Dealing { round } => write!(f, "dealing(round {round})"),
            Phase::Complete => write!(f, "complete"),
        }
    }
}

/// Append-only record of a dealt card. `sequence` is 1-based within the
/// session and never reused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealtCard {
    pub card: Card,
    pub side: Side,
    pub round: Round,
    pub sequence: u32,
}

/// The face-down pair staged by the dealer for rounds 1 and 2.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedPair {
    pub bahar: Card,
    pub andar: Card,
}
