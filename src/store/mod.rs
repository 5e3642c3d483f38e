//! Narrow interfaces to the excluded subsystems: persistence and the
//! balance book. The core consumes these as trait objects; in-memory
//! implementations back tests and single-node deployments.

pub mod in_memory;

pub use in_memory::{InMemoryBalances, InMemorySessionStore};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::{BettorId, Rupees, SessionState};
use crate::ledger::BettingLedger;

/// Everything needed to re-derive authoritative in-memory state on restart.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedSession {
    pub state: SessionState,
    pub ledger: BettingLedger,
}

#[derive(Clone, Debug, Error)]
pub enum StoreError {
    #[error("session storage unavailable: {0}")]
    Unavailable(String),
}

/// Best-effort durability, not a cache: a failed save degrades durability
/// but never invalidates the in-memory authoritative state.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load_current(&self) -> Result<Option<PersistedSession>, StoreError>;
    async fn save(&self, session: &PersistedSession) -> Result<(), StoreError>;
    /// Archives a completed session before the current slot is cleared.
    async fn append_history(&self, completed: &PersistedSession) -> Result<(), StoreError>;
}

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum BalanceError {
    #[error("insufficient balance: needed {needed}, available {available}")]
    Insufficient { needed: Rupees, available: Rupees },
}

/// The balance book. Debited before a stake is accepted; credited on undo,
/// refund, and win. The betting ledger never mutates balances directly.
#[async_trait]
pub trait BalanceLedger: Send + Sync {
    async fn debit(&self, bettor_id: BettorId, amount: Rupees) -> Result<(), BalanceError>;
    async fn credit(&self, bettor_id: BettorId, amount: Rupees);
    async fn balance(&self, bettor_id: BettorId) -> Rupees;
}
