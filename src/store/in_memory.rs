//! In-memory collaborator implementations for tests and single-node runs.

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::debug;

use super::{BalanceError, BalanceLedger, PersistedSession, SessionStore, StoreError};
use crate::engine::{BettorId, Rupees};

const LOG_TARGET: &str = "andar_bahar::store::in_memory";

#[derive(Default)]
pub struct InMemorySessionStore {
    current: Mutex<Option<PersistedSession>>,
    history: Mutex<Vec<PersistedSession>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history_len(&self) -> usize {
        self.history.lock().len()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn load_current(&self) -> Result<Option<PersistedSession>, StoreError> {
        Ok(self.current.lock().clone())
    }

    async fn save(&self, session: &PersistedSession) -> Result<(), StoreError> {
        *self.current.lock() = Some(session.clone());
        Ok(())
    }

    async fn append_history(&self, completed: &PersistedSession) -> Result<(), StoreError> {
        debug!(
            target: LOG_TARGET,
            session_id = %completed.state.session_id,
            "archiving completed session"
        );
        self.history.lock().push(completed.clone());
        Ok(())
    }
}

/// Concurrent balance book keyed by bettor id. Unknown bettors have a zero
/// balance and fail any debit.
#[derive(Default)]
pub struct InMemoryBalances {
    balances: DashMap<BettorId, Rupees>,
}

impl InMemoryBalances {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn deposit(&self, bettor_id: BettorId, amount: Rupees) {
        *self.balances.entry(bettor_id).or_insert(0) += amount;
    }
}

#[async_trait]
impl BalanceLedger for InMemoryBalances {
    async fn debit(&self, bettor_id: BettorId, amount: Rupees) -> Result<(), BalanceError> {
        let mut entry = self.balances.entry(bettor_id).or_insert(0);
        if *entry < amount {
            return Err(BalanceError::Insufficient {
                needed: amount,
                available: *entry,
            });
        }
        *entry -= amount;
        Ok(())
    }

    async fn credit(&self, bettor_id: BettorId, amount: Rupees) {
        *self.balances.entry(bettor_id).or_insert(0) += amount;
    }

    async fn balance(&self, bettor_id: BettorId) -> Rupees {
        self.balances.get(&bettor_id).map(|v| *v).unwrap_or(0)
    }
}
