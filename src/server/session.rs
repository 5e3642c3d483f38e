//! The authoritative session task. One tokio task owns the session state
//! and the betting ledger; everything else talks to it through a command
//! mailbox and a broadcast stream of sequence-numbered events.
//!
//! Serializing all mutation through one task is what makes the betting
//! window atomic: the countdown timer and a concurrent `place_bet` cannot
//! interleave, so a stake is either fully inside the window or rejected.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::RwLock;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use super::commands::{BettorCommand, ClientCommand, DealerCommand};
use super::dto::SessionSnapshot;
use super::events::{CommandReply, EventEnvelope, ServerEvent};
use crate::engine::{
    BettorId, DealerEngine, GameEngine, GameError, Phase, Round, Rupees, StakeId, Transition,
};
use crate::engine::{SessionState, WinningOutcome};
use crate::ledger::BettingLedger;
use crate::store::{BalanceError, BalanceLedger, PersistedSession, SessionStore};

const LOG_TARGET: &str = "andar_bahar::server::session";

/// Mailbox depth before command senders start to backpressure.
pub const DEFAULT_COMMAND_CAPACITY: usize = 256;
/// Broadcast ring size; a subscriber lagging past this must resync.
pub const DEFAULT_BROADCAST_CAPACITY: usize = 512;

pub struct SessionServiceConfig {
    pub store: Arc<dyn SessionStore>,
    pub balances: Arc<dyn BalanceLedger>,
    pub command_capacity: usize,
    pub broadcast_capacity: usize,
}

impl SessionServiceConfig {
    pub fn new(store: Arc<dyn SessionStore>, balances: Arc<dyn BalanceLedger>) -> Self {
        Self {
            store,
            balances,
            command_capacity: DEFAULT_COMMAND_CAPACITY,
            broadcast_capacity: DEFAULT_BROADCAST_CAPACITY,
        }
    }
}

struct CommandRequest {
    command: ClientCommand,
    reply_tx: oneshot::Sender<CommandReply>,
}

/// Cheap-to-clone handle held by every connection and route.
#[derive(Clone)]
pub struct SessionHandle {
    command_tx: mpsc::Sender<CommandRequest>,
    events_tx: broadcast::Sender<EventEnvelope>,
    snapshot: Arc<RwLock<SessionSnapshot>>,
}

impl SessionHandle {
    /// Rehydrates from the store (if a session was persisted) and spawns
    /// the owning task.
    pub async fn spawn(config: SessionServiceConfig) -> Self {
        let (command_tx, command_rx) = mpsc::channel(config.command_capacity);
        let (events_tx, _) = broadcast::channel(config.broadcast_capacity);

        let (state, ledger) = match config.store.load_current().await {
            Ok(Some(persisted)) => {
                info!(
                    target: LOG_TARGET,
                    session_id = %persisted.state.session_id,
                    phase = %persisted.state.phase,
                    "rehydrated session from store"
                );
                (persisted.state, persisted.ledger)
            }
            Ok(None) => (SessionState::new(), BettingLedger::new()),
            Err(err) => {
                warn!(target: LOG_TARGET, %err, "store unavailable at startup, starting fresh");
                (SessionState::new(), BettingLedger::new())
            }
        };

        let snapshot = Arc::new(RwLock::new(SessionSnapshot::from_domain(0, &state, &ledger)));
        let mut actor = SessionActor {
            state,
            ledger,
            seq: 0,
            deadline: None,
            store: config.store,
            balances: config.balances,
            events_tx: events_tx.clone(),
            snapshot: Arc::clone(&snapshot),
        };
        // A deadline persisted in the past fires on the first loop turn.
        actor.resync_deadline();
        tokio::spawn(actor.run(command_rx));

        Self {
            command_tx,
            events_tx,
            snapshot,
        }
    }

    /// Submits a command and waits for the authoritative verdict.
    pub async fn execute(&self, command: ClientCommand) -> CommandReply {
        let (reply_tx, reply_rx) = oneshot::channel();
        let request = CommandRequest { command, reply_tx };
        if self.command_tx.send(request).await.is_err() {
            return session_unavailable();
        }
        reply_rx.await.unwrap_or_else(|_| session_unavailable())
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EventEnvelope> {
        self.events_tx.subscribe()
    }

    /// Current full read model, consistent as of its `seq`.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.read().clone()
    }
}

fn session_unavailable() -> CommandReply {
    CommandReply::CommandRejected {
        code: "session_unavailable",
        reason: "session task is not running".to_string(),
    }
}

/// Per-command side data returned to the issuer alongside the new seq.
#[derive(Default)]
struct Applied {
    stake_id: Option<StakeId>,
    refund: Option<Rupees>,
}

struct SessionActor {
    state: SessionState,
    ledger: BettingLedger,
    /// Monotonic broadcast sequence; bumped once per published event.
    seq: u64,
    /// Monotonic-clock mirror of `state.betting_deadline` for the timer arm.
    deadline: Option<Instant>,
    store: Arc<dyn SessionStore>,
    balances: Arc<dyn BalanceLedger>,
    events_tx: broadcast::Sender<EventEnvelope>,
    snapshot: Arc<RwLock<SessionSnapshot>>,
}

impl SessionActor {
    async fn run(mut self, mut command_rx: mpsc::Receiver<CommandRequest>) {
        loop {
            // Disabled branches still evaluate their expression, so feed the
            // sleep a placeholder when no window is open.
            let deadline = self
                .deadline
                .unwrap_or_else(|| Instant::now() + Duration::from_secs(3600));
            tokio::select! {
                request = command_rx.recv() => match request {
                    Some(CommandRequest { command, reply_tx }) => {
                        let reply = self.handle_command(command).await;
                        let _ = reply_tx.send(reply);
                    }
                    None => {
                        info!(target: LOG_TARGET, "all handles dropped, session task stopping");
                        break;
                    }
                },
                _ = sleep_until(deadline), if self.deadline.is_some() => {
                    self.handle_timer_expiry().await;
                }
            }
        }
    }

    async fn handle_command(&mut self, command: ClientCommand) -> CommandReply {
        let result = match command {
            ClientCommand::Dealer {
                expected_seq,
                command,
            } => self.handle_dealer(expected_seq, command).await,
            ClientCommand::Bettor { bettor_id, command } => {
                self.handle_bettor(bettor_id, command).await
            }
        };
        match result {
            Ok(applied) => CommandReply::CommandAccepted {
                seq: self.seq,
                stake_id: applied.stake_id,
                refund: applied.refund,
            },
            Err(err) => {
                debug!(target: LOG_TARGET, %err, "command rejected");
                CommandReply::CommandRejected {
                    code: err.code(),
                    reason: err.to_string(),
                }
            }
        }
    }

    async fn handle_dealer(
        &mut self,
        expected_seq: Option<u64>,
        command: DealerCommand,
    ) -> Result<Applied, GameError> {
        if let Some(seen) = expected_seq {
            if seen != self.seq {
                return Err(GameError::StaleCommand {
                    seen,
                    current: self.seq,
                });
            }
        }

        let transition = match command {
            DealerCommand::StartGame => GameEngine::start_game(&mut self.state)?,
            DealerCommand::SelectOpeningCard {
                card,
                countdown_secs,
            } => GameEngine::select_opening_card(&mut self.state, card, countdown_secs)?,
            DealerCommand::SaveCards { bahar, andar } => {
                GameEngine::save_cards(&mut self.state, bahar, andar)?
            }
            DealerCommand::RevealCards => GameEngine::reveal_cards(&mut self.state)?,
            DealerCommand::DealSingleCard { card } => {
                GameEngine::deal_single_card(&mut self.state, card)?
            }
            DealerCommand::AdvanceRound => GameEngine::close_betting(&mut self.state)?,
            DealerCommand::ResetGame => self.reset_session().await?,
        };
        self.apply_transition(transition).await;
        Ok(Applied::default())
    }

    /// Reset settles nothing itself: a completed session was already paid
    /// out, an aborted one refunds every active stake at face value.
    async fn reset_session(&mut self) -> Result<Transition, GameError> {
        let settled = self.state.winner.is_some();
        let archive = PersistedSession {
            state: self.state.clone(),
            ledger: self.ledger.clone(),
        };
        let transition = GameEngine::reset_game(&mut self.state)?;

        if settled {
            if let Err(err) = self.store.append_history(&archive).await {
                warn!(target: LOG_TARGET, %err, "failed to archive completed session");
            }
        } else {
            let refunds: Vec<(BettorId, Rupees)> = self
                .ledger
                .active_stakes()
                .map(|s| (s.bettor_id, s.amount))
                .collect();
            info!(
                target: LOG_TARGET,
                count = refunds.len(),
                "refunding active stakes on mid-session reset"
            );
            for (bettor_id, amount) in refunds {
                self.balances.credit(bettor_id, amount).await;
            }
        }
        self.ledger.clear();
        Ok(transition)
    }

    async fn handle_bettor(
        &mut self,
        bettor_id: BettorId,
        command: BettorCommand,
    ) -> Result<Applied, GameError> {
        let round = match self.state.phase {
            Phase::Betting { round } => round,
            _ => return Err(GameError::BettingClosed),
        };
        match command {
            BettorCommand::PlaceBet { side, amount } => {
                if amount == 0 {
                    return Err(GameError::ZeroStake);
                }
                self.balances
                    .debit(bettor_id, amount)
                    .await
                    .map_err(|BalanceError::Insufficient { needed, available }| {
                        GameError::InsufficientBalance { needed, available }
                    })?;
                let stake_id = match self.ledger.place_stake(round, side, bettor_id, amount) {
                    Ok(stake_id) => stake_id,
                    Err(err) => {
                        // Undo the debit, the stake was never recorded.
                        self.balances.credit(bettor_id, amount).await;
                        return Err(err.into());
                    }
                };
                self.publish_totals(round);
                self.after_mutation().await;
                Ok(Applied {
                    stake_id: Some(stake_id),
                    refund: None,
                })
            }
            BettorCommand::UndoBet { side } => {
                let refund = self.ledger.undo_last_stake(round, side, bettor_id)?;
                self.balances.credit(bettor_id, refund).await;
                self.publish_totals(round);
                self.after_mutation().await;
                Ok(Applied {
                    stake_id: None,
                    refund: Some(refund),
                })
            }
        }
    }

    async fn handle_timer_expiry(&mut self) {
        self.deadline = None;
        match GameEngine::close_betting(&mut self.state) {
            Ok(transition) => {
                info!(
                    target: LOG_TARGET,
                    phase = %self.state.phase,
                    "betting window expired"
                );
                self.apply_transition(transition).await;
            }
            // The dealer closed the window first; the expiry is a no-op.
            Err(_) => {}
        }
    }

    async fn apply_transition(&mut self, transition: Transition) {
        for event in transition.events() {
            self.publish(ServerEvent::from_game_event(
                event.clone(),
                self.state.betting_deadline,
            ));
        }
        if let Transition::SessionComplete { outcome, .. } = &transition {
            self.settle(*outcome).await;
        }
        self.after_mutation().await;
    }

    /// Pays winning stakes per the session's payout regime. Losing stakes
    /// were debited at placement and receive nothing.
    async fn settle(&mut self, outcome: WinningOutcome) {
        let credits: Vec<(BettorId, Rupees)> = self
            .ledger
            .active_stakes()
            .filter(|stake| stake.side == outcome.side)
            .map(|stake| (stake.bettor_id, outcome.regime.winning_credit(stake.amount)))
            .collect();
        let total: Rupees = credits.iter().map(|(_, amount)| amount).sum();
        info!(
            target: LOG_TARGET,
            session_id = %self.state.session_id,
            side = %outcome.side,
            round = %outcome.round,
            winners = credits.len(),
            total,
            "settling session"
        );
        for (bettor_id, amount) in credits {
            self.balances.credit(bettor_id, amount).await;
        }
    }

    fn publish(&mut self, event: ServerEvent) {
        self.seq += 1;
        let envelope = EventEnvelope {
            seq: self.seq,
            session_id: self.state.session_id,
            sent_at: Utc::now(),
            event,
        };
        // No subscribers is fine; the envelope is dropped.
        let _ = self.events_tx.send(envelope);
    }

    fn publish_totals(&mut self, round: Round) {
        let totals = self.ledger.round_totals(round);
        self.publish(ServerEvent::BetTotals {
            round,
            andar: totals.andar,
            bahar: totals.bahar,
        });
    }

    /// Re-arms the timer, refreshes the read model, and persists. Runs after
    /// every accepted mutation.
    async fn after_mutation(&mut self) {
        self.resync_deadline();
        *self.snapshot.write() =
            SessionSnapshot::from_domain(self.seq, &self.state, &self.ledger);
        let record = PersistedSession {
            state: self.state.clone(),
            ledger: self.ledger.clone(),
        };
        if let Err(err) = self.store.save(&record).await {
            warn!(
                target: LOG_TARGET,
                %err,
                "session save failed, continuing from memory"
            );
        }
    }

    fn resync_deadline(&mut self) {
        self.deadline = self.state.betting_deadline.map(|deadline| {
            let remaining = (deadline - Utc::now()).to_std().unwrap_or_default();
            Instant::now() + remaining
        });
    }
}
