//! Events pushed to connected clients, each wrapped in a sequence-numbered
//! envelope so gaps are detectable and a full resync can be requested.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::cards::Card;
use crate::engine::{
    GameEvent, PayoutRegime, Phase, Round, Rupees, SessionId, Side, StakeId,
};

#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    SessionStarted {
        session_id: SessionId,
    },
    OpeningCardSelected {
        card: Card,
        countdown_secs: u64,
    },
    PhaseChanged {
        phase: Phase,
        #[serde(skip_serializing_if = "Option::is_none")]
        countdown_secs: Option<u64>,
        /// Absolute end of the betting window, when one is open.
        #[serde(skip_serializing_if = "Option::is_none")]
        deadline: Option<DateTime<Utc>>,
    },
    CardsSaved {
        round: Round,
    },
    CardDealt {
        card: Card,
        side: Side,
        round: Round,
        sequence: u32,
    },
    BetTotals {
        round: Round,
        andar: Rupees,
        bahar: Rupees,
    },
    WinnerDeclared {
        side: Side,
        card: Card,
        round: Round,
        regime: PayoutRegime,
    },
    SessionReset {
        session_id: SessionId,
    },
}

impl ServerEvent {
    pub fn event_name(&self) -> &'static str {
        match self {
            ServerEvent::SessionStarted { .. } => "session_started",
            ServerEvent::OpeningCardSelected { .. } => "opening_card_selected",
            ServerEvent::PhaseChanged { .. } => "phase_changed",
            ServerEvent::CardsSaved { .. } => "cards_saved",
            ServerEvent::CardDealt { .. } => "card_dealt",
            ServerEvent::BetTotals { .. } => "bet_totals",
            ServerEvent::WinnerDeclared { .. } => "winner_declared",
            ServerEvent::SessionReset { .. } => "session_reset",
        }
    }

    /// Lifts a domain event into its wire shape. The deadline is attached
    /// by the actor, which owns the clock.
    pub fn from_game_event(event: GameEvent, deadline: Option<DateTime<Utc>>) -> Self {
        match event {
            GameEvent::SessionStarted { session_id } => ServerEvent::SessionStarted { session_id },
            GameEvent::OpeningCardSelected {
                card,
                countdown_secs,
            } => ServerEvent::OpeningCardSelected {
                card,
                countdown_secs,
            },
            GameEvent::PhaseChanged {
                phase,
                countdown_secs,
            } => ServerEvent::PhaseChanged {
                phase,
                countdown_secs,
                deadline,
            },
            GameEvent::CardsSaved { round } => ServerEvent::CardsSaved { round },
            GameEvent::CardDealt { dealt } => ServerEvent::CardDealt {
                card: dealt.card,
                side: dealt.side,
                round: dealt.round,
                sequence: dealt.sequence,
            },
            GameEvent::WinnerDeclared {
                side,
                card,
                round,
                regime,
            } => ServerEvent::WinnerDeclared {
                side,
                card,
                round,
                regime,
            },
            GameEvent::SessionReset { session_id } => ServerEvent::SessionReset { session_id },
        }
    }
}

/// Broadcast unit: a session-scoped, monotonically increasing `seq` plus
/// the event payload, flattened so the wire object keeps a single `type`.
#[derive(Clone, Debug, Serialize)]
pub struct EventEnvelope {
    pub seq: u64,
    pub session_id: SessionId,
    pub sent_at: DateTime<Utc>,
    #[serde(flatten)]
    pub event: ServerEvent,
}

/// Direct reply to the issuing client; never broadcast.
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandReply {
    CommandAccepted {
        /// Authoritative seq after the command applied.
        seq: u64,
        #[serde(skip_serializing_if = "Option::is_none")]
        stake_id: Option<StakeId>,
        #[serde(skip_serializing_if = "Option::is_none")]
        refund: Option<Rupees>,
    },
    CommandRejected {
        code: &'static str,
        reason: String,
    },
}
