use serde::{Deserialize, Serialize};

use super::resolver::PayoutRegime;
use super::types::{DealtCard, Phase, Round, SessionId, Side};
use crate::cards::Card;

/// Domain events produced by engine transitions, in application order.
/// The broadcast layer wraps these in sequence-numbered envelopes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameEvent {
    SessionStarted {
        session_id: SessionId,
    },
    OpeningCardSelected {
        card: Card,
        countdown_secs: u64,
    },
    PhaseChanged {
        phase: Phase,
        /// Present when the new phase opens a betting window.
        countdown_secs: Option<u64>,
    },
    CardsSaved {
        round: Round,
    },
    CardDealt {
        dealt: DealtCard,
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
