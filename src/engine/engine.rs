use chrono::{Duration, Utc};

use super::errors::GameError;
use super::events::GameEvent;
use super::resolver::{is_match, payout_regime};
use super::state::{SessionState, WinningOutcome};
use super::types::{clamp_countdown, DealtCard, Phase, Round, SavedPair, Side};
use crate::cards::Card;

/// Result of a successfully applied dealer command or timer expiry.
/// Events are in application order and ready for broadcast.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transition {
    Advanced {
        events: Vec<GameEvent>,
    },
    SessionComplete {
        events: Vec<GameEvent>,
        outcome: WinningOutcome,
    },
}

impl Transition {
    pub fn events(&self) -> &[GameEvent] {
        match self {
            Transition::Advanced { events } | Transition::SessionComplete { events, .. } => events,
        }
    }
}

/// The authoritative phase/round state machine. Every operation validates
/// against the current phase before mutating anything; a rejected command
/// leaves the session untouched.
pub trait DealerEngine {
    /// `idle → opening`; resets all session fields under a fresh id.
    fn start_game(state: &mut SessionState) -> Result<Transition, GameError>;
    /// `opening → betting(1)`; marks the opening card used and arms the countdown.
    fn select_opening_card(
        state: &mut SessionState,
        card: Card,
        countdown_secs: u64,
    ) -> Result<Transition, GameError>;
    /// `betting(r) → dealing(r)`, from timer expiry or dealer override.
    fn close_betting(state: &mut SessionState) -> Result<Transition, GameError>;
    /// Stages the face-down pair for the current round (rounds 1–2).
    fn save_cards(
        state: &mut SessionState,
        bahar: Card,
        andar: Card,
    ) -> Result<Transition, GameError>;
    /// Reveals the staged pair, resolves a winner or auto-advances.
    fn reveal_cards(state: &mut SessionState) -> Result<Transition, GameError>;
    /// Round 3 continuous dealing, alternating Bahar/Andar.
    fn deal_single_card(state: &mut SessionState, card: Card) -> Result<Transition, GameError>;
    /// Clears the session back to `idle` under a fresh id.
    fn reset_game(state: &mut SessionState) -> Result<Transition, GameError>;
}

pub struct GameEngine;

impl GameEngine {
    fn arm_countdown(state: &mut SessionState) {
        state.betting_deadline =
            Some(Utc::now() + Duration::seconds(state.countdown_secs as i64));
    }

    fn complete(state: &mut SessionState, dealt: DealtCard) -> WinningOutcome {
        let outcome = WinningOutcome {
            side: dealt.side,
            card: dealt.card,
            round: dealt.round,
            regime: payout_regime(dealt.side, dealt.round),
        };
        state.winner = Some(outcome);
        state.phase = Phase::Complete;
        state.betting_deadline = None;
        outcome
    }
}

impl DealerEngine for GameEngine {
    fn start_game(state: &mut SessionState) -> Result<Transition, GameError> {
        if state.phase != Phase::Idle {
            return Err(GameError::InvalidTransition { phase: state.phase });
        }
        *state = SessionState::new();
        state.phase = Phase::Opening;
        Ok(Transition::Advanced {
            events: vec![
                GameEvent::SessionStarted {
                    session_id: state.session_id,
                },
                GameEvent::PhaseChanged {
                    phase: state.phase,
                    countdown_secs: None,
                },
            ],
        })
    }

    fn select_opening_card(
        state: &mut SessionState,
        card: Card,
        countdown_secs: u64,
    ) -> Result<Transition, GameError> {
        if state.phase != Phase::Opening {
            return Err(GameError::InvalidTransition { phase: state.phase });
        }
        state.used.mark(card)?;
        let countdown_secs = clamp_countdown(countdown_secs);
        state.opening_card = Some(card);
        state.countdown_secs = countdown_secs;
        state.phase = Phase::Betting {
            round: Round::First,
        };
        Self::arm_countdown(state);
        Ok(Transition::Advanced {
            events: vec![
                GameEvent::OpeningCardSelected {
                    card,
                    countdown_secs,
                },
                GameEvent::PhaseChanged {
                    phase: state.phase,
                    countdown_secs: Some(countdown_secs),
                },
            ],
        })
    }

    fn close_betting(state: &mut SessionState) -> Result<Transition, GameError> {
        let round = match state.phase {
            Phase::Betting { round } => round,
            phase => return Err(GameError::InvalidTransition { phase }),
        };
        state.phase = Phase::Dealing { round };
        state.betting_deadline = None;
        Ok(Transition::Advanced {
            events: vec![GameEvent::PhaseChanged {
                phase: state.phase,
                countdown_secs: None,
            }],
        })
    }

    fn save_cards(
        state: &mut SessionState,
        bahar: Card,
        andar: Card,
    ) -> Result<Transition, GameError> {
        let round = match state.phase {
            Phase::Betting { round } | Phase::Dealing { round } if round != Round::Third => round,
            phase => return Err(GameError::InvalidTransition { phase }),
        };
        if state.saved_pair.is_some() {
            return Err(GameError::InvalidTransition { phase: state.phase });
        }
        // Validate both before mutating: no partial mark on rejection.
        if state.used.is_used(bahar) {
            return Err(crate::cards::DuplicateCard { card: bahar }.into());
        }
        if bahar == andar || state.used.is_used(andar) {
            return Err(crate::cards::DuplicateCard { card: andar }.into());
        }
        state.used.mark(bahar)?;
        state.used.mark(andar)?;
        state.saved_pair = Some(SavedPair { bahar, andar });
        Ok(Transition::Advanced {
            events: vec![GameEvent::CardsSaved { round }],
        })
    }

    fn reveal_cards(state: &mut SessionState) -> Result<Transition, GameError> {
        let round = match state.phase {
            Phase::Dealing { round } if round != Round::Third => round,
            phase => return Err(GameError::InvalidTransition { phase }),
        };
        let pair = state
            .saved_pair
            .take()
            .ok_or(GameError::InvalidTransition { phase: state.phase })?;
        let opening = state
            .opening_card
            .ok_or(GameError::InvalidTransition { phase: state.phase })?;

        let mut events = Vec::new();
        // Bahar is dealt first; on a double rank match it wins.
        let mut winner: Option<DealtCard> = None;
        for (side, card) in [(Side::Bahar, pair.bahar), (Side::Andar, pair.andar)] {
            let dealt = DealtCard {
                card,
                side,
                round,
                sequence: state.next_sequence(),
            };
            state.dealt.push(dealt);
            events.push(GameEvent::CardDealt { dealt });
            if winner.is_none() && is_match(opening, card) {
                winner = Some(dealt);
            }
        }

        if let Some(dealt) = winner {
            let outcome = Self::complete(state, dealt);
            events.push(GameEvent::WinnerDeclared {
                side: outcome.side,
                card: outcome.card,
                round: outcome.round,
                regime: outcome.regime,
            });
            events.push(GameEvent::PhaseChanged {
                phase: state.phase,
                countdown_secs: None,
            });
            return Ok(Transition::SessionComplete { events, outcome });
        }

        // No winner: round 1 re-opens betting, round 2 falls through to
        // continuous dealing.
        match round {
            Round::First => {
                state.phase = Phase::Betting {
                    round: Round::Second,
                };
                Self::arm_countdown(state);
                events.push(GameEvent::PhaseChanged {
                    phase: state.phase,
                    countdown_secs: Some(state.countdown_secs),
                });
            }
            Round::Second => {
                state.phase = Phase::Dealing {
                    round: Round::Third,
                };
                state.round3_next_side = Side::Bahar;
                events.push(GameEvent::PhaseChanged {
                    phase: state.phase,
                    countdown_secs: None,
                });
            }
            Round::Third => unreachable!("round 3 never reveals a saved pair"),
        }
        Ok(Transition::Advanced { events })
    }

    fn deal_single_card(state: &mut SessionState, card: Card) -> Result<Transition, GameError> {
        if state.phase
            != (Phase::Dealing {
                round: Round::Third,
            })
        {
            return Err(GameError::InvalidTransition { phase: state.phase });
        }
        let opening = state
            .opening_card
            .ok_or(GameError::InvalidTransition { phase: state.phase })?;
        state.used.mark(card)?;

        let dealt = DealtCard {
            card,
            side: state.round3_next_side,
            round: Round::Third,
            sequence: state.next_sequence(),
        };
        state.dealt.push(dealt);
        state.round3_next_side = state.round3_next_side.other();

        let mut events = vec![GameEvent::CardDealt { dealt }];
        if is_match(opening, card) {
            let outcome = Self::complete(state, dealt);
            events.push(GameEvent::WinnerDeclared {
                side: outcome.side,
                card: outcome.card,
                round: outcome.round,
                regime: outcome.regime,
            });
            events.push(GameEvent::PhaseChanged {
                phase: state.phase,
                countdown_secs: None,
            });
            return Ok(Transition::SessionComplete { events, outcome });
        }
        Ok(Transition::Advanced { events })
    }

    fn reset_game(state: &mut SessionState) -> Result<Transition, GameError> {
        if state.phase == Phase::Idle {
            return Err(GameError::InvalidTransition { phase: state.phase });
        }
        let old_session = state.session_id;
        *state = SessionState::new();
        Ok(Transition::Advanced {
            events: vec![
                GameEvent::SessionReset {
                    session_id: old_session,
                },
                GameEvent::PhaseChanged {
                    phase: state.phase,
                    countdown_secs: None,
                },
            ],
        })
    }
}
