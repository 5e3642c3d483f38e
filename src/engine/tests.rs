use super::engine::{DealerEngine, GameEngine, Transition};
use super::errors::GameError;
use super::events::GameEvent;
use super::resolver::PayoutRegime;
use super::state::SessionState;
use super::types::{Phase, Round, Side, MAX_COUNTDOWN_SECS, MIN_COUNTDOWN_SECS};
use crate::cards::{standard_deck, Card, Rank, Suit};

fn card(suit: Suit, rank: Rank) -> Card {
    Card::new(suit, rank)
}

/// Drives a fresh session to `betting(1)` with the given opening card.
fn session_with_opening(opening: Card, countdown: u64) -> SessionState {
    let mut state = SessionState::new();
    GameEngine::start_game(&mut state).unwrap();
    GameEngine::select_opening_card(&mut state, opening, countdown).unwrap();
    state
}

#[test]
fn start_game_only_from_idle() {
    let mut state = SessionState::new();
    GameEngine::start_game(&mut state).unwrap();
    assert_eq!(state.phase, Phase::Opening);

    let before = state.clone();
    let err = GameEngine::start_game(&mut state).unwrap_err();
    assert!(matches!(err, GameError::InvalidTransition { .. }));
    assert_eq!(state, before);
}

#[test]
fn opening_card_is_marked_used_and_countdown_clamped() {
    let opening = card(Suit::Spades, Rank::Seven);
    let state = session_with_opening(opening, 3);
    assert_eq!(state.opening_card, Some(opening));
    assert!(state.used.is_used(opening));
    assert_eq!(state.countdown_secs, MIN_COUNTDOWN_SECS);
    assert!(state.betting_deadline.is_some());

    let state = session_with_opening(card(Suit::Clubs, Rank::Two), 9_999);
    assert_eq!(state.countdown_secs, MAX_COUNTDOWN_SECS);
}

#[test]
fn opening_card_cannot_be_selected_twice() {
    let mut state = SessionState::new();
    GameEngine::start_game(&mut state).unwrap();
    let opening = card(Suit::Spades, Rank::Seven);
    GameEngine::select_opening_card(&mut state, opening, 30).unwrap();

    let before = state.clone();
    let err = GameEngine::select_opening_card(&mut state, opening, 30).unwrap_err();
    assert!(matches!(err, GameError::InvalidTransition { .. }));
    assert_eq!(state, before);
}

#[test]
fn close_betting_moves_to_dealing_same_round() {
    let mut state = session_with_opening(card(Suit::Spades, Rank::Seven), 30);
    GameEngine::close_betting(&mut state).unwrap();
    assert_eq!(
        state.phase,
        Phase::Dealing {
            round: Round::First
        }
    );
    assert!(state.betting_deadline.is_none());

    // A second close (the timer racing a manual override) is rejected
    // without mutation.
    let before = state.clone();
    assert!(GameEngine::close_betting(&mut state).is_err());
    assert_eq!(state, before);
}

#[test]
fn saved_pair_rejects_used_and_identical_cards() {
    let opening = card(Suit::Spades, Rank::Seven);
    let mut state = session_with_opening(opening, 30);

    // Opening card is already used.
    let before = state.clone();
    let err =
        GameEngine::save_cards(&mut state, opening, card(Suit::Clubs, Rank::King)).unwrap_err();
    assert!(matches!(err, GameError::DuplicateCard(_)));
    assert_eq!(state, before);

    // Same identity on both sides.
    let dup = card(Suit::Hearts, Rank::Three);
    let err = GameEngine::save_cards(&mut state, dup, dup).unwrap_err();
    assert!(matches!(err, GameError::DuplicateCard(_)));
    assert_eq!(state, before);

    GameEngine::save_cards(&mut state, dup, card(Suit::Clubs, Rank::King)).unwrap();
    assert!(state.used.is_used(dup));

    // A second pair cannot be staged over the first.
    let err = GameEngine::save_cards(
        &mut state,
        card(Suit::Diamonds, Rank::Four),
        card(Suit::Clubs, Rank::Five),
    )
    .unwrap_err();
    assert!(matches!(err, GameError::InvalidTransition { .. }));
}

#[test]
fn reveal_without_match_advances_round_one_to_betting_two() {
    let mut state = session_with_opening(card(Suit::Spades, Rank::Seven), 30);
    GameEngine::save_cards(
        &mut state,
        card(Suit::Diamonds, Rank::Three),
        card(Suit::Clubs, Rank::King),
    )
    .unwrap();
    GameEngine::close_betting(&mut state).unwrap();
    let transition = GameEngine::reveal_cards(&mut state).unwrap();

    assert_eq!(
        state.phase,
        Phase::Betting {
            round: Round::Second
        }
    );
    assert!(state.betting_deadline.is_some());
    assert!(state.saved_pair.is_none());
    assert_eq!(state.dealt.len(), 2);
    assert_eq!(state.dealt[0].side, Side::Bahar);
    assert_eq!(state.dealt[1].side, Side::Andar);
    assert!(matches!(transition, Transition::Advanced { .. }));
}

/// Full table run: opening 7♠, round 1 pair (Bahar=3♦, Andar=K♣) no match,
/// round 2 pair (Bahar=7♥, Andar=9♠) — Bahar wins with the refund regime.
#[test]
fn scenario_bahar_wins_round_two_with_refund_regime() {
    let mut state = session_with_opening(card(Suit::Spades, Rank::Seven), 30);

    GameEngine::save_cards(
        &mut state,
        card(Suit::Diamonds, Rank::Three),
        card(Suit::Clubs, Rank::King),
    )
    .unwrap();
    GameEngine::close_betting(&mut state).unwrap();
    GameEngine::reveal_cards(&mut state).unwrap();

    GameEngine::save_cards(
        &mut state,
        card(Suit::Hearts, Rank::Seven),
        card(Suit::Spades, Rank::Nine),
    )
    .unwrap();
    GameEngine::close_betting(&mut state).unwrap();
    let transition = GameEngine::reveal_cards(&mut state).unwrap();

    assert_eq!(state.phase, Phase::Complete);
    let outcome = match transition {
        Transition::SessionComplete { outcome, .. } => outcome,
        other => panic!("expected completion, got {other:?}"),
    };
    assert_eq!(outcome.side, Side::Bahar);
    assert_eq!(outcome.card, card(Suit::Hearts, Rank::Seven));
    assert_eq!(outcome.round, Round::Second);
    assert_eq!(outcome.regime, PayoutRegime::Refund);
    assert_eq!(outcome.card.rank, state.opening_card.unwrap().rank);
}

#[test]
fn andar_match_in_round_one_is_double_payout() {
    let mut state = session_with_opening(card(Suit::Spades, Rank::Seven), 30);
    GameEngine::save_cards(
        &mut state,
        card(Suit::Diamonds, Rank::Three),
        card(Suit::Clubs, Rank::Seven),
    )
    .unwrap();
    GameEngine::close_betting(&mut state).unwrap();
    let transition = GameEngine::reveal_cards(&mut state).unwrap();

    let outcome = match transition {
        Transition::SessionComplete { outcome, .. } => outcome,
        other => panic!("expected completion, got {other:?}"),
    };
    assert_eq!(outcome.side, Side::Andar);
    assert_eq!(outcome.round, Round::First);
    assert_eq!(outcome.regime, PayoutRegime::DoublePayout);
}

#[test]
fn double_match_pair_awards_bahar() {
    // Bahar is physically dealt first, so a pair where both cards match the
    // opening rank resolves to Bahar.
    let mut state = session_with_opening(card(Suit::Spades, Rank::Seven), 30);
    GameEngine::save_cards(
        &mut state,
        card(Suit::Hearts, Rank::Seven),
        card(Suit::Clubs, Rank::Seven),
    )
    .unwrap();
    GameEngine::close_betting(&mut state).unwrap();
    let transition = GameEngine::reveal_cards(&mut state).unwrap();
    match transition {
        Transition::SessionComplete { outcome, .. } => assert_eq!(outcome.side, Side::Bahar),
        other => panic!("expected completion, got {other:?}"),
    }
}

fn drive_to_round_three(opening: Card) -> SessionState {
    let mut state = session_with_opening(opening, 30);
    GameEngine::save_cards(
        &mut state,
        card(Suit::Diamonds, Rank::Three),
        card(Suit::Clubs, Rank::King),
    )
    .unwrap();
    GameEngine::close_betting(&mut state).unwrap();
    GameEngine::reveal_cards(&mut state).unwrap();
    GameEngine::save_cards(
        &mut state,
        card(Suit::Hearts, Rank::Four),
        card(Suit::Spades, Rank::Nine),
    )
    .unwrap();
    GameEngine::close_betting(&mut state).unwrap();
    GameEngine::reveal_cards(&mut state).unwrap();
    assert_eq!(
        state.phase,
        Phase::Dealing {
            round: Round::Third
        }
    );
    state
}

#[test]
fn round_three_alternates_starting_with_bahar_until_match() {
    let mut state = drive_to_round_three(card(Suit::Spades, Rank::Seven));

    GameEngine::deal_single_card(&mut state, card(Suit::Clubs, Rank::Two)).unwrap();
    GameEngine::deal_single_card(&mut state, card(Suit::Clubs, Rank::Three)).unwrap();
    GameEngine::deal_single_card(&mut state, card(Suit::Clubs, Rank::Four)).unwrap();
    let transition =
        GameEngine::deal_single_card(&mut state, card(Suit::Hearts, Rank::Seven)).unwrap();

    let round3: Vec<_> = state
        .dealt
        .iter()
        .filter(|d| d.round == Round::Third)
        .collect();
    assert_eq!(round3.len(), 4);
    assert_eq!(round3[0].side, Side::Bahar);
    assert_eq!(round3[1].side, Side::Andar);
    assert_eq!(round3[2].side, Side::Bahar);
    assert_eq!(round3[3].side, Side::Andar);

    let outcome = match transition {
        Transition::SessionComplete { outcome, .. } => outcome,
        other => panic!("expected completion, got {other:?}"),
    };
    assert_eq!(outcome.side, Side::Andar);
    assert_eq!(outcome.regime, PayoutRegime::DoublePayout);
}

#[test]
fn bahar_match_in_round_three_is_even_money() {
    let mut state = drive_to_round_three(card(Suit::Spades, Rank::Seven));
    let transition =
        GameEngine::deal_single_card(&mut state, card(Suit::Hearts, Rank::Seven)).unwrap();
    let outcome = match transition {
        Transition::SessionComplete { outcome, .. } => outcome,
        other => panic!("expected completion, got {other:?}"),
    };
    assert_eq!(outcome.side, Side::Bahar);
    assert_eq!(outcome.round, Round::Third);
    assert_eq!(outcome.regime, PayoutRegime::EvenMoney);
}

#[test]
fn no_card_is_ever_dealt_twice_in_a_session() {
    // Exhaust the deck in round 3 against the full 52: every card that is
    // not already used deals exactly once, and every reuse attempt fails.
    let opening = card(Suit::Spades, Rank::Ace);
    let mut state = drive_to_round_three(opening);

    let mut dealt_count = state.dealt.len();
    for c in standard_deck() {
        if state.phase != (Phase::Dealing { round: Round::Third }) {
            break;
        }
        if state.used.is_used(c) {
            let before = state.clone();
            assert!(matches!(
                GameEngine::deal_single_card(&mut state, c),
                Err(GameError::DuplicateCard(_))
            ));
            assert_eq!(state, before);
            continue;
        }
        GameEngine::deal_single_card(&mut state, c).unwrap();
        dealt_count += 1;
        assert_eq!(state.dealt.len(), dealt_count);
    }

    // Three aces remained when round 3 began, so a match must have occurred.
    assert_eq!(state.phase, Phase::Complete);
    let identities: std::collections::HashSet<_> =
        state.dealt.iter().map(|d| d.card).collect();
    assert_eq!(identities.len(), state.dealt.len());
}

#[test]
fn completed_session_winner_rank_matches_opening() {
    let mut state = drive_to_round_three(card(Suit::Spades, Rank::Seven));
    GameEngine::deal_single_card(&mut state, card(Suit::Clubs, Rank::Seven)).unwrap();
    let outcome = state.winner.unwrap();
    assert_eq!(outcome.card.rank, state.opening_card.unwrap().rank);
}

#[test]
fn out_of_order_commands_are_rejected_without_mutation() {
    let mut state = SessionState::new();

    // Nothing but start_game is legal from idle.
    let before = state.clone();
    assert!(GameEngine::select_opening_card(&mut state, card(Suit::Clubs, Rank::Two), 30).is_err());
    assert!(GameEngine::close_betting(&mut state).is_err());
    assert!(
        GameEngine::save_cards(
            &mut state,
            card(Suit::Clubs, Rank::Two),
            card(Suit::Clubs, Rank::Three)
        )
        .is_err()
    );
    assert!(GameEngine::reveal_cards(&mut state).is_err());
    assert!(GameEngine::deal_single_card(&mut state, card(Suit::Clubs, Rank::Two)).is_err());
    assert!(GameEngine::reset_game(&mut state).is_err());
    assert_eq!(state, before);

    // Round 3 dealing is not reachable from betting(1).
    let mut state = session_with_opening(card(Suit::Spades, Rank::Seven), 30);
    let before = state.clone();
    assert!(GameEngine::deal_single_card(&mut state, card(Suit::Clubs, Rank::Two)).is_err());
    assert!(GameEngine::reveal_cards(&mut state).is_err());
    assert_eq!(state, before);
}

#[test]
fn reveal_requires_a_staged_pair() {
    let mut state = session_with_opening(card(Suit::Spades, Rank::Seven), 30);
    GameEngine::close_betting(&mut state).unwrap();
    let before = state.clone();
    assert!(matches!(
        GameEngine::reveal_cards(&mut state),
        Err(GameError::InvalidTransition { .. })
    ));
    assert_eq!(state, before);
}

#[test]
fn reset_clears_everything_under_a_fresh_session() {
    let mut state = drive_to_round_three(card(Suit::Spades, Rank::Seven));
    let old_id = state.session_id;
    let transition = GameEngine::reset_game(&mut state).unwrap();

    assert_eq!(state.phase, Phase::Idle);
    assert_ne!(state.session_id, old_id);
    assert!(state.dealt.is_empty());
    assert!(state.used.is_empty());
    assert!(state.opening_card.is_none());
    assert!(state.winner.is_none());
    assert!(matches!(
        transition.events()[0],
        GameEvent::SessionReset { session_id } if session_id == old_id
    ));
}
