//! Typed command intake. Dealer and bettor commands arrive over the
//! WebSocket as tagged JSON and are validated by the session actor.

use serde::{Deserialize, Serialize};

use crate::cards::Card;
use crate::engine::{BettorId, Rupees, Side};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DealerCommand {
    StartGame,
    SelectOpeningCard { card: Card, countdown_secs: u64 },
    SaveCards { bahar: Card, andar: Card },
    RevealCards,
    DealSingleCard { card: Card },
    AdvanceRound,
    ResetGame,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BettorCommand {
    PlaceBet { side: Side, amount: Rupees },
    UndoBet { side: Side },
}

/// The full intake surface, discriminated by issuer role.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum ClientCommand {
    Dealer {
        /// Last broadcast seq the dealer client had observed. A stale value
        /// rejects the command instead of applying it out of order.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        expected_seq: Option<u64>,
        #[serde(flatten)]
        command: DealerCommand,
    },
    Bettor {
        bettor_id: BettorId,
        #[serde(flatten)]
        command: BettorCommand,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{Rank, Suit};

    #[test]
    fn dealer_command_wire_format() {
        let cmd = ClientCommand::Dealer {
            expected_seq: Some(7),
            command: DealerCommand::SelectOpeningCard {
                card: Card::new(Suit::Spades, Rank::Seven),
                countdown_secs: 30,
            },
        };
        let json = serde_json::to_value(&cmd).unwrap();
        assert_eq!(json["role"], "dealer");
        assert_eq!(json["type"], "select_opening_card");
        assert_eq!(json["expected_seq"], 7);
        assert_eq!(json["card"]["suit"], "spades");

        let back: ClientCommand = serde_json::from_value(json).unwrap();
        assert_eq!(back, cmd);
    }

    #[test]
    fn bettor_command_wire_format() {
        let raw = serde_json::json!({
            "role": "bettor",
            "type": "place_bet",
            "bettor_id": "6e5a8f6a-2f8c-4be0-9f2e-3e9d6a1b4c5d",
            "side": "andar",
            "amount": 500,
        });
        let cmd: ClientCommand = serde_json::from_value(raw).unwrap();
        match cmd {
            ClientCommand::Bettor {
                command: BettorCommand::PlaceBet { side, amount },
                ..
            } => {
                assert_eq!(side, Side::Andar);
                assert_eq!(amount, 500);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
