//! Card domain: suits, ranks, full-deck generation, display formatting.
//!
//! Cards are immutable value objects; identity is `(suit, rank)` and two
//! cards with the same identity are the same card.

pub mod tracker;

pub use tracker::{DuplicateCard, UsedCards};

use std::fmt;

use serde::{Deserialize, Serialize};

pub const DECK_SIZE: usize = 52;

#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Suit {
    Clubs,
    Diamonds,
    Hearts,
    Spades,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Clubs, Suit::Diamonds, Suit::Hearts, Suit::Spades];

    pub fn symbol(self) -> char {
        match self {
            Suit::Clubs => '♣',
            Suit::Diamonds => '♦',
            Suit::Hearts => '♥',
            Suit::Spades => '♠',
        }
    }
}

/// Thirteen ranks with ordinal values 1..=13 (ace low).
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rank {
    Ace = 1,
    Two = 2,
    Three = 3,
    Four = 4,
    Five = 5,
    Six = 6,
    Seven = 7,
    Eight = 8,
    Nine = 9,
    Ten = 10,
    Jack = 11,
    Queen = 12,
    King = 13,
}

impl Rank {
    pub const ALL: [Rank; 13] = [
        Rank::Ace,
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
    ];

    /// Ordinal value 1..=13.
    pub fn value(self) -> u8 {
        self as u8
    }

    pub fn label(self) -> &'static str {
        match self {
            Rank::Ace => "A",
            Rank::Two => "2",
            Rank::Three => "3",
            Rank::Four => "4",
            Rank::Five => "5",
            Rank::Six => "6",
            Rank::Seven => "7",
            Rank::Eight => "8",
            Rank::Nine => "9",
            Rank::Ten => "10",
            Rank::Jack => "J",
            Rank::Queen => "Q",
            Rank::King => "K",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Card {
    pub suit: Suit,
    pub rank: Rank,
}

impl Card {
    pub fn new(suit: Suit, rank: Rank) -> Self {
        Self { suit, rank }
    }

    /// Rank-only comparison; the match rule for the whole game.
    pub fn matches_rank(self, other: Card) -> bool {
        self.rank == other.rank
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank.label(), self.suit.symbol())
    }
}

/// Generates the full 52-card deck in a deterministic order.
pub fn standard_deck() -> Vec<Card> {
    let mut deck = Vec::with_capacity(DECK_SIZE);
    for suit in Suit::ALL {
        for rank in Rank::ALL {
            deck.push(Card::new(suit, rank));
        }
    }
    deck
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn deck_has_52_distinct_cards() {
        let deck = standard_deck();
        assert_eq!(deck.len(), DECK_SIZE);
        let identities: HashSet<Card> = deck.iter().copied().collect();
        assert_eq!(identities.len(), DECK_SIZE);
    }

    #[test]
    fn same_identity_compares_equal() {
        let a = Card::new(Suit::Spades, Rank::Seven);
        let b = Card::new(Suit::Spades, Rank::Seven);
        assert_eq!(a, b);
        assert_ne!(a, Card::new(Suit::Hearts, Rank::Seven));
    }

    #[test]
    fn match_ignores_suit() {
        let opening = Card::new(Suit::Spades, Rank::Seven);
        assert!(opening.matches_rank(Card::new(Suit::Hearts, Rank::Seven)));
        assert!(!opening.matches_rank(Card::new(Suit::Spades, Rank::Eight)));
    }

    #[test]
    fn display_formatting() {
        assert_eq!(Card::new(Suit::Spades, Rank::Seven).to_string(), "7♠");
        assert_eq!(Card::new(Suit::Diamonds, Rank::Ace).to_string(), "A♦");
        assert_eq!(Card::new(Suit::Hearts, Rank::Ten).to_string(), "10♥");
    }
}
