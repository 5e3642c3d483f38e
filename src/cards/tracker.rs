//! Session-scoped set of cards already dealt or selected.
//!
//! The dealer UI filters used cards before offering them, but this tracker
//! is the final enforcement point: marking an already-used card is a hard
//! error, never a silent no-op.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::Card;

#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
#[error("card {card} has already been used this session")]
pub struct DuplicateCard {
    pub card: Card,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsedCards {
    used: HashSet<Card>,
}

impl UsedCards {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_used(&self, card: Card) -> bool {
        self.used.contains(&card)
    }

    /// Marks a card used, rejecting duplicates.
    pub fn mark(&mut self, card: Card) -> Result<(), DuplicateCard> {
        if !self.used.insert(card) {
            return Err(DuplicateCard { card });
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.used.len()
    }

    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }

    pub fn clear(&mut self) {
        self.used.clear();
    }
}
