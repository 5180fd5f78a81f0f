//! Card decks.

use std::fmt;
use std::str::FromStr;

use planpoker_core::error::DomainError;
use serde::{Deserialize, Serialize};

/// The "don't know" card.
pub const UNKNOWN_CARD: &str = "?";

/// The "I need a break" card.
pub const COFFEE_CARD: &str = "☕";

/// The set of cards a room votes with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardDeck {
    /// 0, 1, 2, 3, 5, 8 … 89.
    #[default]
    Fibonacci,
    /// 0, ½, 1, 2, 3, 5, 8, 13, 20, 40, 100.
    ModifiedFibonacci,
    /// XS … XXL.
    Tshirt,
    /// 0, 1, 2, 4 … 64.
    PowersOf2,
}

impl CardDeck {
    /// Storage and wire name of the deck.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Fibonacci => "fibonacci",
            Self::ModifiedFibonacci => "modified_fibonacci",
            Self::Tshirt => "tshirt",
            Self::PowersOf2 => "powers_of_2",
        }
    }

    /// All cards of the deck in display order, special cards last.
    #[must_use]
    pub fn values(self) -> &'static [&'static str] {
        match self {
            Self::Fibonacci => &[
                "0", "1", "2", "3", "5", "8", "13", "21", "34", "55", "89", "?", "☕",
            ],
            Self::ModifiedFibonacci => &[
                "0", "½", "1", "2", "3", "5", "8", "13", "20", "40", "100", "?", "☕",
            ],
            Self::Tshirt => &["XS", "S", "M", "L", "XL", "XXL", "?", "☕"],
            Self::PowersOf2 => &["0", "1", "2", "4", "8", "16", "32", "64", "?", "☕"],
        }
    }

    /// Whether `value` is one of the deck's cards.
    #[must_use]
    pub fn contains(self, value: &str) -> bool {
        self.values().contains(&value)
    }

    /// Validates a submitted card.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidVote` if `value` is not in the deck.
    pub fn validate(self, value: &str) -> Result<(), DomainError> {
        if self.contains(value) {
            Ok(())
        } else {
            Err(DomainError::InvalidVote {
                value: value.to_owned(),
                deck: self.name().to_owned(),
            })
        }
    }
}

impl fmt::Display for CardDeck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CardDeck {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "fibonacci" => Ok(Self::Fibonacci),
            "modified_fibonacci" => Ok(Self::ModifiedFibonacci),
            "tshirt" => Ok(Self::Tshirt),
            "powers_of_2" => Ok(Self::PowersOf2),
            other => Err(DomainError::Validation(format!(
                "unknown card deck: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_deck_ends_with_special_cards() {
        for deck in [
            CardDeck::Fibonacci,
            CardDeck::ModifiedFibonacci,
            CardDeck::Tshirt,
            CardDeck::PowersOf2,
        ] {
            let values = deck.values();
            assert_eq!(values[values.len() - 2], UNKNOWN_CARD);
            assert_eq!(values[values.len() - 1], COFFEE_CARD);
        }
    }

    #[test]
    fn test_validate_rejects_card_from_other_deck() {
        let result = CardDeck::Tshirt.validate("5");

        match result.unwrap_err() {
            DomainError::InvalidVote { value, deck } => {
                assert_eq!(value, "5");
                assert_eq!(deck, "tshirt");
            }
            other => panic!("expected InvalidVote, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_accepts_half_card_only_in_modified_fibonacci() {
        assert!(CardDeck::ModifiedFibonacci.validate("½").is_ok());
        assert!(CardDeck::Fibonacci.validate("½").is_err());
    }

    #[test]
    fn test_name_round_trips_through_from_str() {
        let parsed: CardDeck = CardDeck::PowersOf2.name().parse().unwrap();
        assert_eq!(parsed, CardDeck::PowersOf2);
    }

    #[test]
    fn test_from_str_rejects_unknown_deck() {
        assert!("hours".parse::<CardDeck>().is_err());
    }
}
