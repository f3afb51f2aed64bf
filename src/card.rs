//! Card identity and the standard 52-card deck.
//!
//! A [`Card`] is a plain `(Rank, Suit)` value. What a card may do in Cuttle
//! depends only on its rank: A–10 score points, A–9 (except Eight's
//! alternative) have one-off effects, and 8/J/Q/K stay on the field as
//! permanents.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::DECK_SIZE;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Suit {
    Clubs,
    Diamonds,
    Hearts,
    Spades,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Clubs, Suit::Diamonds, Suit::Hearts, Suit::Spades];

    pub fn letter(self) -> char {
        match self {
            Suit::Clubs => 'C',
            Suit::Diamonds => 'D',
            Suit::Hearts => 'H',
            Suit::Spades => 'S',
        }
    }
}

/// Card ranks, Ace low.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rank {
    Ace = 1,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
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

    /// Numeric rank, Ace = 1 through King = 13.
    #[inline]
    pub fn value(self) -> u32 {
        self as u32
    }

    pub fn symbol(self) -> &'static str {
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

/// A playing card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Card {
    rank: Rank,
    suit: Suit,
}

impl Card {
    pub const fn new(rank: Rank, suit: Suit) -> Self {
        Self { rank, suit }
    }

    #[inline]
    pub fn rank(self) -> Rank {
        self.rank
    }

    #[inline]
    pub fn suit(self) -> Suit {
        self.suit
    }

    /// Points this card is worth on a points-field. Face cards are worth 0.
    #[inline]
    pub fn point_value(self) -> u32 {
        if self.is_point_card() {
            self.rank.value()
        } else {
            0
        }
    }

    /// Whether the card can be played for points (and scuttle): A through 10.
    #[inline]
    pub fn is_point_card(self) -> bool {
        self.rank <= Rank::Ten
    }

    /// Whether the card has a one-off effect: A–7 and 9.
    #[inline]
    pub fn has_one_off(self) -> bool {
        self.rank <= Rank::Seven || self.rank == Rank::Nine
    }

    /// Whether the card can be played as a permanent: 8, J, Q, K.
    #[inline]
    pub fn is_permanent(self) -> bool {
        matches!(self.rank, Rank::Eight | Rank::Jack | Rank::Queen | Rank::King)
    }

    /// Whether this card may scuttle `target`: strictly higher point value.
    pub fn beats(self, target: Card) -> bool {
        self.is_point_card() && target.is_point_card() && self.point_value() > target.point_value()
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.rank.symbol(), self.suit.letter())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot parse card from {0:?}")]
pub struct CardParseError(pub String);

impl FromStr for Card {
    type Err = CardParseError;

    /// Parse cards such as `"AS"`, `"10h"`, `"TD"` or `"qc"`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || CardParseError(s.to_string());
        let s = s.trim();
        let mut chars = s.chars();
        let suit = match chars.next_back().map(|c| c.to_ascii_uppercase()) {
            Some('C') => Suit::Clubs,
            Some('D') => Suit::Diamonds,
            Some('H') => Suit::Hearts,
            Some('S') => Suit::Spades,
            _ => return Err(err()),
        };
        let rank = match chars.as_str().to_ascii_uppercase().as_str() {
            "A" | "1" => Rank::Ace,
            "2" => Rank::Two,
            "3" => Rank::Three,
            "4" => Rank::Four,
            "5" => Rank::Five,
            "6" => Rank::Six,
            "7" => Rank::Seven,
            "8" => Rank::Eight,
            "9" => Rank::Nine,
            "10" | "T" => Rank::Ten,
            "J" => Rank::Jack,
            "Q" => Rank::Queen,
            "K" => Rank::King,
            _ => return Err(err()),
        };
        Ok(Card::new(rank, suit))
    }
}

/// Parse a whitespace-separated list of cards.
pub fn parse_cards(s: &str) -> Result<Vec<Card>, CardParseError> {
    s.split_whitespace().map(str::parse).collect()
}

/// The 52-card deck in a fixed order (suit-major, Ace to King).
pub fn full_deck() -> Vec<Card> {
    let mut deck = Vec::with_capacity(DECK_SIZE);
    for suit in Suit::ALL {
        for rank in Rank::ALL {
            deck.push(Card::new(rank, suit));
        }
    }
    deck
}

/// A freshly shuffled deck.
pub fn shuffled_deck(rng: &mut fastrand::Rng) -> Vec<Card> {
    let mut deck = full_deck();
    rng.shuffle(&mut deck);
    deck
}
