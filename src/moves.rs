//! Move types.
//!
//! A [`Move`] is plain data: it names the cards involved and never refers to
//! the state it was generated from, so a move can be stored, compared,
//! serialised and re-validated against any state.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::card::{Card, Rank};

/// The target of a one-off effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Target {
    /// A permanent (Eight, Queen, King, or a Jack holding a stolen card)
    /// on `owner`'s field.
    Permanent { owner: usize, card: Card },
    /// A card in the scrap pile.
    Scrap(Card),
}

impl Target {
    pub fn card(self) -> Card {
        match self {
            Target::Permanent { card, .. } | Target::Scrap(card) => card,
        }
    }
}

/// How a card revealed by a Seven is played.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayAs {
    Points,
    Scuttle(Card),
    OneOff(Option<Target>),
    Permanent(Option<Card>),
}

/// A move for the acting player.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Move {
    /// Draw the top card of the deck.
    Draw,
    /// Play a card from hand onto the points-field.
    PlayPoints(Card),
    /// Destroy an opponent's point card with a higher one from hand.
    Scuttle { card: Card, target: Card },
    /// Play a card from hand for its one-off effect.
    PlayOneOff { card: Card, target: Option<Target> },
    /// Play a permanent from hand; a Jack names the point card it steals.
    PlayPermanent { card: Card, target: Option<Card> },
    /// Answer a pending one-off with a Two.
    Counter(Card),
    /// Let the pending one-off (and counter chain) resolve.
    DeclineCounter,
    /// Play one of the cards revealed by a Seven.
    ResolveSeven { card: Card, play: PlayAs },
    /// Discard cards to satisfy a Four.
    Discard(Vec<Card>),
    /// Pass the turn (empty deck), or give up an unplayable Seven reveal.
    Pass,
}

fn one_off_text(card: Card, target: Option<Target>) -> String {
    let effect = match (card.rank(), target) {
        (Rank::Ace, _) => "scrap all points".to_string(),
        (Rank::Two, Some(t)) => format!("destroy {}", t.card()),
        (Rank::Three, Some(t)) => format!("revive {}", t.card()),
        (Rank::Four, _) => "force discard".to_string(),
        (Rank::Five, _) => "draw two".to_string(),
        (Rank::Six, _) => "scrap all permanents".to_string(),
        (Rank::Seven, _) => "play from deck".to_string(),
        (Rank::Nine, Some(t)) => format!("return {}", t.card()),
        _ => "no effect".to_string(),
    };
    format!("{card} as one-off ({effect})")
}

fn permanent_text(card: Card, target: Option<Card>) -> String {
    match (card.rank(), target) {
        (Rank::Jack, Some(stolen)) => format!("{card} to steal {stolen}"),
        (Rank::Eight, _) => format!("{card} as glasses"),
        (Rank::Queen, _) => format!("{card} for protection"),
        (Rank::King, _) => format!("{card} to lower threshold"),
        _ => format!("{card} as permanent"),
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Move::Draw => write!(f, "Draw"),
            Move::PlayPoints(card) => write!(f, "Play {card} for points"),
            Move::Scuttle { card, target } => write!(f, "Scuttle {target} with {card}"),
            Move::PlayOneOff { card, target } => write!(f, "Play {}", one_off_text(*card, *target)),
            Move::PlayPermanent { card, target } => {
                write!(f, "Play {}", permanent_text(*card, *target))
            }
            Move::Counter(card) => write!(f, "Counter with {card}"),
            Move::DeclineCounter => write!(f, "Decline to counter"),
            Move::ResolveSeven { card, play } => match play {
                PlayAs::Points => write!(f, "Seven: play {card} for points"),
                PlayAs::Scuttle(target) => write!(f, "Seven: scuttle {target} with {card}"),
                PlayAs::OneOff(target) => write!(f, "Seven: play {}", one_off_text(*card, *target)),
                PlayAs::Permanent(target) => {
                    write!(f, "Seven: play {}", permanent_text(*card, *target))
                }
            },
            Move::Discard(cards) => {
                let list: Vec<String> = cards.iter().map(Card::to_string).collect();
                write!(f, "Discard {}", list.join(", "))
            }
            Move::Pass => write!(f, "Pass"),
        }
    }
}
