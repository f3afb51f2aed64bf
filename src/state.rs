//! Game state for Cuttle.
//!
//! A [`GameState`] is a complete snapshot of a game at a decision point. Every
//! card of the deck lives in exactly one zone: a hand, a points-field, a
//! permanents-field, a Jack pair, the deck, the scrap pile, or one of the
//! transient zones held by the pending sub-state (the counter chain and the
//! cards revealed by a Seven).
//!
//! The phase is not stored. It is derived from the pending sub-state and the
//! outcome, so the two can never disagree.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::card::{Card, Rank, shuffled_deck};
use crate::constants::{
    BASE_POINT_THRESHOLD, FIRST_HAND_SIZE, KING_THRESHOLD_REDUCTION, MIN_POINT_THRESHOLD,
    SECOND_HAND_SIZE,
};
use crate::moves::Target;

/// Index of the other player.
#[inline]
pub fn opponent(player: usize) -> usize {
    1 - player
}

/// A Jack on the field together with the point card it stole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct JackPair {
    pub jack: Card,
    pub stolen: Card,
}

/// Everything one player owns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    pub hand: Vec<Card>,
    /// Point cards played by this player.
    pub points: Vec<Card>,
    /// Eights, Queens and Kings.
    pub permanents: Vec<Card>,
    /// Jacks held by this player, each with the card it stole.
    pub jacks: Vec<JackPair>,
}

impl PlayerState {
    /// Points on the field plus the value of every stolen card.
    pub fn point_total(&self) -> u32 {
        let own: u32 = self.points.iter().map(|c| c.point_value()).sum();
        let stolen: u32 = self.jacks.iter().map(|p| p.stolen.point_value()).sum();
        own + stolen
    }

    pub fn queens(&self) -> usize {
        self.permanents.iter().filter(|c| c.rank() == Rank::Queen).count()
    }

    pub fn kings(&self) -> usize {
        self.permanents.iter().filter(|c| c.rank() == Rank::King).count()
    }

    /// Whether an Eight is in play as Glasses (the opponent's hand is open).
    pub fn has_glasses(&self) -> bool {
        self.permanents.iter().any(|c| c.rank() == Rank::Eight)
    }

    /// Points needed to win: 21, minus 7 per King, never below 7.
    pub fn point_threshold(&self) -> u32 {
        let reduction = KING_THRESHOLD_REDUCTION * self.kings() as u32;
        BASE_POINT_THRESHOLD
            .saturating_sub(reduction)
            .max(MIN_POINT_THRESHOLD)
    }

    pub fn has_won(&self) -> bool {
        self.point_total() >= self.point_threshold()
    }

    /// Whether `card` on this player's field is shielded from the opponent's
    /// targeted effects. A Queen protects every other card its owner holds.
    pub fn is_protected(&self, card: Card) -> bool {
        let is_own_queen = card.rank() == Rank::Queen && self.permanents.contains(&card);
        self.queens() > usize::from(is_own_queen)
    }

    /// Cards stolen from the opponent and held here.
    pub fn stolen(&self) -> impl Iterator<Item = Card> + '_ {
        self.jacks.iter().map(|p| p.stolen)
    }

    /// Index of the Jack pair that holds `stolen`, if any.
    pub fn pair_holding(&self, stolen: Card) -> Option<usize> {
        self.jacks.iter().position(|p| p.stolen == stolen)
    }

    /// Index of the Jack pair whose Jack is `jack`, if any.
    pub fn pair_of_jack(&self, jack: Card) -> Option<usize> {
        self.jacks.iter().position(|p| p.jack == jack)
    }

    fn cards(&self) -> impl Iterator<Item = Card> + '_ {
        self.hand
            .iter()
            .chain(&self.points)
            .chain(&self.permanents)
            .copied()
            .chain(self.jacks.iter().flat_map(|p| [p.jack, p.stolen]))
    }
}

/// A one-off waiting for counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterState {
    /// Player who played the one-off.
    pub caster: usize,
    /// The one-off card itself.
    pub card: Card,
    pub target: Option<Target>,
    /// Twos played against (and for) the one-off, oldest first.
    pub chain: Vec<Card>,
}

impl CounterState {
    /// The player who may counter next. With an even chain (including an
    /// empty one) the one-off stands and the caster's opponent answers.
    pub fn waiting_for_player(&self) -> usize {
        if self.chain.len() % 2 == 0 {
            opponent(self.caster)
        } else {
            self.caster
        }
    }

    /// The one-off resolves iff the number of Twos is even.
    pub fn resolves(&self) -> bool {
        self.chain.len() % 2 == 0
    }
}

/// Cards revealed by a resolved Seven, one of which must be played.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SevenState {
    pub player: usize,
    pub revealed: Vec<Card>,
}

/// A resolved Four: `player` must discard `count` cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FourState {
    pub player: usize,
    pub count: usize,
}

/// The sub-state that interrupts normal turn flow.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pending {
    #[default]
    None,
    Counter(CounterState),
    Seven(SevenState),
    Four(FourState),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Main,
    Counter,
    ResolveSeven,
    DiscardFour,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WinReason {
    /// A player reached their point threshold.
    Points,
    /// The player to move had no cards and the deck was empty.
    EmptyHand,
    /// Both players passed on an empty deck; decided on points.
    EmptyDeck,
    /// The round limit was reached; decided on points.
    TurnLimit,
}

/// How a finished game ended. `winner` is `None` for a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Outcome {
    pub winner: Option<usize>,
    pub reason: WinReason,
}

/// A complete game snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub players: [PlayerState; 2],
    /// The draw pile; index 0 is the top card.
    pub deck: Vec<Card>,
    pub scrap: Vec<Card>,
    /// Whose turn it is.
    pub current: usize,
    /// Round number, starting at 1; a round ends after player 1's turn.
    pub turn: u32,
    /// Consecutive passes.
    pub passes: u8,
    pub pending: Pending,
    pub outcome: Option<Outcome>,
}

impl GameState {
    /// Deal from `deck` (top first): player 0 takes the first five cards and
    /// moves first, player 1 takes the next six. The rest is the draw pile.
    pub fn deal(mut deck: Vec<Card>) -> Self {
        let first = deck.drain(..FIRST_HAND_SIZE.min(deck.len())).collect();
        let second = deck.drain(..SECOND_HAND_SIZE.min(deck.len())).collect();
        Self {
            players: [
                PlayerState {
                    hand: first,
                    ..PlayerState::default()
                },
                PlayerState {
                    hand: second,
                    ..PlayerState::default()
                },
            ],
            deck,
            scrap: Vec::new(),
            current: 0,
            turn: 1,
            passes: 0,
            pending: Pending::None,
            outcome: None,
        }
    }

    /// Deal a freshly shuffled deck.
    pub fn new_game(rng: &mut fastrand::Rng) -> Self {
        Self::deal(shuffled_deck(rng))
    }

    /// Deal a deck shuffled with a fixed seed.
    pub fn with_seed(seed: u64) -> Self {
        Self::new_game(&mut fastrand::Rng::with_seed(seed))
    }

    pub fn phase(&self) -> Phase {
        if self.outcome.is_some() {
            return Phase::GameOver;
        }
        match self.pending {
            Pending::None => Phase::Main,
            Pending::Counter(_) => Phase::Counter,
            Pending::Seven(_) => Phase::ResolveSeven,
            Pending::Four(_) => Phase::DiscardFour,
        }
    }

    #[inline]
    pub fn is_terminal(&self) -> bool {
        self.outcome.is_some()
    }

    /// The player who must choose the next move. This differs from the turn
    /// owner while a counter, a discard or a Seven reveal is pending.
    pub fn acting_player(&self) -> usize {
        match &self.pending {
            Pending::None => self.current,
            Pending::Counter(c) => c.waiting_for_player(),
            Pending::Seven(s) => s.player,
            Pending::Four(f) => f.player,
        }
    }

    pub fn player(&self, index: usize) -> &PlayerState {
        &self.players[index]
    }

    /// The winning player, if the game is over and was not drawn.
    pub fn winner(&self) -> Option<usize> {
        self.outcome.and_then(|o| o.winner)
    }

    /// Every card in every zone, in a fixed zone order.
    pub fn all_cards(&self) -> Vec<Card> {
        let mut cards: Vec<Card> = self.players.iter().flat_map(PlayerState::cards).collect();
        cards.extend_from_slice(&self.deck);
        cards.extend_from_slice(&self.scrap);
        match &self.pending {
            Pending::Counter(c) => {
                cards.push(c.card);
                cards.extend_from_slice(&c.chain);
            }
            Pending::Seven(s) => cards.extend_from_slice(&s.revealed),
            Pending::None | Pending::Four(_) => {}
        }
        cards
    }
}

fn join(cards: &[Card]) -> String {
    if cards.is_empty() {
        return "-".to_string();
    }
    cards.iter().map(Card::to_string).collect::<Vec<_>>().join(" ")
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Turn {}  deck {}  scrap {}  phase {:?}",
            self.turn,
            self.deck.len(),
            self.scrap.len(),
            self.phase()
        )?;
        for (i, p) in self.players.iter().enumerate() {
            let marker = if i == self.acting_player() && !self.is_terminal() {
                '*'
            } else {
                ' '
            };
            writeln!(
                f,
                "{marker}P{i}  {}/{} points",
                p.point_total(),
                p.point_threshold()
            )?;
            writeln!(f, "     hand:       {}", join(&p.hand))?;
            writeln!(f, "     points:     {}", join(&p.points))?;
            writeln!(f, "     permanents: {}", join(&p.permanents))?;
            if !p.jacks.is_empty() {
                let pairs: Vec<String> = p
                    .jacks
                    .iter()
                    .map(|j| format!("{}>{}", j.jack, j.stolen))
                    .collect();
                writeln!(f, "     jacks:      {}", pairs.join(" "))?;
            }
        }
        match &self.pending {
            Pending::None => {}
            Pending::Counter(c) => writeln!(
                f,
                "One-off {} by P{} (chain {})",
                c.card,
                c.caster,
                join(&c.chain)
            )?,
            Pending::Seven(s) => writeln!(f, "P{} revealed {}", s.player, join(&s.revealed))?,
            Pending::Four(d) => writeln!(f, "P{} must discard {}", d.player, d.count)?,
        }
        if let Some(outcome) = self.outcome {
            match outcome.winner {
                Some(w) => write!(f, "P{w} wins ({:?})", outcome.reason)?,
                None => write!(f, "Draw ({:?})", outcome.reason)?,
            }
        }
        Ok(())
    }
}
