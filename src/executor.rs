//! Move execution.
//!
//! [`apply_move`] never mutates its input: it clones the state, applies the
//! move to the clone and returns it. Any failure leaves the caller's state
//! untouched, so search code can treat an [`IllegalMove`] as "prune this
//! move" and carry on.
//!
//! One-off effects only take effect through the counter protocol. Playing a
//! one-off opens a [`CounterState`]; the effect runs when the chain is
//! declined with an even number of Twos in it.

use log::trace;
use thiserror::Error;

use crate::card::{Card, Rank};
use crate::constants::{
    FIVE_DRAW_COUNT, FOUR_DISCARD_COUNT, PASSES_TO_END, SEVEN_REVEAL_COUNT, TURN_LIMIT,
};
use crate::moves::{Move, PlayAs, Target};
use crate::state::{
    CounterState, FourState, GameState, JackPair, Outcome, Pending, Phase, SevenState, WinReason,
    opponent,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IllegalMove {
    #[error("card {0} is missing or protected")]
    TargetNotFound(Card),
    #[error("move is not allowed in phase {0:?}")]
    WrongPhase(Phase),
    #[error("player {0} is not the acting player")]
    WrongActor(usize),
    #[error("move does not match the pending action: {0}")]
    WrongPending(&'static str),
}

/// Apply `mv` for whoever is due to act.
pub fn apply_move(state: &GameState, mv: &Move) -> Result<GameState, IllegalMove> {
    let mut next = state.clone();
    let actor = state.acting_player();

    match state.phase() {
        Phase::GameOver => return Err(IllegalMove::WrongPhase(Phase::GameOver)),
        Phase::Main => match mv {
            Move::Draw => {
                if next.deck.is_empty() {
                    return Err(IllegalMove::WrongPending("draw from an empty deck"));
                }
                let card = next.deck.remove(0);
                next.players[actor].hand.push(card);
                next.passes = 0;
                finish_turn(&mut next);
            }
            Move::Pass => {
                if !next.deck.is_empty() {
                    return Err(IllegalMove::WrongPending("pass while the deck still has cards"));
                }
                next.passes += 1;
                finish_turn(&mut next);
            }
            Move::PlayPoints(card) => play_from_hand(&mut next, actor, *card, PlayAs::Points)?,
            Move::Scuttle { card, target } => {
                play_from_hand(&mut next, actor, *card, PlayAs::Scuttle(*target))?
            }
            Move::PlayOneOff { card, target } => {
                play_from_hand(&mut next, actor, *card, PlayAs::OneOff(*target))?
            }
            Move::PlayPermanent { card, target } => {
                play_from_hand(&mut next, actor, *card, PlayAs::Permanent(*target))?
            }
            _ => return Err(IllegalMove::WrongPhase(Phase::Main)),
        },
        Phase::Counter => match mv {
            Move::Counter(card) => {
                if card.rank() != Rank::Two {
                    return Err(IllegalMove::WrongPending("only a Two can counter"));
                }
                take_from_hand(&mut next, actor, *card)?;
                if let Pending::Counter(counter) = &mut next.pending {
                    counter.chain.push(*card);
                }
            }
            Move::DeclineCounter => resolve_counter(&mut next),
            _ => return Err(IllegalMove::WrongPhase(Phase::Counter)),
        },
        Phase::ResolveSeven => {
            let Pending::Seven(seven) = std::mem::take(&mut next.pending) else {
                return Err(IllegalMove::WrongPhase(Phase::ResolveSeven));
            };
            match mv {
                Move::ResolveSeven { card, play } => {
                    let mut revealed = seven.revealed;
                    let Some(index) = revealed.iter().position(|c| c == card) else {
                        return Err(IllegalMove::WrongPending("card was not revealed"));
                    };
                    revealed.remove(index);
                    next.players[actor].hand.extend(revealed);
                    play_card(&mut next, actor, *card, *play)?;
                }
                Move::Pass => {
                    next.players[actor].hand.extend(seven.revealed);
                    finish_turn(&mut next);
                }
                _ => return Err(IllegalMove::WrongPhase(Phase::ResolveSeven)),
            }
        }
        Phase::DiscardFour => {
            let Pending::Four(four) = std::mem::take(&mut next.pending) else {
                return Err(IllegalMove::WrongPhase(Phase::DiscardFour));
            };
            let Move::Discard(cards) = mv else {
                return Err(IllegalMove::WrongPhase(Phase::DiscardFour));
            };
            if cards.len() != four.count {
                return Err(IllegalMove::WrongPending("wrong number of cards discarded"));
            }
            for &card in cards {
                take_from_hand(&mut next, actor, card)?;
                next.scrap.push(card);
            }
            finish_turn(&mut next);
        }
    }

    Ok(next)
}

/// Like [`apply_move`], but first checks that `player` is the one due to act.
pub fn apply_move_for(
    state: &GameState,
    player: usize,
    mv: &Move,
) -> Result<GameState, IllegalMove> {
    if player != state.acting_player() {
        return Err(IllegalMove::WrongActor(player));
    }
    apply_move(state, mv)
}

fn take_from_hand(state: &mut GameState, player: usize, card: Card) -> Result<(), IllegalMove> {
    let hand = &mut state.players[player].hand;
    let index = hand
        .iter()
        .position(|&c| c == card)
        .ok_or(IllegalMove::TargetNotFound(card))?;
    hand.remove(index);
    Ok(())
}

fn play_from_hand(
    state: &mut GameState,
    actor: usize,
    card: Card,
    play: PlayAs,
) -> Result<(), IllegalMove> {
    take_from_hand(state, actor, card)?;
    play_card(state, actor, card, play)
}

/// Play `card`, already removed from its source zone, the way `play` says.
fn play_card(
    state: &mut GameState,
    actor: usize,
    card: Card,
    play: PlayAs,
) -> Result<(), IllegalMove> {
    let opp = opponent(actor);
    state.passes = 0;

    match play {
        PlayAs::Points => {
            if !card.is_point_card() {
                return Err(IllegalMove::WrongPending("card has no point value"));
            }
            state.players[actor].points.push(card);
            finish_turn(state);
        }
        PlayAs::Scuttle(target) => {
            if !card.beats(target) {
                return Err(IllegalMove::WrongPending("scuttle needs a higher point value"));
            }
            if state.players[opp].is_protected(target) {
                return Err(IllegalMove::TargetNotFound(target));
            }
            let theirs = &mut state.players[opp];
            if let Some(index) = theirs.points.iter().position(|&c| c == target) {
                theirs.points.remove(index);
                state.scrap.extend([card, target]);
            } else if let Some(index) = theirs.pair_holding(target) {
                let pair = theirs.jacks.remove(index);
                state.scrap.extend([card, pair.stolen, pair.jack]);
            } else {
                return Err(IllegalMove::TargetNotFound(target));
            }
            finish_turn(state);
        }
        PlayAs::OneOff(target) => {
            if !card.has_one_off() {
                return Err(IllegalMove::WrongPending("card has no one-off effect"));
            }
            check_one_off_target(state, actor, card, target)?;
            state.pending = Pending::Counter(CounterState {
                caster: actor,
                card,
                target,
                chain: Vec::new(),
            });
        }
        PlayAs::Permanent(target) => {
            if !card.is_permanent() {
                return Err(IllegalMove::WrongPending("card is not a permanent"));
            }
            if card.rank() == Rank::Jack {
                let Some(target) = target else {
                    return Err(IllegalMove::WrongPending("a Jack needs a target"));
                };
                steal(state, actor, card, target)?;
            } else {
                state.players[actor].permanents.push(card);
            }
            finish_turn(state);
        }
    }
    Ok(())
}

fn steal(state: &mut GameState, actor: usize, jack: Card, target: Card) -> Result<(), IllegalMove> {
    let opp = opponent(actor);
    if state.players[opp].is_protected(target) {
        return Err(IllegalMove::TargetNotFound(target));
    }
    let theirs = &mut state.players[opp];
    if let Some(index) = theirs.points.iter().position(|&c| c == target) {
        theirs.points.remove(index);
    } else if let Some(index) = theirs.pair_holding(target) {
        let previous = theirs.jacks.remove(index);
        state.scrap.push(previous.jack);
    } else {
        return Err(IllegalMove::TargetNotFound(target));
    }
    state.players[actor].jacks.push(JackPair {
        jack,
        stolen: target,
    });
    Ok(())
}

/// Whether `card` is on `owner`'s field as a permanent or as a Jack.
fn on_field(state: &GameState, owner: usize, card: Card) -> bool {
    let p = &state.players[owner];
    p.permanents.contains(&card) || p.pair_of_jack(card).is_some()
}

/// Check a one-off target at play time. Targets are checked again when the
/// effect resolves.
fn check_one_off_target(
    state: &GameState,
    actor: usize,
    card: Card,
    target: Option<Target>,
) -> Result<(), IllegalMove> {
    match (card.rank(), target) {
        (Rank::Two | Rank::Nine, Some(Target::Permanent { owner, card: t })) => {
            if card.rank() == Rank::Two && owner == actor {
                return Err(IllegalMove::WrongPending("a Two cannot target its caster's cards"));
            }
            if !on_field(state, owner, t) {
                return Err(IllegalMove::TargetNotFound(t));
            }
            if owner != actor && state.players[owner].is_protected(t) {
                return Err(IllegalMove::TargetNotFound(t));
            }
            Ok(())
        }
        (Rank::Three, Some(Target::Scrap(t))) => {
            if state.scrap.contains(&t) {
                Ok(())
            } else {
                Err(IllegalMove::TargetNotFound(t))
            }
        }
        (Rank::Two | Rank::Three | Rank::Nine, _) => {
            Err(IllegalMove::WrongPending("one-off needs a matching target"))
        }
        _ => Ok(()),
    }
}

/// Close a counter exchange: resolve or cancel the one-off, scrap every card
/// involved, and end the turn unless the effect left something pending.
fn resolve_counter(state: &mut GameState) {
    let Pending::Counter(counter) = std::mem::take(&mut state.pending) else {
        return;
    };
    if counter.resolves() {
        resolve_one_off(state, counter.caster, counter.card, counter.target);
    } else {
        trace!("{} cancelled by {} counter(s)", counter.card, counter.chain.len());
    }
    state.scrap.push(counter.card);
    state.scrap.extend(counter.chain);
    if matches!(state.pending, Pending::None) {
        finish_turn(state);
    }
}

fn resolve_one_off(state: &mut GameState, caster: usize, card: Card, target: Option<Target>) {
    let opp = opponent(caster);
    match card.rank() {
        Rank::Ace => {
            for p in 0..2 {
                let player = &mut state.players[p];
                state.scrap.append(&mut player.points);
                for pair in player.jacks.drain(..) {
                    state.scrap.extend([pair.jack, pair.stolen]);
                }
            }
        }
        Rank::Two | Rank::Nine => {
            let Some(Target::Permanent { owner, card: t }) = target else {
                return;
            };
            let still_valid = on_field(state, owner, t)
                && (owner == caster || !state.players[owner].is_protected(t));
            if !still_valid {
                trace!("{card} fizzles: {t} is gone or protected");
                return;
            }
            remove_permanent(state, owner, t, card.rank() == Rank::Nine);
        }
        Rank::Three => {
            let Some(Target::Scrap(t)) = target else {
                return;
            };
            match state.scrap.iter().position(|&c| c == t) {
                Some(index) => {
                    state.scrap.remove(index);
                    state.players[caster].hand.push(t);
                }
                None => trace!("{card} fizzles: {t} left the scrap"),
            }
        }
        Rank::Four => {
            let count = FOUR_DISCARD_COUNT.min(state.players[opp].hand.len());
            if count > 0 {
                state.pending = Pending::Four(FourState { player: opp, count });
            }
        }
        Rank::Five => {
            let n = FIVE_DRAW_COUNT.min(state.deck.len());
            let drawn: Vec<Card> = state.deck.drain(..n).collect();
            state.players[caster].hand.extend(drawn);
        }
        Rank::Six => {
            for p in 0..2 {
                let permanents = std::mem::take(&mut state.players[p].permanents);
                state.scrap.extend(permanents);
                let pairs = std::mem::take(&mut state.players[p].jacks);
                for pair in pairs {
                    state.scrap.push(pair.jack);
                    state.players[opponent(p)].points.push(pair.stolen);
                }
            }
        }
        Rank::Seven => {
            let n = SEVEN_REVEAL_COUNT.min(state.deck.len());
            let revealed: Vec<Card> = state.deck.drain(..n).collect();
            if !revealed.is_empty() {
                state.pending = Pending::Seven(SevenState {
                    player: caster,
                    revealed,
                });
            }
        }
        _ => {}
    }
}

/// Take `card` off `owner`'s field. A Jack releases its stolen card back to
/// the other player. With `to_hand` the card returns to its owner's hand
/// (Nine), otherwise it is scrapped (Two).
fn remove_permanent(state: &mut GameState, owner: usize, card: Card, to_hand: bool) {
    let player = &mut state.players[owner];
    if let Some(index) = player.permanents.iter().position(|&c| c == card) {
        player.permanents.remove(index);
    } else if let Some(index) = player.pair_of_jack(card) {
        let pair = player.jacks.remove(index);
        state.players[opponent(owner)].points.push(pair.stolen);
    } else {
        return;
    }
    if to_hand {
        state.players[owner].hand.push(card);
    } else {
        state.scrap.push(card);
    }
}

/// End the current player's turn and decide the game if it is over.
///
/// Checks, in order: point thresholds (turn owner first), empty hand with an
/// empty deck for the next player, consecutive passes, the round limit.
fn finish_turn(state: &mut GameState) {
    let owner = state.current;
    for p in [owner, opponent(owner)] {
        if state.players[p].has_won() {
            state.outcome = Some(Outcome {
                winner: Some(p),
                reason: WinReason::Points,
            });
            return;
        }
    }

    if owner == 1 {
        state.turn += 1;
    }
    state.current = opponent(owner);

    let next = state.current;
    if state.players[next].hand.is_empty() && state.deck.is_empty() {
        state.outcome = Some(Outcome {
            winner: Some(opponent(next)),
            reason: WinReason::EmptyHand,
        });
    } else if state.passes >= PASSES_TO_END {
        state.outcome = Some(compare_points(state, WinReason::EmptyDeck));
    } else if state.turn > TURN_LIMIT {
        state.outcome = Some(compare_points(state, WinReason::TurnLimit));
    }
}

fn compare_points(state: &GameState, reason: WinReason) -> Outcome {
    let a = state.players[0].point_total();
    let b = state.players[1].point_total();
    let winner = match a.cmp(&b) {
        std::cmp::Ordering::Greater => Some(0),
        std::cmp::Ordering::Less => Some(1),
        std::cmp::Ordering::Equal => None,
    };
    Outcome { winner, reason }
}
