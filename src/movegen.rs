//! Legal move generation.
//!
//! [`legal_moves`] looks at nothing but the state it is given and always
//! produces moves in the same order: Draw (or Pass) first, then every play of
//! every hand card in hand order. Callers may rely on indices being stable
//! for a given state.

use crate::card::{Card, Rank};
use crate::moves::{Move, PlayAs, Target};
use crate::state::{GameState, Pending, opponent};

/// All legal moves for the acting player. Empty only when the game is over.
pub fn legal_moves(state: &GameState) -> Vec<Move> {
    if state.is_terminal() {
        return Vec::new();
    }
    let moves = match &state.pending {
        Pending::None => main_moves(state),
        Pending::Counter(counter) => {
            let waiting = counter.waiting_for_player();
            let mut moves: Vec<Move> = state.players[waiting]
                .hand
                .iter()
                .filter(|c| c.rank() == Rank::Two)
                .map(|&c| Move::Counter(c))
                .collect();
            moves.push(Move::DeclineCounter);
            moves
        }
        Pending::Seven(seven) => {
            let mut moves: Vec<Move> = seven
                .revealed
                .iter()
                .flat_map(|&card| {
                    card_plays(state, seven.player, card)
                        .into_iter()
                        .map(move |play| Move::ResolveSeven { card, play })
                })
                .collect();
            if moves.is_empty() {
                moves.push(Move::Pass);
            }
            moves
        }
        Pending::Four(four) => combinations(&state.players[four.player].hand, four.count)
            .into_iter()
            .map(Move::Discard)
            .collect(),
    };
    debug_assert!(!moves.is_empty(), "non-terminal state without legal moves");
    moves
}

fn main_moves(state: &GameState) -> Vec<Move> {
    let actor = state.current;
    let mut moves = Vec::new();
    moves.push(if state.deck.is_empty() {
        Move::Pass
    } else {
        Move::Draw
    });
    for &card in &state.players[actor].hand {
        for play in card_plays(state, actor, card) {
            moves.push(match play {
                PlayAs::Points => Move::PlayPoints(card),
                PlayAs::Scuttle(target) => Move::Scuttle { card, target },
                PlayAs::OneOff(target) => Move::PlayOneOff { card, target },
                PlayAs::Permanent(target) => Move::PlayPermanent { card, target },
            });
        }
    }
    moves
}

/// Every way `actor` may play `card`, whether it comes from hand or from a
/// Seven reveal.
pub fn card_plays(state: &GameState, actor: usize, card: Card) -> Vec<PlayAs> {
    let opp = opponent(actor);
    let theirs = &state.players[opp];
    let mut plays = Vec::new();

    // Opponent point cards that can be scuttled or stolen.
    let exposed: Vec<Card> = theirs
        .points
        .iter()
        .copied()
        .chain(theirs.stolen())
        .filter(|&c| !theirs.is_protected(c))
        .collect();

    if card.is_point_card() {
        plays.push(PlayAs::Points);
        for &target in &exposed {
            if card.beats(target) {
                plays.push(PlayAs::Scuttle(target));
            }
        }
    }

    if card.has_one_off() {
        let field_permanents = |owner: usize| {
            let p = &state.players[owner];
            p.permanents
                .iter()
                .copied()
                .chain(p.jacks.iter().map(|j| j.jack))
                .collect::<Vec<_>>()
        };
        let any_points = state
            .players
            .iter()
            .any(|p| !p.points.is_empty() || !p.jacks.is_empty());
        let any_permanents = state
            .players
            .iter()
            .any(|p| !p.permanents.is_empty() || !p.jacks.is_empty());

        match card.rank() {
            Rank::Ace if any_points => plays.push(PlayAs::OneOff(None)),
            Rank::Two => {
                for target in field_permanents(opp) {
                    if !theirs.is_protected(target) {
                        plays.push(PlayAs::OneOff(Some(Target::Permanent {
                            owner: opp,
                            card: target,
                        })));
                    }
                }
            }
            Rank::Three => {
                for &target in &state.scrap {
                    plays.push(PlayAs::OneOff(Some(Target::Scrap(target))));
                }
            }
            Rank::Four if !theirs.hand.is_empty() => plays.push(PlayAs::OneOff(None)),
            Rank::Five | Rank::Seven if !state.deck.is_empty() => {
                plays.push(PlayAs::OneOff(None))
            }
            Rank::Six if any_permanents => plays.push(PlayAs::OneOff(None)),
            Rank::Nine => {
                for target in field_permanents(opp) {
                    if !theirs.is_protected(target) {
                        plays.push(PlayAs::OneOff(Some(Target::Permanent {
                            owner: opp,
                            card: target,
                        })));
                    }
                }
                for target in field_permanents(actor) {
                    plays.push(PlayAs::OneOff(Some(Target::Permanent {
                        owner: actor,
                        card: target,
                    })));
                }
            }
            _ => {}
        }
    }

    if card.is_permanent() {
        if card.rank() == Rank::Jack {
            for &target in &exposed {
                plays.push(PlayAs::Permanent(Some(target)));
            }
        } else {
            plays.push(PlayAs::Permanent(None));
        }
    }

    plays
}

/// Every `k`-card subset of `cards`, each in the order the cards appear.
fn combinations(cards: &[Card], k: usize) -> Vec<Vec<Card>> {
    let mut out = Vec::new();
    let mut current = Vec::with_capacity(k);
    fn recurse(
        cards: &[Card],
        k: usize,
        start: usize,
        current: &mut Vec<Card>,
        out: &mut Vec<Vec<Card>>,
    ) {
        if current.len() == k {
            out.push(current.clone());
            return;
        }
        for i in start..cards.len() {
            current.push(cards[i]);
            recurse(cards, k, i + 1, current, out);
            current.pop();
        }
    }
    recurse(cards, k, 0, &mut current, &mut out);
    out
}
