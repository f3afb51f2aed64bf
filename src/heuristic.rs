//! Heuristic move scoring.
//!
//! Cuttle plays like a race: putting points on the board usually beats
//! trading cards. The scores below favour high point plays, Kings and well
//! timed Jacks, and rate scuttles, Glasses and most counters low.
//!
//! Scores are always taken from the point of view of the acting player and
//! are used in three places: the heuristic strategy, the greedy half of the
//! epsilon-greedy rollout, and the order in which MCTS expands moves.

use crate::card::{Card, Rank};
use crate::constants::{
    BEHIND_MARGIN, FAR_BEHIND_MARGIN, SCORE_BLOCK_WIN, SCORE_DRAW, SCORE_GLASSES, SCORE_JACK_BASE,
    SCORE_KING, SCORE_PASS, SCORE_QUEEN, SCORE_WIN,
};
use crate::moves::{Move, PlayAs, Target};
use crate::state::{GameState, Pending, opponent};

/// Score a move for the acting player. Higher is better.
pub fn score_move(state: &GameState, mv: &Move) -> f64 {
    let ctx = Context::new(state);
    match mv {
        Move::Draw => SCORE_DRAW,
        Move::Pass => SCORE_PASS,
        Move::PlayPoints(card) => ctx.points(*card),
        Move::Scuttle { card, target } => ctx.scuttle(*card, *target),
        Move::PlayPermanent { card, target } => ctx.permanent(*card, *target),
        Move::PlayOneOff { card, target } => ctx.one_off(*card, *target),
        Move::Counter(_) => match &state.pending {
            Pending::Counter(c) => match c.card.rank() {
                Rank::Ace => 400.0,
                Rank::Five => 350.0,
                Rank::Four => 100.0,
                Rank::Two => 80.0,
                _ => 50.0,
            },
            _ => 100.0,
        },
        Move::DeclineCounter => match &state.pending {
            Pending::Counter(c) => match c.card.rank() {
                Rank::Six | Rank::Three | Rank::Seven => 200.0,
                Rank::Two | Rank::Four => 150.0,
                Rank::Five => 50.0,
                Rank::Ace => -50.0,
                _ => 100.0,
            },
            _ => 100.0,
        },
        Move::Discard(cards) => cards.iter().map(|c| 10.0 - c.point_value() as f64).sum(),
        Move::ResolveSeven { card, play } => ctx.seven(*card, *play),
    }
}

/// Indices of the highest-scoring moves.
pub fn best_indices(state: &GameState, moves: &[Move]) -> Vec<usize> {
    let scores: Vec<f64> = moves.iter().map(|m| score_move(state, m)).collect();
    let best = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    scores
        .iter()
        .enumerate()
        .filter(|&(_, &s)| s == best)
        .map(|(i, _)| i)
        .collect()
}

/// A highest-scoring move, ties broken at random.
pub fn best_move<'a>(
    state: &GameState,
    moves: &'a [Move],
    rng: &mut fastrand::Rng,
) -> Option<&'a Move> {
    let best = best_indices(state, moves);
    if best.is_empty() {
        return None;
    }
    Some(&moves[best[rng.usize(..best.len())]])
}

struct Context<'a> {
    state: &'a GameState,
    me: usize,
    my_points: i32,
    opp_points: i32,
    threshold: i32,
}

impl<'a> Context<'a> {
    fn new(state: &'a GameState) -> Self {
        let me = state.acting_player();
        Self {
            state,
            me,
            my_points: state.players[me].point_total() as i32,
            opp_points: state.players[opponent(me)].point_total() as i32,
            threshold: state.players[me].point_threshold() as i32,
        }
    }

    fn diff(&self) -> i32 {
        self.my_points - self.opp_points
    }

    fn behind(&self) -> bool {
        self.diff() < -BEHIND_MARGIN
    }

    fn far_behind(&self) -> bool {
        self.diff() < -FAR_BEHIND_MARGIN
    }

    fn wins_with(&self, card: Card) -> bool {
        self.my_points + card.point_value() as i32 >= self.threshold
    }

    fn points(&self, card: Card) -> f64 {
        if self.wins_with(card) {
            return SCORE_WIN;
        }
        let v = card.point_value() as f64;
        match card.point_value() {
            8.. => 800.0 + v * 10.0,
            5..=7 => 400.0 + v * 10.0,
            _ => 200.0 + v * 10.0,
        }
    }

    fn scuttle(&self, card: Card, target: Card) -> f64 {
        let opp = &self.state.players[opponent(self.me)];
        let gained = target.point_value() as i32 - card.point_value() as i32;
        let opp_threshold = opp.point_threshold() as i32;
        if self.opp_points >= opp_threshold - target.point_value() as i32 {
            return SCORE_BLOCK_WIN;
        }
        if self.far_behind() && gained >= 5 {
            return 100.0 + gained as f64 * 10.0;
        }
        20.0 + gained as f64
    }

    fn jack(&self, target: Card) -> f64 {
        let base = SCORE_JACK_BASE + target.point_value() as f64 * 20.0;
        if self.far_behind() {
            base + 200.0
        } else if self.behind() {
            base + 100.0
        } else {
            base
        }
    }

    fn permanent(&self, card: Card, target: Option<Card>) -> f64 {
        match (card.rank(), target) {
            (Rank::King, _) => SCORE_KING,
            (Rank::Jack, Some(t)) => self.jack(t),
            (Rank::Queen, _) => SCORE_QUEEN,
            (Rank::Eight, _) => SCORE_GLASSES,
            _ => 0.0,
        }
    }

    fn one_off(&self, card: Card, _target: Option<Target>) -> f64 {
        let state = self.state;
        match card.rank() {
            Rank::Ace => {
                if self.far_behind() {
                    500.0
                } else if self.behind() {
                    300.0
                } else if self.opp_points > self.my_points {
                    200.0
                } else {
                    30.0
                }
            }
            Rank::Two => 150.0,
            Rank::Three => {
                let worth_reviving = state.scrap.iter().any(|c| {
                    c.point_value() >= 8 || matches!(c.rank(), Rank::King | Rank::Jack)
                });
                if worth_reviving { 400.0 } else { 100.0 }
            }
            Rank::Four => 180.0,
            Rank::Five => 250.0,
            Rank::Six => {
                let ours = state.players[self.me].permanents.len();
                let theirs = state.players[opponent(self.me)].permanents.len();
                if theirs > ours + 1 {
                    300.0
                } else if theirs > ours {
                    150.0
                } else {
                    30.0
                }
            }
            Rank::Seven => 350.0,
            _ => 100.0,
        }
    }

    fn seven(&self, card: Card, play: PlayAs) -> f64 {
        match play {
            PlayAs::OneOff(_) => match card.rank() {
                Rank::Five => 400.0,
                Rank::Ace if self.opp_points > self.my_points => 350.0,
                Rank::Ace => 100.0,
                _ => 250.0,
            },
            PlayAs::Points => {
                if self.wins_with(card) {
                    SCORE_WIN
                } else {
                    200.0 + card.point_value() as f64 * 10.0
                }
            }
            PlayAs::Scuttle(target) => {
                50.0 + (target.point_value() as f64 - card.point_value() as f64)
            }
            PlayAs::Permanent(target) => match (card.rank(), target) {
                (Rank::King, _) => 500.0,
                (Rank::Jack, Some(t)) => SCORE_JACK_BASE + t.point_value() as f64 * 20.0,
                _ => 150.0,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::parse_cards;
    use crate::movegen::legal_moves;
    use crate::state::CounterState;

    fn card(s: &str) -> Card {
        s.parse().unwrap()
    }

    fn state_with(hand0: &str, hand1: &str) -> GameState {
        let mut state = GameState::deal(Vec::new());
        state.players[0].hand = parse_cards(hand0).unwrap();
        state.players[1].hand = parse_cards(hand1).unwrap();
        state.deck = parse_cards("AS 2S 3S").unwrap();
        state
    }

    #[test]
    fn test_winning_points_play_is_best() {
        let mut state = state_with("3C TC KH", "4D");
        state.players[0].points = parse_cards("9C 9D").unwrap();
        let moves = legal_moves(&state);
        let best = best_indices(&state, &moves);
        assert_eq!(best.len(), 2);
        for i in best {
            assert!(matches!(moves[i], Move::PlayPoints(_)));
            assert_eq!(score_move(&state, &moves[i]), SCORE_WIN);
        }
    }

    #[test]
    fn test_high_points_beat_draw() {
        let state = state_with("9C", "4D");
        let draw = score_move(&state, &Move::Draw);
        let nine = score_move(&state, &Move::PlayPoints(card("9C")));
        assert!(nine > draw);
        let four = score_move(&state, &Move::PlayPoints(card("4D")));
        assert!(four < draw);
    }

    #[test]
    fn test_jack_bonus_when_behind() {
        let mut state = state_with("JC", "4D");
        state.players[1].points = parse_cards("TD").unwrap();
        let steal = Move::PlayPermanent {
            card: card("JC"),
            target: Some(card("TD")),
        };
        let level = {
            let mut s = state.clone();
            s.players[0].points = parse_cards("TH").unwrap();
            score_move(&s, &steal)
        };
        let behind = score_move(&state, &steal);
        assert_eq!(level, 500.0);
        assert_eq!(behind, 700.0);
    }

    #[test]
    fn test_counter_scores_follow_threat() {
        let mut state = state_with("", "2D");
        state.pending = Pending::Counter(CounterState {
            caster: 0,
            card: card("AH"),
            target: None,
            chain: Vec::new(),
        });
        let counter = score_move(&state, &Move::Counter(card("2D")));
        let decline = score_move(&state, &Move::DeclineCounter);
        assert!(counter > decline);
    }

    #[test]
    fn test_discard_prefers_low_cards() {
        let state = state_with("", "");
        let low = score_move(&state, &Move::Discard(parse_cards("AC 2C").unwrap()));
        let high = score_move(&state, &Move::Discard(parse_cards("9C TC").unwrap()));
        assert!(low > high);
    }

    #[test]
    fn test_best_move_breaks_ties_randomly() {
        let state = state_with("TC TD", "4D");
        let moves = legal_moves(&state);
        let mut rng = fastrand::Rng::with_seed(1);
        let mut seen = std::collections::HashSet::new();
        for _ in 0..50 {
            seen.insert(best_move(&state, &moves, &mut rng).unwrap().clone());
        }
        assert_eq!(seen.len(), 2);
    }
}
