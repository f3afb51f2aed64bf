//! Monte Carlo playouts (game simulation).
//!
//! A playout plays moves chosen by a [`RolloutPolicy`] until the game ends or
//! a depth cap is hit, then scores the result for one player:
//! - 1.0 for a win, 0.0 for a loss, 0.5 for a draw
//! - a truncated playout is scored on points: 0.7 ahead, 0.3 behind, 0.5 level

use log::trace;
use serde::{Deserialize, Serialize};

use crate::constants::{DRAW_VALUE, ROLLOUT_EPSILON, TRUNCATED_AHEAD, TRUNCATED_BEHIND};
use crate::executor::apply_move;
use crate::heuristic;
use crate::movegen::legal_moves;
use crate::moves::Move;
use crate::state::{GameState, opponent};

/// How moves are picked during a playout.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RolloutPolicy {
    /// Every legal move equally likely.
    Uniform,
    /// A random move with probability `epsilon`, otherwise the best
    /// heuristic move.
    EpsilonGreedy { epsilon: f64 },
    /// Always the best heuristic move (ties broken at random).
    Heuristic,
}

impl Default for RolloutPolicy {
    fn default() -> Self {
        RolloutPolicy::EpsilonGreedy {
            epsilon: ROLLOUT_EPSILON,
        }
    }
}

impl RolloutPolicy {
    /// Index into `moves` of the move this policy plays.
    pub fn choose(&self, state: &GameState, moves: &[Move], rng: &mut fastrand::Rng) -> usize {
        debug_assert!(!moves.is_empty());
        let greedy = match *self {
            RolloutPolicy::Uniform => false,
            RolloutPolicy::EpsilonGreedy { epsilon } => rng.f64() >= epsilon,
            RolloutPolicy::Heuristic => true,
        };
        if greedy {
            let best = heuristic::best_indices(state, moves);
            if !best.is_empty() {
                return best[rng.usize(..best.len())];
            }
        }
        rng.usize(..moves.len())
    }
}

/// Play from `state` until the game ends or `max_depth` plies have been
/// played. Returns the final state.
pub fn playout(
    mut state: GameState,
    policy: RolloutPolicy,
    max_depth: usize,
    rng: &mut fastrand::Rng,
) -> GameState {
    for _ in 0..max_depth {
        if state.is_terminal() {
            break;
        }
        let mut moves = legal_moves(&state);
        let next = loop {
            if moves.is_empty() {
                break None;
            }
            let i = policy.choose(&state, &moves, rng);
            let mv = moves.swap_remove(i);
            match apply_move(&state, &mv) {
                Ok(next) => break Some(next),
                Err(e) => trace!("playout dropped {mv}: {e}"),
            }
        };
        match next {
            Some(next) => state = next,
            None => break,
        }
    }
    state
}

/// The value of `state` for `player`, in `[0, 1]`.
pub fn value_for(state: &GameState, player: usize) -> f64 {
    if let Some(outcome) = state.outcome {
        return match outcome.winner {
            Some(w) if w == player => 1.0,
            Some(_) => 0.0,
            None => DRAW_VALUE,
        };
    }
    let mine = state.players[player].point_total();
    let theirs = state.players[opponent(player)].point_total();
    match mine.cmp(&theirs) {
        std::cmp::Ordering::Greater => TRUNCATED_AHEAD,
        std::cmp::Ordering::Less => TRUNCATED_BEHIND,
        std::cmp::Ordering::Equal => DRAW_VALUE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::parse_cards;
    use crate::constants::MAX_ROLLOUT_DEPTH;
    use crate::state::{Outcome, WinReason};

    #[test]
    fn test_playout_reaches_the_end() {
        let mut rng = fastrand::Rng::with_seed(11);
        for policy in [
            RolloutPolicy::Uniform,
            RolloutPolicy::default(),
            RolloutPolicy::Heuristic,
        ] {
            let end = playout(GameState::with_seed(2), policy, usize::MAX, &mut rng);
            assert!(end.is_terminal(), "{policy:?} did not finish");
        }
    }

    #[test]
    fn test_depth_cap_truncates() {
        let mut rng = fastrand::Rng::with_seed(11);
        let start = GameState::with_seed(2);
        let end = playout(start.clone(), RolloutPolicy::Uniform, 0, &mut rng);
        assert_eq!(end, start);
        let end = playout(start, RolloutPolicy::Uniform, MAX_ROLLOUT_DEPTH, &mut rng);
        let v = value_for(&end, 0);
        assert!((0.0..=1.0).contains(&v));
    }

    #[test]
    fn test_value_for_outcomes() {
        let mut state = GameState::with_seed(1);
        assert_eq!(value_for(&state, 0), DRAW_VALUE);
        state.players[0].points = parse_cards("5H").unwrap();
        assert_eq!(value_for(&state, 0), TRUNCATED_AHEAD);
        assert_eq!(value_for(&state, 1), TRUNCATED_BEHIND);
        state.outcome = Some(Outcome {
            winner: Some(1),
            reason: WinReason::Points,
        });
        assert_eq!(value_for(&state, 0), 0.0);
        assert_eq!(value_for(&state, 1), 1.0);
    }

    #[test]
    fn test_heuristic_policy_takes_the_win() {
        let mut state = GameState::with_seed(1);
        state.players[0].points = parse_cards("9C 9D").unwrap();
        state.players[0].hand = parse_cards("3C").unwrap();
        let moves = legal_moves(&state);
        let mut rng = fastrand::Rng::with_seed(0);
        let i = RolloutPolicy::Heuristic.choose(&state, &moves, &mut rng);
        assert_eq!(moves[i], Move::PlayPoints("3C".parse().unwrap()));
    }
}
