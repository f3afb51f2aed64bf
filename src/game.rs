//! Strategies and a single-game driver.
//!
//! The driver asks the generator for legal moves, asks the acting player's
//! [`Strategy`] to pick one and asks the executor for the next state, until
//! the game ends or a move cap is reached.

use log::{debug, trace};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::executor::{IllegalMove, apply_move};
use crate::heuristic;
use crate::mcts::{SearchConfig, SearchError, search_with};
use crate::movegen::legal_moves;
use crate::moves::Move;
use crate::state::{GameState, Outcome};

#[derive(Debug, Error)]
pub enum GameError {
    #[error("search failed: {0}")]
    Search(#[from] SearchError),
    #[error("strategy chose an illegal move: {0}")]
    Illegal(#[from] IllegalMove),
}

/// A move selection policy.
pub trait Strategy {
    fn name(&self) -> &str;

    /// Pick one of `moves`, which are the legal moves in `state`.
    fn select_move(&mut self, state: &GameState, moves: &[Move]) -> Result<Move, SearchError>;
}

/// Uniformly random moves.
pub struct RandomStrategy {
    rng: fastrand::Rng,
}

impl RandomStrategy {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            rng: seed.map(fastrand::Rng::with_seed).unwrap_or_else(fastrand::Rng::new),
        }
    }
}

impl Strategy for RandomStrategy {
    fn name(&self) -> &str {
        "Random"
    }

    fn select_move(&mut self, _state: &GameState, moves: &[Move]) -> Result<Move, SearchError> {
        if moves.is_empty() {
            return Err(SearchError::NoLegalMoves);
        }
        Ok(moves[self.rng.usize(..moves.len())].clone())
    }
}

/// Best heuristic move, ties broken at random.
pub struct HeuristicStrategy {
    rng: fastrand::Rng,
}

impl HeuristicStrategy {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            rng: seed.map(fastrand::Rng::with_seed).unwrap_or_else(fastrand::Rng::new),
        }
    }
}

impl Strategy for HeuristicStrategy {
    fn name(&self) -> &str {
        "Heuristic"
    }

    fn select_move(&mut self, state: &GameState, moves: &[Move]) -> Result<Move, SearchError> {
        heuristic::best_move(state, moves, &mut self.rng)
            .cloned()
            .ok_or(SearchError::NoLegalMoves)
    }
}

/// Moves chosen by tree search.
pub struct MctsStrategy {
    config: SearchConfig,
    rng: fastrand::Rng,
}

impl MctsStrategy {
    /// A seeded configuration makes every search of the game reproducible.
    pub fn new(config: SearchConfig) -> Self {
        let rng = config
            .seed
            .map(fastrand::Rng::with_seed)
            .unwrap_or_else(fastrand::Rng::new);
        Self { config, rng }
    }
}

impl Strategy for MctsStrategy {
    fn name(&self) -> &str {
        "MCTS"
    }

    fn select_move(&mut self, state: &GameState, moves: &[Move]) -> Result<Move, SearchError> {
        match moves {
            [] => Err(SearchError::NoLegalMoves),
            [only] => Ok(only.clone()),
            _ => {
                let config = SearchConfig {
                    seed: Some(self.rng.u64(..)),
                    ..self.config.clone()
                };
                Ok(search_with(state, &config)?.best)
            }
        }
    }
}

/// What happened in one game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameRecord {
    /// Every move with the player who made it.
    pub moves: Vec<(usize, Move)>,
    /// `None` when the move cap ended the game first.
    pub outcome: Option<Outcome>,
    /// Rounds played.
    pub turns: u32,
    pub final_state: GameState,
}

impl GameRecord {
    pub fn winner(&self) -> Option<usize> {
        self.outcome.and_then(|o| o.winner)
    }
}

/// Play one game from `initial`; `players[i]` moves for player `i`.
pub fn play_game(
    initial: GameState,
    mut players: [&mut dyn Strategy; 2],
    max_moves: usize,
) -> Result<GameRecord, GameError> {
    let mut state = initial;
    let mut record = Vec::new();

    while !state.is_terminal() && record.len() < max_moves {
        let actor = state.acting_player();
        let moves = legal_moves(&state);
        let mv = players[actor].select_move(&state, &moves)?;
        trace!("P{actor} {}: {mv}", players[actor].name());
        state = apply_move(&state, &mv)?;
        record.push((actor, mv));
    }

    if let Some(outcome) = state.outcome {
        debug!(
            "game over after {} moves: {:?} ({:?})",
            record.len(),
            outcome.winner,
            outcome.reason
        );
    } else {
        debug!("game abandoned after {} moves", record.len());
    }

    Ok(GameRecord {
        moves: record,
        outcome: state.outcome,
        turns: state.turn,
        final_state: state,
    })
}
