//! Constants for the rules, the search and the heuristic priors.
//!
//! Everything that tunes behaviour without changing the shape of the engine
//! lives here, grouped the same way the engine is layered.

// =============================================================================
// Deck and Deal
// =============================================================================

/// Number of cards in a standard deck (no jokers).
pub const DECK_SIZE: usize = 52;

/// Cards dealt to player 0, who moves first.
pub const FIRST_HAND_SIZE: usize = 5;

/// Cards dealt to player 1.
pub const SECOND_HAND_SIZE: usize = 6;

// =============================================================================
// Win Conditions
// =============================================================================

/// Points needed to win with no Kings on the field.
pub const BASE_POINT_THRESHOLD: u32 = 21;

/// Threshold reduction per King on the owner's field.
pub const KING_THRESHOLD_REDUCTION: u32 = 7;

/// The threshold never drops below this value.
pub const MIN_POINT_THRESHOLD: u32 = 7;

/// Consecutive passes (empty deck) that end the game by point comparison.
pub const PASSES_TO_END: u8 = 2;

/// Rounds after which the game ends by point comparison.
/// A round is complete once player 1 has finished a turn.
pub const TURN_LIMIT: u32 = 150;

// =============================================================================
// Effects
// =============================================================================

/// Cards the opponent discards when a Four resolves.
pub const FOUR_DISCARD_COUNT: usize = 2;

/// Cards drawn when a Five resolves.
pub const FIVE_DRAW_COUNT: usize = 2;

/// Cards revealed from the deck when a Seven resolves.
pub const SEVEN_REVEAL_COUNT: usize = 2;

// =============================================================================
// MCTS Parameters
// =============================================================================

/// Default number of iterations per search.
pub const N_ITERATIONS: usize = 1000;

/// UCB1 exploration constant (sqrt 2).
pub const EXPLORATION: f64 = std::f64::consts::SQRT_2;

/// Probability of a uniformly random move in an epsilon-greedy rollout.
pub const ROLLOUT_EPSILON: f64 = 0.2;

/// Plies after which a rollout is cut off and scored by point difference.
pub const MAX_ROLLOUT_DEPTH: usize = 200;

/// Value of a truncated rollout for the player ahead on points.
pub const TRUNCATED_AHEAD: f64 = 0.7;

/// Value of a truncated rollout for the player behind on points.
pub const TRUNCATED_BEHIND: f64 = 0.3;

/// Value of a draw (or a level truncated rollout).
pub const DRAW_VALUE: f64 = 0.5;

/// Moves a driven game may take before it is abandoned as a draw.
pub const MAX_GAME_MOVES: usize = 2000;

// =============================================================================
// Heuristic Scores
// =============================================================================

/// Score of a move that wins on the spot.
pub const SCORE_WIN: f64 = 10_000.0;

/// Score of a scuttle that stops the opponent from reaching their threshold.
pub const SCORE_BLOCK_WIN: f64 = 5_000.0;

/// Score of drawing a card.
pub const SCORE_DRAW: f64 = 300.0;

/// Score of passing.
pub const SCORE_PASS: f64 = 0.0;

/// Score of playing a King.
pub const SCORE_KING: f64 = 600.0;

/// Base score of a Jack steal, before the stolen value bonus.
pub const SCORE_JACK_BASE: f64 = 300.0;

/// Score of playing a Queen.
pub const SCORE_QUEEN: f64 = 150.0;

/// Score of playing an Eight as Glasses.
pub const SCORE_GLASSES: f64 = 50.0;

/// Point deficit that counts as "behind".
pub const BEHIND_MARGIN: i32 = 3;

/// Point deficit that counts as "far behind".
pub const FAR_BEHIND_MARGIN: i32 = 8;
