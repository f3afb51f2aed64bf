//! Cuttle-Rust: a Cuttle card game engine with Monte Carlo Tree Search.
//!
//! The engine is a deterministic state-transition system: [`legal_moves`]
//! lists the moves available in a [`GameState`] and [`apply_move`] returns
//! the state a move leads to, leaving its input untouched. The search builds
//! on those two functions alone.
//!
//! ## Modules
//!
//! - [`constants`] - Rule constants and search parameters
//! - [`card`] - Cards and the deck
//! - [`state`] - Game state, zones and pending sub-states
//! - [`moves`] - Move types
//! - [`movegen`] - Legal move generation
//! - [`executor`] - Move execution and win checks
//! - [`heuristic`] - Move scoring
//! - [`playout`] - Rollout policies and game simulation
//! - [`mcts`] - Monte Carlo Tree Search
//! - [`game`] - Strategies and a single-game driver
//! - [`console`] - Text console for playing against the engine
//!
//! ## Example
//!
//! ```
//! use cuttle_rust::{GameState, RolloutPolicy, apply_move, search};
//!
//! // Deal a reproducible game
//! let state = GameState::with_seed(7);
//!
//! // Search for a move and play it
//! let result = search(&state, 100, std::f64::consts::SQRT_2, RolloutPolicy::default()).unwrap();
//! let next = apply_move(&state, &result.best).unwrap();
//! println!("{}\n{next}", result.best);
//! ```

pub mod card;
pub mod console;
pub mod constants;
pub mod executor;
pub mod game;
pub mod heuristic;
pub mod mcts;
pub mod movegen;
pub mod moves;
pub mod playout;
pub mod state;

pub use card::Card;
pub use executor::{IllegalMove, apply_move, apply_move_for};
pub use mcts::{SearchConfig, SearchError, SearchResult, search};
pub use movegen::legal_moves;
pub use moves::Move;
pub use playout::RolloutPolicy;
pub use state::GameState;
