//! Monte Carlo Tree Search (MCTS) over Cuttle game states.
//!
//! The search keeps its nodes in an arena and refers to them by [`NodeId`].
//! Each iteration runs the usual four steps:
//! - Selection: descend by UCB1 while a node is fully expanded
//! - Expansion: add one child for an untried move (best heuristic move first
//!   by default)
//! - Simulation: a playout under the configured [`RolloutPolicy`]
//! - Backpropagation: walk back to the root, crediting each node's mover
//!
//! Cuttle does not strictly alternate turns: a player may act twice in a row
//! (answering a counter, resolving a Seven, discarding after a Four). Every
//! node therefore records the player who made the move leading into it, and a
//! result is flipped only where that player changes.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use log::{debug, info, trace};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{EXPLORATION, MAX_ROLLOUT_DEPTH, N_ITERATIONS};
use crate::executor::apply_move;
use crate::heuristic::{self, score_move};
use crate::movegen::legal_moves;
use crate::moves::Move;
use crate::playout::{RolloutPolicy, playout, value_for};
use crate::state::GameState;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("no legal moves available")]
    NoLegalMoves,

    #[error("could not build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Order in which untried moves are expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Expansion {
    /// Highest heuristic score first.
    Guided,
    /// Uniformly random.
    Random,
}

/// Per-search settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Iterations per tree. With several threads each tree runs this many.
    pub iterations: usize,
    /// UCB1 exploration constant.
    pub exploration: f64,
    pub rollout: RolloutPolicy,
    pub expansion: Expansion,
    pub max_rollout_depth: usize,
    /// Stop early once this much wall-clock time has passed.
    pub time_limit: Option<Duration>,
    pub seed: Option<u64>,
    /// Independent trees searched in parallel (root parallelism).
    pub threads: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            iterations: N_ITERATIONS,
            exploration: EXPLORATION,
            rollout: RolloutPolicy::default(),
            expansion: Expansion::Guided,
            max_rollout_depth: MAX_ROLLOUT_DEPTH,
            time_limit: None,
            seed: None,
            threads: 1,
        }
    }
}

/// Root statistics for one move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveStats {
    pub mv: Move,
    pub visits: u32,
    pub wins: f64,
    pub win_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// The most-visited root move.
    pub best: Move,
    /// Root moves, most visited first. Empty when no iteration completed.
    pub stats: Vec<MoveStats>,
    /// Iterations actually run (summed over workers).
    pub iterations: usize,
}

/// Index of a node in a [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

/// A node in the search tree.
#[derive(Debug, Clone)]
pub struct Node {
    pub state: GameState,
    pub parent: Option<NodeId>,
    pub children: Vec<(Move, NodeId)>,
    /// Moves not yet expanded; the next one to try is at the end.
    pub untried: Vec<Move>,
    pub visits: u32,
    /// Sum of results from the point of view of `mover`.
    pub wins: f64,
    /// Player who made the move into this node. `None` at the root.
    pub mover: Option<usize>,
}

impl Node {
    fn new(state: GameState, parent: Option<NodeId>, mover: Option<usize>, order: Expansion) -> Self {
        let mut untried = legal_moves(&state);
        if order == Expansion::Guided {
            // Stable sort, best first, then reverse so `pop` yields the best
            // move and the earliest of equally scored moves.
            let mut scored: Vec<(f64, Move)> = untried
                .into_iter()
                .map(|m| (score_move(&state, &m), m))
                .collect();
            scored.sort_by(|a, b| b.0.total_cmp(&a.0));
            untried = scored.into_iter().rev().map(|(_, m)| m).collect();
        }
        Self {
            state,
            parent,
            children: Vec::new(),
            untried,
            visits: 0,
            wins: 0.0,
            mover,
        }
    }

    #[inline]
    pub fn win_rate(&self) -> f64 {
        if self.visits > 0 {
            self.wins / self.visits as f64
        } else {
            0.0
        }
    }
}

/// UCB1 score of a child. Unvisited children (or an unvisited parent) score
/// infinity so they are tried first.
pub fn ucb1(wins: f64, visits: u32, parent_visits: u32, exploration: f64) -> f64 {
    if visits == 0 || parent_visits == 0 {
        return f64::INFINITY;
    }
    let n = visits as f64;
    wins / n + exploration * ((parent_visits as f64).ln() / n).sqrt()
}

/// Search tree with arena-allocated nodes.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
    expansion: Expansion,
}

impl Tree {
    pub fn new(root: GameState, expansion: Expansion) -> Self {
        Self {
            nodes: vec![Node::new(root, None, None, expansion)],
            expansion,
        }
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0 as usize]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn allocate(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    /// Add a child of `parent` reached by `mv`, made by `mover`.
    pub fn add_child(&mut self, parent: NodeId, mv: Move, state: GameState, mover: usize) -> NodeId {
        let child = Node::new(state, Some(parent), Some(mover), self.expansion);
        let id = self.allocate(child);
        self.get_mut(parent).children.push((mv, id));
        id
    }

    /// The child of `id` with the highest UCB1 score.
    pub fn select_child(&self, id: NodeId, exploration: f64) -> Option<NodeId> {
        let node = self.get(id);
        node.children
            .iter()
            .map(|&(_, child)| {
                let c = self.get(child);
                (ucb1(c.wins, c.visits, node.visits, exploration), child)
            })
            .max_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, child)| child)
    }

    /// Credit `value`, seen from the leaf's mover, to every node from `leaf`
    /// up to the root.
    ///
    /// Every node on the path gets a visit. Nodes with a mover also get the
    /// value; it is flipped (`1 - v`) only when the parent's mover differs
    /// from the current node's.
    pub fn backpropagate(&mut self, leaf: NodeId, value: f64) {
        let mut current = Some(leaf);
        let mut v = value;
        while let Some(id) = current {
            let (mover, parent) = {
                let node = self.get_mut(id);
                node.visits += 1;
                if node.mover.is_some() {
                    node.wins += v;
                }
                (node.mover, node.parent)
            };
            if let Some(p) = parent {
                let parent_mover = self.get(p).mover;
                if parent_mover.is_some() && parent_mover != mover {
                    v = 1.0 - v;
                }
            }
            current = parent;
        }
    }

    /// Root move statistics, most visited first.
    pub fn root_stats(&self) -> Vec<MoveStats> {
        let mut stats: Vec<MoveStats> = self
            .get(self.root())
            .children
            .iter()
            .map(|(mv, id)| {
                let n = self.get(*id);
                MoveStats {
                    mv: mv.clone(),
                    visits: n.visits,
                    wins: n.wins,
                    win_rate: n.win_rate(),
                }
            })
            .collect();
        stats.sort_by(|a, b| b.visits.cmp(&a.visits));
        stats
    }

    /// The most-visited root move.
    pub fn best_move(&self) -> Option<&Move> {
        self.get(self.root())
            .children
            .iter()
            .max_by_key(|(_, id)| self.get(*id).visits)
            .map(|(mv, _)| mv)
    }

    /// Pop the next untried move of `id` according to the expansion order.
    fn next_untried(&mut self, id: NodeId, rng: &mut fastrand::Rng) -> Option<Move> {
        let expansion = self.expansion;
        let untried = &mut self.get_mut(id).untried;
        if untried.is_empty() {
            return None;
        }
        match expansion {
            Expansion::Guided => untried.pop(),
            Expansion::Random => Some(untried.swap_remove(rng.usize(..untried.len()))),
        }
    }

    /// Expand one child of `id`. Moves the executor rejects are dropped.
    fn expand(&mut self, id: NodeId, rng: &mut fastrand::Rng) -> Option<NodeId> {
        while let Some(mv) = self.next_untried(id, rng) {
            let node = self.get(id);
            let mover = node.state.acting_player();
            match apply_move(&node.state, &mv) {
                Ok(state) => return Some(self.add_child(id, mv, state, mover)),
                Err(e) => debug!("pruned {mv}: {e}"),
            }
        }
        None
    }

    /// One selection, expansion, simulation and backpropagation pass.
    fn iterate(&mut self, config: &SearchConfig, rng: &mut fastrand::Rng) {
        let mut id = self.root();
        loop {
            let node = self.get(id);
            if !node.untried.is_empty() || node.children.is_empty() {
                break;
            }
            match self.select_child(id, config.exploration) {
                Some(child) => id = child,
                None => break,
            }
        }

        if !self.get(id).state.is_terminal() {
            if let Some(child) = self.expand(id, rng) {
                id = child;
            }
        }

        let leaf = self.get(id);
        let perspective = leaf.mover.unwrap_or_else(|| leaf.state.acting_player());
        let end = playout(
            leaf.state.clone(),
            config.rollout,
            config.max_rollout_depth,
            rng,
        );
        let value = value_for(&end, perspective);
        trace!("iteration leaf {} value {value:.2}", id.0);
        self.backpropagate(id, value);
    }
}

/// Run one tree for `config.iterations` iterations (or until the time limit).
/// Returns the tree and the number of iterations run.
pub fn run_tree(root: &GameState, config: &SearchConfig, rng: &mut fastrand::Rng) -> (Tree, usize) {
    let mut tree = Tree::new(root.clone(), config.expansion);
    let start = Instant::now();
    let mut done = 0;
    while done < config.iterations {
        if config.time_limit.is_some_and(|limit| start.elapsed() >= limit) {
            break;
        }
        tree.iterate(config, rng);
        done += 1;
    }
    (tree, done)
}

fn single_move(state: &GameState) -> Result<Option<SearchResult>, SearchError> {
    let moves = legal_moves(state);
    match moves.len() {
        0 => Err(SearchError::NoLegalMoves),
        1 => {
            let mv = moves.into_iter().next().ok_or(SearchError::NoLegalMoves)?;
            Ok(Some(SearchResult {
                best: mv.clone(),
                stats: vec![MoveStats {
                    mv,
                    visits: 0,
                    wins: 0.0,
                    win_rate: 0.0,
                }],
                iterations: 0,
            }))
        }
        _ => Ok(None),
    }
}

/// Search `state` with default settings apart from the given knobs.
pub fn search(
    state: &GameState,
    iterations: usize,
    exploration: f64,
    rollout: RolloutPolicy,
) -> Result<SearchResult, SearchError> {
    let config = SearchConfig {
        iterations,
        exploration,
        rollout,
        ..SearchConfig::default()
    };
    search_with(state, &config)
}

/// Best heuristic root move, for a search that ended before its first
/// iteration.
fn fallback_move(state: &GameState, rng: &mut fastrand::Rng) -> Result<Move, SearchError> {
    let moves = legal_moves(state);
    let mv = heuristic::best_move(state, &moves, rng)
        .cloned()
        .ok_or(SearchError::NoLegalMoves)?;
    debug!("no iterations completed, falling back to {mv}");
    Ok(mv)
}

/// Search `state` with a full configuration. Uses [`search_parallel`] when
/// more than one thread is configured.
pub fn search_with(state: &GameState, config: &SearchConfig) -> Result<SearchResult, SearchError> {
    if config.threads > 1 {
        return search_parallel(state, config);
    }
    if let Some(result) = single_move(state)? {
        return Ok(result);
    }
    let mut rng = config
        .seed
        .map(fastrand::Rng::with_seed)
        .unwrap_or_else(fastrand::Rng::new);
    let (tree, iterations) = run_tree(state, config, &mut rng);
    let best = match tree.best_move() {
        Some(mv) => mv.clone(),
        None => fallback_move(state, &mut rng)?,
    };
    debug!(
        "searched {iterations} iterations, {} nodes, best {best}",
        tree.len()
    );
    Ok(SearchResult {
        best,
        stats: tree.root_stats(),
        iterations,
    })
}

/// Root-parallel search: independent trees on a rayon pool, each with its
/// own seed, merged by summing root statistics per move. Every tree runs the
/// full `config.iterations`.
pub fn search_parallel(
    state: &GameState,
    config: &SearchConfig,
) -> Result<SearchResult, SearchError> {
    if let Some(result) = single_move(state)? {
        return Ok(result);
    }
    let threads = config.threads.max(1);
    let base_seed = config.seed.unwrap_or_else(|| fastrand::u64(..));
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()?;

    let per_tree: Vec<(Vec<MoveStats>, usize)> = pool.install(|| {
        (0..threads)
            .into_par_iter()
            .map(|i| {
                let mut rng = fastrand::Rng::with_seed(base_seed.wrapping_add(i as u64));
                let (tree, done) = run_tree(state, config, &mut rng);
                (tree.root_stats(), done)
            })
            .collect()
    });

    let (stats, iterations) = merge_root_stats(per_tree);
    let best = match stats.first() {
        Some(s) => s.mv.clone(),
        None => fallback_move(state, &mut fastrand::Rng::with_seed(base_seed))?,
    };
    debug!("parallel search: {threads} trees, {iterations} iterations, best {best}");
    Ok(SearchResult {
        best,
        stats,
        iterations,
    })
}

/// Sum per-tree root statistics by move. Moves with equal visits keep the
/// order in which they were first seen.
fn merge_root_stats(per_tree: Vec<(Vec<MoveStats>, usize)>) -> (Vec<MoveStats>, usize) {
    let mut order: Vec<Move> = Vec::new();
    let mut merged: HashMap<Move, (u32, f64)> = HashMap::new();
    let mut iterations = 0;
    for (stats, done) in per_tree {
        iterations += done;
        for s in stats {
            let entry = merged.entry(s.mv.clone()).or_insert_with(|| {
                order.push(s.mv.clone());
                (0, 0.0)
            });
            entry.0 += s.visits;
            entry.1 += s.wins;
        }
    }

    let mut stats: Vec<MoveStats> = order
        .into_iter()
        .filter_map(|mv| {
            let (visits, wins) = merged.get(&mv).copied()?;
            let win_rate = if visits > 0 { wins / visits as f64 } else { 0.0 };
            Some(MoveStats {
                mv,
                visits,
                wins,
                win_rate,
            })
        })
        .collect();
    stats.sort_by(|a, b| b.visits.cmp(&a.visits));
    (stats, iterations)
}

/// Log the root statistics of a search.
pub fn dump_stats(result: &SearchResult) {
    for s in &result.stats {
        info!(
            "move {} v={} w={:.1} wr={:.3}",
            s.mv, s.visits, s.wins, s.win_rate
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::card::parse_cards;

    #[test]
    fn test_ucb1_unvisited_is_infinite() {
        assert_eq!(ucb1(0.0, 0, 10, EXPLORATION), f64::INFINITY);
        assert_eq!(ucb1(1.0, 1, 0, EXPLORATION), f64::INFINITY);
        let exploit = ucb1(9.0, 10, 20, 0.0);
        assert!((exploit - 0.9).abs() < 1e-12);
        assert!(ucb1(9.0, 10, 20, EXPLORATION) > exploit);
    }

    #[test]
    fn test_guided_untried_order() {
        let mut state = GameState::with_seed(1);
        state.players[0].points = parse_cards("9C 9D").unwrap();
        state.players[0].hand = parse_cards("KH 3C").unwrap();
        let tree = Tree::new(state, Expansion::Guided);
        let root = tree.get(tree.root());
        assert_eq!(
            root.untried.last(),
            Some(&Move::PlayPoints("3C".parse().unwrap()))
        );
    }

    #[test]
    fn test_backpropagate_counts_root_visits() {
        let state = GameState::with_seed(4);
        let mut tree = Tree::new(state.clone(), Expansion::Guided);
        let next = apply_move(&state, &Move::Draw).unwrap();
        let child = tree.add_child(tree.root(), Move::Draw, next, 0);
        tree.backpropagate(child, 1.0);
        tree.backpropagate(child, 0.0);
        assert_eq!(tree.get(tree.root()).visits, 2);
        assert_eq!(tree.get(tree.root()).wins, 0.0);
        assert_eq!(tree.get(child).visits, 2);
        assert_eq!(tree.get(child).wins, 1.0);
    }

    #[test]
    fn test_search_returns_root_move() {
        let state = GameState::with_seed(8);
        let config = SearchConfig {
            iterations: 200,
            seed: Some(1),
            ..SearchConfig::default()
        };
        let result = search_with(&state, &config).unwrap();
        assert!(legal_moves(&state).contains(&result.best));
        assert_eq!(result.iterations, 200);
        let visits: u32 = result.stats.iter().map(|s| s.visits).sum();
        assert_eq!(visits, 200);
        assert_eq!(result.stats[0].mv, result.best);
    }

    #[test]
    fn test_seeded_search_is_reproducible() {
        let state = GameState::with_seed(8);
        let config = SearchConfig {
            iterations: 100,
            seed: Some(42),
            ..SearchConfig::default()
        };
        let a = search_with(&state, &config).unwrap();
        let b = search_with(&state, &config).unwrap();
        assert_eq!(a.best, b.best);
        assert_eq!(a.stats, b.stats);
    }

    #[test]
    fn test_single_move_skips_search() {
        // Empty deck and empty hand: passing is the only move.
        let mut state = GameState::with_seed(8);
        state.deck.clear();
        state.players[0].hand.clear();
        let result = search(&state, 50, EXPLORATION, RolloutPolicy::Uniform).unwrap();
        assert_eq!(result.best, Move::Pass);
        assert_eq!(result.iterations, 0);
    }

    #[test]
    fn test_terminal_state_is_an_error() {
        let mut state = GameState::with_seed(8);
        state.outcome = Some(crate::state::Outcome {
            winner: Some(0),
            reason: crate::state::WinReason::Points,
        });
        assert!(matches!(
            search(&state, 10, EXPLORATION, RolloutPolicy::Uniform),
            Err(SearchError::NoLegalMoves)
        ));
    }

    #[test]
    fn test_zero_iterations_falls_back_to_legal_move() {
        let state = GameState::with_seed(8);
        let moves = legal_moves(&state);
        assert!(moves.len() > 1);

        let config = SearchConfig {
            iterations: 0,
            seed: Some(1),
            ..SearchConfig::default()
        };
        let result = search_with(&state, &config).unwrap();
        assert!(moves.contains(&result.best));
        assert_eq!(result.iterations, 0);
        assert!(result.stats.is_empty());

        let parallel = search_with(&state, &SearchConfig { threads: 2, ..config }).unwrap();
        assert!(moves.contains(&parallel.best));
        assert_eq!(parallel.iterations, 0);
    }

    #[test]
    fn test_expired_time_limit_still_returns_move() {
        let state = GameState::with_seed(8);
        let config = SearchConfig {
            time_limit: Some(Duration::ZERO),
            seed: Some(1),
            ..SearchConfig::default()
        };
        let result = search_with(&state, &config).unwrap();
        assert!(legal_moves(&state).contains(&result.best));
        assert_eq!(result.iterations, 0);
    }

    #[test]
    fn test_time_limit_stops_search_early() {
        let state = GameState::with_seed(8);
        let config = SearchConfig {
            iterations: 100_000_000,
            time_limit: Some(Duration::from_millis(20)),
            seed: Some(1),
            ..SearchConfig::default()
        };
        let result = search_with(&state, &config).unwrap();
        assert!(result.iterations < config.iterations);
        assert!(legal_moves(&state).contains(&result.best));
    }

    fn stat(mv: Move, visits: u32, wins: f64) -> MoveStats {
        MoveStats {
            mv,
            visits,
            wins,
            win_rate: wins / visits as f64,
        }
    }

    #[test]
    fn test_merge_keeps_first_seen_order_on_ties() {
        let draw = Move::Draw;
        let points = Move::PlayPoints("7C".parse().unwrap());
        let pass = Move::Pass;
        let per_tree = vec![
            (vec![stat(draw.clone(), 3, 1.0), stat(points.clone(), 2, 1.0)], 5),
            (vec![stat(points.clone(), 3, 2.0), stat(pass.clone(), 2, 0.0)], 5),
            (vec![stat(draw.clone(), 2, 2.0), stat(pass.clone(), 3, 1.5)], 5),
        ];
        let (stats, iterations) = merge_root_stats(per_tree);
        assert_eq!(iterations, 15);
        let order: Vec<(Move, u32)> = stats.iter().map(|s| (s.mv.clone(), s.visits)).collect();
        assert_eq!(order, vec![(draw, 5), (points, 5), (pass, 5)]);
        assert_eq!(stats[0].wins, 3.0);
        assert!((stats[1].win_rate - 0.6).abs() < 1e-12);
    }

    #[test]
    fn test_parallel_merges_visits() {
        let state = GameState::with_seed(8);
        let config = SearchConfig {
            iterations: 60,
            seed: Some(3),
            threads: 2,
            ..SearchConfig::default()
        };
        let result = search_with(&state, &config).unwrap();
        assert_eq!(result.iterations, 120);
        let visits: u32 = result.stats.iter().map(|s| s.visits).sum();
        assert_eq!(visits, 120);
    }
}
