//! Cuttle-Rust: a Cuttle card game engine with MCTS.
//!
//! ## Usage
//!
//! - `cuttle-rust` - Show a demo
//! - `cuttle-rust demo` - Play MCTS against the heuristic strategy
//! - `cuttle-rust search --seed 7` - Run one search on a dealt position
//! - `cuttle-rust play` - Play against the engine in the terminal

use std::time::Duration;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;

use cuttle_rust::console::Console;
use cuttle_rust::constants::{EXPLORATION, MAX_GAME_MOVES, N_ITERATIONS, ROLLOUT_EPSILON};
use cuttle_rust::game::{HeuristicStrategy, MctsStrategy, play_game};
use cuttle_rust::mcts::{Expansion, SearchConfig, dump_stats, search_with};
use cuttle_rust::playout::RolloutPolicy;
use cuttle_rust::state::GameState;

/// Cuttle-Rust: a Cuttle engine with Monte Carlo Tree Search
#[derive(Parser)]
#[command(name = "cuttle-rust")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Play one game of MCTS against the heuristic strategy
    Demo {
        #[command(flatten)]
        search: SearchArgs,
    },
    /// Run a single search on a dealt position and print root statistics
    Search {
        #[command(flatten)]
        search: SearchArgs,
    },
    /// Play against the engine in the terminal
    Play {
        #[command(flatten)]
        search: SearchArgs,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Rollout {
    Uniform,
    Epsilon,
    Heuristic,
}

#[derive(Args)]
struct SearchArgs {
    /// Iterations per search
    #[arg(short, long, default_value_t = N_ITERATIONS)]
    iterations: usize,
    /// UCB1 exploration constant
    #[arg(long, default_value_t = EXPLORATION)]
    exploration: f64,
    /// Rollout policy
    #[arg(long, value_enum, default_value_t = Rollout::Epsilon)]
    rollout: Rollout,
    /// Random move probability for the epsilon-greedy rollout
    #[arg(long, default_value_t = ROLLOUT_EPSILON)]
    epsilon: f64,
    /// Expand untried moves in random order instead of heuristic order
    #[arg(long)]
    random_expansion: bool,
    /// Stop each search after this many milliseconds
    #[arg(long)]
    time_limit_ms: Option<u64>,
    /// Seed for the deal and the search
    #[arg(short, long)]
    seed: Option<u64>,
    /// Independent search trees run in parallel
    #[arg(short, long, default_value_t = 1)]
    threads: usize,
}

impl Default for SearchArgs {
    fn default() -> Self {
        Self {
            iterations: N_ITERATIONS,
            exploration: EXPLORATION,
            rollout: Rollout::Epsilon,
            epsilon: ROLLOUT_EPSILON,
            random_expansion: false,
            time_limit_ms: None,
            seed: None,
            threads: 1,
        }
    }
}

impl SearchArgs {
    fn config(&self) -> SearchConfig {
        let rollout = match self.rollout {
            Rollout::Uniform => RolloutPolicy::Uniform,
            Rollout::Epsilon => RolloutPolicy::EpsilonGreedy {
                epsilon: self.epsilon,
            },
            Rollout::Heuristic => RolloutPolicy::Heuristic,
        };
        SearchConfig {
            iterations: self.iterations,
            exploration: self.exploration,
            rollout,
            expansion: if self.random_expansion {
                Expansion::Random
            } else {
                Expansion::Guided
            },
            time_limit: self.time_limit_ms.map(Duration::from_millis),
            seed: self.seed,
            threads: self.threads,
            ..SearchConfig::default()
        }
    }

    fn deal(&self) -> GameState {
        match self.seed {
            Some(seed) => GameState::with_seed(seed),
            None => GameState::new_game(&mut fastrand::Rng::new()),
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Search { search }) => run_search(&search),
        Some(Commands::Play { search }) => {
            let mut console = Console::new(search.config(), search.seed);
            console.run()?;
            Ok(())
        }
        Some(Commands::Demo { search }) => run_demo(&search),
        None => run_demo(&SearchArgs::default()),
    }
}

fn run_search(args: &SearchArgs) -> Result<()> {
    let state = args.deal();
    println!("{state}");
    let result = search_with(&state, &args.config())?;
    dump_stats(&result);
    println!("Best move: {}", result.best);
    println!("Iterations: {}", result.iterations);
    Ok(())
}

fn run_demo(args: &SearchArgs) -> Result<()> {
    println!("Cuttle-Rust: MCTS vs Heuristic\n");
    let state = args.deal();
    println!("{state}");

    let mut mcts = MctsStrategy::new(args.config());
    let mut heuristic = HeuristicStrategy::new(args.seed);
    let record = play_game(state, [&mut mcts, &mut heuristic], MAX_GAME_MOVES)?;

    for (player, mv) in &record.moves {
        info!("P{player}: {mv}");
    }
    println!("{}", record.final_state);
    match record.winner() {
        Some(0) => println!("MCTS wins after {} rounds", record.turns),
        Some(_) => println!("Heuristic wins after {} rounds", record.turns),
        None => println!("No winner after {} rounds", record.turns),
    }
    Ok(())
}
