//! Line-oriented text console for playing against the search.
//!
//! The human plays seat 0 and the engine seat 1. Responses follow the GTP
//! convention: `=` for success, `?` for failure, then the message.
//!
//! ## Supported Commands
//!
//! - `new [seed]` - Deal a new game
//! - `show` - Print the table (the engine's hand is hidden)
//! - `moves` - List the legal moves with their indices
//! - `play <n>` - Make move `n`; the engine then answers until it is your turn
//! - `genmove` - Let the engine choose the next move, whoever is to act
//! - `help` - List the commands
//! - `quit` - Exit

use std::io::{self, BufRead, Write};

use log::debug;

use crate::executor::apply_move;
use crate::mcts::{SearchConfig, search_with};
use crate::movegen::legal_moves;
use crate::moves::Move;
use crate::state::GameState;

const KNOWN_COMMANDS: &[&str] = &["genmove", "help", "moves", "new", "play", "quit", "show"];

const HUMAN: usize = 0;

pub struct Console {
    state: GameState,
    config: SearchConfig,
}

impl Console {
    pub fn new(config: SearchConfig, seed: Option<u64>) -> Self {
        let state = match seed {
            Some(seed) => GameState::with_seed(seed),
            None => GameState::new_game(&mut fastrand::Rng::new()),
        };
        Self { state, config }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Read commands from stdin until `quit` or end of input.
    pub fn run(&mut self) -> io::Result<()> {
        let stdin = io::stdin();
        let mut stdout = io::stdout();
        writeln!(stdout, "{}", self.table())?;

        for line in stdin.lock().lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let parts: Vec<&str> = line.split_whitespace().collect();
            let command = parts[0].to_lowercase();
            let (success, message) = self.execute(&command, &parts[1..]);
            let prefix = if success { '=' } else { '?' };
            writeln!(stdout, "{prefix} {message}\n")?;
            stdout.flush()?;
            if command == "quit" {
                break;
            }
        }
        Ok(())
    }

    /// Execute one command and return (success, response).
    pub fn execute(&mut self, command: &str, args: &[&str]) -> (bool, String) {
        match command {
            "help" => (true, KNOWN_COMMANDS.join(" ")),

            "quit" => (true, String::new()),

            "new" => {
                let seed = match args.first().map(|s| s.parse::<u64>()) {
                    None => None,
                    Some(Ok(seed)) => Some(seed),
                    Some(Err(_)) => return (false, "invalid seed".to_string()),
                };
                *self = Self::new(self.config.clone(), seed);
                (true, self.table())
            }

            "show" => (true, self.table()),

            "moves" => {
                let moves = legal_moves(&self.state);
                if moves.is_empty() {
                    return (false, "game over".to_string());
                }
                let lines: Vec<String> = moves
                    .iter()
                    .enumerate()
                    .map(|(i, m)| format!("{i:>3}  {m}"))
                    .collect();
                (true, lines.join("\n"))
            }

            "play" => {
                let Some(arg) = args.first() else {
                    return (false, "missing argument".to_string());
                };
                if self.state.acting_player() != HUMAN {
                    return (false, "not your turn, use genmove".to_string());
                }
                let moves = legal_moves(&self.state);
                let Some(mv) = arg.parse::<usize>().ok().and_then(|i| moves.get(i)) else {
                    return (false, format!("no move {arg}"));
                };
                let mut log = vec![format!("you: {mv}")];
                if let Err(e) = self.apply(mv.clone()) {
                    return (false, e);
                }
                while !self.state.is_terminal() && self.state.acting_player() != HUMAN {
                    match self.engine_move() {
                        Ok(reply) => log.push(format!("engine: {reply}")),
                        Err(e) => return (false, e),
                    }
                }
                log.push(self.table());
                (true, log.join("\n"))
            }

            "genmove" => match self.engine_move() {
                Ok(mv) => (true, format!("{mv}\n{}", self.table())),
                Err(e) => (false, e),
            },

            _ => (false, format!("unknown command: {command}")),
        }
    }

    fn apply(&mut self, mv: Move) -> Result<(), String> {
        self.state = apply_move(&self.state, &mv).map_err(|e| e.to_string())?;
        Ok(())
    }

    fn engine_move(&mut self) -> Result<Move, String> {
        let result = search_with(&self.state, &self.config).map_err(|e| e.to_string())?;
        debug!("engine searched {} iterations", result.iterations);
        self.apply(result.best.clone())?;
        Ok(result.best)
    }

    /// The table as the human sees it.
    fn table(&self) -> String {
        if self.state.players[HUMAN].has_glasses() || self.state.is_terminal() {
            return self.state.to_string();
        }
        let mut view = self.state.clone();
        let hidden = std::mem::take(&mut view.players[1 - HUMAN].hand).len();
        format!("{view}engine holds {hidden} card(s)")
    }
}
