//! Finished-game records: storage and reporting

use std::path::Path;

use chess_core::{GameId, GameSnapshot, GameState, TimeControl};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecordError {
    #[error("failed to access record: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed record: {0}")]
    Json(#[from] serde_json::Error),
}

/// Everything worth keeping about one game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    pub game_id: GameId,
    pub white: String,
    pub black: String,
    pub time_control: TimeControl,
    /// Moves in UCI notation, in order
    pub moves: Vec<String>,
    pub state: GameState,
    pub final_fen: String,
    pub white_time_ms: u64,
    pub black_time_ms: u64,
}

impl GameRecord {
    pub fn new(white: &str, black: &str, time_control: TimeControl, snapshot: &GameSnapshot) -> Self {
        Self {
            game_id: snapshot.id,
            white: white.to_string(),
            black: black.to_string(),
            time_control,
            moves: Vec::new(),
            state: snapshot.state,
            final_fen: snapshot.fen.clone(),
            white_time_ms: snapshot.white_time_ms,
            black_time_ms: snapshot.black_time_ms,
        }
    }

    pub fn push_move(&mut self, uci: impl Into<String>) {
        self.moves.push(uci.into());
    }

    /// Take the final state, FEN and clocks from `snapshot`.
    pub fn finish(&mut self, snapshot: &GameSnapshot) {
        self.state = snapshot.state;
        self.final_fen = snapshot.fen.clone();
        self.white_time_ms = snapshot.white_time_ms;
        self.black_time_ms = snapshot.black_time_ms;
    }

    /// PGN-style result tag; `*` while the game is unfinished.
    pub fn result_tag(&self) -> &'static str {
        match self.state {
            GameState::WhiteWins => "1-0",
            GameState::BlackWins => "0-1",
            GameState::Stalemate => "1/2-1/2",
            GameState::Active => "*",
        }
    }

    /// Save record to JSON file
    pub fn save(&self, path: &Path) -> Result<(), RecordError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load record from JSON file
    pub fn load(path: &Path) -> Result<Self, RecordError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Generate a text report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();
        report.push_str(&format!("=== Game {} ===\n\n", self.game_id));
        report.push_str(&format!("White: {}\n", self.white));
        report.push_str(&format!("Black: {}\n", self.black));
        report.push_str(&format!("Time control: {}\n\n", self.time_control));

        for (i, pair) in self.moves.chunks(2).enumerate() {
            match pair {
                [w, b] => report.push_str(&format!("{:>3}. {:<6} {}\n", i + 1, w, b)),
                [w] => report.push_str(&format!("{:>3}. {}\n", i + 1, w)),
                _ => {}
            }
        }

        report.push_str(&format!("\nResult: {}\n", self.result_tag()));
        report.push_str(&format!(
            "Clocks: white {} / black {}\n",
            chess_core::GameClock::format_time(std::time::Duration::from_millis(self.white_time_ms)),
            chess_core::GameClock::format_time(std::time::Duration::from_millis(self.black_time_ms)),
        ));
        report.push_str(&format!("Final position: {}\n", self.final_fen));
        report
    }

    /// Print report to stdout
    pub fn print_report(&self) {
        println!("{}", self.generate_report());
    }
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod record_tests;
