//! The handful of UCI lines exchanged with an engine: formatting what we
//! send, recognising what comes back.

use chess_core::SearchClock;

pub const UCI: &str = "uci";
pub const UCI_OK: &str = "uciok";
pub const IS_READY: &str = "isready";
pub const READY_OK: &str = "readyok";
pub const NEW_GAME: &str = "ucinewgame";

/// Outcome of a `bestmove` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BestMove {
    Move(String),
    /// `bestmove (none)`, `bestmove 0000` or a bare `bestmove`.
    NoMove,
}

impl BestMove {
    pub fn into_move(self) -> Option<String> {
        match self {
            BestMove::Move(mv) => Some(mv),
            BestMove::NoMove => None,
        }
    }
}

pub fn position_command(fen: &str) -> String {
    format!("position fen {fen}")
}

pub fn go_command(clock: &SearchClock) -> String {
    format!(
        "go wtime {} btime {} winc {} binc {}",
        clock.white_ms, clock.black_ms, clock.white_inc_ms, clock.black_inc_ms
    )
}

/// Parse a `bestmove <move> [ponder <move>]` line. Any other line (info
/// output, id lines, blank lines) yields `None`.
pub fn parse_bestmove(line: &str) -> Option<BestMove> {
    let mut tokens = line.split_whitespace();
    if tokens.next()? != "bestmove" {
        return None;
    }
    Some(match tokens.next() {
        Some("(none)") | Some("0000") | None => BestMove::NoMove,
        Some(mv) => BestMove::Move(mv.to_string()),
    })
}

/// Engine name from an `id name ...` line.
pub fn parse_id_name(line: &str) -> Option<&str> {
    let rest = line.trim().strip_prefix("id")?.trim_start();
    let name = rest.strip_prefix("name")?.trim();
    (!name.is_empty()).then_some(name)
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod protocol_tests;
