//! External move selection over the UCI line protocol.
//!
//! A game whose computer side is bound to an engine hands the engine the
//! current position as FEN plus both clocks, and gets back a move in UCI
//! long algebraic form. Everything that can go wrong after the handshake
//! (a crashed process, a closed pipe, a `bestmove (none)`) resolves to "no
//! move" rather than an error, so the caller simply skips the turn.
//!
//! # Usage
//!
//! ```no_run
//! use uci_engine::{EngineCommand, UciEngine};
//! use chess_core::{GameClock, STARTPOS_FEN};
//!
//! # async fn demo() -> Result<(), uci_engine::EngineError> {
//! let engine = UciEngine::start(&EngineCommand::new("stockfish")).await?;
//! let clock = GameClock::default().search_clock();
//! let best = engine.best_move(STARTPOS_FEN, clock).await;
//! engine.close();
//! # Ok(())
//! # }
//! ```

mod engine;
mod error;
pub mod protocol;
mod provider;

pub use engine::*;
pub use error::*;
pub use provider::*;
