//! Chess sessions: many concurrent games, each with its own clock and an
//! optional computer opponent driven by an external UCI engine.
//!
//! This crate provides:
//! - A registry of live games, looked up by id, player or board location
//! - A per-game task that serializes moves, clock ticks and engine replies
//! - Configuration loading and finished-game records
//!
//! # Usage
//!
//! ```bash
//! # Play against the engine configured in session.toml
//! cargo run -p chess_session -- play --config session.toml --color white
//!
//! # Print a saved game
//! cargo run -p chess_session -- show game.json
//! ```

mod config;
mod coords;
mod error;
mod handle;
mod record;
mod registry;

pub use config::*;
pub use coords::*;
pub use error::*;
pub use handle::*;
pub use record::*;
pub use registry::*;
