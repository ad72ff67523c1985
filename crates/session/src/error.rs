use chess_core::GameId;
use thiserror::Error;

use crate::coords::BoardAnchor;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no game with id {0}")]
    UnknownGame(GameId),
    #[error("a game already occupies the board at {0}")]
    LocationOccupied(BoardAnchor),
    #[error("game {0} is closed")]
    GameClosed(GameId),
    #[error("no UCI engine configured")]
    EngineNotConfigured,
    #[error(transparent)]
    Engine(#[from] uci_engine::EngineError),
}

pub type Result<T, E = SessionError> = std::result::Result<T, E>;
