use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to spawn engine '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("engine {0} pipe unavailable")]
    MissingPipe(&'static str),
    #[error("engine closed its output before {0}")]
    Closed(&'static str),
    #[error("engine did not finish the handshake within {0:?}")]
    HandshakeTimeout(Duration),
    #[error("engine I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
