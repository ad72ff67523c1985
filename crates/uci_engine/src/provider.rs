use async_trait::async_trait;
use chess_core::SearchClock;

/// Source of moves for a computer-controlled side.
///
/// The session layer only talks to this trait, so tests can drive games
/// with scripted providers instead of real engine processes.
#[async_trait]
pub trait MoveProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Best move for `fen` in UCI notation, or `None` if there is none.
    async fn best_move(&self, fen: &str, clock: SearchClock) -> Option<String>;

    /// Release the provider. Must be idempotent.
    fn close(&self);
}
