//! Registry of live games.
//!
//! Four lookups are kept in step under a single lock: game id → game,
//! game id → location, player → game id and board anchor → game id. Each
//! registry operation takes the lock once, so no caller ever observes a
//! game that is in one map but not another.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chess_core::{ChessGame, Color, GameId, PlayerId};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{debug, info};
use uci_engine::{EngineError, MoveProvider, UciEngine};
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::coords::BoardAnchor;
use crate::error::{Result, SessionError};
use crate::handle::{EngineMoveCallback, GameHandle};

/// Where a game's board stands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameLocation {
    pub anchor: BoardAnchor,
    pub world: String,
}

struct GameEntry {
    handle: GameHandle,
    /// Mirror of the game's seats, indexed by `Color::idx`
    seats: [Option<PlayerId>; 2],
}

#[derive(Default)]
struct RegistryInner {
    games: HashMap<GameId, GameEntry>,
    locations: HashMap<GameId, GameLocation>,
    players: HashMap<PlayerId, GameId>,
    boards: HashMap<BoardAnchor, GameId>,
}

pub struct GameRegistry {
    config: SessionConfig,
    inner: RwLock<RegistryInner>,
}

impl GameRegistry {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            inner: RwLock::new(RegistryInner::default()),
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Start a new game on the board at `anchor`. Must be called inside a
    /// tokio runtime.
    pub fn create_game(&self, anchor: BoardAnchor, world: impl Into<String>) -> Result<GameHandle> {
        let world = world.into();
        let mut guard = self.inner.write();
        let inner = &mut *guard;
        if inner.boards.contains_key(&anchor) {
            return Err(SessionError::LocationOccupied(anchor));
        }

        let id = Uuid::new_v4();
        let handle = GameHandle::spawn(ChessGame::new(id, self.config.time_control()));
        inner.games.insert(
            id,
            GameEntry {
                handle: handle.clone(),
                seats: [None, None],
            },
        );
        inner.locations.insert(id, GameLocation { anchor, world: world.clone() });
        inner.boards.insert(anchor, id);
        info!(game = %id, %anchor, %world, "game created");
        Ok(handle)
    }

    pub fn get_game(&self, id: GameId) -> Option<GameHandle> {
        self.inner.read().games.get(&id).map(|e| e.handle.clone())
    }

    pub fn get_game_by_player(&self, player: PlayerId) -> Option<GameHandle> {
        let inner = self.inner.read();
        let id = inner.players.get(&player)?;
        inner.games.get(id).map(|e| e.handle.clone())
    }

    pub fn get_game_at_location(&self, anchor: BoardAnchor) -> Option<GameHandle> {
        let inner = self.inner.read();
        let id = inner.boards.get(&anchor)?;
        inner.games.get(id).map(|e| e.handle.clone())
    }

    pub fn game_location(&self, id: GameId) -> Option<GameLocation> {
        self.inner.read().locations.get(&id).cloned()
    }

    /// Seat `player` on `color`. The last assignment wins: whoever held the
    /// seat before loses their player → game entry. Returns false for an
    /// unknown game.
    pub fn assign_player(&self, game_id: GameId, player: PlayerId, color: Color) -> bool {
        let mut guard = self.inner.write();
        let inner = &mut *guard;
        let Some(entry) = inner.games.get_mut(&game_id) else {
            return false;
        };
        let displaced = entry.seats[color.idx()].replace(player);
        let other_seat = entry.seats[color.other().idx()];
        if !entry.handle.assign_player(color, player) {
            return false;
        }

        if let Some(prev) = displaced.filter(|p| *p != player && other_seat != Some(*p)) {
            if inner.players.get(&prev) == Some(&game_id) {
                inner.players.remove(&prev);
            }
        }
        inner.players.insert(player, game_id);
        debug!(game = %game_id, %player, %color, "player assigned");
        true
    }

    /// Drop a game from every lookup and close it, terminating its engine.
    pub async fn remove_game(&self, id: GameId) -> bool {
        let handle = {
            let mut guard = self.inner.write();
            let inner = &mut *guard;
            let Some(entry) = inner.games.remove(&id) else {
                return false;
            };
            if let Some(location) = inner.locations.remove(&id) {
                inner.boards.remove(&location.anchor);
            }
            for player in entry.seats.into_iter().flatten() {
                if inner.players.get(&player) == Some(&id) {
                    inner.players.remove(&player);
                }
            }
            entry.handle
        };
        handle.close().await;
        info!(game = %id, "game removed");
        true
    }

    pub fn list_games(&self) -> Vec<GameHandle> {
        self.inner.read().games.values().map(|e| e.handle.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().games.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Put `side` under control of the configured UCI engine.
    pub async fn bind_engine(
        &self,
        game_id: GameId,
        side: Color,
        on_move: Option<EngineMoveCallback>,
    ) -> Result<()> {
        let handle = self
            .get_game(game_id)
            .ok_or(SessionError::UnknownGame(game_id))?;
        let command = self
            .config
            .engine
            .command()
            .ok_or(SessionError::EngineNotConfigured)?;
        let engine = UciEngine::start(&command).await?;
        if !engine.new_game().await {
            return Err(EngineError::Closed("readyok").into());
        }
        self.attach(&handle, side, Arc::new(engine), on_move).await
    }

    /// Put `side` under control of any move provider.
    pub async fn bind_provider(
        &self,
        game_id: GameId,
        side: Color,
        provider: Arc<dyn MoveProvider>,
        on_move: Option<EngineMoveCallback>,
    ) -> Result<()> {
        let handle = self
            .get_game(game_id)
            .ok_or(SessionError::UnknownGame(game_id))?;
        self.attach(&handle, side, provider, on_move).await
    }

    async fn attach(
        &self,
        handle: &GameHandle,
        side: Color,
        provider: Arc<dyn MoveProvider>,
        on_move: Option<EngineMoveCallback>,
    ) -> Result<()> {
        if handle.bind_provider(side, provider.clone(), on_move).await {
            Ok(())
        } else {
            provider.close();
            Err(SessionError::GameClosed(handle.id()))
        }
    }

    /// Advance every game's clock to `now_ms`.
    pub fn tick_all(&self, now_ms: u64) {
        for handle in self.list_games() {
            handle.tick(now_ms);
        }
    }

    /// Drive `tick_all` from a monotonic clock every `tick_interval_ms`.
    pub fn spawn_ticker(self: &Arc<Self>) -> JoinHandle<()> {
        let registry = Arc::downgrade(self);
        let period = self.config.tick_interval();
        tokio::spawn(async move {
            let start = Instant::now();
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let Some(registry) = registry.upgrade() else {
                    break;
                };
                registry.tick_all(elapsed_ms(start.elapsed()));
            }
        })
    }
}

fn elapsed_ms(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
