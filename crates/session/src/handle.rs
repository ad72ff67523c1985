//! Per-game actor.
//!
//! Every game runs on its own task that exclusively owns the `ChessGame`.
//! Player moves, clock ticks and engine replies all arrive through one
//! mailbox and are applied in order, so an engine reply can never race a
//! human move: a reply is only accepted if the game is still at the ply
//! the request was issued for.

use std::sync::Arc;

use chess_core::{ChessGame, Color, GameId, GameSnapshot, Move, PlayerId};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};
use uci_engine::MoveProvider;

/// Invoked on the game task after an engine move has been applied.
pub type EngineMoveCallback = Arc<dyn Fn(&Move, &GameSnapshot) + Send + Sync>;

enum GameCommand {
    Snapshot(oneshot::Sender<GameSnapshot>),
    LegalMoves {
        row: i8,
        col: i8,
        reply: oneshot::Sender<Vec<Move>>,
    },
    MakeMove {
        from: (i8, i8),
        to: (i8, i8),
        reply: oneshot::Sender<bool>,
    },
    PlayUci {
        text: String,
        reply: oneshot::Sender<Option<Move>>,
    },
    AssignPlayer {
        color: Color,
        player: PlayerId,
    },
    Tick {
        now_ms: u64,
    },
    BindProvider {
        side: Color,
        provider: Arc<dyn MoveProvider>,
        on_move: Option<EngineMoveCallback>,
        reply: oneshot::Sender<()>,
    },
    EngineMoveReady {
        generation: u32,
        ply: u32,
        best: Option<String>,
    },
    Close(oneshot::Sender<()>),
}

/// Cloneable entry point to a running game.
#[derive(Clone)]
pub struct GameHandle {
    id: GameId,
    tx: mpsc::UnboundedSender<GameCommand>,
}

impl std::fmt::Debug for GameHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameHandle")
            .field("id", &self.id)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl GameHandle {
    /// Start the actor for `game`. Must be called inside a tokio runtime.
    pub fn spawn(game: ChessGame) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = game.id();
        let actor = GameActor {
            game,
            provider: None,
            on_move: None,
            mailbox: rx,
            outbox: tx.downgrade(),
        };
        tokio::spawn(actor.run());
        Self { id, tx }
    }

    pub fn id(&self) -> GameId {
        self.id
    }

    /// True once the game has been closed.
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    async fn request<T>(&self, make: impl FnOnce(oneshot::Sender<T>) -> GameCommand) -> Option<T> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(make(reply)).ok()?;
        rx.await.ok()
    }

    /// Current state, or `None` if the game is closed.
    pub async fn snapshot(&self) -> Option<GameSnapshot> {
        self.request(GameCommand::Snapshot).await
    }

    pub async fn legal_moves(&self, row: i8, col: i8) -> Vec<Move> {
        self.request(|reply| GameCommand::LegalMoves { row, col, reply })
            .await
            .unwrap_or_default()
    }

    pub async fn make_move(&self, from_row: i8, from_col: i8, to_row: i8, to_col: i8) -> bool {
        self.request(|reply| GameCommand::MakeMove {
            from: (from_row, from_col),
            to: (to_row, to_col),
            reply,
        })
        .await
        .unwrap_or(false)
    }

    pub async fn play_uci(&self, text: &str) -> Option<Move> {
        let text = text.to_string();
        self.request(|reply| GameCommand::PlayUci { text, reply })
            .await
            .flatten()
    }

    /// Seat `player` on `color`. Returns false if the game is closed.
    pub fn assign_player(&self, color: Color, player: PlayerId) -> bool {
        self.tx
            .send(GameCommand::AssignPlayer { color, player })
            .is_ok()
    }

    pub fn tick(&self, now_ms: u64) -> bool {
        self.tx.send(GameCommand::Tick { now_ms }).is_ok()
    }

    /// Hand `side` to `provider`. Replaces (and closes) any provider bound
    /// before. `on_move` runs after each engine move is applied.
    pub async fn bind_provider(
        &self,
        side: Color,
        provider: Arc<dyn MoveProvider>,
        on_move: Option<EngineMoveCallback>,
    ) -> bool {
        self.request(|reply| GameCommand::BindProvider {
            side,
            provider,
            on_move,
            reply,
        })
        .await
        .is_some()
    }

    /// Stop the game and close its provider. Waits for the actor to finish
    /// the commands queued before this one.
    pub async fn close(&self) {
        let _ = self.request(GameCommand::Close).await;
    }
}

struct GameActor {
    game: ChessGame,
    provider: Option<Arc<dyn MoveProvider>>,
    on_move: Option<EngineMoveCallback>,
    mailbox: mpsc::UnboundedReceiver<GameCommand>,
    /// Engine tasks post their replies here. Weak, so a game nobody holds a
    /// handle to shuts down even while a query is in flight.
    outbox: mpsc::WeakUnboundedSender<GameCommand>,
}

impl GameActor {
    async fn run(mut self) {
        debug!(game = %self.game.id(), "game task started");
        while let Some(cmd) = self.mailbox.recv().await {
            let was_active = !self.game.state().is_terminal();
            if !self.handle(cmd) {
                break;
            }
            if was_active && self.game.state().is_terminal() {
                info!(game = %self.game.id(), state = ?self.game.state(), "game over");
            }
            self.request_engine_move();
        }
        self.release_provider();
        debug!(game = %self.game.id(), "game task stopped");
    }

    /// Returns false when the actor should stop.
    fn handle(&mut self, cmd: GameCommand) -> bool {
        match cmd {
            GameCommand::Snapshot(reply) => {
                let _ = reply.send(self.game.snapshot());
            }
            GameCommand::LegalMoves { row, col, reply } => {
                let _ = reply.send(self.game.legal_moves(row, col));
            }
            GameCommand::MakeMove { from, to, reply } => {
                let ok = self.game.make_move(from.0, from.1, to.0, to.1);
                if !ok {
                    debug!(game = %self.game.id(), ?from, ?to, "illegal move rejected");
                }
                let _ = reply.send(ok);
            }
            GameCommand::PlayUci { text, reply } => {
                let _ = reply.send(self.game.play_uci(&text));
            }
            GameCommand::AssignPlayer { color, player } => {
                self.game.assign_player(color, player);
            }
            GameCommand::Tick { now_ms } => self.game.tick(now_ms),
            GameCommand::BindProvider {
                side,
                provider,
                on_move,
                reply,
            } => {
                self.release_provider();
                info!(game = %self.game.id(), %side, engine = provider.name(), "engine bound");
                self.game.bind_engine(side);
                self.provider = Some(provider);
                self.on_move = on_move;
                let _ = reply.send(());
            }
            GameCommand::EngineMoveReady {
                generation,
                ply,
                best,
            } => self.engine_move_ready(generation, ply, best),
            GameCommand::Close(reply) => {
                self.release_provider();
                let _ = reply.send(());
                return false;
            }
        }
        true
    }

    fn engine_move_ready(&mut self, generation: u32, ply: u32, best: Option<String>) {
        let current = self.game.engine_pending()
            && self.game.engine_generation() == generation
            && self.game.ply() == ply;
        match self.game.complete_engine_request(generation, ply, best.as_deref()) {
            Some(mv) => {
                debug!(game = %self.game.id(), %mv, "engine move applied");
                if let Some(on_move) = &self.on_move {
                    on_move(&mv, &self.game.snapshot());
                }
            }
            None if current => match best {
                Some(text) => warn!(game = %self.game.id(), %text, "engine move rejected"),
                None => debug!(game = %self.game.id(), "engine produced no move"),
            },
            None => debug!(game = %self.game.id(), generation, ply, "stale engine reply dropped"),
        }
    }

    /// Start a query if the engine is due to move.
    fn request_engine_move(&mut self) {
        let Some(provider) = self.provider.clone() else {
            return;
        };
        let Some(req) = self.game.engine_request() else {
            return;
        };
        let outbox = self.outbox.clone();
        debug!(game = %self.game.id(), ply = req.ply, side = %req.side, "requesting engine move");
        tokio::spawn(async move {
            let best = provider.best_move(&req.fen, req.clock).await;
            if let Some(tx) = outbox.upgrade() {
                let _ = tx.send(GameCommand::EngineMoveReady {
                    generation: req.generation,
                    ply: req.ply,
                    best,
                });
            }
        });
    }

    fn release_provider(&mut self) {
        if let Some(provider) = self.provider.take() {
            provider.close();
        }
        self.on_move = None;
        self.game.unbind_engine();
    }
}
