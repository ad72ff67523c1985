use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chess_core::{Color, GameSnapshot, GameState, Move, SearchClock};
use chess_session::{
    BoardAnchor, EngineMoveCallback, GameHandle, GameRegistry, SessionConfig, SessionError,
};
use parking_lot::Mutex;
use tokio::sync::{mpsc, Notify};
use uci_engine::MoveProvider;
use uuid::Uuid;

// =============================================================================
// Scripted provider
// =============================================================================

/// Answers queries from a fixed list of replies, optionally waiting for a
/// release before each answer.
#[derive(Default)]
struct ScriptedProvider {
    replies: Mutex<VecDeque<Option<String>>>,
    gate: Option<Arc<Notify>>,
    queries: AtomicUsize,
    closed: AtomicBool,
}

impl ScriptedProvider {
    fn new(replies: &[Option<&str>]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| r.map(str::to_string)).collect()),
            ..Default::default()
        }
    }

    fn gated(replies: &[Option<&str>], gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new(replies)
        }
    }

    fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MoveProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn best_move(&self, _fen: &str, _clock: SearchClock) -> Option<String> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.replies.lock().pop_front().flatten()
    }

    fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn registry() -> GameRegistry {
    GameRegistry::new(SessionConfig::default())
}

fn anchor(x: i32) -> BoardAnchor {
    BoardAnchor::new(x, 64, 0)
}

/// Poll the game until `done` holds, failing after a second.
async fn wait_for(handle: &GameHandle, done: impl Fn(&GameSnapshot) -> bool) -> GameSnapshot {
    let result = tokio::time::timeout(Duration::from_secs(1), async {
        loop {
            let snapshot = handle.snapshot().await.expect("game closed");
            if done(&snapshot) {
                return snapshot;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    result.expect("condition not reached in time")
}

async fn wait_until(cond: impl Fn() -> bool) {
    tokio::time::timeout(Duration::from_secs(1), async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

// =============================================================================
// Lookups
// =============================================================================

#[tokio::test]
async fn test_create_and_look_up_game() {
    let registry = registry();
    let handle = registry.create_game(anchor(0), "overworld").unwrap();

    assert_eq!(registry.len(), 1);
    assert_eq!(registry.get_game(handle.id()).unwrap().id(), handle.id());
    assert_eq!(registry.get_game_at_location(anchor(0)).unwrap().id(), handle.id());
    assert!(registry.get_game_at_location(anchor(1)).is_none());

    let location = registry.game_location(handle.id()).unwrap();
    assert_eq!(location.anchor, anchor(0));
    assert_eq!(location.world, "overworld");

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.state, GameState::Active);
    assert_eq!(snapshot.current_player, Color::White);
}

#[tokio::test]
async fn test_occupied_anchor_is_rejected() {
    let registry = registry();
    let first = registry.create_game(anchor(0), "overworld").unwrap();
    let err = registry.create_game(anchor(0), "overworld").unwrap_err();

    assert!(matches!(err, SessionError::LocationOccupied(a) if a == anchor(0)));
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.get_game_at_location(anchor(0)).unwrap().id(), first.id());
}

#[tokio::test]
async fn test_unknown_game_lookups() {
    let registry = registry();
    let missing = Uuid::new_v4();

    assert!(registry.get_game(missing).is_none());
    assert!(registry.game_location(missing).is_none());
    assert!(!registry.assign_player(missing, Uuid::new_v4(), Color::White));
    assert!(!registry.remove_game(missing).await);

    let provider = Arc::new(ScriptedProvider::new(&[]));
    let err = registry
        .bind_provider(missing, Color::Black, provider, None)
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::UnknownGame(id) if id == missing));
}

#[tokio::test]
async fn test_list_games() {
    let registry = registry();
    assert!(registry.is_empty());
    let a = registry.create_game(anchor(0), "overworld").unwrap();
    let b = registry.create_game(anchor(10), "nether").unwrap();

    let mut ids: Vec<_> = registry.list_games().iter().map(GameHandle::id).collect();
    ids.sort();
    let mut expected = vec![a.id(), b.id()];
    expected.sort();
    assert_eq!(ids, expected);
}

// =============================================================================
// Players
// =============================================================================

#[tokio::test]
async fn test_assign_player_maps_both_ways() {
    let registry = registry();
    let handle = registry.create_game(anchor(0), "overworld").unwrap();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    assert!(registry.assign_player(handle.id(), alice, Color::White));
    assert!(registry.assign_player(handle.id(), bob, Color::Black));

    assert_eq!(registry.get_game_by_player(alice).unwrap().id(), handle.id());
    assert_eq!(registry.get_game_by_player(bob).unwrap().id(), handle.id());

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.white_player, Some(alice));
    assert_eq!(snapshot.black_player, Some(bob));
}

#[tokio::test]
async fn test_reassigning_a_seat_displaces_the_previous_player() {
    let registry = registry();
    let handle = registry.create_game(anchor(0), "overworld").unwrap();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    registry.assign_player(handle.id(), alice, Color::White);
    registry.assign_player(handle.id(), bob, Color::White);

    assert!(registry.get_game_by_player(alice).is_none());
    assert_eq!(registry.get_game_by_player(bob).unwrap().id(), handle.id());
    assert_eq!(handle.snapshot().await.unwrap().white_player, Some(bob));
}

#[tokio::test]
async fn test_player_holding_both_seats_keeps_mapping() {
    let registry = registry();
    let handle = registry.create_game(anchor(0), "overworld").unwrap();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();

    registry.assign_player(handle.id(), alice, Color::White);
    registry.assign_player(handle.id(), alice, Color::Black);
    registry.assign_player(handle.id(), bob, Color::White);

    assert_eq!(registry.get_game_by_player(alice).unwrap().id(), handle.id());
    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.white_player, Some(bob));
    assert_eq!(snapshot.black_player, Some(alice));
}

// =============================================================================
// Removal
// =============================================================================

#[tokio::test]
async fn test_remove_game_clears_every_lookup() {
    let registry = registry();
    let handle = registry.create_game(anchor(0), "overworld").unwrap();
    let alice = Uuid::new_v4();
    registry.assign_player(handle.id(), alice, Color::White);

    let provider = Arc::new(ScriptedProvider::new(&[]));
    registry
        .bind_provider(handle.id(), Color::Black, provider.clone(), None)
        .await
        .unwrap();

    assert!(registry.remove_game(handle.id()).await);

    assert!(registry.is_empty());
    assert!(registry.get_game(handle.id()).is_none());
    assert!(registry.get_game_by_player(alice).is_none());
    assert!(registry.get_game_at_location(anchor(0)).is_none());
    assert!(registry.game_location(handle.id()).is_none());
    assert!(provider.is_closed());
    assert!(handle.snapshot().await.is_none());
    assert!(!handle.make_move(1, 4, 3, 4).await);

    // The anchor is free again
    registry.create_game(anchor(0), "overworld").unwrap();
}

// =============================================================================
// Moves and clocks
// =============================================================================

#[tokio::test]
async fn test_moves_through_handle() {
    let registry = registry();
    let handle = registry.create_game(anchor(0), "overworld").unwrap();

    assert_eq!(handle.legal_moves(1, 4).await.len(), 2);
    assert!(handle.make_move(1, 4, 3, 4).await);
    assert!(!handle.make_move(1, 3, 3, 3).await, "white cannot move twice");
    assert!(handle.play_uci("e7e5").await.is_some());
    assert!(handle.play_uci("e1e8").await.is_none());

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.ply, 2);
    assert_eq!(snapshot.current_player, Color::White);
    assert!(snapshot.clock_running);
}

#[tokio::test]
async fn test_tick_all_drops_a_flag() {
    let config = SessionConfig::from_toml_str(
        "[clock]\ninitial_seconds = 1\nmax_tick_step_ms = 1000\n",
    )
    .unwrap();
    let registry = GameRegistry::new(config);
    let handle = registry.create_game(anchor(0), "overworld").unwrap();

    registry.tick_all(0);
    registry.tick_all(500);
    assert_eq!(handle.snapshot().await.unwrap().black_time_ms, 1000, "clock waits for the first move");

    assert!(handle.play_uci("e2e4").await.is_some());
    registry.tick_all(600);
    registry.tick_all(1600);

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.black_time_ms, 0);
    assert_eq!(snapshot.state, GameState::WhiteWins);
    assert!(!snapshot.clock_running);
}

// =============================================================================
// Engines
// =============================================================================

#[tokio::test]
async fn test_bind_engine_without_config() {
    let registry = registry();
    let handle = registry.create_game(anchor(0), "overworld").unwrap();
    let err = registry
        .bind_engine(handle.id(), Color::Black, None)
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::EngineNotConfigured));
}

#[tokio::test]
async fn test_engine_reply_is_applied_and_reported() {
    let registry = registry();
    let handle = registry.create_game(anchor(0), "overworld").unwrap();
    let provider = Arc::new(ScriptedProvider::new(&[Some("e7e5")]));

    let (tx, mut rx) = mpsc::unbounded_channel::<(Move, GameSnapshot)>();
    let on_move: EngineMoveCallback = Arc::new(move |mv: &Move, snapshot: &GameSnapshot| {
        let _ = tx.send((*mv, snapshot.clone()));
    });
    registry
        .bind_provider(handle.id(), Color::Black, provider.clone(), Some(on_move))
        .await
        .unwrap();

    assert_eq!(provider.queries(), 0, "engine waits for its turn");
    assert!(handle.play_uci("e2e4").await.is_some());

    let (mv, snapshot) = tokio::time::timeout(Duration::from_secs(1), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(mv.to_string(), "e7e5");
    assert_eq!(snapshot.ply, 2);
    assert_eq!(snapshot.current_player, Color::White);
    assert!(!snapshot.engine_thinking);
    assert_eq!(provider.queries(), 1);
}

#[tokio::test]
async fn test_engine_moves_first_as_white() {
    let registry = registry();
    let handle = registry.create_game(anchor(0), "overworld").unwrap();
    let provider = Arc::new(ScriptedProvider::new(&[Some("d2d4")]));
    registry
        .bind_provider(handle.id(), Color::White, provider, None)
        .await
        .unwrap();

    let snapshot = wait_for(&handle, |s| s.ply == 1).await;
    assert_eq!(snapshot.last_move.unwrap().to_string(), "d2d4");
}

#[tokio::test]
async fn test_stale_reply_is_dropped() {
    let registry = registry();
    let handle = registry.create_game(anchor(0), "overworld").unwrap();
    let gate = Arc::new(Notify::new());
    let provider = Arc::new(ScriptedProvider::gated(&[Some("d2d4")], gate.clone()));
    registry
        .bind_provider(handle.id(), Color::White, provider.clone(), None)
        .await
        .unwrap();

    wait_until(|| provider.queries() == 1).await;
    assert!(handle.snapshot().await.unwrap().engine_thinking);

    // Someone else moves for white while the engine is still thinking
    assert!(handle.play_uci("e2e4").await.is_some());
    gate.notify_one();

    wait_for(&handle, |s| !s.engine_thinking).await;
    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.ply, 1);
    assert_eq!(snapshot.last_move.unwrap().to_string(), "e2e4");
}

#[tokio::test]
async fn test_absent_reply_skips_the_turn() {
    let registry = registry();
    let handle = registry.create_game(anchor(0), "overworld").unwrap();
    let provider = Arc::new(ScriptedProvider::new(&[None, Some("e2e4")]));
    registry
        .bind_provider(handle.id(), Color::White, provider.clone(), None)
        .await
        .unwrap();

    wait_until(|| provider.queries() == 1).await;
    let snapshot = wait_for(&handle, |s| !s.engine_thinking).await;
    assert_eq!(snapshot.ply, 0);

    // Further commands do not re-query the engine at the same ply
    handle.tick(10);
    handle.snapshot().await.unwrap();
    assert_eq!(provider.queries(), 1);
}

#[tokio::test]
async fn test_rebinding_closes_the_previous_provider() {
    let registry = registry();
    let handle = registry.create_game(anchor(0), "overworld").unwrap();
    let first = Arc::new(ScriptedProvider::new(&[]));
    let second = Arc::new(ScriptedProvider::new(&[]));

    registry
        .bind_provider(handle.id(), Color::Black, first.clone(), None)
        .await
        .unwrap();
    registry
        .bind_provider(handle.id(), Color::Black, second.clone(), None)
        .await
        .unwrap();

    assert!(first.is_closed());
    assert!(!second.is_closed());
    assert_eq!(handle.snapshot().await.unwrap().engine_side, Some(Color::Black));
}

#[tokio::test]
async fn test_rebinding_mid_query_ignores_the_old_reply() {
    let registry = registry();
    let handle = registry.create_game(anchor(0), "overworld").unwrap();
    let old_gate = Arc::new(Notify::new());
    let new_gate = Arc::new(Notify::new());
    let old = Arc::new(ScriptedProvider::gated(&[None], old_gate.clone()));
    let new = Arc::new(ScriptedProvider::gated(&[Some("e2e4")], new_gate.clone()));

    registry
        .bind_provider(handle.id(), Color::White, old.clone(), None)
        .await
        .unwrap();
    wait_until(|| old.queries() == 1).await;

    registry
        .bind_provider(handle.id(), Color::White, new.clone(), None)
        .await
        .unwrap();
    wait_until(|| new.queries() == 1).await;
    assert!(old.is_closed());

    // The closed engine answers first, at the same ply
    old_gate.notify_one();
    handle.tick(10);
    assert!(handle.snapshot().await.unwrap().engine_thinking);

    new_gate.notify_one();
    let snapshot = wait_for(&handle, |s| s.ply == 1).await;
    assert_eq!(snapshot.last_move.unwrap().to_string(), "e2e4");
    assert_eq!(new.queries(), 1);
}

#[tokio::test]
async fn test_binding_to_a_closed_game_closes_the_provider() {
    let registry = registry();
    let handle = registry.create_game(anchor(0), "overworld").unwrap();
    handle.close().await;

    let provider = Arc::new(ScriptedProvider::new(&[]));
    let err = registry
        .bind_provider(handle.id(), Color::Black, provider.clone(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::GameClosed(_)));
    assert!(provider.is_closed());
}

#[tokio::test]
async fn test_ticker_runs_clocks() {
    let config = SessionConfig::from_toml_str("tick_interval_ms = 5\n").unwrap();
    let registry = Arc::new(GameRegistry::new(config));
    let ticker = registry.spawn_ticker();
    let handle = registry.create_game(anchor(0), "overworld").unwrap();

    assert!(handle.play_uci("e2e4").await.is_some());
    wait_for(&handle, |s| s.black_time_ms < 600_000).await;
    ticker.abort();
}

#[cfg(unix)]
#[tokio::test]
async fn test_bind_engine_plays_configured_engine() {
    let script = r#"while read -r line; do
  case "$line" in
    uci) echo "id name Replier"; echo "uciok" ;;
    isready) echo "readyok" ;;
    go*) echo "bestmove e7e5" ;;
  esac
done"#;
    let mut config = SessionConfig::default();
    config.engine.path = Some("sh".into());
    config.engine.args = vec!["-c".to_string(), script.to_string()];
    let registry = GameRegistry::new(config);
    let handle = registry.create_game(anchor(0), "overworld").unwrap();

    registry
        .bind_engine(handle.id(), Color::Black, None)
        .await
        .unwrap();
    assert!(handle.play_uci("e2e4").await.is_some());

    let snapshot = wait_for(&handle, |s| s.ply == 2).await;
    assert_eq!(snapshot.last_move.unwrap().to_string(), "e7e5");
    assert!(registry.remove_game(handle.id()).await);
}
