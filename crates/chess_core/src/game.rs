//! Game state machine: turn order, terminal states, clocks and the
//! bookkeeping for an engine-controlled side.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    board::Board,
    clock::{GameClock, SearchClock, TimeControl},
    fen::{self, FenError},
    movegen::{has_legal_move, legal_moves, legal_moves_from},
    types::*,
    uci::parse_uci_move,
};

pub type GameId = Uuid;
pub type PlayerId = Uuid;

#[derive(Debug, Error)]
pub enum GameError {
    #[error("no {0} king on the board")]
    MissingKing(Color),
    #[error("more than one {0} king on the board")]
    ExtraKing(Color),
    #[error("invalid FEN: {0}")]
    Fen(#[from] FenError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameState {
    Active,
    WhiteWins,
    BlackWins,
    Stalemate,
}

impl GameState {
    pub fn is_terminal(self) -> bool {
        self != GameState::Active
    }

    pub fn win_for(color: Color) -> GameState {
        match color {
            Color::White => GameState::WhiteWins,
            Color::Black => GameState::BlackWins,
        }
    }
}

/// What to send the engine when it is the computer's turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineRequest {
    /// Engine binding the request belongs to; replies from an earlier
    /// binding are stale.
    pub generation: u32,
    /// Ply the request was issued at; replies for another ply are stale.
    pub ply: u32,
    pub side: Color,
    pub fen: String,
    pub clock: SearchClock,
}

/// Plain-data view of a game for presentation layers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub id: GameId,
    pub board: Board,
    pub current_player: Color,
    pub state: GameState,
    pub in_check: bool,
    pub white_player: Option<PlayerId>,
    pub black_player: Option<PlayerId>,
    pub white_time_ms: u64,
    pub black_time_ms: u64,
    pub clock_running: bool,
    pub engine_side: Option<Color>,
    /// An engine query is outstanding
    pub engine_thinking: bool,
    pub last_move: Option<Move>,
    pub ply: u32,
    pub fen: String,
}

/// Where the engine-controlled side stands for the current ply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineStatus {
    Idle,
    /// A request issued at this ply, under this binding, is outstanding.
    Waiting { generation: u32, ply: u32 },
    /// The reply for this ply produced no move; the engine is not asked
    /// again until the position changes.
    Skipped(u32),
}

#[derive(Debug, Clone)]
pub struct ChessGame {
    id: GameId,
    board: Board,
    current_player: Color,
    state: GameState,
    white_player: Option<PlayerId>,
    black_player: Option<PlayerId>,
    clock: GameClock,
    engine_side: Option<Color>,
    engine_status: EngineStatus,
    /// Bumped whenever the engine side is bound or unbound
    engine_generation: u32,
    halfmove_clock: u32,
    fullmove_number: u32,
    ply: u32,
    history: Vec<Move>,
}

impl ChessGame {
    pub fn new(id: GameId, time_control: TimeControl) -> Self {
        Self {
            id,
            board: Board::startpos(),
            current_player: Color::White,
            state: GameState::Active,
            white_player: None,
            black_player: None,
            clock: GameClock::new(time_control),
            engine_side: None,
            engine_status: EngineStatus::Idle,
            engine_generation: 0,
            halfmove_clock: 0,
            fullmove_number: 1,
            ply: 0,
            history: Vec::new(),
        }
    }

    /// Start from an arbitrary position. Each side needs exactly one king;
    /// the terminal state is computed immediately.
    pub fn from_fen(id: GameId, fen: &str, time_control: TimeControl) -> Result<Self, GameError> {
        let parsed = fen::parse(fen)?;
        for color in [Color::White, Color::Black] {
            let kings = parsed
                .board
                .pieces()
                .filter(|(_, pc)| pc.is(PieceKind::King, color))
                .count();
            match kings {
                0 => return Err(GameError::MissingKing(color)),
                1 => {}
                _ => return Err(GameError::ExtraKing(color)),
            }
        }
        let mut game = Self::new(id, time_control);
        game.board = parsed.board;
        game.current_player = parsed.side_to_move;
        game.halfmove_clock = parsed.halfmove_clock;
        game.fullmove_number = parsed.fullmove_number;
        game.update_state();
        Ok(game)
    }

    pub fn id(&self) -> GameId {
        self.id
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn current_player(&self) -> Color {
        self.current_player
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn clock(&self) -> &GameClock {
        &self.clock
    }

    pub fn white_time_ms(&self) -> u64 {
        self.clock.remaining_ms(Color::White)
    }

    pub fn black_time_ms(&self) -> u64 {
        self.clock.remaining_ms(Color::Black)
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    /// Number of moves made in this game.
    pub fn ply(&self) -> u32 {
        self.ply
    }

    pub fn history(&self) -> &[Move] {
        &self.history
    }

    pub fn fen(&self) -> String {
        fen::serialize_with_counters(
            &self.board,
            self.current_player,
            self.halfmove_clock,
            self.fullmove_number,
        )
    }

    pub fn king_square(&self, color: Color) -> Result<Square, GameError> {
        self.board
            .find_king(color)
            .ok_or(GameError::MissingKing(color))
    }

    // =========================================================================
    // Players
    // =========================================================================

    pub fn white_player(&self) -> Option<PlayerId> {
        self.white_player
    }

    pub fn black_player(&self) -> Option<PlayerId> {
        self.black_player
    }

    pub fn player(&self, color: Color) -> Option<PlayerId> {
        match color {
            Color::White => self.white_player,
            Color::Black => self.black_player,
        }
    }

    /// Seat `player` on `color`, replacing any occupant. Returns the player
    /// who was displaced.
    pub fn assign_player(&mut self, color: Color, player: PlayerId) -> Option<PlayerId> {
        let seat = match color {
            Color::White => &mut self.white_player,
            Color::Black => &mut self.black_player,
        };
        seat.replace(player).filter(|prev| *prev != player)
    }

    pub fn player_color(&self, player: PlayerId) -> Option<Color> {
        if self.white_player == Some(player) {
            Some(Color::White)
        } else if self.black_player == Some(player) {
            Some(Color::Black)
        } else {
            None
        }
    }

    pub fn is_player_turn(&self, player: PlayerId) -> bool {
        self.player(self.current_player) == Some(player)
    }

    // =========================================================================
    // Moves
    // =========================================================================

    /// Legal moves for the piece on (row, col) with the side to move.
    pub fn legal_moves(&self, row: i8, col: i8) -> Vec<Move> {
        match Square::new(row, col) {
            Some(from) => legal_moves_from(&self.board, from, self.current_player),
            None => Vec::new(),
        }
    }

    pub fn all_legal_moves(&self) -> Vec<Move> {
        legal_moves(&self.board, self.current_player)
    }

    pub fn is_in_check(&self) -> bool {
        self.board.in_check(self.current_player)
    }

    /// Play the move from (from_row, from_col) to (to_row, to_col).
    /// Returns false and leaves the game untouched if it is not legal.
    pub fn make_move(&mut self, from_row: i8, from_col: i8, to_row: i8, to_col: i8) -> bool {
        match (Square::new(from_row, from_col), Square::new(to_row, to_col)) {
            (Some(from), Some(to)) => self.play(from, to, None).is_some(),
            _ => false,
        }
    }

    /// Play a move given in UCI notation, e.g. from an engine reply.
    pub fn play_uci(&mut self, text: &str) -> Option<Move> {
        let uci = parse_uci_move(text)?;
        self.play(uci.from, uci.to, uci.promotion)
    }

    /// Play `from`→`to` if it is legal, returning the move applied.
    ///
    /// Promotions default to a queen; an explicit `promotion` replaces it.
    pub fn play(&mut self, from: Square, to: Square, promotion: Option<PieceKind>) -> Option<Move> {
        if self.state.is_terminal() {
            return None;
        }
        let mut mv = legal_moves_from(&self.board, from, self.current_player)
            .into_iter()
            .find(|m| m.to == to)?;
        if let (MoveKind::Promotion { captured, .. }, Some(kind)) = (mv.kind, promotion) {
            mv.kind = MoveKind::Promotion {
                promote_to: kind,
                captured,
            };
        }

        let mover = self.current_player;
        let pawn_move = self
            .board
            .piece_at(from)
            .is_some_and(|pc| pc.kind == PieceKind::Pawn);

        self.board.apply(&mv);
        self.board.set_last_move(Some(mv));
        self.history.push(mv);
        self.ply += 1;

        if !self.clock.is_started() {
            self.clock.start();
        }
        self.clock.add_increment(mover);

        self.halfmove_clock = if pawn_move || mv.captured().is_some() {
            0
        } else {
            self.halfmove_clock + 1
        };
        if mover == Color::Black {
            self.fullmove_number += 1;
        }

        self.current_player = mover.other();
        self.update_state();
        Some(mv)
    }

    /// Recompute the terminal state for the side now to move.
    fn update_state(&mut self) {
        if has_legal_move(&self.board, self.current_player) {
            return;
        }
        self.state = if self.is_in_check() {
            GameState::win_for(self.current_player.other())
        } else {
            GameState::Stalemate
        };
    }

    // =========================================================================
    // Clock
    // =========================================================================

    /// Advance the clock to `now_ms`. Before the first move, or once the game
    /// is over, this only records the timestamp.
    pub fn tick(&mut self, now_ms: u64) {
        let running_for = (self.state == GameState::Active && self.clock.is_started())
            .then_some(self.current_player);
        if let Some(flagged) = self.clock.tick(now_ms, running_for) {
            self.state = GameState::win_for(flagged.other());
        }
    }

    // =========================================================================
    // Engine-controlled side
    // =========================================================================

    pub fn engine_side(&self) -> Option<Color> {
        self.engine_side
    }

    pub fn bind_engine(&mut self, side: Color) {
        self.engine_side = Some(side);
        self.engine_status = EngineStatus::Idle;
        self.engine_generation = self.engine_generation.wrapping_add(1);
    }

    pub fn unbind_engine(&mut self) {
        self.engine_side = None;
        self.engine_status = EngineStatus::Idle;
        self.engine_generation = self.engine_generation.wrapping_add(1);
    }

    pub fn is_engine_turn(&self) -> bool {
        self.state == GameState::Active && self.engine_side == Some(self.current_player)
    }

    /// Identifies the current engine binding. Changes on every bind and
    /// unbind.
    pub fn engine_generation(&self) -> u32 {
        self.engine_generation
    }

    pub fn engine_pending(&self) -> bool {
        matches!(self.engine_status, EngineStatus::Waiting { .. })
    }

    /// Issue a request if the engine is to move, none is outstanding and the
    /// engine has not already passed on this ply.
    pub fn engine_request(&mut self) -> Option<EngineRequest> {
        if !self.is_engine_turn() {
            return None;
        }
        match self.engine_status {
            EngineStatus::Waiting { .. } => return None,
            EngineStatus::Skipped(ply) if ply == self.ply => return None,
            _ => {}
        }
        self.engine_status = EngineStatus::Waiting {
            generation: self.engine_generation,
            ply: self.ply,
        };
        Some(EngineRequest {
            generation: self.engine_generation,
            ply: self.ply,
            side: self.current_player,
            fen: self.fen(),
            clock: self.clock.search_clock(),
        })
    }

    /// Apply the engine's answer to the request issued at `ply` under
    /// binding `generation`.
    ///
    /// Replies that do not match the outstanding request (including those
    /// from an engine bound before the current one), or that arrive
    /// after the position moved on, are dropped. An absent or illegal move
    /// leaves the game unchanged and the engine sits out this ply.
    pub fn complete_engine_request(
        &mut self,
        generation: u32,
        ply: u32,
        best: Option<&str>,
    ) -> Option<Move> {
        if self.engine_status != (EngineStatus::Waiting { generation, ply }) {
            return None;
        }
        self.engine_status = EngineStatus::Idle;
        if self.ply != ply || !self.is_engine_turn() {
            return None;
        }
        let played = best.and_then(|text| self.play_uci(text));
        if played.is_none() {
            self.engine_status = EngineStatus::Skipped(ply);
        }
        played
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            id: self.id,
            board: self.board.clone(),
            current_player: self.current_player,
            state: self.state,
            in_check: self.is_in_check(),
            white_player: self.white_player,
            black_player: self.black_player,
            white_time_ms: self.white_time_ms(),
            black_time_ms: self.black_time_ms(),
            clock_running: self.clock.is_started() && self.state == GameState::Active,
            engine_side: self.engine_side,
            engine_thinking: self.engine_pending(),
            last_move: self.board.last_move(),
            ply: self.ply,
            fen: self.fen(),
        }
    }
}

#[cfg(test)]
#[path = "game_tests.rs"]
mod game_tests;
