use serde::{Deserialize, Serialize};

use crate::types::*;

const BACK_RANK: [PieceKind; 8] = [
    PieceKind::Rook,
    PieceKind::Knight,
    PieceKind::Bishop,
    PieceKind::Queen,
    PieceKind::King,
    PieceKind::Bishop,
    PieceKind::Knight,
    PieceKind::Rook,
];

/// Mailbox board: `squares[row][col]`, plus the last move played on it.
///
/// `Clone` is a full deep copy (pieces are plain values), which is what the
/// legality filter relies on: probes never touch the authoritative board.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    squares: [[Option<Piece>; 8]; 8],
    last_move: Option<Move>,
}

impl Default for Board {
    fn default() -> Self {
        Self::startpos()
    }
}

impl Board {
    pub fn empty() -> Self {
        Self {
            squares: [[None; 8]; 8],
            last_move: None,
        }
    }

    pub fn startpos() -> Self {
        let mut b = Board::empty();
        for col in 0..8 {
            b.squares[1][col] = Some(Piece::new(PieceKind::Pawn, Color::White));
            b.squares[6][col] = Some(Piece::new(PieceKind::Pawn, Color::Black));
        }
        for (col, &kind) in BACK_RANK.iter().enumerate() {
            b.squares[0][col] = Some(Piece::new(kind, Color::White));
            b.squares[7][col] = Some(Piece::new(kind, Color::Black));
        }
        b
    }

    /// Piece at (row, col); off-board coordinates read as empty.
    pub fn get(&self, row: i8, col: i8) -> Option<Piece> {
        Square::new(row, col).and_then(|sq| self.piece_at(sq))
    }

    /// Off-board coordinates are ignored.
    pub fn set(&mut self, row: i8, col: i8, piece: Option<Piece>) {
        if let Some(sq) = Square::new(row, col) {
            self.set_piece(sq, piece);
        }
    }

    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.squares[sq.row as usize][sq.col as usize]
    }

    pub fn set_piece(&mut self, sq: Square, piece: Option<Piece>) {
        self.squares[sq.row as usize][sq.col as usize] = piece;
    }

    pub fn last_move(&self) -> Option<Move> {
        self.last_move
    }

    pub fn set_last_move(&mut self, mv: Option<Move>) {
        self.last_move = mv;
    }

    /// Occupied squares in row-major order.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::all().filter_map(|sq| self.piece_at(sq).map(|pc| (sq, pc)))
    }

    pub fn find_king(&self, color: Color) -> Option<Square> {
        self.pieces()
            .find(|(_, pc)| pc.is(PieceKind::King, color))
            .map(|(sq, _)| sq)
    }

    /// En-passant target behind a pawn that just advanced two rows.
    pub fn en_passant_target(&self) -> Option<Square> {
        let mv = self.last_move?;
        let pc = self.piece_at(mv.to)?;
        if pc.kind != PieceKind::Pawn || !mv.is_double_step() {
            return None;
        }
        Square::new(((mv.from.row + mv.to.row) / 2) as i8, mv.to.col as i8)
    }

    /// Carry out `mv` on this board. `last_move` is left alone; the game
    /// records it on the live board only.
    pub fn apply(&mut self, mv: &Move) {
        let Some(mut piece) = self.piece_at(mv.from) else {
            return;
        };
        let row = mv.from.row as i8;

        match mv.kind {
            MoveKind::Normal { .. } => {
                piece.has_moved = true;
                self.set_piece(mv.to, Some(piece));
                self.set_piece(mv.from, None);
            }
            MoveKind::CastleKingside | MoveKind::CastleQueenside => {
                let (rook_from, rook_to) = match mv.kind {
                    MoveKind::CastleKingside => (7, 5),
                    _ => (0, 3),
                };
                piece.has_moved = true;
                self.set_piece(mv.to, Some(piece));
                self.set_piece(mv.from, None);

                if let Some(mut rook) = self.get(row, rook_from) {
                    rook.has_moved = true;
                    self.set(row, rook_to, Some(rook));
                    self.set(row, rook_from, None);
                }
            }
            MoveKind::EnPassant { .. } => {
                piece.has_moved = true;
                self.set_piece(mv.to, Some(piece));
                self.set_piece(mv.from, None);
                self.set(row, mv.to.col as i8, None);
            }
            MoveKind::Promotion { promote_to, .. } => {
                let mut promoted = Piece::new(promote_to, piece.color);
                promoted.has_moved = true;
                self.set_piece(mv.to, Some(promoted));
                self.set_piece(mv.from, None);
            }
        }
    }
}
