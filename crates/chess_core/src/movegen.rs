use crate::{
    attacks::{DIAGONALS, KING_OFFSETS, KNIGHT_OFFSETS, ORTHOGONALS},
    board::Board,
    types::*,
};

const QUEEN_DIRS: [(i8, i8); 8] = [
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
];

impl Board {
    /// Pseudo-legal moves for the piece on (row, col). Empty when the square
    /// is off-board, empty, or holds a piece of the other color.
    pub fn pseudo_moves_from(&self, row: i8, col: i8, side: Color) -> Vec<Move> {
        let mut out = Vec::with_capacity(28);
        let Some(from) = Square::new(row, col) else {
            return out;
        };
        let pc = match self.piece_at(from) {
            Some(p) if p.color == side => p,
            _ => return out,
        };
        match pc.kind {
            PieceKind::Pawn => gen_pawn(self, from, side, &mut out),
            PieceKind::Knight => gen_leaper(self, from, side, &KNIGHT_OFFSETS, &mut out),
            PieceKind::Bishop => gen_slider(self, from, side, &DIAGONALS, &mut out),
            PieceKind::Rook => gen_slider(self, from, side, &ORTHOGONALS, &mut out),
            PieceKind::Queen => gen_slider(self, from, side, &QUEEN_DIRS, &mut out),
            PieceKind::King => {
                gen_leaper(self, from, side, &KING_OFFSETS, &mut out);
                if !pc.has_moved {
                    gen_castle(self, from, &mut out);
                }
            }
        }
        out
    }
}

/// True if playing `mv` leaves `side`'s king unattacked. The move is tried
/// on a clone; a board that loses the king counts as illegal.
pub fn is_legal(board: &Board, mv: &Move, side: Color) -> bool {
    let mut probe = board.clone();
    probe.apply(mv);
    match probe.find_king(side) {
        Some(ksq) => !probe.is_square_attacked(ksq, side.other()),
        None => false,
    }
}

/// Legal moves for the piece on `from`.
pub fn legal_moves_from(board: &Board, from: Square, side: Color) -> Vec<Move> {
    let mut moves = board.pseudo_moves_from(from.row as i8, from.col as i8, side);
    moves.retain(|mv| is_legal(board, mv, side));
    moves
}

/// Every legal move for `side`, in row-major order of origin squares.
pub fn legal_moves(board: &Board, side: Color) -> Vec<Move> {
    let mut out = Vec::with_capacity(64);
    for (sq, pc) in board.pieces() {
        if pc.color == side {
            out.extend(legal_moves_from(board, sq, side));
        }
    }
    out
}

/// Short-circuiting form of `!legal_moves(..).is_empty()`.
pub fn has_legal_move(board: &Board, side: Color) -> bool {
    board
        .pieces()
        .filter(|(_, pc)| pc.color == side)
        .any(|(sq, _)| {
            board
                .pseudo_moves_from(sq.row as i8, sq.col as i8, side)
                .iter()
                .any(|mv| is_legal(board, mv, side))
        })
}

fn gen_pawn(board: &Board, from: Square, c: Color, out: &mut Vec<Move>) {
    let dir = c.forward();
    let promo_row = c.other().back_rank();

    let push = |out: &mut Vec<Move>, to: Square, captured: Option<Piece>| {
        if to.row as i8 == promo_row {
            out.push(Move {
                from,
                to,
                kind: MoveKind::Promotion {
                    promote_to: PieceKind::Queen,
                    captured,
                },
            });
        } else {
            out.push(Move::capture(from, to, captured));
        }
    };

    // forward 1, then forward 2 from the start rank
    if let Some(to) = from.offset(dir, 0)
        && board.piece_at(to).is_none()
    {
        push(out, to, None);

        if from.row as i8 == c.pawn_rank()
            && let Some(to2) = from.offset(2 * dir, 0)
            && board.piece_at(to2).is_none()
        {
            out.push(Move::quiet(from, to2));
        }
    }

    for dc in [-1, 1] {
        if let Some(to) = from.offset(dir, dc)
            && let Some(target) = board.piece_at(to)
            && target.color != c
        {
            push(out, to, Some(target));
        }
    }

    // en passant: only right after an adjacent enemy double step
    if let Some(last) = board.last_move()
        && last.is_double_step()
        && last.to.row == from.row
        && last.to.col.abs_diff(from.col) == 1
        && let Some(victim) = board.piece_at(last.to)
        && victim.is(PieceKind::Pawn, c.other())
        && let Some(to) = from.offset(dir, last.to.col as i8 - from.col as i8)
    {
        out.push(Move {
            from,
            to,
            kind: MoveKind::EnPassant { captured: victim },
        });
    }
}

fn gen_leaper(board: &Board, from: Square, c: Color, offsets: &[(i8, i8)], out: &mut Vec<Move>) {
    for &(dr, dc) in offsets {
        if let Some(to) = from.offset(dr, dc) {
            match board.piece_at(to) {
                None => out.push(Move::quiet(from, to)),
                Some(pc) if pc.color != c => out.push(Move::capture(from, to, Some(pc))),
                _ => {}
            }
        }
    }
}

fn gen_slider(board: &Board, from: Square, c: Color, dirs: &[(i8, i8)], out: &mut Vec<Move>) {
    for &(dr, dc) in dirs {
        let mut cur = from.offset(dr, dc);
        while let Some(to) = cur {
            match board.piece_at(to) {
                None => out.push(Move::quiet(from, to)),
                Some(pc) if pc.color != c => {
                    out.push(Move::capture(from, to, Some(pc)));
                    break;
                }
                _ => break,
            }
            cur = to.offset(dr, dc);
        }
    }
}

/// Castling needs an unmoved corner rook and empty squares in between.
/// Squares the king crosses are not tested for attack.
fn gen_castle(board: &Board, from: Square, out: &mut Vec<Move>) {
    let row = from.row as i8;
    let col = from.col as i8;
    let Some(king) = board.piece_at(from) else {
        return;
    };
    let unmoved_rook = |rook_col: i8| {
        board
            .get(row, rook_col)
            .is_some_and(|pc| pc.is(PieceKind::Rook, king.color) && !pc.has_moved)
    };
    let clear = |mut cols: std::ops::Range<i8>| cols.all(|c| board.get(row, c).is_none());

    if unmoved_rook(7)
        && clear(col + 1..7)
        && let Some(to) = Square::new(row, 6)
    {
        out.push(Move {
            from,
            to,
            kind: MoveKind::CastleKingside,
        });
    }
    if unmoved_rook(0)
        && clear(1..col)
        && let Some(to) = Square::new(row, 2)
    {
        out.push(Move {
            from,
            to,
            kind: MoveKind::CastleQueenside,
        });
    }
}

#[cfg(test)]
#[path = "movegen_tests.rs"]
mod movegen_tests;
