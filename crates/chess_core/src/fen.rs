//! Forsyth-Edwards Notation: the position format handed to UCI engines.
//!
//! The board keeps no castling-rights or en-passant fields of its own, so
//! both are derived here: castling from the `has_moved` flags of the king
//! and the corner rooks, en passant from the board's last move. Parsing does
//! the reverse so a parsed position generates the same moves.

use thiserror::Error;

use crate::{board::Board, types::*};

pub const STARTPOS_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FenError {
    #[error("expected at least 4 fields, found {0}")]
    MissingFields(usize),
    #[error("expected 8 ranks, found {0}")]
    RankCount(usize),
    #[error("rank {rank} does not describe exactly 8 files")]
    RankWidth { rank: usize },
    #[error("invalid piece letter '{0}'")]
    PieceLetter(char),
    #[error("invalid side to move '{0}'")]
    SideToMove(String),
    #[error("invalid castling field '{0}'")]
    Castling(String),
    #[error("invalid en-passant square '{0}'")]
    EnPassant(String),
    #[error("invalid move counter '{0}'")]
    Counter(String),
}

/// A parsed FEN record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FenPosition {
    pub board: Board,
    pub side_to_move: Color,
    pub halfmove_clock: u32,
    pub fullmove_number: u32,
}

/// Serialize with placeholder move counters (`0 1`).
pub fn serialize(board: &Board, side_to_move: Color) -> String {
    serialize_with_counters(board, side_to_move, 0, 1)
}

pub fn serialize_with_counters(
    board: &Board,
    side_to_move: Color,
    halfmove_clock: u32,
    fullmove_number: u32,
) -> String {
    let mut fen = placement(board);

    fen.push(' ');
    fen.push(match side_to_move {
        Color::White => 'w',
        Color::Black => 'b',
    });

    fen.push(' ');
    fen.push_str(&castling_field(board));

    fen.push(' ');
    match board.en_passant_target() {
        Some(sq) => fen.push_str(&sq.to_string()),
        None => fen.push('-'),
    }

    fen.push_str(&format!(" {halfmove_clock} {fullmove_number}"));
    fen
}

/// Piece placement field, rank 8 first.
pub fn placement(board: &Board) -> String {
    let mut out = String::with_capacity(72);
    for row in (0..8i8).rev() {
        let mut empty = 0;
        for col in 0..8i8 {
            match board.get(row, col) {
                Some(pc) => {
                    if empty > 0 {
                        out.push_str(&empty.to_string());
                        empty = 0;
                    }
                    out.push(pc.fen_char());
                }
                None => empty += 1,
            }
        }
        if empty > 0 {
            out.push_str(&empty.to_string());
        }
        if row > 0 {
            out.push('/');
        }
    }
    out
}

fn castling_field(board: &Board) -> String {
    let mut rights = String::new();
    for (color, letters) in [(Color::White, ['K', 'Q']), (Color::Black, ['k', 'q'])] {
        let row = color.back_rank();
        let king_home = board
            .get(row, 4)
            .is_some_and(|pc| pc.is(PieceKind::King, color) && !pc.has_moved);
        if !king_home {
            continue;
        }
        for (rook_col, letter) in [(7, letters[0]), (0, letters[1])] {
            if board
                .get(row, rook_col)
                .is_some_and(|pc| pc.is(PieceKind::Rook, color) && !pc.has_moved)
            {
                rights.push(letter);
            }
        }
    }
    if rights.is_empty() {
        rights.push('-');
    }
    rights
}

/// Parse a FEN string. The move counters are optional and default to `0 1`.
///
/// Kings and rooks are flagged as unmoved only where the castling field
/// grants the matching right; pawns off their start rank count as moved.
/// A valid en-passant field is turned back into the double step that
/// produced it.
pub fn parse(fen: &str) -> Result<FenPosition, FenError> {
    let parts: Vec<&str> = fen.split_whitespace().collect();
    if parts.len() < 4 {
        return Err(FenError::MissingFields(parts.len()));
    }

    let mut board = Board::empty();
    let ranks: Vec<&str> = parts[0].split('/').collect();
    if ranks.len() != 8 {
        return Err(FenError::RankCount(ranks.len()));
    }
    for (rank_idx, rank_str) in ranks.iter().enumerate() {
        let row = 7 - rank_idx as i8;
        let mut col: i8 = 0;
        for ch in rank_str.chars() {
            if let Some(d) = ch.to_digit(10) {
                if d == 0 {
                    return Err(FenError::PieceLetter(ch));
                }
                col += d as i8;
            } else {
                let kind = PieceKind::from_letter(ch).ok_or(FenError::PieceLetter(ch))?;
                let color = if ch.is_ascii_uppercase() {
                    Color::White
                } else {
                    Color::Black
                };
                let sq = Square::new(row, col)
                    .ok_or(FenError::RankWidth { rank: rank_idx + 1 })?;
                let mut pc = Piece::new(kind, color);
                pc.has_moved = match kind {
                    PieceKind::King | PieceKind::Rook => true,
                    PieceKind::Pawn => row != color.pawn_rank(),
                    _ => false,
                };
                board.set_piece(sq, Some(pc));
                col += 1;
            }
            if col > 8 {
                return Err(FenError::RankWidth { rank: rank_idx + 1 });
            }
        }
        if col != 8 {
            return Err(FenError::RankWidth { rank: rank_idx + 1 });
        }
    }

    let side_to_move = match parts[1] {
        "w" => Color::White,
        "b" => Color::Black,
        other => return Err(FenError::SideToMove(other.to_string())),
    };

    if parts[2] != "-" {
        for c in parts[2].chars() {
            let (color, rook_col) = match c {
                'K' => (Color::White, 7),
                'Q' => (Color::White, 0),
                'k' => (Color::Black, 7),
                'q' => (Color::Black, 0),
                _ => return Err(FenError::Castling(parts[2].to_string())),
            };
            let row = color.back_rank();
            for (col, kind) in [(4, PieceKind::King), (rook_col, PieceKind::Rook)] {
                if let Some(mut pc) = board.get(row, col)
                    && pc.is(kind, color)
                {
                    pc.has_moved = false;
                    board.set(row, col, Some(pc));
                }
            }
        }
    }

    if parts[3] != "-" {
        let target =
            parse_square(parts[3]).ok_or_else(|| FenError::EnPassant(parts[3].to_string()))?;
        // The pawn that just moved belongs to the side not on move, and
        // the target sits right behind it: rank 3 or rank 6.
        let mover = side_to_move.other();
        let dir = mover.forward();
        if target.row as i8 != mover.pawn_rank() + dir {
            return Err(FenError::EnPassant(parts[3].to_string()));
        }
        let from = target.offset(-dir, 0);
        let to = target.offset(dir, 0);
        let pushed_pawn = to
            .and_then(|sq| board.piece_at(sq))
            .is_some_and(|pc| pc.is(PieceKind::Pawn, mover));
        match (from, to) {
            (Some(from), Some(to)) if pushed_pawn => {
                board.set_last_move(Some(Move::quiet(from, to)));
            }
            _ => return Err(FenError::EnPassant(parts[3].to_string())),
        }
    }

    let counter = |idx: usize, default: u32| -> Result<u32, FenError> {
        match parts.get(idx) {
            Some(s) => s.parse().map_err(|_| FenError::Counter(s.to_string())),
            None => Ok(default),
        }
    };

    Ok(FenPosition {
        board,
        side_to_move,
        halfmove_clock: counter(4, 0)?,
        fullmove_number: counter(5, 1)?,
    })
}

/// `"e3"` → row 2, col 4.
pub fn parse_square(text: &str) -> Option<Square> {
    let b = text.as_bytes();
    if b.len() != 2 {
        return None;
    }
    let (f, r) = (b[0], b[1]);
    if !(b'a'..=b'h').contains(&f) || !(b'1'..=b'8').contains(&r) {
        return None;
    }
    Square::new((r - b'1') as i8, (f - b'a') as i8)
}

#[cfg(test)]
#[path = "fen_tests.rs"]
mod fen_tests;
