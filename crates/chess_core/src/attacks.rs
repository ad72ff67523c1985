//! Offset tables and square-attack detection.
//!
//! Attack detection walks outward from the target square once per piece
//! type (pawn diagonals, knight jumps, slider rays, king adjacency), so it
//! does not need the attacker's move list.

use crate::board::Board;
use crate::types::*;

pub const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (-2, -1),
    (-2, 1),
    (-1, -2),
    (-1, 2),
    (1, -2),
    (1, 2),
    (2, -1),
    (2, 1),
];

pub const KING_OFFSETS: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

pub const DIAGONALS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];
pub const ORTHOGONALS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

impl Board {
    pub fn is_square_attacked(&self, target: Square, by: Color) -> bool {
        // A pawn of `by` attacks from one row behind the target, relative
        // to its own direction of travel.
        for dc in [-1, 1] {
            if let Some(s) = target.offset(-by.forward(), dc)
                && let Some(pc) = self.piece_at(s)
                && pc.is(PieceKind::Pawn, by)
            {
                return true;
            }
        }

        if self.attacked_by_leaper(target, by, &KNIGHT_OFFSETS, PieceKind::Knight) {
            return true;
        }
        if self.attacked_by_leaper(target, by, &KING_OFFSETS, PieceKind::King) {
            return true;
        }

        self.attacked_along_rays(target, by, &DIAGONALS, PieceKind::Bishop)
            || self.attacked_along_rays(target, by, &ORTHOGONALS, PieceKind::Rook)
    }

    /// True if the side to move's king (`color`) is attacked. A board
    /// without that king reports false.
    pub fn in_check(&self, color: Color) -> bool {
        match self.find_king(color) {
            Some(ksq) => self.is_square_attacked(ksq, color.other()),
            None => false,
        }
    }

    fn attacked_by_leaper(
        &self,
        target: Square,
        by: Color,
        offsets: &[(i8, i8)],
        kind: PieceKind,
    ) -> bool {
        offsets.iter().any(|&(dr, dc)| {
            target
                .offset(dr, dc)
                .and_then(|s| self.piece_at(s))
                .is_some_and(|pc| pc.is(kind, by))
        })
    }

    /// Queens count on both ray families.
    fn attacked_along_rays(
        &self,
        target: Square,
        by: Color,
        dirs: &[(i8, i8)],
        slider: PieceKind,
    ) -> bool {
        for &(dr, dc) in dirs {
            let mut cur = target.offset(dr, dc);
            while let Some(s) = cur {
                if let Some(pc) = self.piece_at(s) {
                    if pc.color == by && (pc.kind == slider || pc.kind == PieceKind::Queen) {
                        return true;
                    }
                    break;
                }
                cur = s.offset(dr, dc);
            }
        }
        false
    }
}

#[cfg(test)]
#[path = "attacks_tests.rs"]
mod attacks_tests;
