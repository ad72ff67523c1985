use crate::{fen::parse_square, types::*};

/// A move in UCI long algebraic form, before it is matched against the
/// legal move list (which supplies castle/en-passant/capture details).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UciMove {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceKind>,
}

pub fn move_to_uci(mv: &Move) -> String {
    mv.to_string()
}

/// Parse `e2e4` / `e7e8q`. Returns `None` for anything that is not a
/// well-formed coordinate move, including the `0000` null move.
pub fn parse_uci_move(txt: &str) -> Option<UciMove> {
    let txt = txt.trim();
    if !(4..=5).contains(&txt.len()) || !txt.is_ascii() {
        return None;
    }
    let from = parse_square(&txt[0..2])?;
    let to = parse_square(&txt[2..4])?;
    let promotion = match txt.chars().nth(4) {
        Some(c) => match PieceKind::from_letter(c)? {
            PieceKind::Pawn | PieceKind::King => return None,
            kind => Some(kind),
        },
        None => None,
    };
    Some(UciMove {
        from,
        to,
        promotion,
    })
}

#[cfg(test)]
#[path = "uci_tests.rs"]
mod uci_tests;
