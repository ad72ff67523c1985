use crate::{board::Board, movegen::legal_moves, types::Color};

/// Pure perft node count.
/// Counts all legal positions from the current one down to `depth`. Each
/// child is a fresh clone, mirroring how the game probes legality.
pub fn perft(board: &Board, side: Color, depth: u8) -> u64 {
    if depth == 0 {
        return 1;
    }

    let moves = legal_moves(board, side);
    if depth == 1 {
        return moves.len() as u64;
    }

    let mut nodes = 0u64;
    for mv in moves {
        let mut child = board.clone();
        child.apply(&mv);
        child.set_last_move(Some(mv));
        nodes += perft(&child, side.other(), depth - 1);
    }
    nodes
}
