use std::time::Instant;

use rayon::prelude::*;

use chess_core::{STARTPOS_FEN, fen, perft};

const FULL_PERFT_ENV: &str = "FULL_PERFT";
const NODE_LIMIT: u64 = 1_000_000;

/// Positions whose counts at these depths do not depend on under-promotion
/// or castling through attacked squares, neither of which the generator
/// models.
const CASES: &[(&str, &[(u8, u64)])] = &[
    (STARTPOS_FEN, &[(1, 20), (2, 400), (3, 8_902), (4, 197_281)]),
    (
        "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1",
        &[(1, 14), (2, 191), (3, 2_812), (4, 43_238)],
    ),
];

#[test]
fn perft_known_positions() {
    let full = std::env::var(FULL_PERFT_ENV).is_ok();

    CASES.par_iter().enumerate().for_each(|(idx, (fen, depths))| {
        let pos = fen::parse(fen).unwrap_or_else(|e| panic!("bad FEN '{}': {}", fen, e));
        let mut ran_depths = Vec::new();
        let mut total_nodes: u64 = 0;
        let case_start = Instant::now();

        for (depth, expected) in depths.iter() {
            if !full && *expected > NODE_LIMIT {
                eprintln!(
                    "Skipping depth {} for case {} (expected {} nodes), set {}=1 to run all.",
                    depth,
                    idx + 1,
                    expected,
                    FULL_PERFT_ENV
                );
                continue;
            }
            let got = perft(&pos.board, pos.side_to_move, *depth);
            assert!(
                got == *expected,
                "Perft mismatch for FEN '{}' at depth {}: expected {}, got {}",
                fen,
                depth,
                expected,
                got
            );

            ran_depths.push(*depth);
            total_nodes += got;
        }

        println!(
            "Case {:03} done: depths {:?}, total nodes {}, elapsed {:.3?}",
            idx + 1,
            ran_depths,
            total_nodes,
            case_start.elapsed()
        );
    });
}

#[test]
fn perft_depth_zero_is_one() {
    let pos = fen::parse(STARTPOS_FEN).unwrap();
    assert_eq!(perft(&pos.board, pos.side_to_move, 0), 1);
}
