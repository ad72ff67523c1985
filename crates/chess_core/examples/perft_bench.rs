//! Perft timing for profiling move generation with cargo-flamegraph.
//!
//! Usage:
//!   cargo run --release --example perft_bench -p chess_core -- [depth] [fen]
//!   cargo flamegraph --profile profiling --example perft_bench -p chess_core -- 4
//!
//! Counts can differ from published perft tables on positions where a king
//! in check, or crossing an attacked square, still has castling rights: only
//! the landing square is tested for attack.

use chess_core::{fen, perft};
use std::env;
use std::process;
use std::time::{Duration, Instant};

const TEST_POSITIONS: &[(&str, &str)] = &[
    (
        "Starting position",
        "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
    ),
    ("Rook endgame", "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1"),
    (
        "Italian middlegame",
        "r4rk1/1pp1qppp/p1np1n2/2b1p1B1/2B1P1b1/P1NP1N2/1PP1QPPP/R4RK1 w - - 0 10",
    ),
];

fn main() {
    let args: Vec<String> = env::args().collect();
    let depth: u8 = args.get(1).and_then(|s| s.parse().ok()).unwrap_or(4);

    if let Some(fen) = args.get(2) {
        run_single_position(fen, depth);
    } else {
        run_all_positions(depth);
    }
}

fn timed(fen_text: &str, depth: u8) -> (u64, Duration) {
    let position = match fen::parse(fen_text) {
        Ok(position) => position,
        Err(err) => {
            eprintln!("Invalid FEN '{fen_text}': {err}");
            process::exit(1);
        }
    };
    let start = Instant::now();
    let nodes = perft(&position.board, position.side_to_move, depth);
    (nodes, start.elapsed())
}

fn nps(nodes: u64, elapsed: Duration) -> f64 {
    if elapsed.as_secs_f64() > 0.0 {
        nodes as f64 / elapsed.as_secs_f64()
    } else {
        0.0
    }
}

fn run_single_position(fen_text: &str, depth: u8) {
    println!("Position: {fen_text}");
    println!("Depth: {depth}");
    println!();

    let (nodes, elapsed) = timed(fen_text, depth);
    println!("Nodes: {nodes}");
    println!("Time: {elapsed:.3?}");
    println!("NPS: {:.0}", nps(nodes, elapsed));
}

fn run_all_positions(depth: u8) {
    println!("=== Perft Benchmark Suite ===");
    println!("Depth: {depth}");
    println!();

    let mut total_nodes = 0u64;
    let mut total_time = Duration::ZERO;

    for (name, fen_text) in TEST_POSITIONS {
        print!("{name:.<30}");
        let (nodes, elapsed) = timed(fen_text, depth);
        total_nodes += nodes;
        total_time += elapsed;
        println!(
            " {nodes:>12} nodes in {elapsed:>8.3?} ({:>10.0} nps)",
            nps(nodes, elapsed)
        );
    }

    println!();
    println!("{:=<70}", "");
    println!(
        "TOTAL: {total_nodes} nodes in {total_time:.3?} ({:.0} nps)",
        nps(total_nodes, total_time)
    );
}
