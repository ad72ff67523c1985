use super::*;
use crate::fen;

fn sq(name: &str) -> Square {
    fen::parse_square(name).unwrap()
}

fn board(placement: &str) -> Board {
    fen::parse(&format!("{placement} w - - 0 1")).unwrap().board
}

#[test]
fn test_knight_attacks() {
    // Knight on e4 attacks f6 and d2 but not e5
    let b = board("8/8/8/8/4N3/8/8/8");
    assert!(b.is_square_attacked(sq("f6"), Color::White));
    assert!(b.is_square_attacked(sq("d2"), Color::White));
    assert!(!b.is_square_attacked(sq("e5"), Color::White));
    assert!(!b.is_square_attacked(sq("f6"), Color::Black));

    // Knight in the corner only reaches two squares
    let b = board("8/8/8/8/8/8/8/N7");
    let attacked = Square::all()
        .filter(|&s| b.is_square_attacked(s, Color::White))
        .count();
    assert_eq!(attacked, 2);
}

#[test]
fn test_pawn_attacks() {
    // White pawn on e4 attacks d5 and f5, not e5
    let b = board("8/8/8/8/4P3/8/8/8");
    assert!(b.is_square_attacked(sq("d5"), Color::White));
    assert!(b.is_square_attacked(sq("f5"), Color::White));
    assert!(!b.is_square_attacked(sq("e5"), Color::White));
    assert!(!b.is_square_attacked(sq("d3"), Color::White));

    // Black pawn on e5 attacks d4 and f4
    let b = board("8/8/8/4p3/8/8/8/8");
    assert!(b.is_square_attacked(sq("d4"), Color::Black));
    assert!(b.is_square_attacked(sq("f4"), Color::Black));
    assert!(!b.is_square_attacked(sq("d6"), Color::Black));
}

#[test]
fn test_king_adjacency() {
    let b = board("8/8/8/8/8/8/8/K7");
    let attacked = Square::all()
        .filter(|&s| b.is_square_attacked(s, Color::White))
        .count();
    assert_eq!(attacked, 3);
}

#[test]
fn test_rook_attacks_with_blockers() {
    // Rook on a1, blocker on a4
    let b = board("8/8/8/8/p7/8/8/R7");
    assert!(b.is_square_attacked(sq("a2"), Color::White));
    assert!(b.is_square_attacked(sq("a3"), Color::White));
    assert!(b.is_square_attacked(sq("a4"), Color::White)); // blocker itself
    assert!(!b.is_square_attacked(sq("a5"), Color::White)); // behind blocker
    assert!(b.is_square_attacked(sq("h1"), Color::White));
    assert!(!b.is_square_attacked(sq("b2"), Color::White)); // rooks don't see diagonals
}

#[test]
fn test_queen_attacks_both_ray_families() {
    let b = board("8/8/8/3q4/8/8/8/8");
    assert!(b.is_square_attacked(sq("d1"), Color::Black));
    assert!(b.is_square_attacked(sq("a8"), Color::Black));
    assert!(b.is_square_attacked(sq("h1"), Color::Black));
    assert!(!b.is_square_attacked(sq("e3"), Color::Black));
}

#[test]
fn test_in_check_and_missing_king() {
    let b = board("4k3/8/8/8/8/8/8/4R3");
    assert!(b.in_check(Color::Black));
    assert!(!b.in_check(Color::White)); // no white king at all
}

#[test]
fn test_startpos_nothing_attacked_in_the_middle() {
    let b = Board::startpos();
    for row in 3..5 {
        for col in 0..8 {
            let s = Square::new(row, col).unwrap();
            assert!(!b.is_square_attacked(s, Color::White));
            assert!(!b.is_square_attacked(s, Color::Black));
        }
    }
    // Third rank is covered by white pawns and knights
    assert!(b.is_square_attacked(sq("c3"), Color::White));
    assert!(b.is_square_attacked(sq("f6"), Color::Black));
}
