//! Mapping between board squares and the world space a board is placed in.
//!
//! A board occupies an 8×8 block of unit cells starting at its anchor.
//! Rows run along +z; columns run along -x, so column 0 (file a) sits in
//! the cell furthest along +x.

use chess_core::Square;
use serde::{Deserialize, Serialize};

/// Integer cell a board is anchored at. Also the key boards are registered
/// under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoardAnchor {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BoardAnchor {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

impl std::fmt::Display for BoardAnchor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorldPos {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl WorldPos {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Square under a world position, or `None` outside the board's footprint.
/// Height is ignored.
pub fn world_to_board(pos: WorldPos, anchor: BoardAnchor) -> Option<Square> {
    let rel_x = pos.x - f64::from(anchor.x);
    let rel_z = pos.z - f64::from(anchor.z);
    let col = 7.0 - rel_x.floor();
    let row = rel_z.floor();
    if !(0.0..8.0).contains(&col) || !(0.0..8.0).contains(&row) {
        return None;
    }
    Square::new(row as i8, col as i8)
}

/// Centre of a square's cell, half a block above the anchor.
pub fn board_to_world(square: Square, anchor: BoardAnchor) -> WorldPos {
    WorldPos {
        x: f64::from(anchor.x) + f64::from(7 - square.col) + 0.5,
        y: f64::from(anchor.y) + 0.5,
        z: f64::from(anchor.z) + f64::from(square.row) + 0.5,
    }
}

#[cfg(test)]
#[path = "coords_tests.rs"]
mod coords_tests;
