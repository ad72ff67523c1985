pub mod attacks;
pub mod board;
pub mod clock;
pub mod fen;
pub mod game;
pub mod movegen;
pub mod perft;
pub mod types;
pub mod uci;

pub use board::*;
pub use clock::*;
pub use fen::{FenError, FenPosition, STARTPOS_FEN};
pub use game::*;
pub use movegen::*;
pub use perft::perft;
pub use types::*;
pub use uci::*;
