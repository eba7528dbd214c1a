//! Tower-of-Hanoi board parsing and optimal-play reference

pub mod board;
pub mod solver;

pub use board::{extract_snapshots, Board, Peg, BOARD_MARKER};
pub use solver::{best_move, solution_distance, Move};
