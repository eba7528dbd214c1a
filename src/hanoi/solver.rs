//! Optimal-play reference for a 3-peg Tower of Hanoi
//!
//! Used to score logged boards offline and to check the model's moves
//! against ground truth. Neither function touches an environment.

use crate::core::error::{ReplayError, Result};
use crate::hanoi::board::{Board, Peg};
use serde::Serialize;
use std::fmt;

/// A single disk move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Move {
    pub disk: u32,
    pub from: Peg,
    pub to: Peg,
}

impl fmt::Display for Move {
    /// Rendered in the environment's action syntax, e.g. `[A C]`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{} {}]", self.from, self.to)
    }
}

/// Minimum number of moves to gather disks `1..=disks` on `target`
///
/// If the largest disk already sits on `target` it never moves, and only the
/// smaller stack remains. Otherwise the smaller stack goes to the spare peg,
/// the largest disk moves, and the smaller stack is rebuilt on top of it,
/// which costs `2^(disks-1)` moves beyond the first step.
///
/// Returns `None` when a disk is missing from the board, or when the count
/// does not fit in a `u64`.
pub fn solution_distance(board: &Board, disks: u32, target: Peg) -> Option<u64> {
    if disks == 0 {
        return Some(0);
    }

    let current = board.locate(disks)?;
    if current == target {
        return solution_distance(board, disks - 1, target);
    }

    let spare = Peg::spare(current, target);
    let clear_the_way = solution_distance(board, disks - 1, spare)?;
    let relocate = 1u64.checked_shl(disks - 1)?;
    clear_the_way.checked_add(relocate)
}

/// The next move of the canonical solution toward `target`
///
/// Disks are scanned from largest to smallest while tracking the peg each
/// one should end up on. The smallest disk that is off its goal is the one
/// to move; every smaller disk is already out of its way. `Ok(None)` means
/// the board is solved.
pub fn best_move(board: &Board, target: Peg) -> Result<Option<Move>> {
    let largest = board
        .largest_disk()
        .ok_or_else(|| ReplayError::InvalidBoard("no disks on board".into()))?;

    let mut goal = target;
    let mut next = None;

    for disk in (1..=largest).rev() {
        let current = board
            .locate(disk)
            .ok_or_else(|| ReplayError::InvalidBoard(format!("disk {} not found", disk)))?;

        if current != goal {
            next = Some(Move {
                disk,
                from: current,
                to: goal,
            });
            goal = Peg::spare(current, goal);
        }
    }

    Ok(next)
}
