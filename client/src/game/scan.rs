//! Four-in-a-row detection.
//!
//! Every occupied cell is tried as the start of a run in four directions
//! (right, down, down-right, down-left). The mirrored directions are covered
//! because every cell gets a turn as the start. A cell on more than one
//! winning line is reported once per line; callers test membership.

#[cfg(test)]
#[path = "scan_test.rs"]
mod scan_test;

use super::board::{Board, Coord};

/// Tokens in a row needed to win.
pub const CONNECT: usize = 4;

const DIRECTIONS: [(isize, isize); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

/// All coordinates that belong to a winning run, possibly with repeats.
#[must_use]
pub fn find_connected_tokens(board: &Board) -> Vec<Coord> {
    let mut connected = Vec::new();

    for row in 0..board.rows() {
        for col in 0..board.cols() {
            if board.get(row, col).is_none() {
                continue;
            }
            for (dr, dc) in DIRECTIONS {
                if let Some(run) = run_from(board, Coord::new(row, col), dr, dc) {
                    connected.extend(run);
                }
            }
        }
    }

    connected
}

fn run_from(board: &Board, start: Coord, dr: isize, dc: isize) -> Option<[Coord; CONNECT]> {
    let token = board.get(start.row, start.col)?;
    let mut run = [start; CONNECT];

    for (step, slot) in run.iter_mut().enumerate().skip(1) {
        let offset = isize::try_from(step).ok()?;
        let row = start.row.checked_add_signed(dr * offset)?;
        let col = start.col.checked_add_signed(dc * offset)?;
        if board.get(row, col) != Some(token) {
            return None;
        }
        *slot = Coord::new(row, col);
    }

    Some(run)
}
