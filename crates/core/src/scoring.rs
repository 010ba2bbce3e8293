//! Scoring module
//!
//! Every run resolved in a cascade step is worth `POINTS_PER_TILE` per tile.
//! A tile in both a horizontal and a vertical run counts toward both.

use crate::board::Run;
use crate::types::POINTS_PER_TILE;

/// Points for a single run of `len` tiles
pub fn run_score(len: u8) -> u32 {
    POINTS_PER_TILE.saturating_mul(len as u32)
}

/// Total points for every run found in one detection pass
pub fn step_score(runs: &[Run]) -> u32 {
    runs.iter()
        .fold(0u32, |acc, run| acc.saturating_add(run_score(run.len)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Axis, Kind, Position};

    fn run(axis: Axis, len: u8) -> Run {
        Run {
            axis,
            kind: Kind(0),
            start: Position::new(0, 0),
            len,
        }
    }

    #[test]
    fn test_run_score() {
        assert_eq!(run_score(3), 30);
        assert_eq!(run_score(4), 40);
        assert_eq!(run_score(8), 80);
    }

    #[test]
    fn test_step_score_sums_runs() {
        assert_eq!(step_score(&[]), 0);
        // An L shape sharing a corner: both runs pay in full.
        let runs = [run(Axis::Horizontal, 3), run(Axis::Vertical, 3)];
        assert_eq!(step_score(&runs), 60);
    }
}
