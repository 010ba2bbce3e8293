//! Shared board layouts for integration tests

#![allow(dead_code)]

use match_three::core::{BoardEngine, EngineConfig};
use match_three::types::{Cell, Kind, Position};

/// 8x8 board with no runs, one swap away from a vertical run.
///
/// Base pattern is `(col + 2 * row) % 4`. Column 0 reads 2, 2, 0, 1, ...
/// and (1, 2) holds a 2, so swapping (0, 2) with (1, 2) lines up three 2s
/// in column 0, rows 0 to 2.
pub fn near_match_rows() -> Vec<Vec<Cell>> {
    let mut rows: Vec<Vec<Cell>> = (0..8u8)
        .map(|r| (0..8u8).map(|c| Some(Kind((c + 2 * r) % 4))).collect())
        .collect();
    rows[0][0] = Some(Kind(2));
    rows[2][1] = Some(Kind(2));
    rows[3][0] = Some(Kind(1));
    rows
}

pub const NEAR_MATCH_SWAP: (Position, Position) = (Position::new(0, 2), Position::new(1, 2));

pub fn config(seed: u32, target_score: u32) -> EngineConfig {
    EngineConfig {
        seed: Some(seed),
        target_score,
        ..EngineConfig::default()
    }
}

pub fn near_match_engine(seed: u32, target_score: u32) -> BoardEngine {
    BoardEngine::from_cells(config(seed, target_score), near_match_rows()).unwrap()
}
