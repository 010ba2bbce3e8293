//! Engine errors
//!
//! Only internal contract violations are errors. A rejected swap is a normal
//! outcome and is reported through [`SwapResult`](crate::SwapResult).

use thiserror::Error;

use crate::types::Position;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("invalid board: {0}")]
    InvalidBoard(String),

    #[error("removal targeted empty cell at ({}, {})", .0.col, .0.row)]
    RemoveEmptyCell(Position),

    #[error("column {col} has an empty cell at row {row} above a filled cell")]
    GravityGap { col: u8, row: u8 },

    #[error("initial board still had matches after {passes} repaint passes")]
    SeedDidNotConverge { passes: u32 },

    #[error("no replacement kind found for ({}, {}) after {redraws} redraws", .pos.col, .pos.row)]
    KindRedrawExhausted { pos: Position, redraws: u32 },
}
