//! Read-only views of engine state
//!
//! Presentation and adapter code consume these instead of borrowing the
//! engine. Every snapshot is an owned copy; mutating it has no effect on
//! the game.

use crate::board::{Board, Run};
use crate::types::{Cell, Kind, Position};

/// A tile moved down by gravity during a cascade step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fall {
    pub from: Position,
    pub to: Position,
}

/// A new tile placed into a freed cell during a cascade step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Spawn {
    pub pos: Position,
    pub kind: Kind,
}

/// Result of one cascade step
///
/// A non-quiescent step carries the runs it cleared, the distinct cells it
/// emptied, and the gravity moves and spawns that refilled the board. A
/// quiescent step carries nothing but the flags.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CascadeStep {
    pub runs: Vec<Run>,
    pub removed: Vec<Position>,
    pub score_delta: u32,
    pub fallen: Vec<Fall>,
    pub spawned: Vec<Spawn>,
    /// No runs were found; the gate is open again
    pub quiescent: bool,
    /// This step is the one that crossed the target score
    pub game_won: bool,
}

impl CascadeStep {
    pub(crate) fn settled(game_won: bool) -> Self {
        Self {
            quiescent: true,
            game_won,
            ..Self::default()
        }
    }
}

/// Copy of the tile grid
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BoardSnapshot {
    pub width: u8,
    pub height: u8,
    /// Row-major cells (row * width + col)
    pub cells: Vec<Cell>,
}

impl BoardSnapshot {
    pub fn get(&self, pos: Position) -> Option<Cell> {
        if pos.col >= self.width || pos.row >= self.height {
            return None;
        }
        self.cells
            .get(pos.row as usize * self.width as usize + pos.col as usize)
            .copied()
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }
}

impl From<&Board> for BoardSnapshot {
    fn from(board: &Board) -> Self {
        Self {
            width: board.width(),
            height: board.height(),
            cells: board.cells().to_vec(),
        }
    }
}

/// Everything a presentation layer needs to draw one frame
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GameSnapshot {
    pub board: BoardSnapshot,
    pub score: u32,
    pub target_score: u32,
    pub accepting_moves: bool,
    pub selected: Option<Position>,
    pub game_won: bool,
    pub episode_id: u32,
    pub seed: u32,
    /// Non-quiescent steps taken by the current cascade
    pub cascade_depth: u32,
}
