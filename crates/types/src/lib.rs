//! Core types module - shared data structures and constants
//!
//! This module defines the fundamental types used throughout the workspace.
//! All types are plain data with no external dependencies, so they can be used
//! by the board engine, the adapter protocol, and any presentation layer.
//!
//! # Board Dimensions
//!
//! The reference board is 8x8 with a palette of 4 tile kinds:
//!
//! - **Width**: 8 columns (indexed 0-7, left to right)
//! - **Height**: 8 rows (indexed 0-7, top to bottom)
//! - **Gravity**: tiles fall toward larger row indices
//!
//! # Presentation Pacing
//!
//! The engine never waits. These values are for drivers that animate the
//! engine's steps (milliseconds):
//!
//! | Constant | Value | Description |
//! |----------|-------|-------------|
//! | `SWAP_ANIMATION_MS` | 200 | Two tiles trading places |
//! | `REMOVE_PAUSE_MS` | 500 | Matched tiles fading out |
//! | `SETTLE_PAUSE_MS` | 300 | Tiles falling and spawning |
//!
//! # Examples
//!
//! ```
//! use match_three_types::{Kind, Position, SwapRejection};
//!
//! let a = Position::new(2, 3);
//! assert!(a.is_adjacent(Position::new(2, 4)));
//! assert!(!a.is_adjacent(Position::new(3, 4)));
//!
//! assert_eq!(Kind(1).label(), "test-tube");
//! assert_eq!(SwapRejection::from_str("not-adjacent"), Some(SwapRejection::NotAdjacent));
//! ```

/// Default board width in cells (8 columns)
pub const DEFAULT_BOARD_WIDTH: u8 = 8;

/// Default board height in cells (8 rows)
pub const DEFAULT_BOARD_HEIGHT: u8 = 8;

/// Default number of tile kinds in the palette
pub const DEFAULT_KIND_COUNT: u8 = 4;

/// Smallest palette that can always be stabilized
pub const MIN_KIND_COUNT: u8 = 2;

/// Largest palette supported by the wire encoding
pub const MAX_KIND_COUNT: u8 = 16;

/// Smallest board edge on which a run can form
pub const MIN_BOARD_DIM: u8 = 3;

/// Largest board edge
pub const MAX_BOARD_DIM: u8 = 32;

/// Minimum number of contiguous same-kind tiles that form a run
pub const MIN_RUN_LENGTH: u8 = 3;

/// Points awarded per tile in a resolved run
pub const POINTS_PER_TILE: u32 = 10;

/// Score at which the game is won
pub const DEFAULT_TARGET_SCORE: u32 = 6969;

/// Maximum detection passes while repainting the initial board
pub const SEED_MAX_PASSES: u32 = 1000;

/// Maximum redraws when picking a replacement kind that differs from the current one
pub const SEED_MAX_REDRAWS: u32 = 64;

/// Swap animation duration
pub const SWAP_ANIMATION_MS: u32 = 200;

/// Pause while matched tiles fade out, before gravity is shown
pub const REMOVE_PAUSE_MS: u32 = 500;

/// Pause while fallen and spawned tiles settle, before the next scan is shown
pub const SETTLE_PAUSE_MS: u32 = 300;

/// Display labels of the reference palette, indexed by kind
pub const KIND_LABELS: [&str; 4] = ["alembic", "test-tube", "crystal-ball", "alarm-clock"];


/// A tile kind: an index into the palette
///
/// Kinds are compared by index only. The palette size is chosen when the
/// engine is initialized (`kind_count`), so `Kind(n)` is valid for
/// `n < kind_count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Kind(pub u8);

impl Kind {
    pub fn index(&self) -> usize {
        self.0 as usize
    }

    /// Display label from the reference palette, or `"kind"` for extended palettes
    ///
    /// # Examples
    ///
    /// ```
    /// use match_three_types::Kind;
    ///
    /// assert_eq!(Kind(0).label(), "alembic");
    /// assert_eq!(Kind(9).label(), "kind");
    /// ```
    pub fn label(&self) -> &'static str {
        KIND_LABELS.get(self.index()).copied().unwrap_or("kind")
    }
}

/// A cell on the board
///
/// - `None`: Empty cell (only observable mid-cascade)
/// - `Some(Kind)`: Cell holding a tile of the given kind
pub type Cell = Option<Kind>;

/// Grid coordinate. Row 0 is the top row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub col: u8,
    pub row: u8,
}

impl Position {
    pub const fn new(col: u8, row: u8) -> Self {
        Self { col, row }
    }

    /// True when `other` is exactly one step away horizontally or vertically
    pub fn is_adjacent(&self, other: Position) -> bool {
        let dc = self.col.abs_diff(other.col);
        let dr = self.row.abs_diff(other.row);
        (dc == 1 && dr == 0) || (dc == 0 && dr == 1)
    }
}

/// Direction along which a run is contiguous
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Along a row (varying column)
    Horizontal,
    /// Along a column (varying row)
    Vertical,
}

impl Axis {
    pub fn as_str(&self) -> &'static str {
        match self {
            Axis::Horizontal => "horizontal",
            Axis::Vertical => "vertical",
        }
    }
}

/// Why a swap request was not accepted
///
/// Rejections are ordinary interaction no-ops, not errors: the board and
/// the gate are left untouched (apart from the selection bookkeeping of
/// `SameTile` and `NotAdjacent`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwapRejection {
    /// A cascade is in flight; moves are not accepted
    GateClosed,
    /// The target score was reached; restart to keep playing
    GameOver,
    /// A coordinate lies outside the board
    OutOfBounds,
    /// Both coordinates name the same tile (treated as a deselect)
    SameTile,
    /// The tiles do not share an edge (treated as a reselect)
    NotAdjacent,
}

impl SwapRejection {
    /// Parse a rejection from its wire name
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "gate-closed" => Some(SwapRejection::GateClosed),
            "game-over" => Some(SwapRejection::GameOver),
            "out-of-bounds" => Some(SwapRejection::OutOfBounds),
            "same-tile" => Some(SwapRejection::SameTile),
            "not-adjacent" => Some(SwapRejection::NotAdjacent),
            _ => None,
        }
    }

    /// Wire name of the rejection
    pub fn as_str(&self) -> &'static str {
        match self {
            SwapRejection::GateClosed => "gate-closed",
            SwapRejection::GameOver => "game-over",
            SwapRejection::OutOfBounds => "out-of-bounds",
            SwapRejection::SameTile => "same-tile",
            SwapRejection::NotAdjacent => "not-adjacent",
        }
    }
}
