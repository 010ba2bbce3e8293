//! Board module - manages the tile grid
//!
//! The board is a `width x height` grid where each cell is empty or holds a
//! tile kind. Uses a flat row-major vector (row * width + col).
//! Coordinates: `col` grows left to right, `row` grows top to bottom, and
//! gravity pulls tiles toward larger rows.

use crate::error::EngineError;
use crate::rng::SimpleRng;
use crate::scoring::run_score;
use crate::snapshot::{Fall, Spawn};
use crate::types::{
    Axis, Cell, Kind, Position, MAX_BOARD_DIM, MAX_KIND_COUNT, MIN_BOARD_DIM, MIN_RUN_LENGTH,
};

/// A maximal run of at least `MIN_RUN_LENGTH` same-kind tiles along one axis
///
/// Runs are recomputed on every scan and never stored on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Run {
    pub axis: Axis,
    pub kind: Kind,
    /// Leftmost (horizontal) or topmost (vertical) tile
    pub start: Position,
    pub len: u8,
}

impl Run {
    /// Position of the `i`-th tile of the run
    fn at(&self, i: u8) -> Position {
        match self.axis {
            Axis::Horizontal => Position::new(self.start.col + i, self.start.row),
            Axis::Vertical => Position::new(self.start.col, self.start.row + i),
        }
    }

    pub fn positions(&self) -> impl Iterator<Item = Position> {
        let run = *self;
        (0..run.len).map(move |i| run.at(i))
    }

    /// The tile at index `len / 2`, repainted when breaking initial matches
    pub fn middle(&self) -> Position {
        self.at(self.len / 2)
    }

    pub fn contains(&self, pos: Position) -> bool {
        self.positions().any(|p| p == pos)
    }

    pub fn score(&self) -> u32 {
        run_score(self.len)
    }
}

/// The tile grid
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Board {
    width: u8,
    height: u8,
    /// Flat array of cells, row-major order (row * width + col)
    cells: Vec<Cell>,
}

impl Board {
    /// Create an empty board
    pub fn new(width: u8, height: u8) -> Self {
        Self {
            width,
            height,
            cells: vec![None; width as usize * height as usize],
        }
    }

    /// Create a board with every cell drawn uniformly from the palette
    ///
    /// Cells are drawn column by column, top to bottom.
    pub fn filled(width: u8, height: u8, rng: &mut SimpleRng, kind_count: u8) -> Self {
        let mut board = Self::new(width, height);
        for col in 0..width {
            for row in 0..height {
                board.set(Position::new(col, row), Some(rng.next_kind(kind_count)));
            }
        }
        board
    }

    /// Build a board from rows (top row first)
    pub fn from_rows(rows: &[Vec<Cell>]) -> Result<Self, EngineError> {
        let height = rows.len();
        let width = rows.first().map(Vec::len).unwrap_or(0);
        let dims = MIN_BOARD_DIM as usize..=MAX_BOARD_DIM as usize;
        if !dims.contains(&width) || !dims.contains(&height) {
            return Err(EngineError::InvalidBoard(format!(
                "dimensions {}x{} outside {}..={}",
                width, height, MIN_BOARD_DIM, MAX_BOARD_DIM
            )));
        }
        if let Some(row) = rows.iter().position(|r| r.len() != width) {
            return Err(EngineError::InvalidBoard(format!(
                "row {} has {} cells, expected {}",
                row,
                rows[row].len(),
                width
            )));
        }
        if let Some(kind) = rows.iter().flatten().flatten().find(|k| k.0 >= MAX_KIND_COUNT) {
            return Err(EngineError::InvalidBoard(format!(
                "kind {} exceeds palette limit {}",
                kind.0, MAX_KIND_COUNT
            )));
        }

        Ok(Self {
            width: width as u8,
            height: height as u8,
            cells: rows.iter().flatten().copied().collect(),
        })
    }

    /// Calculate flat index from a position
    #[inline(always)]
    fn index(&self, pos: Position) -> Option<usize> {
        if pos.col >= self.width || pos.row >= self.height {
            return None;
        }
        Some(pos.row as usize * self.width as usize + pos.col as usize)
    }

    pub fn width(&self) -> u8 {
        self.width
    }

    pub fn height(&self) -> u8 {
        self.height
    }

    /// True if the position lies on the board
    pub fn contains(&self, pos: Position) -> bool {
        self.index(pos).is_some()
    }

    /// Get cell at position
    /// Returns None if out of bounds
    pub fn get(&self, pos: Position) -> Option<Cell> {
        self.index(pos).map(|idx| self.cells[idx])
    }

    /// Kind at position, None if empty or out of bounds
    pub fn kind_at(&self, pos: Position) -> Option<Kind> {
        self.get(pos).flatten()
    }

    /// Set cell at position
    /// Returns false if out of bounds
    pub fn set(&mut self, pos: Position, cell: Cell) -> bool {
        match self.index(pos) {
            Some(idx) => {
                self.cells[idx] = cell;
                true
            }
            None => false,
        }
    }

    /// Exchange the contents of two cells
    /// Returns false (and changes nothing) if either is out of bounds
    pub fn swap(&mut self, a: Position, b: Position) -> bool {
        match (self.index(a), self.index(b)) {
            (Some(ia), Some(ib)) => {
                self.cells.swap(ia, ib);
                true
            }
            _ => false,
        }
    }

    /// Check that no cell is empty
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    /// Number of tiles of each kind (index = kind)
    pub fn kind_counts(&self) -> [u32; MAX_KIND_COUNT as usize] {
        let mut counts = [0u32; MAX_KIND_COUNT as usize];
        for kind in self.cells.iter().flatten() {
            if let Some(c) = counts.get_mut(kind.index()) {
                *c += 1;
            }
        }
        counts
    }

    /// Find every maximal run, rows first (top to bottom) then columns (left to right)
    ///
    /// Empty cells break runs. A tile can appear in one horizontal and one
    /// vertical run at the same time.
    pub fn find_runs(&self) -> Vec<Run> {
        let mut runs = Vec::new();
        for row in 0..self.height {
            self.scan_line(Axis::Horizontal, Position::new(0, row), &mut runs);
        }
        for col in 0..self.width {
            self.scan_line(Axis::Vertical, Position::new(col, 0), &mut runs);
        }
        runs
    }

    /// True if any run exists
    pub fn has_runs(&self) -> bool {
        !self.find_runs().is_empty()
    }

    fn scan_line(&self, axis: Axis, origin: Position, out: &mut Vec<Run>) {
        let (len, at): (u8, fn(Position, u8) -> Position) = match axis {
            Axis::Horizontal => (self.width, |o, i| Position::new(o.col + i, o.row)),
            Axis::Vertical => (self.height, |o, i| Position::new(o.col, o.row + i)),
        };

        let mut i = 0u8;
        while i < len {
            let Some(kind) = self.kind_at(at(origin, i)) else {
                i += 1;
                continue;
            };

            let mut j = i + 1;
            while j < len && self.kind_at(at(origin, j)) == Some(kind) {
                j += 1;
            }

            if j - i >= MIN_RUN_LENGTH {
                out.push(Run {
                    axis,
                    kind,
                    start: at(origin, i),
                    len: j - i,
                });
            }
            i = j;
        }
    }

    /// Empty every listed cell
    ///
    /// Positions must be distinct and filled. Hitting an empty or missing
    /// cell means detection and removal disagree, which is fatal.
    pub fn remove(&mut self, positions: &[Position]) -> Result<(), EngineError> {
        for &pos in positions {
            match self.index(pos) {
                Some(idx) if self.cells[idx].is_some() => self.cells[idx] = None,
                _ => return Err(EngineError::RemoveEmptyCell(pos)),
            }
        }
        Ok(())
    }

    /// Apply gravity to every column and spawn new tiles into the freed top rows
    ///
    /// Surviving tiles keep their vertical order. Spawns are reported column
    /// by column, top to bottom.
    pub fn collapse_and_refill(
        &mut self,
        rng: &mut SimpleRng,
        kind_count: u8,
    ) -> (Vec<Fall>, Vec<Spawn>) {
        let mut fallen = Vec::new();
        let mut spawned = Vec::new();
        for col in 0..self.width {
            // Next row to fill, counting up from the bottom
            let mut write = self.height;
            for read in (0..self.height).rev() {
                let from = Position::new(col, read);
                let Some(kind) = self.kind_at(from) else {
                    continue;
                };
                write -= 1;
                if write != read {
                    let to = Position::new(col, write);
                    self.set(to, Some(kind));
                    self.set(from, None);
                    fallen.push(Fall { from, to });
                }
            }

            for row in 0..write {
                let pos = Position::new(col, row);
                let kind = rng.next_kind(kind_count);
                self.set(pos, Some(kind));
                spawned.push(Spawn { pos, kind });
            }
        }
        (fallen, spawned)
    }

    /// Verify that no column holds a tile above an empty cell
    pub fn check_gravity(&self) -> Result<(), EngineError> {
        for col in 0..self.width {
            let mut gap: Option<u8> = None;
            for row in (0..self.height).rev() {
                match self.kind_at(Position::new(col, row)) {
                    None => gap = gap.or(Some(row)),
                    Some(_) => {
                        if let Some(row) = gap {
                            return Err(EngineError::GravityGap { col, row });
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Get a reference to the internal cells array
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Rows of cells, top row first
    pub fn rows(&self) -> Vec<Vec<Cell>> {
        self.cells
            .chunks(self.width as usize)
            .map(<[Cell]>::to_vec)
            .collect()
    }

    /// Rows encoded for the wire: 0 = empty, kind + 1 otherwise
    pub fn rows_u8(&self) -> Vec<Vec<u8>> {
        self.cells
            .chunks(self.width as usize)
            .map(|row| row.iter().map(|c| c.map_or(0, |k| k.0 + 1)).collect())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn k(n: u8) -> Cell {
        Some(Kind(n))
    }

    /// Parse a board from digit rows; '.' is empty
    fn board(rows: &[&str]) -> Board {
        let rows: Vec<Vec<Cell>> = rows
            .iter()
            .map(|r| {
                r.chars()
                    .map(|c| c.to_digit(10).map(|d| Kind(d as u8)))
                    .collect()
            })
            .collect();
        Board::from_rows(&rows).unwrap()
    }

    #[test]
    fn test_board_index_calculation() {
        let b = Board::new(8, 8);
        assert_eq!(b.index(Position::new(0, 0)), Some(0));
        assert_eq!(b.index(Position::new(7, 0)), Some(7));
        assert_eq!(b.index(Position::new(0, 1)), Some(8));
        assert_eq!(b.index(Position::new(7, 7)), Some(63));
        assert_eq!(b.index(Position::new(8, 0)), None);
        assert_eq!(b.index(Position::new(0, 8)), None);
    }

    #[test]
    fn test_from_rows_rejects_ragged_and_tiny() {
        let ragged = vec![vec![k(0); 3], vec![k(1); 2], vec![k(2); 3]];
        assert!(Board::from_rows(&ragged).is_err());

        let tiny = vec![vec![k(0); 2], vec![k(1); 2]];
        assert!(Board::from_rows(&tiny).is_err());
    }

    #[test]
    fn test_find_runs_row_and_column() {
        let b = board(&[
            "0001", //
            "1232", //
            "1303", //
            "1012",
        ]);
        let runs = b.find_runs();
        assert_eq!(runs.len(), 2);

        // Rows are reported before columns
        assert_eq!(
            runs[0],
            Run {
                axis: Axis::Horizontal,
                kind: Kind(0),
                start: Position::new(0, 0),
                len: 3
            }
        );
        assert_eq!(
            runs[1],
            Run {
                axis: Axis::Vertical,
                kind: Kind(1),
                start: Position::new(0, 1),
                len: 3
            }
        );
    }

    #[test]
    fn test_find_runs_is_maximal() {
        let b = board(&[
            "22222", //
            "01010", //
            "10101",
        ]);
        let runs = b.find_runs();
        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].len, 5);
        assert_eq!(runs[0].middle(), Position::new(2, 0));
    }

    #[test]
    fn test_find_runs_shared_tile_in_both_axes() {
        let b = board(&[
            "333", //
            "301", //
            "310",
        ]);
        let runs = b.find_runs();
        assert_eq!(runs.len(), 2);
        assert!(runs.iter().all(|r| r.contains(Position::new(0, 0))));
    }

    #[test]
    fn test_empty_cells_break_runs() {
        let b = board(&[
            "00.00", //
            "12121", //
            "21212",
        ]);
        assert!(b.find_runs().is_empty());
    }

    #[test]
    fn test_remove_empty_cell_is_error() {
        let mut b = board(&["012", "120", "201"]);
        let pos = Position::new(1, 1);
        b.remove(&[pos]).unwrap();
        assert_eq!(b.get(pos), Some(None));
        assert_eq!(b.remove(&[pos]), Err(EngineError::RemoveEmptyCell(pos)));
    }

    #[test]
    fn test_collapse_and_refill() {
        let mut b = board(&[
            "012", //
            "1.0", //
            "2.1",
        ]);
        let mut rng = SimpleRng::new(5);
        let (fallen, spawned) = b.collapse_and_refill(&mut rng, 3);

        // Column 1: the '1' on top falls to the bottom, two tiles spawn above it
        assert_eq!(
            fallen,
            vec![Fall {
                from: Position::new(1, 0),
                to: Position::new(1, 2)
            }]
        );
        assert_eq!(spawned.len(), 2);
        assert_eq!(spawned[0].pos, Position::new(1, 0));
        assert_eq!(spawned[1].pos, Position::new(1, 1));
        assert_eq!(b.kind_at(Position::new(1, 2)), Some(Kind(1)));
        assert!(b.is_full());
        assert!(b.check_gravity().is_ok());
    }

    #[test]
    fn test_collapse_preserves_order() {
        let mut b = board(&["111", "222", "...", "333", "..."]);
        let mut rng = SimpleRng::new(5);
        let (fallen, spawned) = b.collapse_and_refill(&mut rng, 4);

        for col in 0..3 {
            assert_eq!(b.kind_at(Position::new(col, 2)), Some(Kind(1)));
            assert_eq!(b.kind_at(Position::new(col, 3)), Some(Kind(2)));
            assert_eq!(b.kind_at(Position::new(col, 4)), Some(Kind(3)));
        }
        assert_eq!(spawned.len(), 6);
        assert_eq!(fallen.len(), 9);
    }

    #[test]
    fn test_check_gravity_detects_gap() {
        let b = board(&[
            "012", //
            "1.0", //
            "201",
        ]);
        assert_eq!(
            b.check_gravity(),
            Err(EngineError::GravityGap { col: 1, row: 1 })
        );

        let settled = board(&[
            "0.2", //
            "1.0", //
            "201",
        ]);
        assert!(settled.check_gravity().is_ok());
    }

    #[test]
    fn test_swap_and_kind_counts() {
        let mut b = board(&["012", "120", "201"]);
        let before = b.kind_counts();
        assert!(b.swap(Position::new(0, 0), Position::new(1, 0)));
        assert_eq!(b.kind_at(Position::new(0, 0)), Some(Kind(1)));
        assert_eq!(b.kind_at(Position::new(1, 0)), Some(Kind(0)));
        assert_eq!(b.kind_counts(), before);

        assert!(!b.swap(Position::new(0, 0), Position::new(3, 0)));
    }

    #[test]
    fn test_rows_u8_encoding() {
        let b = board(&["0.2", "1.0", "201"]);
        assert_eq!(b.rows_u8()[0], vec![1, 0, 3]);
        assert_eq!(b.rows().len(), 3);
    }
}
