//! Engine module - owns the board and drives every state change
//!
//! The engine validates swaps, runs cascades one observable step at a time,
//! keeps the score, and owns the interaction gate. Timing is left to the
//! caller: a presentation layer calls [`BoardEngine::step_cascade`] on its
//! own schedule (see the pacing constants in `match_three_types`), while
//! headless callers can use [`BoardEngine::resolve_cascade`].

use log::{debug, info};

use crate::board::Board;
use crate::error::EngineError;
use crate::gate::InteractionGate;
use crate::rng::SimpleRng;
use crate::scoring::step_score;
use crate::snapshot::{BoardSnapshot, CascadeStep, GameSnapshot};
use crate::types::{
    Cell, Position, SwapRejection, DEFAULT_BOARD_HEIGHT, DEFAULT_BOARD_WIDTH, DEFAULT_KIND_COUNT,
    DEFAULT_TARGET_SCORE, MAX_BOARD_DIM, MAX_KIND_COUNT, MIN_BOARD_DIM, MIN_KIND_COUNT,
    SEED_MAX_PASSES, SEED_MAX_REDRAWS,
};

/// Parameters fixed for the lifetime of one game
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub width: u8,
    pub height: u8,
    /// Palette size; kinds are `0..kind_count`
    pub kind_count: u8,
    pub target_score: u32,
    /// RNG seed. `None` draws one from OS entropy.
    pub seed: Option<u32>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_BOARD_WIDTH,
            height: DEFAULT_BOARD_HEIGHT,
            kind_count: DEFAULT_KIND_COUNT,
            target_score: DEFAULT_TARGET_SCORE,
            seed: None,
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        let dims = MIN_BOARD_DIM..=MAX_BOARD_DIM;
        if !dims.contains(&self.width) || !dims.contains(&self.height) {
            return Err(EngineError::InvalidConfig(format!(
                "board {}x{} outside {}..={}",
                self.width, self.height, MIN_BOARD_DIM, MAX_BOARD_DIM
            )));
        }
        if !(MIN_KIND_COUNT..=MAX_KIND_COUNT).contains(&self.kind_count) {
            return Err(EngineError::InvalidConfig(format!(
                "kind_count {} outside {}..={}",
                self.kind_count, MIN_KIND_COUNT, MAX_KIND_COUNT
            )));
        }
        if self.target_score == 0 {
            return Err(EngineError::InvalidConfig(
                "target_score must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Outcome of [`BoardEngine::attempt_swap`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapResult {
    pub accepted: bool,
    pub reason: Option<SwapRejection>,
}

impl SwapResult {
    pub fn ok() -> Self {
        Self {
            accepted: true,
            reason: None,
        }
    }

    pub fn rejected(reason: SwapRejection) -> Self {
        Self {
            accepted: false,
            reason: Some(reason),
        }
    }
}

/// Outcome of a single tap in tap-tap swap mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TapOutcome {
    /// Nothing was selected; the tapped tile is now selected
    Selected(Position),
    /// The selected tile was tapped again and is no longer selected
    Deselected,
    /// A non-adjacent tile was tapped and replaced the selection
    Reselected(Position),
    /// The tap completed a swap; a cascade is now in flight
    Swapped,
    Rejected(SwapRejection),
}

/// The board engine
#[derive(Debug, Clone)]
pub struct BoardEngine {
    config: EngineConfig,
    board: Board,
    rng: SimpleRng,
    /// Seed this episode was created from
    seed: u32,
    gate: InteractionGate,
    score: u32,
    game_won: bool,
    /// A swap was accepted and the cascade has not reached quiescence yet
    cascading: bool,
    cascade_depth: u32,
    /// Monotonic episode id (increments on restart).
    episode_id: u32,
}

impl BoardEngine {
    /// Create a new game: fill the board, break every initial match, open the gate
    pub fn initialize(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let (rng, seed) = match config.seed {
            Some(seed) => (SimpleRng::new(seed), seed),
            None => SimpleRng::from_entropy(),
        };

        let mut engine = Self::with_board(config, Board::new(0, 0), rng, seed);
        engine.board = Board::filled(
            engine.config.width,
            engine.config.height,
            &mut engine.rng,
            engine.config.kind_count,
        );
        engine.stabilize_seed()?;

        info!(
            "episode {} seeded: {}x{} board, {} kinds, seed {}",
            engine.episode_id,
            engine.config.width,
            engine.config.height,
            engine.config.kind_count,
            engine.seed
        );
        Ok(engine)
    }

    /// Create a game from an explicit layout (top row first)
    ///
    /// The layout must match the configured dimensions, be completely
    /// filled with kinds from the palette, and contain no runs. The
    /// configured seed (or entropy) drives spawned tiles.
    pub fn from_cells(config: EngineConfig, rows: Vec<Vec<Cell>>) -> Result<Self, EngineError> {
        config.validate()?;
        let board = Board::from_rows(&rows)?;
        if board.width() != config.width || board.height() != config.height {
            return Err(EngineError::InvalidBoard(format!(
                "layout is {}x{}, config says {}x{}",
                board.width(),
                board.height(),
                config.width,
                config.height
            )));
        }
        if !board.is_full() {
            return Err(EngineError::InvalidBoard("layout has empty cells".to_string()));
        }
        if board.cells().iter().flatten().any(|k| k.0 >= config.kind_count) {
            return Err(EngineError::InvalidBoard(format!(
                "layout uses kinds outside 0..{}",
                config.kind_count
            )));
        }
        if board.has_runs() {
            return Err(EngineError::InvalidBoard("layout contains runs".to_string()));
        }

        let (rng, seed) = match config.seed {
            Some(seed) => (SimpleRng::new(seed), seed),
            None => SimpleRng::from_entropy(),
        };
        let mut engine = Self::with_board(config, board, rng, seed);
        engine.gate.open();
        Ok(engine)
    }

    fn with_board(config: EngineConfig, board: Board, rng: SimpleRng, seed: u32) -> Self {
        Self {
            config,
            board,
            rng,
            seed,
            gate: InteractionGate::closed(),
            score: 0,
            game_won: false,
            cascading: false,
            cascade_depth: 0,
            episode_id: 0,
        }
    }

    /// Repaint the middle tile of every run until the board has none
    ///
    /// Does not score. Opens the gate once the board is clean.
    fn stabilize_seed(&mut self) -> Result<(), EngineError> {
        for pass in 0..SEED_MAX_PASSES {
            let runs = self.board.find_runs();
            if runs.is_empty() {
                debug!("seed board stable after {} repaint passes", pass);
                self.gate.open();
                return Ok(());
            }

            for run in &runs {
                let pos = run.middle();
                // Read the live kind: an earlier run this pass may share the tile
                let current = self.board.kind_at(pos).ok_or_else(|| {
                    EngineError::InvalidBoard(format!(
                        "seed board has an empty cell at ({}, {})",
                        pos.col, pos.row
                    ))
                })?;
                let kind = self
                    .rng
                    .next_kind_except(current, self.config.kind_count, SEED_MAX_REDRAWS)
                    .ok_or(EngineError::KindRedrawExhausted {
                        pos,
                        redraws: SEED_MAX_REDRAWS,
                    })?;
                self.board.set(pos, Some(kind));
            }
        }

        Err(EngineError::SeedDidNotConverge {
            passes: SEED_MAX_PASSES,
        })
    }

    /// Request a swap of two tiles
    ///
    /// Checks run in order: gate closed, game over, out of bounds, same
    /// tile (clears the selection), not adjacent (selects `b`). An accepted
    /// swap is unconditional: it need not create a run. It closes the gate
    /// and starts a cascade that the caller drives with
    /// [`step_cascade`](Self::step_cascade).
    pub fn attempt_swap(&mut self, a: Position, b: Position) -> SwapResult {
        if !self.gate.is_accepting_moves() {
            return SwapResult::rejected(SwapRejection::GateClosed);
        }
        if self.game_won {
            return SwapResult::rejected(SwapRejection::GameOver);
        }
        if !self.board.contains(a) || !self.board.contains(b) {
            return SwapResult::rejected(SwapRejection::OutOfBounds);
        }
        if a == b {
            self.gate.clear_selection();
            return SwapResult::rejected(SwapRejection::SameTile);
        }
        if !a.is_adjacent(b) {
            self.gate.select(b);
            return SwapResult::rejected(SwapRejection::NotAdjacent);
        }

        self.board.swap(a, b);
        self.gate.close();
        self.cascading = true;
        self.cascade_depth = 0;
        debug!(
            "swap ({}, {}) <-> ({}, {}) accepted",
            a.col, a.row, b.col, b.row
        );
        SwapResult::ok()
    }

    /// Tap-tap selection: the first tap selects, the second tries to swap
    pub fn select_tile(&mut self, pos: Position) -> TapOutcome {
        if !self.gate.is_accepting_moves() {
            return TapOutcome::Rejected(SwapRejection::GateClosed);
        }
        if self.game_won {
            return TapOutcome::Rejected(SwapRejection::GameOver);
        }
        if !self.board.contains(pos) {
            return TapOutcome::Rejected(SwapRejection::OutOfBounds);
        }

        let Some(selected) = self.gate.selected() else {
            self.gate.select(pos);
            return TapOutcome::Selected(pos);
        };

        match self.attempt_swap(selected, pos).reason {
            None => TapOutcome::Swapped,
            Some(SwapRejection::SameTile) => TapOutcome::Deselected,
            Some(SwapRejection::NotAdjacent) => TapOutcome::Reselected(pos),
            Some(reason) => TapOutcome::Rejected(reason),
        }
    }

    /// Run one scan-remove-fall-refill step
    ///
    /// With no runs on the board the step is quiescent: the gate opens and,
    /// the first time the score has reached the target, the game is won.
    /// Calling it again on a quiescent board is a no-op that reports
    /// quiescence again.
    pub fn step_cascade(&mut self) -> Result<CascadeStep, EngineError> {
        let runs = self.board.find_runs();
        if runs.is_empty() {
            return Ok(CascadeStep::settled(self.settle()));
        }

        let score_delta = step_score(&runs);
        let mut removed: Vec<Position> = runs.iter().flat_map(|r| r.positions()).collect();
        removed.sort_unstable();
        removed.dedup();
        self.board.remove(&removed)?;

        let (fallen, spawned) = self
            .board
            .collapse_and_refill(&mut self.rng, self.config.kind_count);
        self.board.check_gravity()?;

        self.score = self.score.saturating_add(score_delta);
        self.cascade_depth += 1;
        debug!(
            "cascade step {}: {} runs, {} cells, +{} (score {})",
            self.cascade_depth,
            runs.len(),
            removed.len(),
            score_delta,
            self.score
        );

        Ok(CascadeStep {
            runs,
            removed,
            score_delta,
            fallen,
            spawned,
            quiescent: false,
            game_won: false,
        })
    }

    /// Open the gate after a cascade and check the win condition
    ///
    /// Returns true only on the call that sets the win.
    fn settle(&mut self) -> bool {
        if self.cascading {
            debug!(
                "cascade settled after {} steps (score {})",
                self.cascade_depth, self.score
            );
        }
        self.cascading = false;
        self.gate.open();

        if !self.game_won && self.score >= self.config.target_score {
            self.game_won = true;
            info!(
                "episode {} won with score {} (target {})",
                self.episode_id, self.score, self.config.target_score
            );
            return true;
        }
        false
    }

    /// Drive the cascade to quiescence, returning every step taken
    ///
    /// The last element is always the quiescent step.
    pub fn resolve_cascade(&mut self) -> Result<Vec<CascadeStep>, EngineError> {
        let mut steps = Vec::new();
        loop {
            let step = self.step_cascade()?;
            let done = step.quiescent;
            steps.push(step);
            if done {
                return Ok(steps);
            }
        }
    }

    /// Start a fresh episode with the same dimensions and palette
    ///
    /// The new board is seeded from the current RNG state, so a seeded
    /// game replays the same sequence of episodes. Returns false and
    /// changes nothing while the gate is closed: a cascade in flight
    /// always runs to quiescence.
    pub fn restart(&mut self) -> Result<bool, EngineError> {
        if !self.gate.is_accepting_moves() {
            debug!("restart refused: cascade in flight");
            return Ok(false);
        }

        let episode_id = self.episode_id.wrapping_add(1);
        let config = EngineConfig {
            seed: Some(self.rng.state()),
            ..self.config.clone()
        };
        *self = Self::initialize(config)?;
        self.episode_id = episode_id;
        info!("restarted as episode {}", episode_id);
        Ok(true)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn is_accepting_moves(&self) -> bool {
        self.gate.is_accepting_moves()
    }

    pub fn selected(&self) -> Option<Position> {
        self.gate.selected()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn target_score(&self) -> u32 {
        self.config.target_score
    }

    pub fn is_game_won(&self) -> bool {
        self.game_won
    }

    /// True between an accepted swap and the quiescent step that ends it
    pub fn is_cascading(&self) -> bool {
        self.cascading
    }

    pub fn cascade_depth(&self) -> u32 {
        self.cascade_depth
    }

    pub fn episode_id(&self) -> u32 {
        self.episode_id
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn board_snapshot(&self) -> BoardSnapshot {
        BoardSnapshot::from(&self.board)
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            board: self.board_snapshot(),
            score: self.score,
            target_score: self.config.target_score,
            accepting_moves: self.gate.is_accepting_moves(),
            selected: self.gate.selected(),
            game_won: self.game_won,
            episode_id: self.episode_id,
            seed: self.seed,
            cascade_depth: self.cascade_depth,
        }
    }
}
